//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **HTML to text**: Rendering release-note HTML as wrapped plain text
//! - **Text measurement**: Unicode-aware display width for word wrapping
//!
//! # Examples
//!
//! ```
//! use release_feed::util::{display_width, html_to_text};
//!
//! let text = html_to_text("<p>ID: 42</p>", 130);
//! assert_eq!(text, "ID: 42");
//!
//! assert_eq!(display_width("Hello"), 5);
//! ```

mod text;

pub use text::{decode_entities, display_width, html_to_text};
