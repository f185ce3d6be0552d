//! Shared utility functions.
//!
//! - [`content_length`] - size extraction from `Content-Length` and
//!   `Content-Range` headers
//!
//! # Examples
//!
//! ```rust
//! use proxysplit::utils::parse_content_range_total;
//!
//! let header_value = "bytes 0-0/2048";
//! assert_eq!(parse_content_range_total(header_value), Some(2048));
//! ```

pub mod content_length;

pub use content_length::{content_range_total, declared_content_length, parse_content_range_total};
