//! Error handling for proxysplit.
//!
//! This module provides centralized error handling for every stage of a
//! chunked download: configuration, size discovery, chunk fetching, partial
//! file verification and reassembly. All errors implement the standard Error
//! trait.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can happen when using proxysplit.
///
/// Some variants are fatal for a whole run ([`Error::UnknownSize`],
/// [`Error::Verification`]), others only describe a single failed attempt and
/// are retried by the chunk fetcher ([`Error::UnexpectedLength`], network
/// errors).
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// This variant captures internal errors that don't fit into other categories,
    /// typically representing a broken invariant.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error from the underlying URL parser or the expected URL format.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The downloader or the proxy pool was configured with unusable values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Neither the HEAD probe nor the ranged probe yielded a usable size.
    #[error("Cannot determine file size of {url}")]
    UnknownSize { url: String },

    /// The declared size would need more chunks than a plan may hold.
    #[error("Declared size of {size} bytes needs {chunks} chunks, more than the limit of {max}")]
    TooManyChunks { size: u64, chunks: u64, max: u64 },

    /// A chunk response did not carry exactly the requested number of bytes.
    #[error("Retrieved the incorrect amount of bytes: received {received}, expected {expected}")]
    UnexpectedLength { expected: u64, received: u64 },

    /// A chunk exhausted its attempts.
    #[error("Failed to download chunk {index} after {attempts} attempts: {reason}")]
    ChunkFailed {
        index: usize,
        attempts: u32,
        reason: String,
    },

    /// A partial file is missing or has the wrong size after the fetch loop.
    #[error("Progress file {} is missing or has incorrect size (expected {expected}, found {})", path.display(), found.map_or_else(|| "nothing".to_string(), |f| f.to_string()))]
    Verification {
        path: PathBuf,
        expected: u64,
        found: Option<u64>,
    },

    /// I/O Error.
    ///
    /// This variant wraps standard I/O errors that can occur while writing
    /// partial files or assembling the output.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    ///
    /// Includes HTTP status errors raised by `error_for_status`.
    #[error("Reqwest error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error raised while sending a request through the middleware stack.
    #[error("Request error: {source}")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },
}

impl Error {
    /// Whether the chunk fetcher may try the same range again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedLength { .. } | Error::Reqwest { .. } | Error::Middleware { .. }
        )
    }
}

/// Result type alias for operations that can fail with a proxysplit error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_message_with_missing_file() {
        let err = Error::Verification {
            path: PathBuf::from("/tmp/out.bin.progress.3"),
            expected: 1024,
            found: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("out.bin.progress.3"));
        assert!(msg.contains("expected 1024"));
        assert!(msg.contains("found nothing"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::UnexpectedLength {
            expected: 2,
            received: 1
        }
        .is_retryable());
        assert!(!Error::UnknownSize { url: "x".into() }.is_retryable());
        assert!(!Error::TooManyChunks {
            size: u64::MAX,
            chunks: 1 << 44,
            max: 1 << 22
        }
        .is_retryable());
        assert!(!Error::IOError {
            source: io::Error::other("disk full")
        }
        .is_retryable());
    }
}
