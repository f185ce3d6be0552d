//! Builder pattern implementation for creating Downloader instances.
//!
//! # Example
//!
//! ```rust
//! use proxysplit::downloader::{DispatchMode, DownloaderBuilder};
//! use proxysplit::download::RetryPolicy;
//! use std::time::Duration;
//!
//! let downloader = DownloaderBuilder::new()
//!     .scratch_dir("/var/tmp".into())
//!     .retry_policy(RetryPolicy::new(8).with_backoff(
//!         Duration::from_millis(200),
//!         Duration::from_secs(5),
//!     ))
//!     .dispatch(DispatchMode::Sequential)
//!     .build();
//! assert_eq!(downloader.retry_policy().max_attempts(), 8);
//! ```

use super::{
    config::{DispatchMode, DownloaderConfig},
    downloader::Downloader,
};
use crate::download::{ChunkSummary, RetryPolicy};
use crate::{ProgressBarOpts, StyleOptions};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::{num::NonZeroU64, path::PathBuf, sync::Arc, time::Duration};

/// A builder used to create a [`Downloader`].
#[derive(Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Convenience function to hide the progress bars.
    pub fn hidden() -> Self {
        let mut builder = DownloaderBuilder::default();
        builder.config.style_options =
            StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden());
        builder
    }

    /// Sets the directory holding the partial files.
    pub fn scratch_dir(mut self, scratch_dir: PathBuf) -> Self {
        self.config.scratch_dir = scratch_dir;
        self
    }

    /// Sets the chunk size.
    pub fn chunk_size(mut self, chunk_size: NonZeroU64) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Sets the number of attempts per chunk, keeping the current backoff
    /// disabled.
    pub fn retries(mut self, max_attempts: u32) -> Self {
        self.config.retry_policy = RetryPolicy::new(max_attempts);
        self
    }

    /// Sets the full retry policy.
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.config.retry_policy = retry_policy;
        self
    }

    /// Sets how pending chunks are dispatched.
    pub fn dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.config.dispatch = dispatch;
        self
    }

    /// Sets the timeout of each size probe.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Sets the timeout of each chunk request.
    pub fn chunk_timeout(mut self, timeout: Duration) -> Self {
        self.config.chunk_timeout = timeout;
        self
    }

    /// Set the downloader style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Use range requests to get content length instead of HEAD requests.
    ///
    /// This is useful when servers don't provide accurate Content-Length headers
    /// in HEAD requests but do support range requests with Content-Range responses.
    pub fn use_range_for_content_length(mut self, use_range: bool) -> Self {
        self.config.use_range_for_content_length = use_range;
        self
    }

    /// Reuse complete partial files left by a previous run.
    pub fn resumable(mut self, resumable: bool) -> Self {
        self.config.resumable = resumable;
        self
    }

    /// Set callback for when each chunk settles.
    ///
    /// ```rust
    /// use proxysplit::downloader::DownloaderBuilder;
    /// use proxysplit::download::Status;
    ///
    /// let downloader = DownloaderBuilder::new()
    ///     .on_chunk(|summary| match summary.status() {
    ///         Status::Success => println!("[Success] chunk {}", summary.index()),
    ///         Status::Skipped(reason) => println!("[Skipped] chunk {} - {}", summary.index(), reason),
    ///         Status::Fail(error) => println!("[Failed] chunk {} - {}", summary.index(), error),
    ///         Status::NotStarted => {}
    ///     })
    ///     .build();
    /// ```
    pub fn on_chunk<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ChunkSummary) + Send + Sync + 'static,
    {
        self.config.on_chunk = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Add the http headers.
    ///
    /// Headers are merged into the current set, which starts with the browser
    /// `User-Agent`.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.config.headers.extend(headers);
        self
    }

    /// Add the http header
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use proxysplit::downloader::DownloaderBuilder;
    ///
    /// let auth = HeaderValue::from_static("Basic aGk6MTIzNDU2Cg==");
    /// let downloader = DownloaderBuilder::new()
    ///     .header(header::AUTHORIZATION, auth)
    ///     .build();
    /// assert!(downloader.headers().contains_key(header::USER_AGENT));
    /// ```
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.config.headers.insert(name, value);
        self
    }

    /// Create the [`Downloader`] with the specified options.
    pub fn build(self) -> Downloader {
        Downloader::new(self.config)
    }
}
