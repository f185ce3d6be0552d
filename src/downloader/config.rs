//! Configuration structures and defaults for the downloader.
//!
//! # Example
//!
//! ```rust
//! use proxysplit::downloader::{ChunkCallback, DispatchMode};
//! use proxysplit::download::{ChunkSummary, Status};
//!
//! let callback: ChunkCallback = Box::new(|summary: &ChunkSummary| {
//!     if let Status::Fail(msg) = summary.status() {
//!         eprintln!("chunk {} failed: {}", summary.index(), msg);
//!     }
//! });
//! assert_eq!(DispatchMode::default(), DispatchMode::Concurrent);
//! ```

use crate::download::{ChunkSummary, RetryPolicy, CHUNK_TIMEOUT, DEFAULT_CHUNK_SIZE, PROBE_TIMEOUT};
use crate::http::default_headers;
use crate::StyleOptions;

use reqwest::header::HeaderMap;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked each time a chunk settles (skipped, fetched or failed).
pub type ChunkCallback = Box<dyn Fn(&ChunkSummary) + Send + Sync>;

/// How pending chunks are handed to the workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Keep one fetch in flight per proxy identity.
    #[default]
    Concurrent,
    /// Wait for each chunk to settle before dispatching the next one.
    Sequential,
}

/// Configuration structure for the downloader
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Directory holding the partial files.
    pub scratch_dir: PathBuf,
    /// Size of every chunk except possibly the last.
    pub chunk_size: NonZeroU64,
    /// Attempts and backoff per chunk.
    pub retry_policy: RetryPolicy,
    /// Concurrent or sequential dispatch.
    pub dispatch: DispatchMode,
    /// Timeout of each size probe.
    pub probe_timeout: Duration,
    /// Timeout of each chunk request.
    pub chunk_timeout: Duration,
    /// HTTP headers sent with every request.
    pub headers: HeaderMap,
    /// Use range requests to get content length instead of HEAD requests.
    pub use_range_for_content_length: bool,
    /// Reuse partial files left by a previous run.
    pub resumable: bool,
    /// Downloader style options.
    pub style_options: StyleOptions,
    /// Callback for when each chunk settles.
    pub on_chunk: Option<Arc<ChunkCallback>>,
}

impl std::fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("scratch_dir", &self.scratch_dir)
            .field("chunk_size", &self.chunk_size)
            .field("retry_policy", &self.retry_policy)
            .field("dispatch", &self.dispatch)
            .field("probe_timeout", &self.probe_timeout)
            .field("chunk_timeout", &self.chunk_timeout)
            .field("headers", &self.headers)
            .field(
                "use_range_for_content_length",
                &self.use_range_for_content_length,
            )
            .field("resumable", &self.resumable)
            .field("style_options", &self.style_options)
            .field("on_chunk", &self.on_chunk.is_some())
            .finish()
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry_policy: RetryPolicy::default(),
            dispatch: DispatchMode::default(),
            probe_timeout: PROBE_TIMEOUT,
            chunk_timeout: CHUNK_TIMEOUT,
            headers: default_headers(),
            use_range_for_content_length: false,
            resumable: true,
            style_options: StyleOptions::default(),
            on_chunk: None,
        }
    }
}
