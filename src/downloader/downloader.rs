//! Core downloader implementation: the chunked download of one file.
//!
//! A run resolves the remote size, plans the chunks, skips chunks whose
//! partial file is already complete, fetches the rest through the proxy pool,
//! verifies every partial file and finally reassembles the output.
//!
//! # Example
//!
//! ```rust,no_run
//! use proxysplit::download::Download;
//! use proxysplit::downloader::DownloaderBuilder;
//! use proxysplit::http::HttpClientConfig;
//! use proxysplit::proxy::ProxyPool;
//!
//! # async fn example() -> proxysplit::Result<()> {
//! let pool = ProxyPool::socks(9000, 4, &HttpClientConfig::default())?;
//! let download = Download::parse("https://example.com/big.iso", "big.iso")?;
//! let report = DownloaderBuilder::new().build().download(&pool, &download).await?;
//! println!("{} bytes, {} chunks resumed", report.total_size(), report.skipped());
//! # Ok(())
//! # }
//! ```

use super::config::{DispatchMode, DownloaderConfig};
use crate::download::{
    is_resumable, ByteRange, ChunkFetcher, ChunkSummary, Download, DownloadPlan, DownloadReport,
    RetryPolicy, ScratchSpace, SizeResolver, Status,
};
use crate::error::{Error, Result};
use crate::progress::ProgressDisplay;
use crate::proxy::ProxyPool;

use futures::stream::{self, StreamExt};
use reqwest::header::HeaderMap;
use std::fmt;
use std::num::NonZeroU64;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Represents the download controller.
///
/// ```rust
/// use proxysplit::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().build();
/// assert_eq!(d.chunk_size().get(), 1 << 20);
/// ```
#[derive(Clone)]
pub struct Downloader {
    config: DownloaderConfig,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .finish()
    }
}

impl Downloader {
    pub(crate) fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.config.scratch_dir
    }

    pub fn chunk_size(&self) -> NonZeroU64 {
        self.config.chunk_size
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry_policy
    }

    pub fn dispatch(&self) -> DispatchMode {
        self.config.dispatch
    }

    pub fn probe_timeout(&self) -> Duration {
        self.config.probe_timeout
    }

    pub fn chunk_timeout(&self) -> Duration {
        self.config.chunk_timeout
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.config.headers
    }

    pub fn use_range_for_content_length(&self) -> bool {
        self.config.use_range_for_content_length
    }

    pub fn resumable(&self) -> bool {
        self.config.resumable
    }

    /// Downloads `download` through the identities of `pool`.
    ///
    /// Fails with [`Error::UnknownSize`] or [`Error::TooManyChunks`] before
    /// touching the disk when the size cannot be determined or is absurd, and with [`Error::Verification`] when a chunk
    /// could not be fetched. In both cases no output file is written and the
    /// partial files already on disk are kept for the next run.
    pub async fn download(&self, pool: &ProxyPool, download: &Download) -> Result<DownloadReport> {
        let total_size = SizeResolver::new(pool)
            .headers(self.config.headers.clone())
            .timeout(self.config.probe_timeout)
            .range_only(self.config.use_range_for_content_length)
            .resolve(&download.url)
            .await
            .filter(|size| *size > 0)
            .ok_or_else(|| Error::UnknownSize {
                url: download.url.to_string(),
            })?;

        let plan = DownloadPlan::checked(total_size, self.config.chunk_size)?;
        debug!(
            "Downloading {} ({} bytes) in {} chunks through {} identities",
            download.url,
            total_size,
            plan.len(),
            pool.len()
        );

        let scratch = ScratchSpace::new(&self.config.scratch_dir, &download.output)?;
        scratch.prepare().await?;

        let progress = ProgressDisplay::new(self.config.style_options.clone(), total_size);

        let mut chunks = Vec::with_capacity(plan.len());
        let mut pending = Vec::new();
        for (index, range) in plan.iter() {
            if self.config.resumable && is_resumable(&range, &scratch.partial_path(index)).await {
                debug!("Chunk {} {} already on disk, skipping", index, range);
                progress.advance(range.len());
                let summary = ChunkSummary::new(index, range).skip("progress file already complete");
                self.notify(&summary);
                chunks.push(summary);
            } else {
                pending.push((index, range));
            }
        }

        let fetcher = ChunkFetcher::new(pool.clone(), download.url.clone())
            .headers(self.config.headers.clone())
            .timeout(self.config.chunk_timeout)
            .retry_policy(self.config.retry_policy.clone());
        let in_flight = match self.config.dispatch {
            DispatchMode::Concurrent => pool.len(),
            DispatchMode::Sequential => 1,
        };

        let fetched = stream::iter(pending)
            .map(|(index, range)| self.fetch_chunk(&fetcher, &scratch, &progress, index, range))
            .buffer_unordered(in_flight)
            .collect::<Vec<_>>()
            .await;
        chunks.extend(fetched);
        chunks.sort_by_key(ChunkSummary::index);

        progress.finish();

        scratch.verify(&plan).await?;
        let written = scratch.assemble(&plan, &download.output).await?;
        debug!("Wrote {} bytes to {:?}", written, &download.output);

        let leftovers = scratch.cleanup(&plan).await;
        if leftovers > 0 {
            warn!("{} progress files could not be removed", leftovers);
        }

        Ok(DownloadReport::new(download.output.clone(), written, chunks))
    }

    /// Fetches one chunk and settles its progress bar. Failures are recorded in
    /// the summary; the post-loop verification turns them into a run failure.
    async fn fetch_chunk(
        &self,
        fetcher: &ChunkFetcher,
        scratch: &ScratchSpace,
        progress: &ProgressDisplay,
        index: usize,
        range: ByteRange,
    ) -> ChunkSummary {
        let pb = progress.create_child_progress(range.len(), format!("chunk {}", index));
        let summary = ChunkSummary::new(index, range);

        let summary = match fetcher
            .fetch(index, range, &scratch.partial_path(index), &pb)
            .await
        {
            Ok(chunk) => summary
                .with_attempts(chunk.attempts, Some(chunk.port))
                .with_status(Status::Success),
            Err(e) => {
                warn!("{}", e);
                let attempts = match &e {
                    Error::ChunkFailed { attempts, .. } => *attempts,
                    _ => 0,
                };
                summary.with_attempts(attempts, None).fail(e)
            }
        };

        progress.settle_child(pb, range.len());
        self.notify(&summary);
        summary
    }

    fn notify(&self, summary: &ChunkSummary) {
        if let Some(ref callback) = self.config.on_chunk {
            callback(summary);
        }
    }
}
