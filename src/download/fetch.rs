//! Single-chunk fetching.
//!
//! A [`ChunkFetcher`] leases one identity for the whole retry loop of a chunk,
//! requests the range through it and only accepts a body of exactly the
//! requested length. Accepted bytes are persisted before returning.

use super::plan::ByteRange;
use super::retry::RetryPolicy;
use super::scratch::persist_atomically;
use crate::error::{Error, Result};
use crate::proxy::{ProxyLease, ProxyPool};

use futures::StreamExt;
use indicatif::ProgressBar;
use reqwest::{
    header::{HeaderMap, RANGE},
    Url,
};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Timeout applied to each chunk request.
pub const CHUNK_TIMEOUT: Duration = Duration::from_secs(60);

/// A chunk whose bytes were verified and written to its partial file.
#[derive(Debug, Clone)]
pub struct FetchedChunk {
    /// Position of the chunk in the plan.
    pub index: usize,
    /// Offset of the first byte in the remote object.
    pub start: u64,
    pub bytes: Vec<u8>,
    /// Attempts needed, including the successful one.
    pub attempts: u32,
    /// Port of the identity the chunk went through.
    pub port: u16,
}

/// Fetches byte ranges of one URL through the proxy pool.
#[derive(Debug, Clone)]
pub struct ChunkFetcher {
    pool: ProxyPool,
    url: Url,
    headers: HeaderMap,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ChunkFetcher {
    pub fn new(pool: ProxyPool, url: Url) -> Self {
        Self {
            pool,
            url,
            headers: HeaderMap::new(),
            timeout: CHUNK_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Headers added to every chunk request.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetches `range`, writes it to `output_path` and returns it.
    ///
    /// Network errors, error statuses and bodies of the wrong length are
    /// retried until the retry policy gives up, which yields
    /// [`Error::ChunkFailed`]. `index` only labels logs and errors. `pb` tracks
    /// the bytes received by the current attempt.
    pub async fn fetch(
        &self,
        index: usize,
        range: ByteRange,
        output_path: &Path,
        pb: &ProgressBar,
    ) -> Result<FetchedChunk> {
        let lease = self.pool.acquire().await?;
        let port = lease.identity().port();
        let started = SystemTime::now();
        let mut failures = 0;

        loop {
            let err = match self.attempt(&lease, range, pb).await {
                Ok(bytes) => {
                    persist_atomically(output_path, &bytes)
                        .await
                        .map_err(|e| Error::ChunkFailed {
                            index,
                            attempts: failures + 1,
                            reason: e.to_string(),
                        })?;
                    debug!(
                        "Chunk {} {} stored in {:?} via port {}",
                        index, range, output_path, port
                    );
                    return Ok(FetchedChunk {
                        index,
                        start: range.start,
                        bytes,
                        attempts: failures + 1,
                        port,
                    });
                }
                Err(e) => e,
            };

            failures += 1;
            warn!(
                "Error downloading chunk {} {} via port {} (attempt {}/{}): {}",
                index,
                range,
                port,
                failures,
                self.retry.max_attempts(),
                err
            );
            if !err.is_retryable() || !self.retry.should_retry(failures) {
                return Err(Error::ChunkFailed {
                    index,
                    attempts: failures,
                    reason: err.to_string(),
                });
            }
            if let Some(delay) = self.retry.delay(started, failures) {
                tokio::time::sleep(delay).await;
            }
            pb.set_position(0);
        }
    }

    /// One ranged request; returns the body only if it has the exact length.
    async fn attempt(&self, lease: &ProxyLease, range: ByteRange, pb: &ProgressBar) -> Result<Vec<u8>> {
        let expected = range.len();
        let response = lease
            .client()
            .get(self.url.clone())
            .headers(self.headers.clone())
            .header(RANGE, range.header_value())
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        let mut body = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
        let mut stream = response.bytes_stream();
        while let Some(item) = stream.next().await {
            let chunk = item?;
            body.extend_from_slice(&chunk);
            if body.len() as u64 > expected {
                // A server ignoring the range sends the whole object.
                return Err(Error::UnexpectedLength {
                    expected,
                    received: body.len() as u64,
                });
            }
            pb.inc(chunk.len() as u64);
        }

        if body.len() as u64 != expected {
            return Err(Error::UnexpectedLength {
                expected,
                received: body.len() as u64,
            });
        }
        Ok(body)
    }
}
