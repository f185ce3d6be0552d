//! Remote size discovery.
//!
//! The size is probed with a HEAD request first. When that fails, a
//! `Range: bytes=0-0` GET is issued and the total is read from the
//! `Content-Range` header. Each probe holds its own lease for the whole
//! request.

use super::plan::ByteRange;
use crate::error::Result;
use crate::proxy::ProxyPool;
use crate::utils::{content_range_total, declared_content_length};

use reqwest::{
    header::{HeaderMap, RANGE},
    Url,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout applied to each size probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Determines the total size of a remote object through the proxy pool.
#[derive(Debug, Clone)]
pub struct SizeResolver<'a> {
    pool: &'a ProxyPool,
    headers: HeaderMap,
    timeout: Duration,
    range_only: bool,
}

impl<'a> SizeResolver<'a> {
    pub fn new(pool: &'a ProxyPool) -> Self {
        Self {
            pool,
            headers: HeaderMap::new(),
            timeout: PROBE_TIMEOUT,
            range_only: false,
        }
    }

    /// Headers added to every probe.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skip the HEAD probe and use the ranged probe only.
    ///
    /// Useful with servers that answer HEAD requests with a wrong or missing
    /// `Content-Length`.
    pub fn range_only(mut self, range_only: bool) -> Self {
        self.range_only = range_only;
        self
    }

    /// Returns the declared size of `url`.
    ///
    /// `Some(0)` means the HEAD probe succeeded without a usable
    /// `Content-Length`; callers must treat it as unknown. `None` means both
    /// probes failed.
    pub async fn resolve(&self, url: &Url) -> Option<u64> {
        if !self.range_only {
            match self.probe_head(url).await {
                Ok(size) => {
                    debug!("HEAD probe of {} reported {} bytes", url, size);
                    return Some(size);
                }
                Err(e) => warn!("HEAD request failed. Attempting GET request: {}", e),
            }
        }

        match self.probe_range(url).await {
            Ok(Some(size)) => {
                debug!("Range probe of {} reported {} bytes", url, size);
                Some(size)
            }
            Ok(None) => {
                warn!("Content-Range header not found in the response");
                None
            }
            Err(e) => {
                warn!("Range probe failed: {}", e);
                None
            }
        }
    }

    async fn probe_head(&self, url: &Url) -> Result<u64> {
        let lease = self.pool.acquire().await?;
        debug!("Probing size of {} with HEAD via {}", url, lease.identity());
        let response = lease
            .client()
            .head(url.clone())
            .headers(self.headers.clone())
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(declared_content_length(response.headers()))
    }

    async fn probe_range(&self, url: &Url) -> Result<Option<u64>> {
        let lease = self.pool.acquire().await?;
        debug!("Probing size of {} with a ranged GET via {}", url, lease.identity());
        let response = lease
            .client()
            .get(url.clone())
            .headers(self.headers.clone())
            .header(RANGE, ByteRange::new(0, 0).header_value())
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(content_range_total(response.headers()))
    }
}
