//! Pool of proxy identities handed out one lease at a time.
//!
//! The pool holds one permit per identity in a [`Semaphore`] and keeps the
//! free identities in a FIFO queue. Acquiring waits for a permit, then pops the
//! front identity; dropping the [`ProxyLease`] pushes it to the back before the
//! permit is released. Since permits and free identities always match, an
//! identity is never leased twice at the same time, and free identities rotate
//! round-robin.
//!
//! # Example
//!
//! ```rust,no_run
//! use proxysplit::proxy::ProxyPool;
//! use proxysplit::http::HttpClientConfig;
//!
//! # async fn example() -> proxysplit::Result<()> {
//! // Ports 9000 and 9001.
//! let pool = ProxyPool::socks(9000, 2, &HttpClientConfig::default())?;
//! let lease = pool.acquire().await?;
//! println!("leased {}", lease.identity());
//! drop(lease);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::http::{create_http_client, socks_proxy, socks_proxy_url, HttpClientConfig};

use parking_lot::Mutex;
use reqwest_middleware::ClientWithMiddleware;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// One egress route, identified by the port of a local SOCKS endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyIdentity {
    port: u16,
}

impl ProxyIdentity {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// URL of the SOCKS endpoint behind this identity.
    pub fn proxy_url(&self) -> String {
        socks_proxy_url(self.port)
    }
}

impl fmt::Display for ProxyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port {}", self.port)
    }
}

/// An identity together with the client routed through it.
struct Slot {
    identity: ProxyIdentity,
    client: ClientWithMiddleware,
}

struct PoolInner {
    permits: Arc<Semaphore>,
    free: Mutex<VecDeque<Slot>>,
    size: usize,
}

/// Thread-safe pool of proxy identities.
///
/// Cloning a pool is cheap and yields a handle to the same identities.
#[derive(Clone)]
pub struct ProxyPool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for ProxyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyPool")
            .field("size", &self.inner.size)
            .field("available", &self.available())
            .finish()
    }
}

impl ProxyPool {
    /// Creates a pool of `count` identities on contiguous ports starting at
    /// `start_port`, each routed through `socks5h://127.0.0.1:<port>`.
    pub fn socks(start_port: u16, count: usize, config: &HttpClientConfig) -> Result<Self> {
        Self::with_client_factory(start_port, count, |identity| {
            let config = HttpClientConfig {
                proxy: Some(socks_proxy(identity.port())?),
                ..config.clone()
            };
            Ok(create_http_client(config)?)
        })
    }

    /// Creates a pool of `count` identities on contiguous ports starting at
    /// `start_port`, building each identity's client with `factory`.
    pub fn with_client_factory<F>(start_port: u16, count: usize, mut factory: F) -> Result<Self>
    where
        F: FnMut(&ProxyIdentity) -> Result<ClientWithMiddleware>,
    {
        if count == 0 {
            return Err(Error::InvalidConfig(
                "the proxy pool needs at least one port".into(),
            ));
        }
        let last = u16::try_from(count - 1)
            .ok()
            .and_then(|offset| start_port.checked_add(offset))
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "{} ports starting at {} exceed the port range",
                    count, start_port
                ))
            })?;

        let mut free = VecDeque::with_capacity(count);
        for port in start_port..=last {
            let identity = ProxyIdentity::new(port);
            let client = factory(&identity)?;
            free.push_back(Slot { identity, client });
        }
        debug!("Created proxy pool with ports {}..={}", start_port, last);

        Ok(Self {
            inner: Arc::new(PoolInner {
                permits: Arc::new(Semaphore::new(count)),
                free: Mutex::new(free),
                size: count,
            }),
        })
    }

    /// Waits until an identity is free and leases it exclusively.
    pub async fn acquire(&self) -> Result<ProxyLease> {
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Internal("proxy pool semaphore closed".into()))?;

        let slot = self
            .inner
            .free
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Internal("proxy pool has a permit but no free identity".into()))?;

        Ok(ProxyLease {
            slot: Some(slot),
            pool: self.inner.clone(),
            _permit: permit,
        })
    }

    /// Number of identities in the pool.
    pub fn len(&self) -> usize {
        self.inner.size
    }

    /// Always false: pools are created with at least one identity.
    pub fn is_empty(&self) -> bool {
        self.inner.size == 0
    }

    /// Number of identities currently free.
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }
}

/// Exclusive ownership of one identity. The identity goes back to the pool
/// when the lease is dropped.
pub struct ProxyLease {
    slot: Option<Slot>,
    pool: Arc<PoolInner>,
    // Released after `drop` has returned the slot.
    _permit: OwnedSemaphorePermit,
}

impl ProxyLease {
    pub fn identity(&self) -> ProxyIdentity {
        self.slot().identity
    }

    /// Client whose traffic leaves through this identity.
    pub fn client(&self) -> &ClientWithMiddleware {
        &self.slot().client
    }

    fn slot(&self) -> &Slot {
        // Only `drop` takes the slot out.
        self.slot.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl fmt::Debug for ProxyLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyLease")
            .field("identity", &self.slot.as_ref().map(|s| s.identity))
            .finish()
    }
}

impl Drop for ProxyLease {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.pool.free.lock().push_back(slot);
        }
    }
}
