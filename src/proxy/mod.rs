//! Proxy module managing the egress identities used by every request.
//!
//! - [`pool`] - the [`ProxyPool`], its [`ProxyIdentity`] values and the RAII
//!   [`ProxyLease`]

pub mod pool;

pub use pool::{ProxyIdentity, ProxyLease, ProxyPool};
