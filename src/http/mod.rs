//! HTTP module containing client creation for proxy identities.
//!
//! - [`client`] - HTTP client creation, SOCKS proxy addressing and default
//!   headers
//!
//! # Examples
//!
//! ```rust
//! use proxysplit::http::{create_http_client, default_headers, HttpClientConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig {
//!     headers: Some(default_headers()),
//!     ..HttpClientConfig::default()
//! };
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{
    create_http_client, default_headers, socks_proxy, socks_proxy_url, HttpClientConfig,
    BROWSER_USER_AGENT,
};
