//! HTTP client setup and middleware configuration.
//!
//! Every proxy identity in the pool owns one client built here. Clients carry
//! tracing middleware, an optional transient-retry middleware and, for pool
//! identities, a `socks5h://` proxy so that DNS is resolved on the proxy side.
//!
//! # Examples
//!
//! ## Client routed through a local SOCKS endpoint
//!
//! ```rust
//! use proxysplit::http::{create_http_client, socks_proxy, HttpClientConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig {
//!     proxy: Some(socks_proxy(9050)?),
//!     ..HttpClientConfig::default()
//! };
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Proxy,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use reqwest_tracing::TracingMiddleware;

/// Desktop browser identification sent with every request.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/116.0";

/// Host on which the SOCKS endpoints listen.
pub const PROXY_HOST: &str = "127.0.0.1";

/// Configuration for HTTP client setup.
#[derive(Debug, Clone, Default)]
pub struct HttpClientConfig {
    /// Number of transient retries performed by the middleware for a single
    /// request. Chunk-level retries are handled by the fetcher, so this is 0
    /// by default.
    pub retries: u32,
    /// Optional proxy configuration.
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
}

/// Returns the proxy URL of the SOCKS endpoint listening on `port`.
pub fn socks_proxy_url(port: u16) -> String {
    format!("socks5h://{}:{}", PROXY_HOST, port)
}

/// Builds a proxy covering both HTTP and HTTPS traffic for the SOCKS endpoint
/// listening on `port`.
pub fn socks_proxy(port: u16) -> Result<Proxy, reqwest::Error> {
    Proxy::all(socks_proxy_url(port))
}

/// Headers sent with every request unless the caller overrides them.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

/// Creates an HTTP client with middleware configuration.
///
/// When no proxy is configured the client is built with `no_proxy()`, so
/// requests never silently pick up proxies from the environment.
pub fn create_http_client(
    config: HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.retries);

    let mut inner_client_builder = reqwest::Client::builder();

    inner_client_builder = match config.proxy {
        Some(proxy) => inner_client_builder.proxy(proxy),
        None => inner_client_builder.no_proxy(),
    };

    if let Some(headers) = config.headers {
        inner_client_builder = inner_client_builder.default_headers(headers);
    }

    let inner_client = inner_client_builder.build()?;

    let client = ClientBuilder::new(inner_client)
        // Trace HTTP requests. See the tracing crate to make use of these traces.
        .with(TracingMiddleware::default())
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

    Ok(client)
}
