//! proxysplit downloads one large file over HTTP(S) in fixed-size byte ranges,
//! routing every range through its own local SOCKS5 endpoint.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use proxysplit::{Download, DownloaderBuilder, HttpClientConfig, ProxyPool};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), proxysplit::Error> {
//! // SOCKS endpoints on 127.0.0.1:9000 ..= 127.0.0.1:9003.
//! let pool = ProxyPool::socks(9000, 4, &HttpClientConfig::default())?;
//! let download = Download::parse("https://example.com/big.iso", "big.iso")?;
//! DownloaderBuilder::new().build().download(&pool, &download).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`proxy`] - the pool of egress identities and their leases
//! - [`download`] - size discovery, chunk planning, fetching and partial files
//! - [`downloader`] - the [`Downloader`] orchestrating a run, and its builder
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`http`] - HTTP client creation and SOCKS addressing
//! - [`progress`] - Progress bar styling and display management
//! - [`utils`] - Header parsing helpers
//! - [`cli`] - The command-line interface

pub mod cli;
pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod progress;
pub mod proxy;
pub mod utils;

pub use download::{ByteRange, ChunkSummary, Download, DownloadPlan, DownloadReport, Status};
pub use downloader::{DispatchMode, Downloader, DownloaderBuilder};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use progress::{ProgressBarOpts, StyleOptions};
pub use proxy::{ProxyIdentity, ProxyLease, ProxyPool};
pub use utils::parse_content_range_total;
