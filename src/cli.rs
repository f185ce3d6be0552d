//! Command-line interface.
//!
//! ```text
//! proxysplit --url https://example.com/big.iso --filename big.iso --sport 9000 --threads 4
//! ```
//!
//! uses the SOCKS endpoints on ports 9000 to 9003 of 127.0.0.1.

use crate::download::{Download, RetryPolicy, MAX_RETRIES};
use crate::downloader::{DispatchMode, Downloader, DownloaderBuilder};
use crate::error::Result;
use crate::http::HttpClientConfig;
use crate::proxy::ProxyPool;

use clap::Parser;
use std::path::PathBuf;

/// Download a single file using multiple SOCKS proxies in parallel.
#[derive(Debug, Parser)]
#[command(name = "proxysplit", version)]
pub struct Cli {
    /// URL of the file to be downloaded.
    #[arg(long)]
    pub url: String,

    /// Output filename for the downloaded file.
    #[arg(long)]
    pub filename: PathBuf,

    /// Starting port for proxying.
    #[arg(long)]
    pub sport: u16,

    /// Number of workers and total proxy ports. Proxies are expected on
    /// consecutive ports: `--sport 9000 --threads 2` means ports 9000 and 9001.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Directory for the partial files [default: system temp directory].
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Attempts per chunk before giving up.
    #[arg(long, default_value_t = MAX_RETRIES)]
    pub retries: u32,

    /// Wait for each chunk before dispatching the next one.
    #[arg(long)]
    pub sequential: bool,

    /// Hide the progress bars.
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// The downloader described by the flags.
    pub fn downloader(&self) -> Downloader {
        let builder = if self.no_progress {
            DownloaderBuilder::hidden()
        } else {
            DownloaderBuilder::new()
        };
        let builder = builder
            .retry_policy(RetryPolicy::new(self.retries))
            .dispatch(if self.sequential {
                DispatchMode::Sequential
            } else {
                DispatchMode::Concurrent
            });
        let builder = match &self.scratch_dir {
            Some(dir) => builder.scratch_dir(dir.clone()),
            None => builder,
        };
        builder.build()
    }

    /// The proxy pool on ports `sport..sport + threads`.
    pub fn pool(&self) -> Result<ProxyPool> {
        ProxyPool::socks(
            self.sport,
            usize::from(self.threads),
            &HttpClientConfig::default(),
        )
    }

    pub fn download(&self) -> Result<Download> {
        Download::parse(&self.url, self.filename.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_zero_threads_is_rejected() {
        let res = Cli::try_parse_from([
            "proxysplit", "--url", "http://x/y", "--filename", "y", "--sport", "9000",
            "--threads", "0",
        ]);
        assert!(res.is_err());
    }
}
