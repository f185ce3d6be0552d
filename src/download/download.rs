//! The file to download.
//!
//! # Example
//!
//! ```rust
//! use proxysplit::download::Download;
//!
//! let download = Download::parse("https://example.com/big.iso", "big.iso")?;
//! assert_eq!(download.url.host_str(), Some("example.com"));
//! # Ok::<(), proxysplit::Error>(())
//! ```

use crate::error::Error;

use reqwest::Url;
use std::path::PathBuf;

/// Represents the remote object and where to reassemble it.
#[derive(Debug, Clone)]
pub struct Download {
    /// URL of the file to download.
    pub url: Url,
    /// Destination path of the reassembled file.
    pub output: PathBuf,
}

impl Download {
    /// Creates a new [`Download`].
    pub fn new(url: &Url, output: impl Into<PathBuf>) -> Self {
        Self {
            url: url.clone(),
            output: output.into(),
        }
    }

    /// Parses `url` and creates a new [`Download`]. Only HTTP(S) URLs are
    /// accepted.
    pub fn parse(url: &str, output: impl Into<PathBuf>) -> Result<Self, Error> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(Self::new(&parsed, output)),
            scheme => Err(Error::InvalidUrl(format!(
                "The url \"{}\" uses unsupported scheme \"{}\"",
                url, scheme
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_url() {
        let d = Download::parse("http://domain.com/file.zip", "out/file.zip").unwrap();
        assert_eq!(d.url.path(), "/file.zip");
        assert_eq!(d.output, PathBuf::from("out/file.zip"));
    }

    #[test]
    fn test_parse_rejects_garbage_and_other_schemes() {
        assert!(matches!(
            Download::parse("not a url", "x"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            Download::parse("ftp://domain.com/file.zip", "x"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
