//! Content length extraction utilities.
//!
//! Size discovery reads the raw headers instead of `Response::content_length`
//! because the latter reflects the body size hint, which is 0 for HEAD
//! responses.

use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_RANGE};

/// Parse Content-Range header to extract total size.
///
/// Content-Range header format: "bytes start-end/total"
/// This function extracts the total size from the header.
///
/// # Example
///
/// ```rust
/// use proxysplit::utils::parse_content_range_total;
///
/// let total = parse_content_range_total("bytes 0-1023/2048");
/// assert_eq!(total, Some(2048));
/// ```
pub fn parse_content_range_total(content_range: &str) -> Option<u64> {
    let (_, total) = content_range.rsplit_once('/')?;
    total.trim().parse::<u64>().ok()
}

/// Total object size advertised by the `Content-Range` header of a range
/// response, if present and well formed. An unknown total (`*`) yields `None`.
pub fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()
        .and_then(parse_content_range_total)
}

/// Value of the `Content-Length` header, or 0 when absent or unparseable.
///
/// Callers treat 0 as "unknown" rather than "empty".
pub fn declared_content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}
