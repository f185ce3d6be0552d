//! Chunk planning.
//!
//! A [`DownloadPlan`] is derived from the total size and the chunk size alone,
//! so it is never persisted: a restarted run recomputes it and only trusts
//! partial files whose length matches the recomputed range.

use crate::error::{Error, Result};

use std::fmt;
use std::num::NonZeroU64;
use std::path::Path;
use tokio::fs;

/// Default chunk size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: NonZeroU64 = match NonZeroU64::new(1 << 20) {
    Some(size) => size,
    None => unreachable!(),
};

/// Largest number of chunks a plan may hold: 4 TiB at the default chunk size.
pub const MAX_CHUNKS: u64 = 1 << 22;

/// Inclusive byte range `[start, end]` of the remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Creates a range. `end` must not be smaller than `start`.
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(end >= start, "invalid byte range {}-{}", start, end);
        Self { start, end }
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false, a range covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for the `Range` request header.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Splits `[0, total_size - 1]` into `ceil(total_size / chunk_size)`
/// contiguous ranges. Every range but the last is exactly `chunk_size` long.
pub fn plan(total_size: u64, chunk_size: NonZeroU64) -> Vec<ByteRange> {
    let chunk_size = chunk_size.get();
    let count = total_size.div_ceil(chunk_size);
    (0..count)
        .map(|i| {
            let start = i * chunk_size;
            let end = start.saturating_add(chunk_size - 1).min(total_size - 1);
            ByteRange::new(start, end)
        })
        .collect()
}

/// Whether the partial file at `path` already holds the whole `range`.
pub async fn is_resumable(range: &ByteRange, path: &Path) -> bool {
    match fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && metadata.len() == range.len(),
        Err(_) => false,
    }
}

/// Total size plus the ordered ranges derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    total_size: u64,
    chunk_size: NonZeroU64,
    ranges: Vec<ByteRange>,
}

impl DownloadPlan {
    pub fn new(total_size: u64, chunk_size: NonZeroU64) -> Self {
        Self {
            total_size,
            chunk_size,
            ranges: plan(total_size, chunk_size),
        }
    }

    /// Like [`DownloadPlan::new`], but refuses a size needing more than
    /// [`MAX_CHUNKS`] chunks instead of allocating them.
    pub fn checked(total_size: u64, chunk_size: NonZeroU64) -> Result<Self> {
        let chunks = total_size.div_ceil(chunk_size.get());
        if chunks > MAX_CHUNKS {
            return Err(Error::TooManyChunks {
                size: total_size,
                chunks,
                max: MAX_CHUNKS,
            });
        }
        Ok(Self::new(total_size, chunk_size))
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn chunk_size(&self) -> NonZeroU64 {
        self.chunk_size
    }

    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterates over `(index, range)` pairs in plan order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, ByteRange)> + '_ {
        self.ranges.iter().copied().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    fn assert_exact_cover(total: u64, chunk: u64) {
        let ranges = plan(total, size(chunk));
        assert_eq!(ranges.len() as u64, total.div_ceil(chunk));
        let mut next = 0;
        for (i, range) in ranges.iter().enumerate() {
            assert_eq!(range.start, next, "gap or overlap before chunk {}", i);
            assert!(range.end >= range.start);
            if i + 1 < ranges.len() {
                assert_eq!(range.len(), chunk);
            } else {
                assert!(range.len() <= chunk);
            }
            next = range.end + 1;
        }
        assert_eq!(next, total);
    }

    #[test]
    fn test_plan_three_full_chunks() {
        let ranges = plan(3 * (1 << 20), DEFAULT_CHUNK_SIZE);
        assert_eq!(
            ranges,
            vec![
                ByteRange::new(0, 1_048_575),
                ByteRange::new(1_048_576, 2_097_151),
                ByteRange::new(2_097_152, 3_145_727),
            ]
        );
    }

    #[test]
    fn test_plan_covers_exactly() {
        for total in [1, 2, 9, 10, 11, 1023, 1024, 1025, 65_537] {
            for chunk in [1, 3, 10, 1024] {
                assert_exact_cover(total, chunk);
            }
        }
    }

    #[test]
    fn test_plan_short_tail() {
        let ranges = plan(2500, size(1000));
        assert_eq!(ranges.last(), Some(&ByteRange::new(2000, 2499)));
        assert_eq!(ranges.last().unwrap().len(), 500);
    }

    #[test]
    fn test_plan_empty_object() {
        assert!(plan(0, DEFAULT_CHUNK_SIZE).is_empty());
    }

    #[test]
    fn test_plan_near_u64_max_does_not_overflow() {
        let ranges = plan(u64::MAX, size(u64::MAX / 2 + 1));
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].end, u64::MAX - 1);
    }

    #[test]
    fn test_range_header_value() {
        assert_eq!(ByteRange::new(0, 0).header_value(), "bytes=0-0");
        assert_eq!(
            ByteRange::new(1_048_576, 2_097_151).header_value(),
            "bytes=1048576-2097151"
        );
    }

    #[test]
    fn test_checked_plan_rejects_absurd_sizes() {
        match DownloadPlan::checked(u64::MAX, DEFAULT_CHUNK_SIZE) {
            Err(Error::TooManyChunks { chunks, max, .. }) => {
                assert_eq!(chunks, u64::MAX.div_ceil(1 << 20));
                assert_eq!(max, MAX_CHUNKS);
            }
            other => panic!("expected too many chunks, got {:?}", other),
        }

        assert!(DownloadPlan::checked(MAX_CHUNKS * 4 + 1, size(4)).is_err());
        assert_eq!(DownloadPlan::checked(10, size(4)).unwrap().len(), 3);
    }

    #[test]
    fn test_download_plan_accessors() {
        let plan = DownloadPlan::new(10, size(4));
        assert_eq!(plan.total_size(), 10);
        assert_eq!(plan.chunk_size().get(), 4);
        assert_eq!(plan.len(), 3);
        let indexes: Vec<usize> = plan.iter().map(|(i, _)| i).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_is_resumable_checks_exact_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part");
        let range = ByteRange::new(10, 19);

        assert!(!is_resumable(&range, &path).await);

        std::fs::write(&path, [0u8; 9]).unwrap();
        assert!(!is_resumable(&range, &path).await);

        std::fs::write(&path, [0u8; 10]).unwrap();
        assert!(is_resumable(&range, &path).await);

        std::fs::write(&path, [0u8; 11]).unwrap();
        assert!(!is_resumable(&range, &path).await);
    }
}
