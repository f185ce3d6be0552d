//! Chunk and run summaries.
//!
//! A [`ChunkSummary`] records how one chunk settled; a [`DownloadReport`]
//! gathers them for a whole run.
//!
//! # Example
//!
//! ```rust
//! use proxysplit::download::{ByteRange, ChunkSummary, Status};
//!
//! let summary = ChunkSummary::new(0, ByteRange::new(0, 1023)).skip("already on disk");
//! assert!(matches!(summary.status(), Status::Skipped(_)));
//! ```

use super::plan::ByteRange;
use std::path::{Path, PathBuf};

/// Chunk status enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Chunk failed with error message
    Fail(String),
    /// Chunk not yet settled
    NotStarted,
    /// Chunk was already on disk, with reason
    Skipped(String),
    /// Chunk fetched and persisted
    Success,
}

/// Outcome of one chunk.
#[derive(Debug, Clone)]
pub struct ChunkSummary {
    index: usize,
    range: ByteRange,
    status: Status,
    /// Number of attempts made, 0 for skipped chunks.
    attempts: u32,
    /// Port of the identity the chunk was fetched through.
    port: Option<u16>,
}

impl ChunkSummary {
    pub fn new(index: usize, range: ByteRange) -> Self {
        Self {
            index,
            range,
            status: Status::NotStarted,
            attempts: 0,
            port: None,
        }
    }

    /// Attach a status to a [`ChunkSummary`].
    pub fn with_status(self, status: Status) -> Self {
        Self { status, ..self }
    }

    /// Record the attempts made and the identity used.
    pub fn with_attempts(self, attempts: u32, port: Option<u16>) -> Self {
        Self {
            attempts,
            port,
            ..self
        }
    }

    /// Mark the summary as failed with a message.
    pub fn fail(self, msg: impl std::fmt::Display) -> Self {
        Self {
            status: Status::Fail(format!("{}", msg)),
            ..self
        }
    }

    /// Mark the summary as skipped with a message.
    pub fn skip(self, msg: impl std::fmt::Display) -> Self {
        Self {
            status: Status::Skipped(format!("{}", msg)),
            ..self
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn range(&self) -> ByteRange {
        self.range
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    output: PathBuf,
    total_size: u64,
    chunks: Vec<ChunkSummary>,
}

impl DownloadReport {
    pub fn new(output: PathBuf, total_size: u64, chunks: Vec<ChunkSummary>) -> Self {
        Self {
            output,
            total_size,
            chunks,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Chunk summaries in plan order.
    pub fn chunks(&self) -> &[ChunkSummary] {
        &self.chunks
    }

    /// Number of chunks fetched during this run.
    pub fn fetched(&self) -> usize {
        self.count(|s| matches!(s, Status::Success))
    }

    /// Number of chunks reused from a previous run.
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, Status::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, Status::Fail(_)))
    }

    fn count(&self, pred: impl Fn(&Status) -> bool) -> usize {
        self.chunks.iter().filter(|c| pred(c.status())).count()
    }
}
