//! Download module containing the chunked-transfer building blocks.
//!
//! - [`download`] - the [`Download`] target (URL + output path)
//! - [`plan`] - chunk planning and the resumable check
//! - [`size`] - remote size discovery
//! - [`fetch`] - fetching one chunk through a leased identity
//! - [`retry`] - chunk retry policy
//! - [`scratch`] - partial file lifecycle, verification and reassembly
//! - [`summary`] - per-chunk and per-run summaries
//!
//! # Example
//!
//! ```rust
//! use proxysplit::download::{plan, ByteRange, DEFAULT_CHUNK_SIZE};
//!
//! let ranges = plan(3 << 20, DEFAULT_CHUNK_SIZE);
//! assert_eq!(ranges.len(), 3);
//! assert_eq!(ranges[2], ByteRange::new(2_097_152, 3_145_727));
//! ```

pub mod download;
pub mod fetch;
pub mod plan;
pub mod retry;
pub mod scratch;
pub mod size;
pub mod summary;

pub use download::Download;
pub use fetch::{ChunkFetcher, FetchedChunk, CHUNK_TIMEOUT};
pub use plan::{is_resumable, plan, ByteRange, DownloadPlan, DEFAULT_CHUNK_SIZE, MAX_CHUNKS};
pub use retry::{RetryPolicy, MAX_RETRIES};
pub use scratch::{persist_atomically, ScratchSpace};
pub use size::{SizeResolver, PROBE_TIMEOUT};
pub use summary::{ChunkSummary, DownloadReport, Status};
