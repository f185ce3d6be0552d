//! Downloader module containing the orchestrator, its builder and configuration.
//!
//! - `downloader` - [`Downloader`], which sequences a whole chunked run
//! - `builder` - [`DownloaderBuilder`] for flexible configuration
//! - `config` - [`DownloaderConfig`], [`DispatchMode`] and the chunk callback type
//!
//! # Example
//!
//! ```rust
//! use proxysplit::downloader::DownloaderBuilder;
//! use std::num::NonZeroU64;
//!
//! let downloader = DownloaderBuilder::hidden()
//!     .chunk_size(NonZeroU64::new(4 << 20).unwrap())
//!     .retries(3)
//!     .build();
//! assert_eq!(downloader.retry_policy().max_attempts(), 3);
//! ```

pub mod builder;
pub mod config;
pub mod downloader;

pub use builder::DownloaderBuilder;
pub use config::{ChunkCallback, DispatchMode, DownloaderConfig};
pub use downloader::Downloader;
