//! Progress bar display management and coordination.
//!
//! [`ProgressDisplay`] owns the main bar, measured in bytes of the whole
//! object, and hands out one child bar per chunk in flight.
//!
//! ```rust
//! use proxysplit::progress::{ProgressDisplay, StyleOptions};
//!
//! let progress = ProgressDisplay::new(StyleOptions::default(), 3 << 20);
//! let chunk = progress.create_child_progress(1 << 20, "chunk 0");
//! chunk.inc(1 << 20);
//! progress.settle_child(chunk, 1 << 20);
//! progress.finish();
//! ```

use crate::progress::StyleOptions;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use std::sync::Arc;

/// Progress display manager that coordinates multiple progress bars.
pub struct ProgressDisplay {
    multi: Arc<MultiProgress>,
    main: Arc<ProgressBar>,
    style_options: StyleOptions,
}

impl ProgressDisplay {
    /// Create a new progress display for an object of `total_bytes`.
    pub fn new(style_options: StyleOptions, total_bytes: u64) -> Self {
        let multi = match style_options.is_enabled() {
            true => Arc::new(MultiProgress::new()),
            false => Arc::new(MultiProgress::with_draw_target(ProgressDrawTarget::hidden())),
        };

        let main = Arc::new(multi.add(style_options.main().clone().to_progress_bar(total_bytes)));
        main.set_message("Downloading");
        main.tick();

        Self {
            multi,
            main,
            style_options,
        }
    }

    pub fn main(&self) -> Arc<ProgressBar> {
        self.main.clone()
    }

    /// Create a child progress bar for one chunk of `size` bytes.
    pub fn create_child_progress(&self, size: u64, label: impl Into<String>) -> ProgressBar {
        let pb = self
            .multi
            .add(self.style_options.child().clone().to_progress_bar(size));
        pb.set_message(label.into());
        pb
    }

    /// Advance the main bar by `bytes`, for a chunk that settled without a
    /// child bar (skipped chunks).
    pub fn advance(&self, bytes: u64) {
        self.main.inc(bytes);
    }

    /// Finish a chunk's bar and advance the main bar by the chunk's size,
    /// whether the chunk succeeded or not.
    pub fn settle_child(&self, pb: ProgressBar, bytes: u64) {
        if self.style_options.child().clear {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
        self.multi.remove(&pb);
        self.advance(bytes);
    }

    /// Finish the progress display, clearing or keeping bars based on configuration.
    pub fn finish(self) {
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }
}
