//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`ProgressCallback`] observer trait that sync
//! passes report through, and [`Progress`], which renders it as terminal
//! progress bars for the CLI.
//!
//! Progress is purely observational: nothing a callback does affects the
//! outcome of a pass.
//!
//! # Accessible Mode
//!
//! When accessible mode is enabled, progress reporting uses simplified output:
//! - ASCII bars, no Unicode block characters
//! - Reduced update frequency for screen reader compatibility

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Phase name reported by save passes.
pub const PHASE_SAVE: &str = "save";

/// Phase name reported by restore passes.
pub const PHASE_RESTORE: &str = "restore";

/// Progress callback for sync passes.
///
/// Implement this trait to receive progress updates from the sync engine.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_SAVE`] or [`PHASE_RESTORE`])
    /// * `total` - Total number of items to process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called after each item is processed.
    ///
    /// # Arguments
    ///
    /// * `completed` - Number of items completed so far
    /// * `item` - Item just processed (a source path or artifact location)
    fn on_progress(&self, completed: usize, item: &str);

    /// Called when a phase completes, successfully or not.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
    accessible: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use swapcache::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_accessible(quiet, false)
    }

    /// Create a new progress reporter with accessible mode.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress will be displayed.
    /// * `accessible` - If true, uses simplified output for screen readers.
    #[must_use]
    pub fn with_accessible(quiet: bool, accessible: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
            accessible,
        }
    }

    /// Check if accessible mode is enabled.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    fn bar_style(&self) -> ProgressStyle {
        if self.accessible {
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        } else {
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(self.bar_style());
        pb.set_message(match phase {
            PHASE_SAVE => "Saving current profile to cache".to_string(),
            PHASE_RESTORE => "Filling working root from cache".to_string(),
            other => other.to_string(),
        });
        if self.accessible {
            pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(2));
        } else {
            pb.enable_steady_tick(Duration::from_millis(100));
        }

        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_progress(&self, completed: usize, item: &str) {
        if self.quiet {
            return;
        }
        if let Ok(bar) = self.bar.lock() {
            if let Some(ref pb) = *bar {
                pb.set_position(completed as u64);
                pb.set_message(truncate_path(item, 30));
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        let finished = self.bar.lock().ok().and_then(|mut bar| bar.take());
        if let Some(pb) = finished {
            pb.finish_with_message(match phase {
                PHASE_SAVE => "Save complete".to_string(),
                PHASE_RESTORE => "Restore complete".to_string(),
                other => format!("{} complete", other),
            });
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
