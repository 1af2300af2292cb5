//! Profile cache synchronization engine.
//!
//! The [`SyncEngine`] moves derived artifacts between the shared working
//! root and the per-profile stores of a [`SnapshotStore`]:
//!
//! 1. **Save** ([`SyncEngine::save`]) - copy the working root's artifacts for
//!    every known source asset into the current profile's store, refreshing
//!    entries whose source changed since the last save.
//! 2. **Restore** ([`SyncEngine::restore`]) - fill the working root from the
//!    target profile's store, dropping orphaned entries and skipping entries
//!    older than their live source.
//! 3. **Switch** ([`SyncEngine::switch`]) - save then restore, recording the
//!    new active profile.
//!
//! All passes are synchronous and single-threaded. A pass can be cancelled
//! through the shutdown flag, which is checked once per artifact.
//!
//! # Example
//!
//! ```no_run
//! use swapcache::profile::Profile;
//! use swapcache::resolver::MetaFileResolver;
//! use swapcache::scanner::{AssetScanner, ScannerConfig};
//! use swapcache::store::SnapshotStore;
//! use swapcache::sync::{SyncConfig, SyncEngine};
//! use std::path::Path;
//!
//! let project = Path::new("Assets");
//! let scanner = AssetScanner::new(project, ScannerConfig::default());
//! let resolver = MetaFileResolver::scan(project).unwrap();
//! let engine = SyncEngine::new(SnapshotStore::new("SwapCacheData"), SyncConfig::default());
//!
//! let android = Profile::new("android").unwrap();
//! let report = engine
//!     .save(&android, Path::new("Library/metadata"), &scanner, &resolver)
//!     .unwrap();
//! println!("{} artifacts copied", report.copied);
//! ```

mod restore;
mod save;
mod switch;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::{Profile, ProfileError};
use crate::progress::ProgressCallback;
use crate::resolver::ResolverError;
use crate::store::{
    ArtifactLayout, CopyError, IndexError, ShardedLayout, SnapshotStore, StoreError,
};

pub use switch::{SwitchOutcome, SwitchReport};

/// Errors raised by sync passes.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// The working root does not exist.
    #[error("Working root not found: {0}")]
    MissingWorkingRoot(PathBuf),

    /// A directory, index, copy or delete operation failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A source asset could not be mapped to an identifier.
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// The pass was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Sync interrupted by user")]
    Interrupted,

    /// A pass finished, but some entries could not be processed.
    #[error("{failed} entries failed to sync")]
    PartialFailure {
        /// Number of failed entries
        failed: usize,
    },

    /// The profile name is not usable as a store name.
    #[error(transparent)]
    InvalidProfile(#[from] ProfileError),

    /// Saving the outgoing profile failed, so the switch was not performed.
    #[error("Switch aborted: saving '{profile}' failed: {source}")]
    SwitchAborted {
        /// Profile that could not be saved
        profile: Profile,
        /// Why the save failed
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { path, source } => Self::Io { path, source },
            StoreError::Index(e) => e.into(),
        }
    }
}

impl From<IndexError> for SyncError {
    fn from(err: IndexError) -> Self {
        Self::Io {
            path: err.path,
            source: err.source,
        }
    }
}

impl From<CopyError> for SyncError {
    fn from(err: CopyError) -> Self {
        match err {
            CopyError::SourceMissing(path) => Self::Io {
                path,
                source: io::Error::from(io::ErrorKind::NotFound),
            },
            CopyError::Io { path, source } => Self::Io { path, source },
        }
    }
}

/// What a pass does when a single copy or delete fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failure. The marker is left unchanged.
    #[default]
    Abort,
    /// Record the failure, finish the pass, and leave the marker unchanged.
    Continue,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

/// Configuration for the sync engine.
pub struct SyncConfig {
    /// Mapping from artifact identifiers to locations in every root.
    pub layout: Box<dyn ArtifactLayout + Send + Sync>,
    /// Behaviour on per-entry failures.
    pub policy: FailurePolicy,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("layout", &"<layout>")
            .field("policy", &self.policy)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            layout: Box::new(ShardedLayout::default()),
            policy: FailurePolicy::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl SyncConfig {
    /// Set the artifact layout.
    #[must_use]
    pub fn with_layout(mut self, layout: impl ArtifactLayout + Send + Sync + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    /// Set the failure policy.
    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn phase_start(&self, phase: &str, total: usize) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(phase, total);
        }
    }

    fn progress(&self, completed: usize, item: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_progress(completed, item);
        }
    }

    fn phase_end(&self, phase: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(phase);
        }
    }
}

/// A single entry that could not be synced under [`FailurePolicy::Continue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFailure {
    /// File the failed operation targeted
    pub path: PathBuf,
    /// Error message
    pub message: String,
}

/// Outcome of a save pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveReport {
    /// Profile that was saved
    pub profile: String,
    /// Number of source assets enumerated
    pub assets: usize,
    /// Artifacts copied into the store for the first time
    pub copied: usize,
    /// Cached artifacts refreshed because their source changed
    pub overwritten: usize,
    /// Cached artifacts left untouched
    pub up_to_date: usize,
    /// Assets whose artifact was absent from the working root
    pub missing_in_working: usize,
    /// Assets skipped because they had no identifier
    pub unresolved: usize,
    /// Assets the source failed to enumerate
    pub scan_errors: usize,
    /// Bytes written into the store
    pub bytes_copied: u64,
    /// Entries that failed under the continue policy
    pub failures: Vec<EntryFailure>,
    /// Marker before the pass, if the profile had been saved
    pub previous_marker: Option<DateTime<Utc>>,
    /// Marker recorded by this pass; `None` if it was not advanced
    pub marker: Option<DateTime<Utc>>,
}

impl SaveReport {
    /// Whether the pass finished without per-entry failures.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn per-entry failures into an error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PartialFailure`] if any entry failed.
    pub fn check(&self) -> Result<(), SyncError> {
        partial(&self.failures)
    }
}

/// Outcome of a restore pass over an existing store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    /// Profile that was restored
    pub profile: String,
    /// Entries found in the store
    pub entries: usize,
    /// Entries copied into the working root
    pub restored: usize,
    /// Entries skipped because their live source is newer
    pub stale: usize,
    /// Entries deleted because nothing produces them any more
    pub orphans_removed: usize,
    /// Entries kept because the resolver could not tell whether they have a source
    pub unresolved: usize,
    /// Bytes written into the working root
    pub bytes_restored: u64,
    /// Entries that failed under the continue policy
    pub failures: Vec<EntryFailure>,
}

impl RestoreReport {
    /// Whether the pass finished without per-entry failures.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn per-entry failures into an error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PartialFailure`] if any entry failed.
    pub fn check(&self) -> Result<(), SyncError> {
        partial(&self.failures)
    }
}

/// Result of a restore request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RestoreOutcome {
    /// The profile was never saved; nothing was touched.
    NoStore {
        /// Profile that was requested
        profile: String,
    },
    /// The store was restored into the working root.
    Restored(RestoreReport),
}

impl RestoreOutcome {
    /// The restore report, if a store existed.
    #[must_use]
    pub fn report(&self) -> Option<&RestoreReport> {
        match self {
            Self::NoStore { .. } => None,
            Self::Restored(report) => Some(report),
        }
    }
}

fn partial(failures: &[EntryFailure]) -> Result<(), SyncError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SyncError::PartialFailure {
            failed: failures.len(),
        })
    }
}

/// Save/restore engine over one data root.
#[derive(Debug)]
pub struct SyncEngine {
    store: SnapshotStore,
    config: SyncConfig,
}

impl SyncEngine {
    /// Create an engine over `store`.
    #[must_use]
    pub fn new(store: SnapshotStore, config: SyncConfig) -> Self {
        Self { store, config }
    }

    /// The stores this engine syncs with.
    #[must_use]
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Handle a failed copy or delete according to the failure policy.
    fn record_failure(
        &self,
        failures: &mut Vec<EntryFailure>,
        path: PathBuf,
        err: SyncError,
    ) -> Result<(), SyncError> {
        match self.config.policy {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::Continue => {
                log::warn!("{}", err);
                failures.push(EntryFailure {
                    path,
                    message: err.to_string(),
                });
                Ok(())
            }
        }
    }
}
