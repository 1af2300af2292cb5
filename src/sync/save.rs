//! Save pass: working root -> profile store.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use super::{SaveReport, SyncEngine, SyncError};
use crate::profile::Profile;
use crate::progress::PHASE_SAVE;
use crate::resolver::IdentifierResolver;
use crate::scanner::AssetSource;
use crate::store::{copy_atomic, index_root, CopyError, SnapshotStore};

impl SyncEngine {
    /// Snapshot the working root into `profile`'s store.
    ///
    /// For every asset yielded by `assets`, the artifact at its location in
    /// `working_root` is copied into the store if the store has no entry for
    /// it, or if the asset was modified after the profile's last save. The
    /// marker is advanced to the current time once the pass completes
    /// without failures.
    ///
    /// Assets without an identifier and artifacts missing from the working
    /// root are skipped and counted, never fatal.
    ///
    /// The asset sequence is drained into memory before any copy so the
    /// progress callback gets a total; one [`SourceAsset`](crate::scanner::SourceAsset)
    /// per asset is held for the duration of the pass.
    ///
    /// # Errors
    ///
    /// - [`SyncError::MissingWorkingRoot`] if `working_root` does not exist.
    ///   Nothing is written in that case.
    /// - [`SyncError::Io`] if the store cannot be prepared or indexed, or on
    ///   the first copy failure under [`FailurePolicy::Abort`](super::FailurePolicy).
    /// - [`SyncError::Interrupted`] if shutdown was requested. The marker is
    ///   not advanced.
    pub fn save<A, R>(
        &self,
        profile: &Profile,
        working_root: &Path,
        assets: &A,
        resolver: &R,
    ) -> Result<SaveReport, SyncError>
    where
        A: AssetSource + ?Sized,
        R: IdentifierResolver + ?Sized,
    {
        if !working_root.is_dir() {
            return Err(SyncError::MissingWorkingRoot(working_root.to_path_buf()));
        }

        let store_root = self.store.ensure_store(profile)?;
        let previous = SnapshotStore::read_marker(&store_root)?;
        let cached = index_root(&store_root)?;

        log::info!("Saving profile '{}' to {}", profile, store_root.display());

        let mut report = SaveReport {
            profile: profile.to_string(),
            previous_marker: previous.saved_at().map(DateTime::<Utc>::from),
            ..SaveReport::default()
        };

        let mut sources = Vec::new();
        for asset in assets.assets() {
            match asset {
                Ok(asset) => sources.push(asset),
                Err(e) => {
                    log::warn!("Skipping asset: {}", e);
                    report.scan_errors += 1;
                }
            }
        }
        report.assets = sources.len();

        self.config.phase_start(PHASE_SAVE, sources.len());
        let result = (|| -> Result<(), SyncError> {
            for (done, asset) in sources.iter().enumerate() {
                if self.config.is_shutdown_requested() {
                    log::info!("Save of '{}' interrupted", profile);
                    return Err(SyncError::Interrupted);
                }

                let id = match resolver.resolve(&asset.path) {
                    Ok(id) => id,
                    Err(e) => {
                        log::warn!("Skipping {}: {}", asset.path.display(), SyncError::from(e));
                        report.unresolved += 1;
                        continue;
                    }
                };

                let location = self.config.layout.locate(&id);
                let working = location.resolve(working_root);
                let stored = location.resolve(&store_root);

                let overwrite = if cached.contains_key(&location) {
                    if !previous.is_older_than(asset.modified) {
                        report.up_to_date += 1;
                        self.config.progress(done + 1, &asset.path.to_string_lossy());
                        continue;
                    }
                    true
                } else {
                    false
                };

                match copy_atomic(&working, &stored) {
                    Ok(bytes) => {
                        report.bytes_copied += bytes;
                        if overwrite {
                            log::debug!("Refreshed {} ({})", location, asset.path.display());
                            report.overwritten += 1;
                        } else {
                            log::debug!("Cached {} ({})", location, asset.path.display());
                            report.copied += 1;
                        }
                    }
                    Err(CopyError::SourceMissing(path)) => {
                        log::debug!(
                            "No artifact for {} at {}",
                            asset.path.display(),
                            path.display()
                        );
                        report.missing_in_working += 1;
                    }
                    Err(e) => {
                        self.record_failure(&mut report.failures, stored, e.into())?;
                    }
                }

                self.config.progress(done + 1, &asset.path.to_string_lossy());
            }
            Ok(())
        })();
        self.config.phase_end(PHASE_SAVE);
        result?;

        // The scanner stops silently on shutdown; a short asset list is not
        // a completed pass.
        if self.config.is_shutdown_requested() {
            log::info!("Save of '{}' interrupted", profile);
            return Err(SyncError::Interrupted);
        }

        if report.failures.is_empty() {
            let marker = SnapshotStore::write_marker(&store_root, profile, SystemTime::now())?;
            report.marker = marker.saved_at().map(DateTime::<Utc>::from);
        } else {
            log::warn!(
                "Save of '{}' had {} failures; marker left unchanged",
                profile,
                report.failures.len()
            );
        }

        log::info!(
            "Saved '{}': {} copied, {} refreshed, {} up to date, {} missing, {} unresolved",
            profile,
            report.copied,
            report.overwritten,
            report.up_to_date,
            report.missing_in_working,
            report.unresolved
        );
        Ok(report)
    }
}
