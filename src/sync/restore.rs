//! Restore pass: profile store -> working root.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::{RestoreOutcome, RestoreReport, SyncEngine, SyncError};
use crate::profile::Profile;
use crate::progress::PHASE_RESTORE;
use crate::resolver::IdentifierResolver;
use crate::store::{copy_atomic, index_root, remove_and_prune, ArtifactLocation};

/// What restore does with one cached entry.
enum Disposition {
    /// Nothing produces this artifact any more.
    Orphan,
    /// The live source changed after the entry was cached.
    Stale,
    /// The entry is current and belongs in the working root.
    Restore,
    /// The resolver cannot tell whether a source exists; leave the entry.
    Unresolved,
}

impl SyncEngine {
    /// Fill the working root from `profile`'s store.
    ///
    /// Every cached entry is classified against its live source: entries
    /// whose source is gone (or that the layout cannot map back to an
    /// identifier) are deleted from the store, entries older than their
    /// source are skipped, and the rest are copied into `working_root`,
    /// replacing what is there. Entries the resolver cannot answer for are
    /// left in the store and counted as unresolved. The marker is never
    /// written.
    ///
    /// A profile that was never saved yields [`RestoreOutcome::NoStore`]
    /// without touching anything.
    ///
    /// # Errors
    ///
    /// - [`SyncError::MissingWorkingRoot`] if the store exists but
    ///   `working_root` does not.
    /// - [`SyncError::Io`] if the store cannot be indexed, or on the first
    ///   copy or delete failure under [`FailurePolicy::Abort`](super::FailurePolicy).
    /// - [`SyncError::Interrupted`] if shutdown was requested.
    pub fn restore<R>(
        &self,
        profile: &Profile,
        working_root: &Path,
        resolver: &R,
    ) -> Result<RestoreOutcome, SyncError>
    where
        R: IdentifierResolver + ?Sized,
    {
        if !self.store.exists(profile) {
            log::info!("No cache for profile '{}'; nothing to restore", profile);
            return Ok(RestoreOutcome::NoStore {
                profile: profile.to_string(),
            });
        }
        if !working_root.is_dir() {
            return Err(SyncError::MissingWorkingRoot(working_root.to_path_buf()));
        }

        let store_root = self.store.store_root(profile);
        let entries = index_root(&store_root)?;

        log::info!(
            "Restoring profile '{}' from {} ({} entries)",
            profile,
            store_root.display(),
            entries.len()
        );

        let mut report = RestoreReport {
            profile: profile.to_string(),
            entries: entries.len(),
            ..RestoreReport::default()
        };

        self.config.phase_start(PHASE_RESTORE, entries.len());
        let result = (|| -> Result<(), SyncError> {
            for (done, (location, cached_at)) in entries.iter().enumerate() {
                if self.config.is_shutdown_requested() {
                    log::info!("Restore of '{}' interrupted", profile);
                    return Err(SyncError::Interrupted);
                }

                let stored = location.resolve(&store_root);
                let disposition = match self.classify(location, *cached_at, resolver) {
                    Ok(disposition) => disposition,
                    Err(e) => {
                        self.record_failure(&mut report.failures, stored, e)?;
                        self.config.progress(done + 1, &location.to_string());
                        continue;
                    }
                };

                match disposition {
                    Disposition::Orphan => match remove_and_prune(&stored, &store_root) {
                        Ok(()) => {
                            log::debug!("Removed orphan {}", location);
                            report.orphans_removed += 1;
                        }
                        Err(e) => self.record_failure(&mut report.failures, stored, e.into())?,
                    },
                    Disposition::Stale => {
                        log::debug!("Skipped stale {}", location);
                        report.stale += 1;
                    }
                    Disposition::Unresolved => report.unresolved += 1,
                    Disposition::Restore => {
                        let working = location.resolve(working_root);
                        match copy_atomic(&stored, &working) {
                            Ok(bytes) => {
                                log::debug!("Restored {}", location);
                                report.restored += 1;
                                report.bytes_restored += bytes;
                            }
                            Err(e) => {
                                self.record_failure(&mut report.failures, working, e.into())?;
                            }
                        }
                    }
                }

                self.config.progress(done + 1, &location.to_string());
            }
            Ok(())
        })();
        self.config.phase_end(PHASE_RESTORE);
        result?;

        log::info!(
            "Restored '{}': {} restored, {} stale, {} orphans removed, {} unresolved",
            profile,
            report.restored,
            report.stale,
            report.orphans_removed,
            report.unresolved
        );
        Ok(RestoreOutcome::Restored(report))
    }

    fn classify<R>(
        &self,
        location: &ArtifactLocation,
        cached_at: std::time::SystemTime,
        resolver: &R,
    ) -> Result<Disposition, SyncError>
    where
        R: IdentifierResolver + ?Sized,
    {
        let Some(id) = self.config.layout.identify(location) else {
            log::debug!("{} does not match the artifact layout", location);
            return Ok(Disposition::Orphan);
        };
        let source = match resolver.reverse_lookup(&id) {
            Ok(Some(source)) => source,
            Ok(None) => return Ok(Disposition::Orphan),
            Err(e) => {
                log::warn!("Keeping {}: {}", location, SyncError::from(e));
                return Ok(Disposition::Unresolved);
            }
        };

        let metadata = match fs::metadata(&source) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(Disposition::Orphan),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Disposition::Orphan),
            Err(e) => return Err(SyncError::io(source, e)),
        };
        let modified = metadata.modified().map_err(|e| SyncError::io(&source, e))?;

        if modified >= cached_at {
            Ok(Disposition::Stale)
        } else {
            Ok(Disposition::Restore)
        }
    }
}
