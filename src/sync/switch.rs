//! Profile switch: save the outgoing profile, restore the incoming one.

use std::path::Path;

use serde::Serialize;

use super::{RestoreOutcome, SaveReport, SyncEngine, SyncError};
use crate::profile::Profile;
use crate::resolver::IdentifierResolver;
use crate::scanner::AssetSource;

/// Everything a completed switch did.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchReport {
    /// Profile that was active before the switch
    pub from: String,
    /// Profile that is active now
    pub to: String,
    /// Save of the outgoing profile, if it completed
    pub save: Option<SaveReport>,
    /// Why the save failed, when the switch went ahead uncached
    pub save_error: Option<String>,
    /// Restore of the incoming profile
    pub restore: RestoreOutcome,
}

/// Result of a switch request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwitchOutcome {
    /// The requested profile is already active; nothing was done.
    AlreadyActive {
        /// The active profile
        profile: String,
    },
    /// Both passes ran and the active profile was recorded.
    Switched(SwitchReport),
}

impl SyncEngine {
    /// Switch the working root from profile `from` to profile `to`.
    ///
    /// Saves `from`, restores `to`, then records `to` as the active profile
    /// under the data root. If the save fails (including a save that
    /// finished with per-entry failures) the switch is aborted, unless
    /// `allow_uncached` is set: then the failure is logged and the restore
    /// still runs, leaving `from`'s cache as it was.
    ///
    /// # Errors
    ///
    /// - [`SyncError::SwitchAborted`] if saving `from` failed and
    ///   `allow_uncached` is not set.
    /// - [`SyncError::Interrupted`] if shutdown was requested during either
    ///   pass.
    /// - Any error from the restore pass, or [`SyncError::Io`] if the active
    ///   profile cannot be recorded.
    pub fn switch<A, R>(
        &self,
        from: &Profile,
        to: &Profile,
        working_root: &Path,
        assets: &A,
        resolver: &R,
        allow_uncached: bool,
    ) -> Result<SwitchOutcome, SyncError>
    where
        A: AssetSource + ?Sized,
        R: IdentifierResolver + ?Sized,
    {
        if from == to {
            log::info!("Profile '{}' is already active", to);
            return Ok(SwitchOutcome::AlreadyActive {
                profile: to.to_string(),
            });
        }

        log::info!("Switching from '{}' to '{}'", from, to);

        let saved = self
            .save(from, working_root, assets, resolver)
            .and_then(|report| report.check().map(|()| report));

        let (save, save_error) = match saved {
            Ok(report) => (Some(report), None),
            Err(SyncError::Interrupted) => return Err(SyncError::Interrupted),
            Err(e) if allow_uncached => {
                log::warn!("Saving '{}' failed ({}); switching uncached", from, e);
                (None, Some(e.to_string()))
            }
            Err(e) => {
                return Err(SyncError::SwitchAborted {
                    profile: from.clone(),
                    source: Box::new(e),
                })
            }
        };

        let restore = self.restore(to, working_root, resolver)?;
        self.store.set_active_profile(to)?;

        Ok(SwitchOutcome::Switched(SwitchReport {
            from: from.to_string(),
            to: to.to_string(),
            save,
            save_error,
            restore,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::resolver::{ArtifactId, MapResolver};
    use crate::scanner::SourceAsset;
    use crate::store::SnapshotStore;
    use crate::sync::SyncConfig;

    fn profile(name: &str) -> Profile {
        Profile::new(name).unwrap()
    }

    fn setup() -> (TempDir, PathBuf, Vec<SourceAsset>, MapResolver) {
        let dir = TempDir::new().unwrap();
        let working = dir.path().join("Library/metadata");
        let project = dir.path().join("Assets");
        fs::create_dir_all(working.join("ab")).unwrap();
        fs::create_dir_all(&project).unwrap();

        let source = project.join("tree.fbx");
        fs::write(&source, b"mesh source").unwrap();
        filetime::set_file_mtime(&source, filetime::FileTime::from_unix_time(1_000, 0)).unwrap();
        fs::write(working.join("ab/ab12cd34"), b"desktop import").unwrap();

        let mut resolver = MapResolver::new();
        resolver.insert(source.clone(), ArtifactId::new("ab12cd34").unwrap());
        let modified = fs::metadata(&source).unwrap().modified().unwrap();
        let assets = vec![SourceAsset::new(source, modified)];
        (dir, working, assets, resolver)
    }

    #[test]
    fn test_same_profile_is_noop() {
        let (dir, working, assets, resolver) = setup();
        let engine = SyncEngine::new(
            SnapshotStore::new(dir.path().join("data")),
            SyncConfig::default(),
        );

        let outcome = engine
            .switch(&profile("ios"), &profile("ios"), &working, &assets, &resolver, false)
            .unwrap();

        assert!(matches!(outcome, SwitchOutcome::AlreadyActive { .. }));
        assert!(!dir.path().join("data").exists());
    }

    #[test]
    fn test_switch_saves_restores_and_records() {
        let (dir, working, assets, resolver) = setup();
        let store = SnapshotStore::new(dir.path().join("data"));
        let engine = SyncEngine::new(store.clone(), SyncConfig::default());

        let outcome = engine
            .switch(
                &profile("desktop"),
                &profile("android"),
                &working,
                &assets,
                &resolver,
                false,
            )
            .unwrap();

        let SwitchOutcome::Switched(report) = outcome else {
            panic!("expected a switch");
        };
        assert_eq!(report.save.as_ref().map(|s| s.copied), Some(1));
        assert!(matches!(report.restore, RestoreOutcome::NoStore { .. }));
        assert!(store
            .store_root(&profile("desktop"))
            .join("ab/ab12cd34")
            .exists());
        assert_eq!(store.active_profile().unwrap(), Some(profile("android")));
    }

    #[test]
    fn test_failed_save_aborts_unless_uncached_allowed() {
        let (dir, working, assets, resolver) = setup();
        let engine = SyncEngine::new(
            SnapshotStore::new(dir.path().join("data")),
            SyncConfig::default(),
        );
        let missing = working.join("absent");

        let result = engine.switch(
            &profile("desktop"),
            &profile("android"),
            &missing,
            &assets,
            &resolver,
            false,
        );
        assert!(matches!(result, Err(SyncError::SwitchAborted { .. })));
        assert!(engine.store().active_profile().unwrap().is_none());

        let outcome = engine
            .switch(
                &profile("desktop"),
                &profile("android"),
                &missing,
                &assets,
                &resolver,
                true,
            )
            .unwrap();
        let SwitchOutcome::Switched(report) = outcome else {
            panic!("expected a switch");
        };
        assert!(report.save.is_none());
        assert!(report.save_error.unwrap().contains("Working root not found"));
        assert_eq!(
            engine.store().active_profile().unwrap(),
            Some(profile("android"))
        );
    }
}
