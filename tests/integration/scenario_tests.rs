use std::fs;
use std::thread;
use std::time::Duration;

use swapcache::store::SnapshotStore;
use swapcache::sync::{FailurePolicy, RestoreOutcome, SwitchOutcome, SyncConfig, SyncError};

use super::common::{profile, read_tree, set_mtime, Project};

/// tree.fbx imports to `ab12cd34`, which lives at `ab/ab12cd34`.
#[test]
fn test_asset_lifecycle_through_save_and_restore() {
    let project = Project::new();
    project.add_source("Models/tree.fbx", "ab12cd34", 1_000);
    project.import("ab12cd34", b"tree v1");

    let engine = project.engine();
    let android = profile("android");
    let cached = project.cached_artifact("android", "ab12cd34");

    let first = engine
        .save(&android, &project.working, &project.scanner(), &project.resolver())
        .unwrap();
    assert_eq!(first.copied, 1);
    assert_eq!(fs::read(&cached).unwrap(), b"tree v1");
    let t1 = first.marker.unwrap();

    // Edit the source after T1 and re-import.
    thread::sleep(Duration::from_millis(20));
    set_mtime(&project.assets.join("Models/tree.fbx"), t1.timestamp() + 5);
    project.import("ab12cd34", b"tree v2");

    let second = engine
        .save(&android, &project.working, &project.scanner(), &project.resolver())
        .unwrap();
    assert_eq!(second.overwritten, 1);
    assert_eq!(fs::read(&cached).unwrap(), b"tree v2");
    assert_eq!(second.previous_marker, Some(t1));
    assert!(second.marker.unwrap() > t1);

    // Delete the asset: the cached import becomes an orphan.
    project.delete_source("Models/tree.fbx");
    let outcome = engine
        .restore(&android, &project.working, &project.resolver())
        .unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.orphans_removed, 1);
    assert_eq!(report.restored, 0);
    assert!(!cached.exists());
    assert!(!cached.parent().unwrap().exists());
    assert!(project.data.join("android").exists());
}

#[test]
fn test_switch_between_two_profiles() {
    let project = Project::new();
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.add_source("music.ogg", "9f00aa11", 1_000);
    project.import("ab12cd34", b"tree for android");
    project.import("9f00aa11", b"music for android");

    let engine = project.engine();
    let android = profile("android");
    let ios = profile("ios");

    // First switch: ios has no cache yet.
    let outcome = engine
        .switch(
            &android,
            &ios,
            &project.working,
            &project.scanner(),
            &project.resolver(),
            false,
        )
        .unwrap();
    let SwitchOutcome::Switched(report) = outcome else {
        panic!("expected a switch");
    };
    assert_eq!(report.save.as_ref().unwrap().copied, 2);
    assert!(matches!(report.restore, RestoreOutcome::NoStore { .. }));
    assert_eq!(engine.store().active_profile().unwrap(), Some(ios.clone()));

    // The host re-imports for ios.
    project.import("ab12cd34", b"tree for ios");
    project.import("9f00aa11", b"music for ios");
    let ios_tree = read_tree(&project.working);

    // Back to android: ios is saved, android restored.
    let outcome = engine
        .switch(
            &ios,
            &android,
            &project.working,
            &project.scanner(),
            &project.resolver(),
            false,
        )
        .unwrap();
    let SwitchOutcome::Switched(report) = outcome else {
        panic!("expected a switch");
    };
    assert_eq!(report.restore.report().unwrap().restored, 2);
    assert_eq!(
        fs::read(project.working_artifact("ab12cd34")).unwrap(),
        b"tree for android"
    );
    assert_eq!(read_tree(&project.data.join("ios")), ios_tree);
    assert_eq!(engine.store().active_profile().unwrap(), Some(android.clone()));

    // Switching to the active profile does nothing.
    let outcome = engine
        .switch(
            &android,
            &android,
            &project.working,
            &project.scanner(),
            &project.resolver(),
            false,
        )
        .unwrap();
    assert!(matches!(outcome, SwitchOutcome::AlreadyActive { .. }));
}

#[test]
fn test_switch_without_working_root_is_aborted() {
    let project = Project::new();
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    fs::remove_dir_all(&project.working).unwrap();

    let engine = project.engine();
    let err = engine
        .switch(
            &profile("android"),
            &profile("ios"),
            &project.working,
            &project.scanner(),
            &project.resolver(),
            false,
        )
        .unwrap_err();

    match err {
        SyncError::SwitchAborted { profile, source } => {
            assert_eq!(profile.as_str(), "android");
            assert!(matches!(*source, SyncError::MissingWorkingRoot(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(engine.store().active_profile().unwrap(), None);
}

#[cfg(unix)]
#[test]
fn test_continue_policy_saves_what_it_can() {
    use std::os::unix::fs::PermissionsExt;

    let project = Project::new();
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.add_source("rock.fbx", "ef901234", 1_000);
    project.import("ab12cd34", b"tree");
    let locked = project.import("ef901234", b"rock");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root can read anything; the failure cannot be provoked.
    if fs::read(&locked).is_ok() {
        return;
    }

    let engine = project.engine_with(SyncConfig::default().with_policy(FailurePolicy::Continue));
    let report = engine
        .save(
            &profile("android"),
            &project.working,
            &project.scanner(),
            &project.resolver(),
        )
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.copied, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(!report.is_complete());
    assert!(report.marker.is_none());
    assert!(project.cached_artifact("android", "ab12cd34").exists());
    assert_eq!(
        SnapshotStore::read_marker(&project.data.join("android")).unwrap(),
        swapcache::store::Marker::Never
    );
}

#[test]
fn test_unreadable_sidecar_does_not_orphan_cached_import() {
    let project = Project::new();
    let rock = project.add_source("rock.fbx", "ef901234", 1_000);
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.import("ab12cd34", b"tree");
    project.import("ef901234", b"rock");

    let engine = project.engine();
    let desktop = profile("desktop");
    engine
        .save(&desktop, &project.working, &project.scanner(), &project.resolver())
        .unwrap();

    // The asset still exists, but its sidecar can no longer be parsed.
    fs::write(format!("{}.meta", rock.display()), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
    fs::remove_dir_all(&project.working).unwrap();
    fs::create_dir_all(&project.working).unwrap();

    let outcome = engine
        .restore(&desktop, &project.working, &project.resolver())
        .unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.unresolved, 1);
    assert_eq!(report.orphans_removed, 0);
    assert_eq!(report.restored, 1);
    assert!(project.cached_artifact("desktop", "ef901234").exists());
    assert!(project.working_artifact("ab12cd34").exists());
    assert!(!project.working_artifact("ef901234").exists());
}
