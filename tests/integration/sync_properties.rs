use std::fs;
use std::time::{Duration, SystemTime};

use swapcache::store::{index_root, Marker, SnapshotStore};
use swapcache::sync::RestoreOutcome;

use super::common::{profile, read_tree, set_mtime, Project};

#[test]
fn test_second_save_without_changes_copies_nothing() {
    let project = Project::new();
    project.add_source("Models/tree.fbx", "ab12cd34", 1_000);
    project.add_source("Textures/bark.png", "cd5678ef", 1_000);
    project.import("ab12cd34", b"tree mesh");
    project.import("cd5678ef", b"bark texture");

    let engine = project.engine();
    let resolver = project.resolver();
    let desktop = profile("desktop");

    let first = engine
        .save(&desktop, &project.working, &project.scanner(), &resolver)
        .unwrap();
    assert_eq!(first.copied, 2);
    let before = read_tree(&project.data.join("desktop"));

    let second = engine
        .save(&desktop, &project.working, &project.scanner(), &resolver)
        .unwrap();
    assert_eq!(second.copied, 0);
    assert_eq!(second.overwritten, 0);
    assert_eq!(second.up_to_date, 2);
    assert_eq!(read_tree(&project.data.join("desktop")), before);
}

#[test]
fn test_marker_never_moves_backwards() {
    let project = Project::new();
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.import("ab12cd34", b"mesh");

    let engine = project.engine();
    let resolver = project.resolver();
    let desktop = profile("desktop");
    let store_root = project.data.join("desktop");

    engine
        .save(&desktop, &project.working, &project.scanner(), &resolver)
        .unwrap();
    let first = SnapshotStore::read_marker(&store_root).unwrap();

    engine
        .save(&desktop, &project.working, &project.scanner(), &resolver)
        .unwrap();
    let second = SnapshotStore::read_marker(&store_root).unwrap();
    assert!(second >= first);

    let earlier = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
    let kept = SnapshotStore::write_marker(&store_root, &desktop, earlier).unwrap();
    assert_eq!(kept, second);
    assert!(matches!(kept, Marker::SavedAt(_)));
}

#[test]
fn test_restore_removes_orphans_from_index() {
    let project = Project::new();
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.add_source("rock.fbx", "ef901234", 1_000);
    project.import("ab12cd34", b"tree");
    project.import("ef901234", b"rock");

    let engine = project.engine();
    let desktop = profile("desktop");
    engine
        .save(&desktop, &project.working, &project.scanner(), &project.resolver())
        .unwrap();

    project.delete_source("rock.fbx");
    let outcome = engine
        .restore(&desktop, &project.working, &project.resolver())
        .unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.orphans_removed, 1);

    let index = index_root(&project.data.join("desktop")).unwrap();
    let remaining: Vec<String> = index.keys().map(ToString::to_string).collect();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].ends_with("ab12cd34"));
    assert!(!project.data.join("desktop/ef").exists());
}

#[test]
fn test_restore_skips_entries_older_than_source() {
    let project = Project::new();
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.import("ab12cd34", b"old import");

    let engine = project.engine();
    let desktop = profile("desktop");
    engine
        .save(&desktop, &project.working, &project.scanner(), &project.resolver())
        .unwrap();

    // The source is edited after the artifact was cached, and re-imported.
    let cached = project.cached_artifact("desktop", "ab12cd34");
    set_mtime(&cached, 2_000);
    set_mtime(&project.assets.join("tree.fbx"), 3_000);
    project.import("ab12cd34", b"new import");

    let outcome = engine
        .restore(&desktop, &project.working, &project.resolver())
        .unwrap();

    assert_eq!(outcome.report().unwrap().stale, 1);
    assert_eq!(
        fs::read(project.working_artifact("ab12cd34")).unwrap(),
        b"new import"
    );
    assert_eq!(fs::read(&cached).unwrap(), b"old import");
}

#[test]
fn test_two_profiles_round_trip() {
    let project = Project::new();
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.add_source("bark.png", "cd5678ef", 1_000);

    let engine = project.engine();
    let resolver = project.resolver();

    // Profile A imports.
    project.import("ab12cd34", b"tree for A");
    project.import("cd5678ef", b"bark for A");
    engine
        .save(&profile("a"), &project.working, &project.scanner(), &resolver)
        .unwrap();
    let tree_a = read_tree(&project.working);

    // Profile B re-imports everything.
    project.import("ab12cd34", b"tree for B");
    project.import("cd5678ef", b"bark for B");
    engine
        .save(&profile("b"), &project.working, &project.scanner(), &resolver)
        .unwrap();
    let tree_b = read_tree(&project.working);

    for (name, expected) in [("a", &tree_a), ("b", &tree_b)] {
        fs::remove_dir_all(&project.working).unwrap();
        fs::create_dir_all(&project.working).unwrap();

        let outcome = engine
            .restore(&profile(name), &project.working, &resolver)
            .unwrap();
        assert_eq!(outcome.report().unwrap().restored, 2);
        assert_eq!(&read_tree(&project.working), expected);
    }
}

#[test]
fn test_same_profile_round_trip_after_adding_asset() {
    let project = Project::new();
    let engine = project.engine();
    let desktop = profile("desktop");

    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.import("ab12cd34", b"tree");
    engine
        .save(&desktop, &project.working, &project.scanner(), &project.resolver())
        .unwrap();

    // A second asset appears and is imported after the first save.
    project.add_source("bark.png", "cd5678ef", 1_000);
    project.import("cd5678ef", b"bark");
    let report = engine
        .save(&desktop, &project.working, &project.scanner(), &project.resolver())
        .unwrap();
    assert_eq!(report.copied, 1);
    let expected = read_tree(&project.working);

    fs::remove_dir_all(&project.working).unwrap();
    fs::create_dir_all(&project.working).unwrap();
    let outcome = engine
        .restore(&desktop, &project.working, &project.resolver())
        .unwrap();

    assert_eq!(outcome.report().unwrap().restored, 2);
    assert_eq!(read_tree(&project.working), expected);
}

#[test]
fn test_restore_of_unsaved_profile_is_noop() {
    let project = Project::new();
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.import("ab12cd34", b"mesh");
    let before = read_tree(&project.working);

    let outcome = project
        .engine()
        .restore(&profile("console"), &project.working, &project.resolver())
        .unwrap();

    assert!(matches!(outcome, RestoreOutcome::NoStore { .. }));
    assert_eq!(read_tree(&project.working), before);
    assert!(!project.data.join("console").exists());
}
