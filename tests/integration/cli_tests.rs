use std::fs;
use std::path::Path;

use clap::Parser;
use swapcache::cli::Cli;
use swapcache::error::ExitCode;
use swapcache::run_app;

use super::common::{profile, Project};

fn run(project: &Project, args: &[&str]) -> anyhow::Result<ExitCode> {
    let config = project.data.with_file_name("none.toml");
    let mut argv = vec![
        "swapcache".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        path(&config),
        "--working-root".to_string(),
        path(&project.working),
        "--data-root".to_string(),
        path(&project.data),
        "--project-root".to_string(),
        path(&project.assets),
    ];
    argv.extend(args.iter().map(ToString::to_string));
    run_app(Cli::try_parse_from(argv).unwrap())
}

fn path(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

fn seeded() -> Project {
    let project = Project::new();
    project.add_source("tree.fbx", "ab12cd34", 1_000);
    project.import("ab12cd34", b"tree");
    project
}

#[test]
fn test_restore_unknown_profile_exits_nothing_to_restore() {
    let project = seeded();
    let code = run(&project, &["restore", "android"]).unwrap();
    assert_eq!(code, ExitCode::NothingToRestore);
    assert_eq!(
        fs::read(project.working_artifact("ab12cd34")).unwrap(),
        b"tree"
    );
}

#[test]
fn test_save_then_restore() {
    let project = seeded();
    assert_eq!(run(&project, &["save", "android"]).unwrap(), ExitCode::Success);
    assert!(project.cached_artifact("android", "ab12cd34").exists());

    fs::remove_file(project.working_artifact("ab12cd34")).unwrap();
    assert_eq!(
        run(&project, &["restore", "android"]).unwrap(),
        ExitCode::Success
    );
    assert_eq!(
        fs::read(project.working_artifact("ab12cd34")).unwrap(),
        b"tree"
    );
}

#[test]
fn test_switch_needs_a_source_profile() {
    let project = seeded();
    let err = run(&project, &["switch", "ios"]).unwrap_err();
    assert!(format!("{err:#}").contains("--from"));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_switch_records_active_profile() {
    let project = seeded();
    let code = run(&project, &["switch", "ios", "--from", "android"]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let store = swapcache::store::SnapshotStore::new(&project.data);
    assert_eq!(store.active_profile().unwrap(), Some(profile("ios")));

    // The recorded profile is now the default source.
    let code = run(&project, &["switch", "android"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(store.active_profile().unwrap(), Some(profile("android")));
    assert!(project.cached_artifact("ios", "ab12cd34").exists());
}

#[test]
fn test_status_and_list() {
    let project = seeded();
    assert_eq!(run(&project, &["list"]).unwrap(), ExitCode::Success);
    assert_eq!(run(&project, &["status"]).unwrap(), ExitCode::Success);
    assert_eq!(
        run(&project, &["status", "android"]).unwrap(),
        ExitCode::NothingToRestore
    );

    run(&project, &["save", "android"]).unwrap();
    assert_eq!(
        run(&project, &["status", "android"]).unwrap(),
        ExitCode::Success
    );
    assert_eq!(
        run(&project, &["-o", "json", "list"]).unwrap(),
        ExitCode::Success
    );
}

#[test]
fn test_missing_working_root_is_an_error() {
    let project = seeded();
    fs::remove_dir_all(&project.working).unwrap();
    let err = run(&project, &["save", "android"]).unwrap_err();
    assert!(format!("{err:#}").contains("Working root not found"));
}

#[test]
fn test_invalid_profile_is_rejected_by_parser() {
    let result = Cli::try_parse_from(["swapcache", "save", "../escape"]);
    assert!(result.is_err());
    let result = Cli::try_parse_from(["swapcache", "save", ".hidden"]);
    assert!(result.is_err());
}
