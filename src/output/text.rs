//! Human-readable output for command results.
//!
//! Sizes are rendered with `bytesize`, times as RFC 3339, and highlights with
//! `yansi` (which honours `--no-color` through [`yansi::disable`]).

use std::fmt::Write as _;

use bytesize::ByteSize;
use chrono::{DateTime, Utc};
use yansi::Paint;

use crate::profile::Profile;
use crate::store::StoreStatus;
use crate::sync::{EntryFailure, RestoreOutcome, SaveReport, SwitchOutcome};

fn format_time(time: Option<&DateTime<Utc>>) -> String {
    time.map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
}

fn write_failures(out: &mut String, failures: &[EntryFailure]) {
    if failures.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {} {}", "failed:".red().bold(), failures.len());
    for failure in failures {
        let _ = writeln!(out, "    {}: {}", failure.path.display(), failure.message);
    }
}

/// Summary of a save pass.
#[must_use]
pub fn save_summary(report: &SaveReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Saved profile {}", report.profile.as_str().bold());
    let _ = writeln!(
        out,
        "  copied: {}  refreshed: {}  up to date: {}",
        report.copied.green(),
        report.overwritten.green(),
        report.up_to_date
    );
    if report.missing_in_working + report.unresolved + report.scan_errors > 0 {
        let _ = writeln!(
            out,
            "  skipped: {} not imported, {} without identifier, {} unreadable",
            report.missing_in_working,
            report.unresolved,
            report.scan_errors
        );
    }
    let _ = writeln!(out, "  written: {}", ByteSize::b(report.bytes_copied));
    write_failures(&mut out, &report.failures);
    match report.marker {
        Some(ref marker) => {
            let _ = writeln!(out, "  marker: {}", marker.to_rfc3339());
        }
        None => {
            let _ = writeln!(out, "  marker: {}", "unchanged".yellow());
        }
    }
    out
}

/// Summary of a restore request.
#[must_use]
pub fn restore_summary(outcome: &RestoreOutcome) -> String {
    let mut out = String::new();
    match outcome {
        RestoreOutcome::NoStore { profile } => {
            let _ = writeln!(
                out,
                "No cache for profile {}; nothing to restore",
                profile.as_str().bold()
            );
        }
        RestoreOutcome::Restored(report) => {
            let _ = writeln!(out, "Restored profile {}", report.profile.as_str().bold());
            let _ = writeln!(
                out,
                "  restored: {}  stale: {}  orphans removed: {}  (of {} cached)",
                report.restored.green(),
                report.stale.yellow(),
                report.orphans_removed,
                report.entries
            );
            let _ = writeln!(out, "  written: {}", ByteSize::b(report.bytes_restored));
            if report.unresolved > 0 {
                let _ = writeln!(
                    out,
                    "  kept {} entries whose source could not be determined",
                    report.unresolved.yellow()
                );
            }
            write_failures(&mut out, &report.failures);
        }
    }
    out
}

/// Summary of a switch request.
#[must_use]
pub fn switch_summary(outcome: &SwitchOutcome) -> String {
    match outcome {
        SwitchOutcome::AlreadyActive { profile } => {
            format!("Profile {} is already active\n", profile.as_str().bold())
        }
        SwitchOutcome::Switched(report) => {
            let mut out = String::new();
            let _ = writeln!(
                out,
                "Switched {} -> {}",
                report.from.as_str().bold(),
                report.to.as_str().bold()
            );
            if let Some(ref save) = report.save {
                out.push_str(&save_summary(save));
            }
            if let Some(ref error) = report.save_error {
                let _ = writeln!(
                    out,
                    "{} {} was not cached: {}",
                    "warning:".yellow().bold(),
                    report.from,
                    error
                );
            }
            out.push_str(&restore_summary(&report.restore));
            out
        }
    }
}

/// Table of store details.
#[must_use]
pub fn status_table(stores: &[StoreStatus], active: Option<&Profile>) -> String {
    if stores.is_empty() {
        return "No cached profiles\n".to_string();
    }

    let width = stores
        .iter()
        .map(|s| s.profile.as_str().len())
        .max()
        .unwrap_or(0)
        .max("PROFILE".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<width$}  {:>8}  {:>10}  LAST SAVED",
        "PROFILE", "ENTRIES", "SIZE"
    );
    for store in stores {
        let is_active = active == Some(&store.profile);
        let name = format!("{:<width$}", store.profile.as_str());
        let _ = writeln!(
            out,
            "{} {}  {:>8}  {:>10}  {}",
            if is_active { "*" } else { " " },
            if is_active { name.green().bold().to_string() } else { name },
            store.entries,
            ByteSize::b(store.total_bytes).to_string(),
            format_time(store.saved_at.as_ref())
        );
    }
    out
}

/// One profile name per line, marking the active one.
#[must_use]
pub fn profile_list(profiles: &[Profile], active: Option<&Profile>) -> String {
    let mut out = String::new();
    for profile in profiles {
        if active == Some(profile) {
            let _ = writeln!(out, "{} (active)", profile.as_str().green().bold());
        } else {
            let _ = writeln!(out, "{}", profile);
        }
    }
    out
}
