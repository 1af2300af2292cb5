//! swapcache - per-profile cache for imported build artifacts.
//!
//! Game and app projects import every source asset (textures, meshes, audio)
//! into derived artifacts whose contents depend on the active build profile.
//! swapcache keeps one snapshot of those artifacts per profile, so switching
//! profiles restores the previous imports instead of recomputing them.
//!
//! The library is organised leaves first:
//!
//! - [`profile`]: validated profile names
//! - [`resolver`]: source asset -> artifact identifier mapping
//! - [`scanner`]: source asset discovery
//! - [`store`]: artifact layout, indexing, atomic copies and per-profile stores
//! - [`sync`]: the save / restore / switch engine
//!
//! The remaining modules make up the `swapcache` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod profile;
pub mod progress;
pub mod resolver;
pub mod scanner;
pub mod signal;
pub mod store;
pub mod sync;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{Cli, Commands, OutputFormat, StatusArgs, SwitchArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{text, JsonOutput, ListView, StatusView};
use crate::profile::Profile;
use crate::progress::Progress;
use crate::resolver::{MapResolver, MetaFileResolver};
use crate::scanner::AssetScanner;
use crate::signal::ShutdownHandler;
use crate::store::SnapshotStore;
use crate::sync::{RestoreOutcome, SwitchOutcome, SyncConfig, SyncEngine};

/// Run one CLI invocation and return its exit code.
///
/// Logging is expected to be initialised by the caller.
///
/// # Errors
///
/// Returns an error when the command fails. Use
/// [`ExitCode::for_error`] to map it to an exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let mut config = match cli.config {
        Some(ref path) => Config::load_from_path(path),
        None => Config::load(),
    };
    config.merge_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    if cli.no_color || config.accessible {
        yansi::disable();
    }

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;
    let app = App::new(config, &handler, cli.quiet);

    match cli.command {
        Commands::Save(args) => app.save(&args.profile),
        Commands::Restore(args) => app.restore(&args.profile),
        Commands::Switch(args) => app.switch(args),
        Commands::Status(args) => app.status(args),
        Commands::List => app.list(),
    }
}

struct App {
    config: Config,
    engine: SyncEngine,
    handler: ShutdownHandler,
    quiet: bool,
}

impl App {
    fn new(config: Config, handler: &ShutdownHandler, quiet: bool) -> Self {
        let mut sync_config = SyncConfig::default()
            .with_policy(config.policy)
            .with_shutdown_flag(handler.get_flag());
        if config.show_progress && config.output == OutputFormat::Text {
            let progress = Progress::with_accessible(false, config.accessible);
            sync_config = sync_config.with_progress_callback(Arc::new(progress));
        }

        Self {
            engine: SyncEngine::new(SnapshotStore::new(&config.data_root), sync_config),
            handler: handler.clone(),
            config,
            quiet,
        }
    }

    fn scanner(&self) -> AssetScanner {
        AssetScanner::new(&self.config.project_root, self.config.assets.clone())
            .with_shutdown_flag(self.handler.get_flag())
    }

    fn resolver(&self) -> Result<MetaFileResolver> {
        MetaFileResolver::scan(&self.config.project_root).with_context(|| {
            format!(
                "Failed to read asset identifiers under {}",
                self.config.project_root.display()
            )
        })
    }

    fn save(&self, profile: &Profile) -> Result<ExitCode> {
        let resolver = self.resolver()?;
        let report = self
            .engine
            .save(profile, &self.config.working_root, &self.scanner(), &resolver)
            .with_context(|| format!("Failed to save profile '{}'", profile))?;

        let code = if report.is_complete() {
            ExitCode::Success
        } else {
            ExitCode::PartialSuccess
        };
        self.emit("save", &report, code, || text::save_summary(&report))?;
        Ok(code)
    }

    fn restore(&self, profile: &Profile) -> Result<ExitCode> {
        // A profile without a cache needs no identifiers.
        let outcome = if self.engine.store().exists(profile) {
            let resolver = self.resolver()?;
            self.engine
                .restore(profile, &self.config.working_root, &resolver)
        } else {
            self.engine
                .restore(profile, &self.config.working_root, &MapResolver::new())
        }
        .with_context(|| format!("Failed to restore profile '{}'", profile))?;

        let code = match outcome {
            RestoreOutcome::NoStore { .. } => ExitCode::NothingToRestore,
            RestoreOutcome::Restored(ref report) if !report.is_complete() => {
                ExitCode::PartialSuccess
            }
            RestoreOutcome::Restored(_) => ExitCode::Success,
        };
        self.emit("restore", &outcome, code, || text::restore_summary(&outcome))?;
        Ok(code)
    }

    fn switch(&self, args: SwitchArgs) -> Result<ExitCode> {
        let from = match args.from {
            Some(from) => from,
            None => self
                .engine
                .store()
                .active_profile()
                .context("Failed to read the active profile")?
                .context("No active profile recorded; pass --from <PROFILE>")?,
        };

        let resolver = self.resolver()?;
        let outcome = self
            .engine
            .switch(
                &from,
                &args.to,
                &self.config.working_root,
                &self.scanner(),
                &resolver,
                args.allow_uncached,
            )
            .with_context(|| format!("Failed to switch from '{}' to '{}'", from, args.to))?;

        let code = match outcome {
            SwitchOutcome::Switched(ref report)
                if report.save_error.is_some()
                    || report.restore.report().is_some_and(|r| !r.is_complete()) =>
            {
                ExitCode::PartialSuccess
            }
            _ => ExitCode::Success,
        };
        self.emit("switch", &outcome, code, || text::switch_summary(&outcome))?;
        Ok(code)
    }

    fn status(&self, args: StatusArgs) -> Result<ExitCode> {
        let store = self.engine.store();
        let profiles = match args.profile {
            Some(profile) => vec![profile],
            None => store.list_profiles().context("Failed to list cached profiles")?,
        };

        let mut stores = Vec::new();
        for profile in &profiles {
            if let Some(status) = store
                .status(profile)
                .with_context(|| format!("Failed to inspect cache of '{}'", profile))?
            {
                stores.push(status);
            }
        }

        let code = if stores.is_empty() && !profiles.is_empty() {
            ExitCode::NothingToRestore
        } else {
            ExitCode::Success
        };
        let view = StatusView {
            active: store.active_profile().unwrap_or_default(),
            stores,
        };
        self.emit("status", &view, code, || {
            text::status_table(&view.stores, view.active.as_ref())
        })?;
        Ok(code)
    }

    fn list(&self) -> Result<ExitCode> {
        let store = self.engine.store();
        let view = ListView {
            active: store.active_profile().unwrap_or_default(),
            profiles: store
                .list_profiles()
                .context("Failed to list cached profiles")?,
        };
        self.emit("list", &view, ExitCode::Success, || {
            text::profile_list(&view.profiles, view.active.as_ref())
        })?;
        Ok(ExitCode::Success)
    }

    /// Print a result in the configured format. `--quiet` silences text
    /// output but not JSON.
    fn emit<T, F>(&self, command: &str, result: &T, code: ExitCode, render: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce() -> String,
    {
        let mut stdout = io::stdout().lock();
        match self.config.output {
            OutputFormat::Json => JsonOutput::new(command, result, code)
                .write_to(&mut stdout)
                .context("Failed to write JSON output")?,
            OutputFormat::Text if self.quiet => {}
            OutputFormat::Text => stdout
                .write_all(render().as_bytes())
                .context("Failed to write output")?,
        }
        Ok(())
    }
}
