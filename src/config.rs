//! Application configuration management.
//!
//! Configuration is layered with figment, each layer overriding the previous:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. the TOML config file (`--config`, or `config.toml` in the platform
//!    config directory)
//! 3. `SWAPCACHE_*` environment variables, with `__` separating nested keys
//!    (`SWAPCACHE_ASSETS__SKIP_HIDDEN=false`)
//! 4. command-line flags ([`Config::merge_cli`])
//!
//! # Example file
//!
//! ```toml
//! working_root = "Library/metadata"
//! data_root = "SwapCacheData"
//! project_root = "Assets"
//! policy = "continue"
//! accessible = false
//!
//! [assets]
//! extensions = ["png", "fbx", "wav"]
//! ignore_patterns = ["Generated/**"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, OutputFormat};
use crate::scanner::ScannerConfig;
use crate::sync::FailurePolicy;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "SWAPCACHE_";

const TOP_LEVEL_KEYS: &[&str] = &[
    "working_root",
    "data_root",
    "project_root",
    "policy",
    "output",
    "show_progress",
    "accessible",
    "assets",
];

const ASSET_KEYS: &[&str] = &[
    "extensions",
    "ignore_patterns",
    "skip_hidden",
    "follow_symlinks",
];

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the live imported artifacts.
    pub working_root: PathBuf,
    /// Directory holding one cache per profile.
    pub data_root: PathBuf,
    /// Directory holding the source assets.
    pub project_root: PathBuf,
    /// Behaviour when a single artifact cannot be synced.
    pub policy: FailurePolicy,
    /// Default output format.
    pub output: OutputFormat,
    /// Show progress bars during passes.
    pub show_progress: bool,
    /// Screen-reader friendly output.
    pub accessible: bool,
    /// Asset discovery settings.
    pub assets: ScannerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_root: PathBuf::from("Library/metadata"),
            data_root: PathBuf::from("SwapCacheData"),
            project_root: PathBuf::from("Assets"),
            policy: FailurePolicy::Abort,
            output: OutputFormat::Text,
            show_progress: true,
            accessible: false,
            assets: ScannerConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    #[must_use]
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from_path(path),
            None => {
                log::debug!("No platform config directory; using defaults and environment");
                Self::from_figment(Self::base_figment())
            }
        }
    }

    /// Load the configuration from a specific file.
    ///
    /// A missing file is not an error. A file that cannot be parsed is
    /// reported and the defaults (plus environment) are used instead.
    #[must_use]
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            warn_unknown_keys(path);
        } else {
            log::debug!("Config file {} not found", path.display());
        }

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Invalid configuration in {}: {}; using defaults",
                    path.display(),
                    e
                );
                Self::from_figment(Self::base_figment())
            }
        }
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn from_figment(figment: Figment) -> Self {
        figment.extract().unwrap_or_else(|e| {
            log::warn!("Invalid {}* environment: {}; using defaults", ENV_PREFIX, e);
            Self::default()
        })
    }

    /// Apply command-line overrides.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(ref path) = cli.working_root {
            self.working_root = path.clone();
        }
        if let Some(ref path) = cli.data_root {
            self.data_root = path.clone();
        }
        if let Some(ref path) = cli.project_root {
            self.project_root = path.clone();
        }
        if let Some(policy) = cli.policy {
            self.policy = policy.into();
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if cli.quiet {
            self.show_progress = false;
        }
        if cli.accessible {
            self.accessible = true;
        }
    }

    /// Get the default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "swapcache", "swapcache")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Warn about keys the configuration does not know, suggesting the closest
/// known key.
fn warn_unknown_keys(path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        // Parse errors are reported by figment.
        return;
    };
    for unknown in unknown_keys(&table) {
        match suggest(&unknown) {
            Some(known) => log::warn!(
                "Unknown config key '{}' in {} (did you mean '{}'?)",
                unknown,
                path.display(),
                known
            ),
            None => log::warn!("Unknown config key '{}' in {}", unknown, path.display()),
        }
    }
}

fn unknown_keys(table: &toml::Table) -> Vec<String> {
    let mut unknown = Vec::new();
    for (key, value) in table {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            unknown.push(key.clone());
            continue;
        }
        if key == "assets" {
            if let Some(assets) = value.as_table() {
                unknown.extend(
                    assets
                        .keys()
                        .filter(|k| !ASSET_KEYS.contains(&k.as_str()))
                        .map(|k| format!("assets.{}", k)),
                );
            }
        }
    }
    unknown
}

fn suggest(unknown: &str) -> Option<String> {
    let (prefix, name, candidates) = match unknown.strip_prefix("assets.") {
        Some(name) => ("assets.", name, ASSET_KEYS),
        None => ("", unknown, TOP_LEVEL_KEYS),
    };
    candidates
        .iter()
        .map(|c| (c, strsim::jaro_winkler(name, c)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| format!("{}{}", prefix, c))
}
