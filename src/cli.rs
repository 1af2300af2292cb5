//! Command-line interface definitions for swapcache.
//!
//! This module defines all CLI arguments and subcommands using the clap derive
//! API. Global options (verbosity, colour, roots, failure policy, output
//! format) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Cache the current import results under "android"
//! swapcache save android
//!
//! # Switch to iOS: save the active profile, then restore "ios"
//! swapcache switch ios
//!
//! # Show every cached profile as JSON
//! swapcache --output json status
//! ```

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::profile::Profile;
use crate::sync::FailurePolicy;

/// Per-profile cache for imported build artifacts.
///
/// swapcache keeps one copy of the project's imported artifacts per build
/// profile, so switching profiles restores previous imports instead of
/// re-importing every asset.
#[derive(Debug, Parser)]
#[command(name = "swapcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Screen-reader friendly output: plain ASCII progress, no colour
    #[arg(long, global = true)]
    pub accessible: bool,

    /// Print errors as structured JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML); defaults to the platform config directory
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the live imported artifacts
    #[arg(long, value_name = "PATH", global = true)]
    pub working_root: Option<PathBuf>,

    /// Directory holding one cache per profile
    #[arg(long, value_name = "PATH", global = true)]
    pub data_root: Option<PathBuf>,

    /// Directory holding the source assets and their .meta sidecars
    #[arg(long, value_name = "PATH", global = true)]
    pub project_root: Option<PathBuf>,

    /// What to do when a single artifact cannot be copied or deleted
    #[arg(long, value_enum, value_name = "POLICY", global = true)]
    pub policy: Option<PolicyArg>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy the working root's artifacts into a profile's cache
    Save(ProfileArgs),
    /// Fill the working root from a profile's cache
    Restore(ProfileArgs),
    /// Save the active profile, then restore another one
    Switch(SwitchArgs),
    /// Show cache details for one or all profiles
    Status(StatusArgs),
    /// List profiles that have a cache
    List,
}

/// Arguments naming a single profile.
#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Build profile name (e.g. android, ios, desktop)
    #[arg(value_name = "PROFILE", value_parser = parse_profile)]
    pub profile: Profile,
}

/// Arguments for the switch subcommand.
#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Profile to switch to
    #[arg(value_name = "TO", value_parser = parse_profile)]
    pub to: Profile,

    /// Profile currently active; defaults to the last profile switched to
    #[arg(long, value_name = "FROM", value_parser = parse_profile)]
    pub from: Option<Profile>,

    /// Still restore the target profile if saving the current one fails
    #[arg(long)]
    pub allow_uncached: bool,
}

/// Arguments for the status subcommand.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Profile to inspect; all cached profiles when omitted
    #[arg(value_name = "PROFILE", value_parser = parse_profile)]
    pub profile: Option<Profile>,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON for scripting
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Failure policy as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Stop at the first failed copy or delete
    Abort,
    /// Finish the pass and report failures (exit code 3)
    Continue,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Abort => FailurePolicy::Abort,
            PolicyArg::Continue => FailurePolicy::Continue,
        }
    }
}

/// Parse and validate a profile name.
///
/// # Examples
///
/// ```
/// use swapcache::cli::parse_profile;
///
/// assert_eq!(parse_profile("android").unwrap().as_str(), "android");
/// assert!(parse_profile("../etc").is_err());
/// ```
///
/// # Errors
///
/// Returns the validation error for names that cannot be used as a cache
/// directory.
pub fn parse_profile(s: &str) -> Result<Profile, crate::profile::ProfileError> {
    Profile::new(s)
}
