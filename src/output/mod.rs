//! Output formatters for command results.
//!
//! - [`text`]: human-readable summaries and tables
//! - [`json`]: one JSON object per command, for scripting
//!
//! # Example
//!
//! ```
//! use swapcache::error::ExitCode;
//! use swapcache::output::json::JsonOutput;
//! use swapcache::sync::SaveReport;
//!
//! let report = SaveReport::default();
//! let output = JsonOutput::new("save", &report, ExitCode::Success);
//! assert!(output.to_json_pretty().unwrap().contains("\"command\": \"save\""));
//! ```

pub mod json;
pub mod text;

use serde::Serialize;

use crate::profile::Profile;
use crate::store::StoreStatus;

pub use json::{JsonOutput, JsonOutputError};

/// Payload of the `status` command.
#[derive(Debug, Serialize)]
pub struct StatusView {
    /// Profile most recently switched to
    pub active: Option<Profile>,
    /// Cached profiles
    pub stores: Vec<StoreStatus>,
}

/// Payload of the `list` command.
#[derive(Debug, Serialize)]
pub struct ListView {
    /// Profile most recently switched to
    pub active: Option<Profile>,
    /// Profiles that have a cache
    pub profiles: Vec<Profile>,
}
