//! JSON output for command results.
//!
//! Every command prints one object with the same envelope:
//!
//! ```json
//! {
//!   "command": "save",
//!   "exit_code": 0,
//!   "exit_code_name": "SC000",
//!   "result": { "profile": "android", "copied": 12, ... }
//! }
//! ```

use std::io::{self, Write};

use serde::Serialize;

use crate::error::ExitCode;

/// Error type for JSON output operations.
#[derive(Debug, thiserror::Error)]
pub enum JsonOutputError {
    /// Serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Writing to the output failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// JSON envelope around a command result.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a, T: Serialize> {
    /// Subcommand that produced the result
    pub command: &'a str,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "SC000")
    pub exit_code_name: &'static str,
    /// Command-specific payload
    pub result: &'a T,
}

impl<'a, T: Serialize> JsonOutput<'a, T> {
    /// Wrap a result.
    #[must_use]
    pub fn new(command: &'a str, result: &'a T, exit_code: ExitCode) -> Self {
        Self {
            command,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
            result,
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}
