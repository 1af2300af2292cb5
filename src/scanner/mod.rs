//! Scanner module for source asset discovery.
//!
//! This module answers "which source files matter" for a project:
//! - Directory walking using walkdir
//! - Extension filtering against the configured asset formats
//! - Gitignore-style ignore patterns
//!
//! # Architecture
//!
//! - [`walker`]: the [`AssetScanner`] that walks a project root
//! - [`AssetSource`]: the trait the sync engine consumes, so hosts can plug
//!   in their own asset database instead of a directory walk
//!
//! # Example
//!
//! ```no_run
//! use swapcache::scanner::{AssetScanner, AssetSource, ScannerConfig};
//! use std::path::Path;
//!
//! let scanner = AssetScanner::new(Path::new("Assets"), ScannerConfig::default());
//! for asset in scanner.assets() {
//!     match asset {
//!         Ok(asset) => println!("{}", asset.path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

pub use walker::AssetScanner;

/// Texture formats whose imports depend on the build profile.
pub const TEXTURE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "rgb", "tga", "targa", "gif", "tiff", "tif", "bmp", "iff", "pict",
    "psd", "exr",
];

/// Mesh and model formats whose imports depend on the build profile.
pub const MESH_EXTENSIONS: &[&str] = &[
    "mtl", "obj", "blend", "fbm", "fbx", "3ds", "mb", "ma", "max", "c4d", "collada", "dxf",
];

/// Audio formats whose imports depend on the build profile.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "aif", "aiff", "ogg"];

/// A source file the host cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAsset {
    /// Path to the source file
    pub path: PathBuf,
    /// Last modification time of the source file
    pub modified: SystemTime,
}

impl SourceAsset {
    /// Create a new SourceAsset.
    #[must_use]
    pub fn new(path: PathBuf, modified: SystemTime) -> Self {
        Self { path, modified }
    }
}

/// Produces the project's source assets.
///
/// Each call to [`assets`](Self::assets) starts a fresh, finite enumeration.
/// Order is irrelevant to the engine. Errors for individual entries are
/// yielded in-line and do not end the enumeration.
pub trait AssetSource {
    /// Enumerate source assets.
    fn assets(&self) -> Box<dyn Iterator<Item = Result<SourceAsset, ScanError>> + '_>;
}

impl AssetSource for Vec<SourceAsset> {
    fn assets(&self) -> Box<dyn Iterator<Item = Result<SourceAsset, ScanError>> + '_> {
        Box::new(self.iter().cloned().map(Ok))
    }
}

/// Configuration for asset discovery.
///
/// Controls which extensions count as assets, ignore patterns and symlink
/// handling. The default extension list covers the texture, mesh and audio
/// formats whose imports differ per build profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// File extensions (without dot, case-insensitive) treated as assets.
    /// An empty list accepts every file except identifier sidecars.
    pub extensions: Vec<String>,

    /// Glob patterns to ignore (gitignore-style), relative to the project root.
    pub ignore_patterns: Vec<String>,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_patterns: Vec::new(),
            skip_hidden: true,
            follow_symlinks: false,
        }
    }
}

impl ScannerConfig {
    /// Replace the extension list.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Add ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns.extend(patterns);
        self
    }

    /// Whether a file extension is on the asset list.
    #[must_use]
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions.is_empty()
            || self
                .extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

/// The built-in texture, mesh and audio extension tables.
#[must_use]
pub fn default_extensions() -> Vec<String> {
    TEXTURE_EXTENSIONS
        .iter()
        .chain(MESH_EXTENSIONS)
        .chain(AUDIO_EXTENSIONS)
        .map(|e| (*e).to_string())
        .collect()
}

/// Errors that can occur during asset discovery.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
