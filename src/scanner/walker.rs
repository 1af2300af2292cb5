//! Project walker for source asset discovery.
//!
//! # Overview
//!
//! This module provides the [`AssetScanner`] struct, which walks a project
//! root and yields every file whose extension is on the configured asset
//! list. It uses [`walkdir`]: sync passes are single-threaded and the walk
//! is consumed lazily by the engine.
//!
//! # Features
//!
//! - Extension filtering against [`ScannerConfig::extensions`]
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Hidden file filtering
//! - Identifier sidecars (`.meta`) are never reported as assets
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use swapcache::scanner::{AssetScanner, AssetSource, ScannerConfig};
//! use std::path::Path;
//!
//! let config = ScannerConfig::default().with_extensions(["png", "fbx"]);
//! let scanner = AssetScanner::new(Path::new("Assets"), config);
//! let assets: Vec<_> = scanner.assets().filter_map(Result::ok).collect();
//! println!("Found {} assets", assets.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{AssetSource, ScanError, ScannerConfig, SourceAsset};
use crate::resolver::meta::is_sidecar;

/// Directory walker producing source assets.
#[derive(Debug)]
pub struct AssetScanner {
    /// Root path to walk
    root: PathBuf,
    /// Scanner configuration
    config: ScannerConfig,
    /// Compiled ignore patterns, if any
    gitignore: Option<Gitignore>,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl AssetScanner {
    /// Create a new scanner for the given project root.
    ///
    /// # Arguments
    ///
    /// * `path` - Project root to scan
    /// * `config` - Scanner configuration options
    #[must_use]
    pub fn new(path: &Path, config: ScannerConfig) -> Self {
        let gitignore = build_gitignore(path, &config.ignore_patterns);
        Self {
            root: path.to_path_buf(),
            config,
            gitignore,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walk stops as soon as possible.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Project root being scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check if a path should be ignored based on configured patterns.
    fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        let Some(gi) = &self.gitignore else {
            return false;
        };
        // Gitignore matching expects paths relative to the root, with
        // forward slashes even on Windows.
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path);
        let path_str = relative_path.to_string_lossy();
        let normalized_path = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };
        gi.matched(normalized_path, is_dir).is_ignore()
    }

    /// Whether the walk should descend into / consider this entry at all.
    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if self.config.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            return false;
        }
        if entry.file_type().is_dir() && self.should_ignore(entry.path(), true) {
            log::trace!("Ignoring directory: {}", entry.path().display());
            return false;
        }
        true
    }

    /// Check whether a file qualifies as an asset.
    fn is_asset(&self, path: &Path) -> bool {
        if is_sidecar(path) {
            return false;
        }
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy())
            .unwrap_or_default();
        if !self.config.accepts_extension(&extension) {
            return false;
        }
        if self.should_ignore(path, false) {
            log::trace!("Ignoring file: {}", path.display());
            return false;
        }
        true
    }

    /// Walk the project, yielding source assets.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Entries are visited in file-name order.
    pub fn walk(&self) -> impl Iterator<Item = Result<SourceAsset, ScanError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| self.keep_entry(entry))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Scanner: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    if !self.is_asset(entry.path()) {
                        return None;
                    }
                    let modified = match entry.metadata() {
                        Ok(m) => m.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                        Err(e) => {
                            let error = e
                                .into_io_error()
                                .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                            return Some(self.handle_io_error(entry.path(), error));
                        }
                    };
                    Some(Ok(SourceAsset::new(entry.into_path(), modified)))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    let error = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("symlink loop detected"));
                    Some(self.handle_io_error(&path, error))
                }
            })
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> Result<SourceAsset, ScanError> {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                Err(ScanError::PermissionDenied(path.to_path_buf()))
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                Err(ScanError::NotFound(path.to_path_buf()))
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                Err(ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                })
            }
        }
    }
}

impl AssetSource for AssetScanner {
    fn assets(&self) -> Box<dyn Iterator<Item = Result<SourceAsset, ScanError>> + '_> {
        Box::new(self.walk())
    }
}

/// Build gitignore matcher from config patterns and a project `.gitignore`.
fn build_gitignore(root: &Path, patterns: &[String]) -> Option<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);

    let gitignore_path = root.join(".gitignore");
    if gitignore_path.exists() {
        if let Some(e) = builder.add(&gitignore_path) {
            log::warn!(
                "Failed to load .gitignore from {}: {}",
                gitignore_path.display(),
                e
            );
        } else {
            log::debug!("Loaded .gitignore from {}", gitignore_path.display());
        }
    }

    for pattern in patterns {
        if let Err(e) = builder.add_line(None, pattern) {
            log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
        }
    }

    match builder.build() {
        Ok(gitignore) if gitignore.is_empty() => None,
        Ok(gitignore) => Some(gitignore),
        Err(e) => {
            log::warn!("Failed to build ignore patterns: {}", e);
            None
        }
    }
}
