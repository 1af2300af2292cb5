//! Atomic artifact copies and removals.
//!
//! An artifact is never visible half-written: data is streamed into a hidden
//! temporary sibling of the destination, flushed, and then renamed over the
//! destination. A crash mid-copy leaves at most a stray temporary file, which
//! the store treats as an unknown entry and removes on the next restore.

use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Suffix of in-flight copy files.
pub const TEMP_SUFFIX: &str = ".swaptmp";

/// Errors from a single copy or removal.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// The source file does not exist.
    #[error("source not found: {0}")]
    SourceMissing(PathBuf),

    /// Any other I/O failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl CopyError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Copy `src` to `dest`, creating parent directories and replacing any
/// existing file at `dest` in one rename.
///
/// Returns the number of bytes copied. The destination gets a fresh
/// modification time; source timestamps are not carried over.
///
/// # Errors
///
/// Returns [`CopyError::SourceMissing`] if `src` does not exist, and
/// [`CopyError::Io`] for any other failure. The temporary file is removed on
/// failure.
pub fn copy_atomic(src: &Path, dest: &Path) -> Result<u64, CopyError> {
    let mut reader = match File::open(src) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CopyError::SourceMissing(src.to_path_buf()))
        }
        Err(e) => return Err(CopyError::io(src, e)),
    };

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| CopyError::io(parent, e))?;
    }

    let tmp = temp_path_for(dest);
    let result = (|| -> Result<u64, CopyError> {
        let mut writer = File::create(&tmp).map_err(|e| CopyError::io(&tmp, e))?;
        let bytes = io::copy(&mut reader, &mut writer).map_err(|e| CopyError::io(&tmp, e))?;
        writer.sync_all().map_err(|e| CopyError::io(&tmp, e))?;
        drop(writer);
        fs::rename(&tmp, dest).map_err(|e| CopyError::io(dest, e))?;
        Ok(bytes)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Remove a file, then remove any directories between it and `root` that
/// became empty. `root` itself is never removed.
///
/// A file that is already gone is not an error.
///
/// # Errors
///
/// Returns [`CopyError::Io`] if the file exists but cannot be removed.
/// Failing to prune a directory is only logged.
pub fn remove_and_prune(path: &Path, root: &Path) -> Result<(), CopyError> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(CopyError::io(path, e)),
    }

    let mut dir = path.parent();
    while let Some(current) = dir {
        if current == root || !current.starts_with(root) {
            break;
        }
        let is_empty = fs::read_dir(current)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            break;
        }
        if let Err(e) = fs::remove_dir(current) {
            log::debug!("Could not prune {}: {}", current.display(), e);
            break;
        }
        dir = current.parent();
    }
    Ok(())
}

/// Whether a file name belongs to an in-flight copy.
#[must_use]
pub fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

fn temp_path_for(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}{}", name, TEMP_SUFFIX))
}
