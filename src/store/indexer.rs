//! Directory indexer for artifact roots.
//!
//! [`index_root`] walks an artifact root (the working root or a snapshot
//! store) and returns every regular file keyed by its path relative to the
//! root, together with its modification time. The snapshot marker is store
//! metadata, not an artifact, and is left out.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use super::layout::ArtifactLocation;
use super::snapshot::MARKER_FILE_NAME;

/// Index of an artifact root: relative location -> last-modified time.
pub type ArtifactIndex = BTreeMap<ArtifactLocation, SystemTime>;

/// Errors raised while indexing a root.
#[derive(Debug, thiserror::Error)]
#[error("failed to index {path}: {source}")]
pub struct IndexError {
    /// Directory or file that could not be read
    pub path: PathBuf,
    /// The underlying I/O error
    #[source]
    pub source: io::Error,
}

/// Index every regular file under `root`.
///
/// Returns an empty index if `root` does not exist. Symbolic links are not
/// followed and not indexed. The marker file at the top of the root is
/// excluded.
///
/// # Errors
///
/// Returns [`IndexError`] if `root` or any directory beneath it cannot be
/// read, or a file's metadata cannot be queried.
///
/// # Example
///
/// ```no_run
/// use swapcache::store::index_root;
/// use std::path::Path;
///
/// let index = index_root(Path::new("SwapCacheData/android")).unwrap();
/// for (location, modified) in &index {
///     println!("{} modified {:?}", location, modified);
/// }
/// ```
pub fn index_root(root: &Path) -> Result<ArtifactIndex, IndexError> {
    let mut index = ArtifactIndex::new();
    if !root.exists() {
        log::trace!("Index root {} does not exist", root.display());
        return Ok(index);
    }

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            IndexError {
                path,
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("directory walk failed")),
            }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        if entry.depth() == 1 && entry.file_name() == MARKER_FILE_NAME {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(location) = ArtifactLocation::new(relative) else {
            continue;
        };

        let modified = entry
            .metadata()
            .map_err(|e| IndexError {
                path: entry.path().to_path_buf(),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("metadata unavailable")),
            })?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);

        index.insert(location, modified);
    }

    log::debug!("Indexed {} entries under {}", index.len(), root.display());
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let index = index_root(&dir.path().join("absent")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_indexes_nested_files_relative_to_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("ab")).unwrap();
        fs::create_dir_all(dir.path().join("cd")).unwrap();
        fs::write(dir.path().join("ab/ab12cd34"), b"one").unwrap();
        fs::write(dir.path().join("cd/cd5678"), b"two").unwrap();

        let index = index_root(dir.path()).unwrap();

        let keys: Vec<_> = index.keys().map(|l| l.as_path().to_path_buf()).collect();
        assert_eq!(
            keys,
            vec![PathBuf::from("ab/ab12cd34"), PathBuf::from("cd/cd5678")]
        );
    }

    #[test]
    fn test_marker_is_excluded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MARKER_FILE_NAME), b"").unwrap();
        fs::create_dir_all(dir.path().join("ab")).unwrap();
        fs::write(dir.path().join("ab/ab12cd34"), b"one").unwrap();

        let index = index_root(dir.path()).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_directories_are_not_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("ab/empty")).unwrap();
        assert!(index_root(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_records_modification_time() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("ab12");
        fs::write(&file, b"x").unwrap();
        let expected = fs::metadata(&file).unwrap().modified().unwrap();

        let index = index_root(dir.path()).unwrap();
        let location = ArtifactLocation::new("ab12").unwrap();
        assert_eq!(index.get(&location), Some(&expected));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("ab");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("ab12"), b"x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = index_root(dir.path());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        // Root bypasses permission checks, so only assert when the walk failed.
        if let Err(err) = result {
            assert!(err.to_string().contains("failed to index"));
        }
    }
}
