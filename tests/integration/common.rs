use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use swapcache::resolver::MetaFileResolver;
use swapcache::scanner::{AssetScanner, ScannerConfig};
use swapcache::store::{SnapshotStore, MARKER_FILE_NAME};
use swapcache::sync::{SyncConfig, SyncEngine};
use tempfile::TempDir;

/// A scratch project: source assets with `.meta` sidecars, a working root
/// of imported artifacts and a data root for the caches.
pub struct Project {
    _dir: TempDir,
    pub assets: PathBuf,
    pub working: PathBuf,
    pub data: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("Assets");
        let working = dir.path().join("Library/metadata");
        let data = dir.path().join("SwapCacheData");
        fs::create_dir_all(&assets).unwrap();
        fs::create_dir_all(&working).unwrap();
        Self {
            _dir: dir,
            assets,
            working,
            data,
        }
    }

    /// Add a source asset modified at `source_secs`, with its sidecar.
    pub fn add_source(&self, rel: &str, guid: &str, source_secs: i64) -> PathBuf {
        let path = self.assets.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("source of {rel}")).unwrap();
        fs::write(
            format!("{}.meta", path.display()),
            format!("fileFormatVersion: 2\nguid: {guid}\n"),
        )
        .unwrap();
        set_mtime(&path, source_secs);
        path
    }

    /// Write the imported artifact for `guid` into the working root.
    pub fn import(&self, guid: &str, content: &[u8]) -> PathBuf {
        let path = self.working_artifact(guid);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Remove a source asset and its sidecar.
    pub fn delete_source(&self, rel: &str) {
        let path = self.assets.join(rel);
        fs::remove_file(&path).unwrap();
        fs::remove_file(format!("{}.meta", path.display())).unwrap();
    }

    pub fn working_artifact(&self, guid: &str) -> PathBuf {
        self.working.join(&guid[..2]).join(guid)
    }

    pub fn cached_artifact(&self, profile: &str, guid: &str) -> PathBuf {
        self.data.join(profile).join(&guid[..2]).join(guid)
    }

    pub fn scanner(&self) -> AssetScanner {
        AssetScanner::new(&self.assets, ScannerConfig::default())
    }

    pub fn resolver(&self) -> MetaFileResolver {
        MetaFileResolver::scan(&self.assets).unwrap()
    }

    pub fn engine(&self) -> SyncEngine {
        self.engine_with(SyncConfig::default())
    }

    pub fn engine_with(&self, config: SyncConfig) -> SyncEngine {
        SyncEngine::new(SnapshotStore::new(&self.data), config)
    }
}

pub fn set_mtime(path: &Path, seconds: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(seconds, 0)).unwrap();
}

/// Every file under `root` (minus the marker) with its contents.
pub fn read_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut tree = BTreeMap::new();
    if !root.exists() {
        return tree;
    }
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        if entry.file_type().is_file() && entry.file_name() != MARKER_FILE_NAME {
            let rel = entry.path().strip_prefix(root).unwrap().to_path_buf();
            tree.insert(rel, fs::read(entry.path()).unwrap());
        }
    }
    tree
}

pub fn profile(name: &str) -> swapcache::profile::Profile {
    swapcache::profile::Profile::new(name).unwrap()
}
