//! Per-profile snapshot stores and their markers.
//!
//! Every profile owns one directory under the data root,
//! `<data_root>/<profile>/`, mirroring the working root's artifact layout.
//! A single marker file at the top of that directory records when the
//! profile was last saved in full.
//!
//! The marker is created empty the first time a profile is saved; an empty
//! marker reads as [`Marker::Never`]. It is only rewritten after a save pass
//! completes.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::copy::is_temp_name;
use super::indexer::{index_root, IndexError};
use crate::profile::Profile;

/// Reserved file name of the marker inside each store.
pub const MARKER_FILE_NAME: &str = ".swapcache-marker";

/// Reserved file name, under the data root, of the active profile record.
pub const ACTIVE_FILE_NAME: &str = ".active";

/// Current marker file format version.
pub const MARKER_VERSION: u32 = 1;

/// Errors raised by store bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A store directory or marker could not be created, read or written.
    #[error("store I/O error at {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The store could not be indexed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Last successful save time of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Marker {
    /// The profile has never been fully saved.
    Never,
    /// The profile was last saved at this time.
    SavedAt(SystemTime),
}

impl Marker {
    /// Whether a source modified at `modified` changed after this marker.
    ///
    /// Nothing is newer than [`Marker::Never`]: a store without a recorded
    /// save treats everything it already holds as current.
    #[must_use]
    pub fn is_older_than(&self, modified: SystemTime) -> bool {
        match self {
            Self::Never => false,
            Self::SavedAt(saved) => modified > *saved,
        }
    }

    /// The recorded time, if any.
    #[must_use]
    pub fn saved_at(&self) -> Option<SystemTime> {
        match self {
            Self::Never => None,
            Self::SavedAt(time) => Some(*time),
        }
    }
}

/// On-disk marker contents.
#[derive(Debug, Serialize, Deserialize)]
struct MarkerFile {
    version: u32,
    profile: String,
    saved_at: DateTime<Utc>,
}

/// Summary of a single store, for status output.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    /// Profile owning the store
    pub profile: Profile,
    /// Store directory
    pub root: PathBuf,
    /// Last successful save, if any
    pub saved_at: Option<DateTime<Utc>>,
    /// Number of cached artifacts
    pub entries: usize,
    /// Total size of cached artifacts in bytes
    pub total_bytes: u64,
}

/// The collection of per-profile stores under one data root.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_root: PathBuf,
}

impl SnapshotStore {
    /// Create a handle on the stores under `data_root`. Nothing is created yet.
    #[must_use]
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// The data root.
    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Store directory for a profile. Pure; does not touch the filesystem.
    #[must_use]
    pub fn store_root(&self, profile: &Profile) -> PathBuf {
        self.data_root.join(profile.as_str())
    }

    /// Whether a store exists for this profile.
    #[must_use]
    pub fn exists(&self, profile: &Profile) -> bool {
        self.store_root(profile).is_dir()
    }

    /// Resolve the profile's store directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn ensure_store(&self, profile: &Profile) -> Result<PathBuf, StoreError> {
        let root = self.store_root(profile);
        if !root.is_dir() {
            log::debug!("Creating store for '{}' at {}", profile, root.display());
            fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        }
        Ok(root)
    }

    /// Read a store's marker.
    ///
    /// A missing marker is created empty and reads as [`Marker::Never`]. A
    /// marker that cannot be parsed is logged and also reads as `Never`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the marker cannot be read or created.
    pub fn read_marker(store_root: &Path) -> Result<Marker, StoreError> {
        let path = store_root.join(MARKER_FILE_NAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("First snapshot of {}; creating marker", store_root.display());
                fs::write(&path, b"").map_err(|e| StoreError::io(&path, e))?;
                return Ok(Marker::Never);
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Marker::Never);
        }

        match serde_json::from_str::<MarkerFile>(&content) {
            Ok(marker) if marker.version == MARKER_VERSION => {
                Ok(Marker::SavedAt(SystemTime::from(marker.saved_at)))
            }
            Ok(marker) => {
                log::warn!(
                    "Unsupported marker version {} in {}; treating store as never saved",
                    marker.version,
                    path.display()
                );
                Ok(Marker::Never)
            }
            Err(e) => {
                log::warn!(
                    "Unreadable marker {} ({}); treating store as never saved",
                    path.display(),
                    e
                );
                Ok(Marker::Never)
            }
        }
    }

    /// Record a completed save at `now`.
    ///
    /// The marker never moves backwards: if the store already records a
    /// later time, that time is kept. Returns the recorded marker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the marker cannot be written.
    pub fn write_marker(
        store_root: &Path,
        profile: &Profile,
        now: SystemTime,
    ) -> Result<Marker, StoreError> {
        let path = store_root.join(MARKER_FILE_NAME);
        let saved_at = match Self::read_marker(store_root)? {
            Marker::SavedAt(previous) if previous > now => {
                log::warn!("Clock is behind the last recorded save; keeping previous marker");
                previous
            }
            _ => now,
        };

        let marker = MarkerFile {
            version: MARKER_VERSION,
            profile: profile.to_string(),
            saved_at: DateTime::<Utc>::from(saved_at),
        };
        let json = serde_json::to_string_pretty(&marker)
            .map_err(|e| StoreError::io(&path, io::Error::other(e)))?;

        let tmp = store_root.join(format!("{}{}", MARKER_FILE_NAME, super::copy::TEMP_SUFFIX));
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;

        log::debug!("Marker for '{}' set to {}", profile, marker.saved_at.to_rfc3339());
        Ok(Marker::SavedAt(saved_at))
    }

    /// The profile most recently switched to, if one is recorded.
    ///
    /// An unreadable or invalid record is logged and reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the record exists but cannot be read.
    pub fn active_profile(&self) -> Result<Option<Profile>, StoreError> {
        let path = self.data_root.join(ACTIVE_FILE_NAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        match Profile::new(content) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                log::warn!("Ignoring active profile record {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Record `profile` as the active one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the data root or record cannot be written.
    pub fn set_active_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_root).map_err(|e| StoreError::io(&self.data_root, e))?;
        let path = self.data_root.join(ACTIVE_FILE_NAME);
        let tmp = self
            .data_root
            .join(format!("{}{}", ACTIVE_FILE_NAME, super::copy::TEMP_SUFFIX));
        fs::write(&tmp, profile.as_str()).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }

    /// Profiles that currently have a store, sorted by name.
    ///
    /// Directories whose names are not valid profile names are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the data root exists but cannot be read.
    pub fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let entries = match fs::read_dir(&self.data_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.data_root, e)),
        };

        let mut profiles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.data_root, e))?;
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            if let Ok(profile) = Profile::new(entry.file_name().to_string_lossy()) {
                profiles.push(profile);
            }
        }
        profiles.sort();
        Ok(profiles)
    }

    /// Summarize a profile's store. Returns `None` if it has no store.
    ///
    /// Temp files left by interrupted copies are not counted. Unlike a save
    /// pass this does not create a missing marker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be indexed or its marker
    /// cannot be read.
    pub fn status(&self, profile: &Profile) -> Result<Option<StoreStatus>, StoreError> {
        let root = self.store_root(profile);
        if !root.is_dir() {
            return Ok(None);
        }

        let saved_at = if root.join(MARKER_FILE_NAME).exists() {
            Self::read_marker(&root)?.saved_at().map(DateTime::<Utc>::from)
        } else {
            None
        };

        let index = index_root(&root)?;
        let mut entries = 0;
        let mut total_bytes = 0;
        for location in index.keys() {
            let in_flight = location
                .as_path()
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(is_temp_name);
            if in_flight {
                continue;
            }
            let path = location.resolve(&root);
            entries += 1;
            total_bytes += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        }

        Ok(Some(StoreStatus {
            profile: profile.clone(),
            root,
            saved_at,
            entries,
            total_bytes,
        }))
    }
}
