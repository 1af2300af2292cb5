//! Sidecar-file identifier resolver.
//!
//! Every asset in the project has a `<asset>.meta` file next to it carrying
//! the asset's stable identifier on a `guid: <hex>` line:
//!
//! ```text
//! fileFormatVersion: 2
//! guid: ab12cd34ef5678900000000000000000
//! ```
//!
//! [`MetaFileResolver::resolve`] reads the sidecar of the asset it is asked
//! about. Reverse lookups use an index of every sidecar under the project
//! root, built once by [`MetaFileResolver::scan`], so a cached artifact whose
//! sidecar is gone is reported as having no source. If any part of the
//! project could not be read during the scan, identifiers missing from the
//! index are reported as unknown instead.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use super::{ArtifactId, IdentifierResolver, ResolverError};

/// File extension of identifier sidecars.
pub const META_EXTENSION: &str = "meta";

static GUID_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^guid:\s*([0-9A-Za-z]+)\s*$").expect("guid pattern is valid")
});

/// Resolver reading identifiers from `.meta` sidecar files.
#[derive(Debug)]
pub struct MetaFileResolver {
    /// Project root that was indexed
    root: PathBuf,
    /// Identifier -> asset path, from the sidecar index
    by_id: HashMap<ArtifactId, PathBuf>,
    /// Directories and sidecars the scan could not read
    unreadable: Vec<PathBuf>,
}

impl MetaFileResolver {
    /// Index every sidecar under `project_root`.
    ///
    /// Sidecars that cannot be read or carry no identifier are logged,
    /// left out of the index and recorded in [`Self::unreadable`], as are
    /// directories the walk cannot enter. If two sidecars claim the same
    /// identifier the first one in walk order wins.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Io`] if `project_root` itself cannot be read.
    pub fn scan(project_root: &Path) -> Result<Self, ResolverError> {
        let mut resolver = Self {
            root: project_root.to_path_buf(),
            by_id: HashMap::new(),
            unreadable: Vec::new(),
        };

        fs::read_dir(project_root).map_err(|source| ResolverError::Io {
            path: project_root.to_path_buf(),
            source,
        })?;

        let walk = WalkDir::new(project_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();
        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable project entry: {}", e);
                    let path = e
                        .path()
                        .map_or_else(|| project_root.to_path_buf(), Path::to_path_buf);
                    resolver.unreadable.push(path);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_sidecar(entry.path()) {
                continue;
            }

            let Some(asset) = asset_for_sidecar(entry.path()) else {
                continue;
            };
            match read_sidecar(entry.path()) {
                Ok(id) => {
                    if let Some(existing) = resolver.by_id.get(&id) {
                        log::warn!(
                            "Identifier {} claimed by both {} and {}; keeping the first",
                            id,
                            existing.display(),
                            asset.display()
                        );
                    } else {
                        resolver.by_id.insert(id, asset);
                    }
                }
                Err(e) => {
                    log::warn!("{}", e);
                    resolver.unreadable.push(entry.path().to_path_buf());
                }
            }
        }

        log::debug!(
            "Indexed {} identifiers under {}",
            resolver.by_id.len(),
            resolver.root.display()
        );
        Ok(resolver)
    }

    /// Project root this resolver indexed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of identifiers in the reverse index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the reverse index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Entries the scan could not read. While this is non-empty, reverse
    /// lookups of unindexed identifiers fail instead of returning `None`.
    #[must_use]
    pub fn unreadable(&self) -> &[PathBuf] {
        &self.unreadable
    }
}

impl IdentifierResolver for MetaFileResolver {
    fn resolve(&self, source: &Path) -> Result<ArtifactId, ResolverError> {
        let sidecar = sidecar_for_asset(source);
        if !sidecar.exists() {
            return Err(ResolverError::Unknown(source.to_path_buf()));
        }
        read_sidecar(&sidecar)
    }

    fn reverse_lookup(&self, id: &ArtifactId) -> Result<Option<PathBuf>, ResolverError> {
        if let Some(asset) = self.by_id.get(id) {
            return Ok(Some(asset.clone()));
        }
        if self.unreadable.is_empty() {
            Ok(None)
        } else {
            Err(ResolverError::Incomplete {
                id: id.clone(),
                root: self.root.clone(),
                unreadable: self.unreadable.len(),
            })
        }
    }
}

fn read_sidecar(sidecar: &Path) -> Result<ArtifactId, ResolverError> {
    let content = fs::read_to_string(sidecar).map_err(|source| ResolverError::Io {
        path: sidecar.to_path_buf(),
        source,
    })?;
    let raw = GUID_LINE
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ResolverError::Malformed {
            path: sidecar.to_path_buf(),
            reason: "no guid line".to_string(),
        })?;
    ArtifactId::new(raw).ok_or_else(|| ResolverError::Malformed {
        path: sidecar.to_path_buf(),
        reason: format!("unusable guid '{}'", raw),
    })
}

/// Whether `path` is an identifier sidecar.
#[must_use]
pub fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(META_EXTENSION))
}

/// Sidecar path for an asset: `tree.fbx` -> `tree.fbx.meta`.
#[must_use]
pub fn sidecar_for_asset(asset: &Path) -> PathBuf {
    let mut name = OsString::from(asset.as_os_str());
    name.push(".");
    name.push(META_EXTENSION);
    PathBuf::from(name)
}

fn asset_for_sidecar(sidecar: &Path) -> Option<PathBuf> {
    let stem = sidecar.file_stem()?;
    Some(sidecar.with_file_name(stem))
}
