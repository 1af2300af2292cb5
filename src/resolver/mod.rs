//! Identifier resolution between source assets and derived artifacts.
//!
//! The host decides how a source file maps to the stable identifier that
//! names its derived artifact. The sync engine only consumes that mapping
//! through the [`IdentifierResolver`] trait:
//!
//! - [`IdentifierResolver::resolve`] during save, to find where an asset's
//!   artifact lives.
//! - [`IdentifierResolver::reverse_lookup`] during restore, to decide whether
//!   a cached artifact still has a live source.
//!
//! # Implementations
//!
//! - [`meta::MetaFileResolver`]: reads the `guid:` line from the `.meta`
//!   sidecar written next to every asset.
//! - [`MapResolver`]: an in-memory table for embedding hosts and tests.
//!
//! # Example
//!
//! ```
//! use swapcache::resolver::{ArtifactId, IdentifierResolver, MapResolver};
//! use std::path::Path;
//!
//! let mut resolver = MapResolver::new();
//! resolver.insert("/project/Assets/tree.fbx", ArtifactId::new("ab12cd34").unwrap());
//!
//! let id = resolver.resolve(Path::new("/project/Assets/tree.fbx")).unwrap();
//! assert_eq!(id.as_str(), "ab12cd34");
//! ```

pub mod meta;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use meta::MetaFileResolver;

/// Errors raised while resolving an asset's identifier.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// The resolver has no identifier for this asset.
    #[error("no identifier known for {0}")]
    Unknown(PathBuf),

    /// The identifier source for the asset could not be read.
    #[error("failed to read identifier for {path}: {source}")]
    Io {
        /// Asset (or sidecar) path that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The identifier data exists but is malformed.
    #[error("malformed identifier for {path}: {reason}")]
    Malformed {
        /// Asset (or sidecar) path
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The identifier is not indexed, but parts of the project could not be
    /// read, so its source may still exist.
    #[error("identifier {id} not indexed; {unreadable} entries under {root} could not be read")]
    Incomplete {
        /// Identifier that was looked up
        id: ArtifactId,
        /// Root of the incomplete index
        root: PathBuf,
        /// Number of entries that failed to read
        unreadable: usize,
    },
}

/// Stable, opaque identifier naming a derived artifact.
///
/// Identifiers become file names inside every artifact root, so they must be
/// non-empty and free of path separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Wrap an identifier string.
    ///
    /// Returns `None` for identifiers that cannot be used as a file name
    /// (empty, `.`/`..`, or containing a separator).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let usable = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && !id.chars().any(char::is_control);
        usable.then_some(Self(id))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps source assets to artifact identifiers and back.
///
/// Implementations must be deterministic: the same asset resolves to the same
/// identifier across calls.
pub trait IdentifierResolver {
    /// Resolve the identifier for a source asset.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the asset has no usable identifier. The
    /// engine skips such assets rather than failing the pass.
    fn resolve(&self, source: &Path) -> Result<ArtifactId, ResolverError>;

    /// Find the source asset currently associated with an identifier.
    ///
    /// Returns `Ok(None)` only when no source corresponds to it any more;
    /// restore deletes the cached artifact in that case. A returned path is
    /// not guaranteed to exist; the engine checks that itself.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the answer cannot be known, for example
    /// because part of the project could not be read. Restore keeps the
    /// cached artifact.
    fn reverse_lookup(&self, id: &ArtifactId) -> Result<Option<PathBuf>, ResolverError>;
}

impl<R: IdentifierResolver + ?Sized> IdentifierResolver for &R {
    fn resolve(&self, source: &Path) -> Result<ArtifactId, ResolverError> {
        (**self).resolve(source)
    }

    fn reverse_lookup(&self, id: &ArtifactId) -> Result<Option<PathBuf>, ResolverError> {
        (**self).reverse_lookup(id)
    }
}

/// In-memory resolver backed by a two-way table.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    by_path: HashMap<PathBuf, ArtifactId>,
    by_id: HashMap<ArtifactId, PathBuf>,
}

impl MapResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a source path with an identifier, replacing any previous
    /// association of either side.
    pub fn insert(&mut self, source: impl Into<PathBuf>, id: ArtifactId) {
        let source = source.into();
        if let Some(old_id) = self.by_path.insert(source.clone(), id.clone()) {
            self.by_id.remove(&old_id);
        }
        if let Some(old_path) = self.by_id.insert(id, source.clone()) {
            if old_path != source {
                self.by_path.remove(&old_path);
            }
        }
    }

    /// Forget a source path. Returns the identifier it was mapped to.
    pub fn remove(&mut self, source: &Path) -> Option<ArtifactId> {
        let id = self.by_path.remove(source)?;
        self.by_id.remove(&id);
        Some(id)
    }

    /// Number of known associations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

impl IdentifierResolver for MapResolver {
    fn resolve(&self, source: &Path) -> Result<ArtifactId, ResolverError> {
        self.by_path
            .get(source)
            .cloned()
            .ok_or_else(|| ResolverError::Unknown(source.to_path_buf()))
    }

    fn reverse_lookup(&self, id: &ArtifactId) -> Result<Option<PathBuf>, ResolverError> {
        Ok(self.by_id.get(id).cloned())
    }
}
