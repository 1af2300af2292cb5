//! Artifact layout rules.
//!
//! A layout turns an [`ArtifactId`] into the relative path of its artifact.
//! The same rule is applied to the working root and to every snapshot store,
//! so relative locations can be compared directly across roots.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::resolver::ArtifactId;

/// Default number of identifier characters used as the shard directory name.
pub const DEFAULT_SHARD_WIDTH: usize = 2;

/// Relative path of an artifact within an artifact root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactLocation(PathBuf);

impl ArtifactLocation {
    /// Wrap a relative path.
    ///
    /// Returns `None` for absolute paths or paths containing `..`, which
    /// would escape the root they are resolved against.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let relative = !path.as_os_str().is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        relative.then_some(Self(path))
    }

    /// The relative path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolve this location against a root directory.
    #[must_use]
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl Serialize for ArtifactLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Mapping between artifact identifiers and their relative locations.
pub trait ArtifactLayout {
    /// Compute the location of an identifier's artifact. Pure and infallible.
    fn locate(&self, id: &ArtifactId) -> ArtifactLocation;

    /// Recover the identifier from a location produced by [`Self::locate`].
    ///
    /// Returns `None` for any path this layout would never produce.
    fn identify(&self, location: &ArtifactLocation) -> Option<ArtifactId>;
}

/// Two-level sharded layout: `ab12cd34` lives at `ab/ab12cd34`.
///
/// The shard directory is the identifier's first `width` characters, which
/// keeps per-directory file counts low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardedLayout {
    width: usize,
}

impl ShardedLayout {
    /// Create a layout using `width` leading characters as the shard name.
    /// A width of zero is treated as one.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    /// Shard width in characters.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    fn shard<'a>(&self, id: &'a str) -> &'a str {
        match id.char_indices().nth(self.width) {
            Some((end, _)) => &id[..end],
            None => id,
        }
    }
}

impl Default for ShardedLayout {
    fn default() -> Self {
        Self::new(DEFAULT_SHARD_WIDTH)
    }
}

impl ArtifactLayout for ShardedLayout {
    fn locate(&self, id: &ArtifactId) -> ArtifactLocation {
        let id = id.as_str();
        ArtifactLocation(Path::new(self.shard(id)).join(id))
    }

    fn identify(&self, location: &ArtifactLocation) -> Option<ArtifactId> {
        let mut components = location.as_path().components();
        let (Some(Component::Normal(shard)), Some(Component::Normal(name)), None) =
            (components.next(), components.next(), components.next())
        else {
            return None;
        };
        let name = name.to_str()?;
        if shard.to_str()? != self.shard(name) {
            return None;
        }
        ArtifactId::new(name)
    }
}
