//! Snapshot storage for derived artifacts.
//!
//! This module holds everything the sync engine needs to reason about
//! artifact roots on disk:
//!
//! * [`layout`]: maps artifact identifiers to relative locations (and back).
//! * [`indexer`]: walks a root into a location -> modification time index.
//! * [`snapshot`]: per-profile store directories and their save markers.
//! * [`copy`]: atomic copy and remove-with-pruning primitives.
//!
//! # On-disk layout
//!
//! ```text
//! <data_root>/
//!   .active                 # last profile switched to
//!   android/
//!     .swapcache-marker     # last successful save of "android"
//!     ab/ab12cd34           # cached artifacts, same layout as the working root
//!   ios/
//!     ...
//! ```

pub mod copy;
pub mod indexer;
pub mod layout;
pub mod snapshot;

pub use copy::{copy_atomic, remove_and_prune, CopyError};
pub use indexer::{index_root, ArtifactIndex, IndexError};
pub use layout::{ArtifactLayout, ArtifactLocation, ShardedLayout};
pub use snapshot::{
    Marker, SnapshotStore, StoreError, StoreStatus, ACTIVE_FILE_NAME, MARKER_FILE_NAME,
};
