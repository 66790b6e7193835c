//! Persistence layer for the thread registry.
//!
//! The registry is stored as a single JSON snapshot:
//!
//! ```text
//! <registry_path>        # e.g. state/threads.json
//! <registry_path>.tmp    # only exists mid-write
//! ```
//!
//! # Recovery
//!
//! On startup the snapshot is loaded if present; a missing file means an
//! empty registry. A leftover `.tmp` file from a crash mid-write is ignored
//! and overwritten by the next save.
//!
//! # Crash Safety
//!
//! - Snapshots: Written atomically using write-to-temp-then-rename
//! - Both the file and its directory are fsynced before a save returns

pub mod fsync;
pub mod snapshot;

pub use fsync::{fsync_dir, fsync_file};
pub use snapshot::{
    RegistrySnapshot, SCHEMA_VERSION, SnapshotError, load_snapshot, save_snapshot_atomic,
    try_load_snapshot,
};
