//! Snapshot persistence for the thread registry.
//!
//! The whole registry is one JSON document, rewritten on every new entry.
//! Entries are a few dozen bytes, so a full rewrite stays cheap for any
//! realistic number of threads.
//!
//! # Atomic Writes
//!
//! Snapshots are written atomically using a write-to-temp-then-rename pattern:
//! 1. Write to `<path>.tmp`
//! 2. fsync the file
//! 3. Rename to `<path>`
//! 4. fsync the directory
//!
//! Readers always see either the old or the new snapshot, never a partial write.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fsync::{fsync_dir, fsync_file};
use crate::types::{MessageTs, ThreadKey};

/// Current schema version. Increment when making breaking changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema version mismatch.
    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },

    /// The new snapshot is in place but the directory fsync failed, so the
    /// rename may not survive a power loss.
    #[error("snapshot renamed but directory sync failed: {0}")]
    DirSync(io::Error),
}

impl SnapshotError {
    /// True if the new snapshot replaced the old one despite the error.
    pub fn is_committed(&self) -> bool {
        matches!(self, SnapshotError::DirSync(_))
    }
}

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Persisted registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Schema version for forward-compatible migrations.
    pub schema_version: u32,

    /// When this snapshot was written (ISO 8601).
    pub snapshot_at: DateTime<Utc>,

    /// Origin message timestamp per thread key.
    pub threads: BTreeMap<ThreadKey, MessageTs>,
}

impl RegistrySnapshot {
    /// Creates a snapshot of the given entries, stamped now.
    pub fn new(threads: BTreeMap<ThreadKey, MessageTs>) -> Self {
        RegistrySnapshot {
            schema_version: SCHEMA_VERSION,
            snapshot_at: Utc::now(),
            threads,
        }
    }
}

/// Directory containing `path`. A bare file name lives in `.`.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Saves a snapshot atomically to disk, creating parent directories.
///
/// # Errors
///
/// Returns an error if any IO operation fails. Only
/// [`SnapshotError::DirSync`] is returned after the rename.
pub fn save_snapshot_atomic(path: &Path, snapshot: &RegistrySnapshot) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;

    let dir = parent_dir(path);
    std::fs::create_dir_all(dir)?;

    let tmp_path = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(snapshot)?;

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(&bytes)?;
        fsync_file(&file)?;
    }

    std::fs::rename(&tmp_path, path)?;

    // fsync directory to ensure rename is durable
    fsync_dir(dir).map_err(SnapshotError::DirSync)?;

    Ok(())
}

/// Loads a snapshot from disk.
///
/// # Errors
///
/// Returns an error if:
/// - The file doesn't exist or can't be read
/// - The JSON is malformed
/// - The schema version is incompatible
pub fn load_snapshot(path: &Path) -> Result<RegistrySnapshot> {
    let bytes = std::fs::read(path)?;
    let snapshot: RegistrySnapshot = serde_json::from_slice(&bytes)?;

    if snapshot.schema_version != SCHEMA_VERSION {
        return Err(SnapshotError::SchemaMismatch {
            expected: SCHEMA_VERSION,
            got: snapshot.schema_version,
        });
    }

    Ok(snapshot)
}

/// Attempts to load a snapshot, returning None if the file doesn't exist.
///
/// Other errors (malformed JSON, schema mismatch) are propagated.
pub fn try_load_snapshot(path: &Path) -> Result<Option<RegistrySnapshot>> {
    match load_snapshot(path) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(SnapshotError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn arb_threads() -> impl Strategy<Value = BTreeMap<ThreadKey, MessageTs>> {
        prop::collection::btree_map(
            "https://github\\.com/[a-z]{1,8}/[a-z]{1,8}/pull/[0-9]{1,5}"
                .prop_map(|url| ThreadKey::for_url(&url)),
            "[0-9]{10}\\.[0-9]{6}".prop_map(MessageTs::new),
            0..20,
        )
    }

    proptest! {
        #[test]
        fn atomic_save_load_preserves_threads(threads in arb_threads()) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("threads.json");

            let snapshot = RegistrySnapshot::new(threads);
            save_snapshot_atomic(&path, &snapshot).unwrap();
            let loaded = load_snapshot(&path).unwrap();

            prop_assert_eq!(snapshot, loaded);
        }
    }

    #[test]
    fn temp_file_cleaned_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("threads.json");

        save_snapshot_atomic(&path, &RegistrySnapshot::new(BTreeMap::new())).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("threads.json.tmp").exists());
    }

    #[test]
    fn file_format_is_plain_key_value_map() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("threads.json");

        let mut threads = BTreeMap::new();
        threads.insert(
            ThreadKey::for_url("https://github.com/o/r/pull/1"),
            MessageTs::new("1000.1"),
        );
        save_snapshot_atomic(&path, &RegistrySnapshot::new(threads)).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["schema_version"], 1);
        assert_eq!(
            raw["threads"]["github-https://github.com/o/r/pull/1"],
            "1000.1"
        );
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let dir = tempdir().unwrap();
        let result = load_snapshot(&dir.path().join("nonexistent.json"));
        assert!(matches!(result, Err(SnapshotError::Io(_))));
    }

    #[test]
    fn try_load_nonexistent_returns_none() {
        let dir = tempdir().unwrap();
        let result = try_load_snapshot(&dir.path().join("nonexistent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_snapshot(&path);
        assert!(matches!(result, Err(SnapshotError::Json(_))));
    }

    #[test]
    fn load_wrong_schema_version_returns_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wrong_version.json");

        let mut snapshot = RegistrySnapshot::new(BTreeMap::new());
        snapshot.schema_version = SCHEMA_VERSION + 1;

        // Write directly to avoid the schema check on save
        let json = serde_json::to_string(&snapshot).unwrap();
        std::fs::write(&path, json).unwrap();

        let result = load_snapshot(&path);
        assert!(matches!(
            result,
            Err(SnapshotError::SchemaMismatch {
                expected: 1,
                got: 2
            })
        ));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/threads.json");

        save_snapshot_atomic(&path, &RegistrySnapshot::new(BTreeMap::new())).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn bare_file_name_lives_in_current_dir() {
        assert_eq!(parent_dir(Path::new("threads.json")), Path::new("."));
        assert_eq!(parent_dir(Path::new("state/threads.json")), Path::new("state"));
        assert_eq!(parent_dir(Path::new("/threads.json")), Path::new("/"));
    }

    #[test]
    fn dir_sync_failure_counts_as_committed() {
        let err = SnapshotError::DirSync(io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_committed());
        assert!(!SnapshotError::Io(io::Error::from(io::ErrorKind::NotFound)).is_committed());
    }
}
