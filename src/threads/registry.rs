//! Thread registry: thread key → timestamp of the thread's origin message.
//!
//! Entries are written once, by the first successful delivery for a key, and
//! never changed afterwards. Concurrent first deliveries for the same key
//! race on [`ThreadRegistry::set_if_absent`]; exactly one of them wins and
//! the others stay unthreaded.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::warn;

use crate::persistence::{RegistrySnapshot, SnapshotError, save_snapshot_atomic, try_load_snapshot};
use crate::types::{MessageTs, ThreadKey};

/// Errors that can occur when recording a thread.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The new entry could not be made durable. It was not recorded.
    #[error("failed to persist thread registry: {0}")]
    Persist(#[from] SnapshotError),

    /// The blocking write task panicked or was cancelled. The entry was not
    /// recorded.
    #[error("thread registry write task failed: {0}")]
    WriteTask(#[from] tokio::task::JoinError),
}

/// Durable first-writer-wins mapping from thread key to origin timestamp.
pub trait ThreadRegistry: Send + Sync {
    /// Returns the origin timestamp recorded for `key`, if any. Never waits
    /// on disk.
    fn get(&self, key: &ThreadKey) -> Option<MessageTs>;

    /// Records `ts` as the origin of `key` unless one is already recorded.
    ///
    /// Returns `Ok(true)` if this call established the mapping, `Ok(false)`
    /// if another writer got there first. Atomic per key.
    fn set_if_absent(
        &self,
        key: &ThreadKey,
        ts: MessageTs,
    ) -> impl Future<Output = Result<bool, RegistryError>> + Send;
}

/// Locks a mutex, recovering the data if a previous holder panicked.
///
/// Every critical section leaves the map consistent, so a poisoned lock
/// carries no partial state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local registry with no persistence.
#[derive(Debug, Default)]
pub struct MemoryThreadRegistry {
    threads: Mutex<HashMap<ThreadKey, MessageTs>>,
}

impl MemoryThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.threads).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ThreadRegistry for MemoryThreadRegistry {
    fn get(&self, key: &ThreadKey) -> Option<MessageTs> {
        lock(&self.threads).get(key).cloned()
    }

    async fn set_if_absent(&self, key: &ThreadKey, ts: MessageTs) -> Result<bool, RegistryError> {
        let mut threads = lock(&self.threads);
        if threads.contains_key(key) {
            return Ok(false);
        }
        threads.insert(key.clone(), ts);
        Ok(true)
    }
}

/// Registry backed by a JSON snapshot file.
///
/// The file is loaded once at startup and rewritten atomically on every new
/// entry. The compare-and-set happens on the in-memory map; the rewrite runs
/// on the blocking pool without holding the map lock, so lookups never wait
/// on disk. Writes are serialized, and each one snapshots the map after
/// taking its turn, so a stale snapshot never replaces a newer one.
///
/// A new entry is visible to [`get`](ThreadRegistry::get) while its write is
/// in flight. If the write fails before the file is replaced, the entry is
/// removed again.
#[derive(Debug)]
pub struct FileThreadRegistry {
    path: PathBuf,
    threads: Mutex<BTreeMap<ThreadKey, MessageTs>>,
    writer: tokio::sync::Mutex<()>,
}

impl FileThreadRegistry {
    /// Opens the registry at `path`. A missing file is an empty registry;
    /// a corrupt file or schema mismatch is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let path = path.into();
        let threads = try_load_snapshot(&path)?
            .map(|snapshot| snapshot.threads)
            .unwrap_or_default();

        Ok(Self {
            path,
            threads: Mutex::new(threads),
            writer: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        lock(&self.threads).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Undoes an insert whose write failed.
    fn roll_back(&self, key: &ThreadKey, ts: &MessageTs) {
        let mut threads = lock(&self.threads);
        if threads.get(key) == Some(ts) {
            threads.remove(key);
        }
    }
}

impl ThreadRegistry for FileThreadRegistry {
    fn get(&self, key: &ThreadKey) -> Option<MessageTs> {
        lock(&self.threads).get(key).cloned()
    }

    async fn set_if_absent(&self, key: &ThreadKey, ts: MessageTs) -> Result<bool, RegistryError> {
        {
            let mut threads = lock(&self.threads);
            if threads.contains_key(key) {
                return Ok(false);
            }
            threads.insert(key.clone(), ts.clone());
        }

        // Held until the write (or its rollback) is done.
        let _writer = self.writer.lock().await;

        let snapshot = RegistrySnapshot::new(lock(&self.threads).clone());
        let path = self.path.clone();
        let saved =
            tokio::task::spawn_blocking(move || save_snapshot_atomic(&path, &snapshot)).await;

        match saved {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) if e.is_committed() => {
                warn!(
                    path = %self.path.display(),
                    thread_key = %key,
                    error = %e,
                    "Thread registry written but not synced"
                );
                Ok(true)
            }
            Ok(Err(e)) => {
                self.roll_back(key, &ts);
                Err(e.into())
            }
            Err(e) => {
                self.roll_back(key, &ts);
                Err(e.into())
            }
        }
    }
}
