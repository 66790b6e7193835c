//! fsync helpers for durable snapshot writes.
//!
//! Both the file and its directory must be synced: on POSIX systems a rename
//! only updates the directory entry, and without a directory fsync the new
//! name may not survive a power loss even though the contents were synced.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Syncs a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory so that renames into it are durable.
///
/// Should only be called with directory paths.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}
