//! Storage API
//!
//! The block-oriented, directory-capable volume the utility layer sits on.
//! Every path handed to a backend is absolute and rooted at its mount point.

use crate::error::StorageError;
use crate::storage::types::{DirEntry, OpenMode, VolumeStats};

pub trait Storage {
    /// Open file handle
    type File;
    /// Open directory handle
    type Dir;

    /// Attach the volume to its mount point
    fn mount(&self) -> Result<(), StorageError>;

    fn statvfs(&self, path: &str) -> Result<VolumeStats, StorageError>;

    fn open(&self, path: &str, mode: OpenMode) -> Result<Self::File, StorageError>;

    /// Read up to `buf.len()` bytes; fewer only at end of file
    fn read(&self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write up to `buf.len()` bytes, returning how many were accepted
    fn write(&self, file: &mut Self::File, buf: &[u8]) -> Result<usize, StorageError>;

    /// Seek to an absolute offset from the start of the file
    fn seek(&self, file: &mut Self::File, offset: u64) -> Result<(), StorageError>;

    fn truncate(&self, file: &mut Self::File, len: u64) -> Result<(), StorageError>;

    fn close(&self, file: Self::File) -> Result<(), StorageError>;

    fn stat(&self, path: &str) -> Result<DirEntry, StorageError>;

    fn opendir(&self, path: &str) -> Result<Self::Dir, StorageError>;

    /// Next entry of an open directory; an entry with an empty name marks the end
    fn readdir(&self, dir: &mut Self::Dir) -> Result<DirEntry, StorageError>;

    fn closedir(&self, dir: Self::Dir) -> Result<(), StorageError>;

    fn mkdir(&self, path: &str) -> Result<(), StorageError>;

    fn unlink(&self, path: &str) -> Result<(), StorageError>;
}
