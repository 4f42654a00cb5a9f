//! Error types
//!
//! Defines the storage-boundary error and the error returned by every
//! file system utility operation.

use std::fmt;
use std::io;

/// Errors reported by a storage backend
#[derive(Debug)]
pub enum StorageError {
    NotFound(String),
    AlreadyExists(String),
    NotADirectory(String),
    IsADirectory(String),
    NoSpace,
    NotMounted,
    InvalidPath(String),
    Io(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(p) => write!(f, "No such entry: {}", p),
            StorageError::AlreadyExists(p) => write!(f, "Entry already exists: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::IsADirectory(p) => write!(f, "Is a directory: {}", p),
            StorageError::NoSpace => write!(f, "No space left on volume"),
            StorageError::NotMounted => write!(f, "Volume not mounted"),
            StorageError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            StorageError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(error.to_string()),
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(error.to_string()),
            io::ErrorKind::NotADirectory => StorageError::NotADirectory(error.to_string()),
            io::ErrorKind::IsADirectory => StorageError::IsADirectory(error.to_string()),
            io::ErrorKind::StorageFull => StorageError::NoSpace,
            _ => StorageError::Io(error),
        }
    }
}

/// Errors returned by the file system utility operations
#[derive(Debug)]
pub enum FsuError {
    /// A required argument was empty
    InvalidInput(String),
    /// A path or name exceeds the configured bound
    TooLong { len: usize, max: usize },
    /// A `..` segment tried to climb above the mount point
    MalformedTraversal(String),
    NotFound(String),
    NotADirectory(String),
    IsADirectory(String),
    /// A uniqueness query matched more than one entry
    AmbiguousMatch { name: String, count: usize },
    /// Fewer bytes were written than requested
    DiskFull { written: usize, requested: usize },
    IoError(String),
    OutOfMemory(String),
    /// The requested feature was compiled out
    Unsupported(&'static str),
    /// Opaque passthrough from the storage backend
    Storage(StorageError),
}

impl fmt::Display for FsuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsuError::InvalidInput(s) => write!(f, "Invalid input: {}", s),
            FsuError::TooLong { len, max } => {
                write!(f, "Path too long: {} characters (max {})", len, max)
            }
            FsuError::MalformedTraversal(p) => write!(f, "Path escapes the root: {}", p),
            FsuError::NotFound(p) => write!(f, "Not found: {}", p),
            FsuError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            FsuError::IsADirectory(p) => write!(f, "Is a directory: {}", p),
            FsuError::AmbiguousMatch { name, count } => {
                write!(f, "{} entries match '{}', expected one", count, name)
            }
            FsuError::DiskFull { written, requested } => {
                write!(f, "Disk full: wrote {} of {} bytes", written, requested)
            }
            FsuError::IoError(s) => write!(f, "IO error: {}", s),
            FsuError::OutOfMemory(s) => write!(f, "Out of memory: {}", s),
            FsuError::Unsupported(s) => write!(f, "Unsupported: {}", s),
            FsuError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for FsuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsuError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for FsuError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(p) => FsuError::NotFound(p),
            StorageError::NotADirectory(p) => FsuError::NotADirectory(p),
            StorageError::IsADirectory(p) => FsuError::IsADirectory(p),
            other => FsuError::Storage(other),
        }
    }
}

impl From<io::Error> for FsuError {
    fn from(error: io::Error) -> Self {
        FsuError::from(StorageError::from(error))
    }
}

/// Result alias used throughout the crate
pub type FsuResult<T> = Result<T, FsuError>;
