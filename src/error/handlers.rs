//! Error handlers
//!
//! Logging and errno translation for callers that report results as
//! negative status codes (remote file status, checksum and transfer handlers).

use crate::error::types::{FsuError, StorageError};
use log::error;

pub const EPERM: i32 = 1;
pub const ENOENT: i32 = 2;
pub const EIO: i32 = 5;
pub const ENOMEM: i32 = 12;
pub const EEXIST: i32 = 17;
pub const ENOTDIR: i32 = 20;
pub const EISDIR: i32 = 21;
pub const EINVAL: i32 = 22;
pub const ENOSPC: i32 = 28;
pub const ENAMETOOLONG: i32 = 36;
pub const ENOSYS: i32 = 38;

/// Log an operation error
pub fn handle_error(err: &FsuError) {
    error!("File system utility error: {}", err);
}

/// Convert an error to the negative errno value expected on the wire
pub fn error_to_errno(err: &FsuError) -> i32 {
    -match err {
        FsuError::InvalidInput(_) => EPERM,
        FsuError::TooLong { .. } => ENAMETOOLONG,
        FsuError::MalformedTraversal(_) => EINVAL,
        FsuError::NotFound(_) => ENOENT,
        FsuError::NotADirectory(_) => ENOTDIR,
        FsuError::IsADirectory(_) => EISDIR,
        FsuError::AmbiguousMatch { .. } => EINVAL,
        FsuError::DiskFull { .. } => ENOSPC,
        FsuError::IoError(_) => EIO,
        FsuError::OutOfMemory(_) => ENOMEM,
        FsuError::Unsupported(_) => ENOSYS,
        FsuError::Storage(e) => storage_errno(e),
    }
}

fn storage_errno(err: &StorageError) -> i32 {
    match err {
        StorageError::NotFound(_) => ENOENT,
        StorageError::AlreadyExists(_) => EEXIST,
        StorageError::NotADirectory(_) => ENOTDIR,
        StorageError::IsADirectory(_) => EISDIR,
        StorageError::NoSpace => ENOSPC,
        StorageError::NotMounted => EPERM,
        StorageError::InvalidPath(_) => EINVAL,
        StorageError::Io(e) => e.raw_os_error().unwrap_or(EIO),
    }
}
