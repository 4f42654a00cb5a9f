//! Single-file operations
//!
//! Read, write, append, delete and size queries by absolute path. Each call
//! opens, works and closes; a close failure is only reported when the work
//! itself succeeded.

use log::{debug, error, warn};

use crate::config::FsuConfig;
use crate::error::{FsuError, FsuResult, StorageError};
use crate::find::find;
use crate::path::resolve;
use crate::storage::{EntryKind, OpenMode, Storage};

/// Combine the outcome of a file operation with the outcome of its close.
///
/// An earlier error always wins over a close error.
pub(crate) fn close_after<T>(
    result: FsuResult<T>,
    closed: Result<(), StorageError>,
    path: &str,
) -> FsuResult<T> {
    match closed {
        Ok(()) => result,
        Err(e) => {
            error!("Unable to close file {}: {}", path, e);
            match result {
                Ok(_) => Err(FsuError::IoError(format!("close {}: {}", path, e))),
                Err(earlier) => Err(earlier),
            }
        }
    }
}

fn require_path(path: &str) -> FsuResult<()> {
    if path.is_empty() {
        error!("Invalid absolute path");
        return Err(FsuError::InvalidInput("empty path".into()));
    }
    Ok(())
}

/// Read up to `buf.len()` bytes of the file at `path`, starting at `offset`
pub fn read<S: Storage>(storage: &S, path: &str, offset: u64, buf: &mut [u8]) -> FsuResult<usize> {
    require_path(path)?;

    let entry = storage.stat(path).map_err(|e| {
        debug!("File {} does not exist: {}", path, e);
        FsuError::NotFound(path.to_string())
    })?;
    if !entry.is_file() {
        warn!("{} is directory not file", path);
        return Err(FsuError::IsADirectory(path.to_string()));
    }

    let mut file = storage.open(path, OpenMode::read_only())?;
    let result = read_open(storage, &mut file, offset, buf);
    let closed = storage.close(file);
    close_after(result, closed, path)
}

fn read_open<S: Storage>(
    storage: &S,
    file: &mut S::File,
    offset: u64,
    buf: &mut [u8],
) -> FsuResult<usize> {
    if offset != 0 {
        storage.seek(file, offset)?;
    }
    Ok(storage.read(file, buf)?)
}

/// Read the start of `dir/name`
pub fn read_in<S: Storage>(
    storage: &S,
    dir: &str,
    name: &str,
    buf: &mut [u8],
    config: &FsuConfig,
) -> FsuResult<usize> {
    let path = resolve(dir, name, config)?;
    read(storage, &path, 0, buf)
}

/// Replace the contents of the file at `path` with `data`, creating it if needed.
///
/// The file ends up exactly `data.len()` bytes long even if it was longer.
pub fn write<S: Storage>(storage: &S, path: &str, data: &[u8], config: &FsuConfig) -> FsuResult<usize> {
    write_or_append(storage, path, data, false, config)
}

/// Append `data` to the file at `path`, creating it if needed
pub fn append<S: Storage>(storage: &S, path: &str, data: &[u8], config: &FsuConfig) -> FsuResult<usize> {
    write_or_append(storage, path, data, true, config)
}

pub fn write_in<S: Storage>(
    storage: &S,
    dir: &str,
    name: &str,
    data: &[u8],
    config: &FsuConfig,
) -> FsuResult<usize> {
    let path = resolve(dir, name, config)?;
    write(storage, &path, data, config)
}

pub fn append_in<S: Storage>(
    storage: &S,
    dir: &str,
    name: &str,
    data: &[u8],
    config: &FsuConfig,
) -> FsuResult<usize> {
    let path = resolve(dir, name, config)?;
    append(storage, &path, data, config)
}

fn write_or_append<S: Storage>(
    storage: &S,
    path: &str,
    data: &[u8],
    append: bool,
    config: &FsuConfig,
) -> FsuResult<usize> {
    require_path(path)?;

    let (mode, desc) = if append {
        (OpenMode::append_mode(), "append")
    } else {
        (OpenMode::rewrite(), "write")
    };

    let mut file = storage.open(path, mode).map_err(|e| {
        error!("Unable to open file {} for {}: {}", path, desc, e);
        FsuError::from(e)
    })?;
    let result = write_open(storage, &mut file, path, data, append, desc);
    let closed = storage.close(file);
    let written = close_after(result, closed, path)?;

    if !append && config.rewrite_size_check {
        verify_size(storage, path, data.len() as u64)?;
    }

    Ok(written)
}

fn write_open<S: Storage>(
    storage: &S,
    file: &mut S::File,
    path: &str,
    data: &[u8],
    append: bool,
    desc: &str,
) -> FsuResult<usize> {
    // A rewrite must not leave the old tail behind
    if !append {
        storage.truncate(file, data.len() as u64)?;
    }

    let written = storage.write(file, data).map_err(|e| {
        error!("Unable to {} file {}: {}", desc, path, e);
        FsuError::from(e)
    })?;

    if written != data.len() {
        error!("Disk Full: Unable to {} file {}", desc, path);
        return Err(FsuError::DiskFull {
            written,
            requested: data.len(),
        });
    }

    debug!("{} {} ({})", path, desc, written);
    Ok(written)
}

fn verify_size<S: Storage>(storage: &S, path: &str, desired: u64) -> FsuResult<()> {
    match size(storage, path) {
        Ok(actual) if actual == desired => Ok(()),
        Ok(actual) => {
            error!(
                "Unexpected file size (actual) {} != {} (desired)",
                actual, desired
            );
            Err(FsuError::IoError(format!(
                "{} is {} bytes after writing {}",
                path, actual, desired
            )))
        }
        Err(e) => {
            error!("Unable to verify size of {}: {}", path, e);
            Err(FsuError::IoError(format!("{} vanished after write", path)))
        }
    }
}

/// Size of the single entry of `kind` in `dir` whose name contains `name`.
///
/// No match is `NotFound`; more than one is `AmbiguousMatch`.
pub fn exists_unique<S: Storage>(storage: &S, dir: &str, name: &str, kind: EntryKind) -> FsuResult<u64> {
    if dir.is_empty() {
        error!("Invalid path or name");
        return Err(FsuError::InvalidInput("empty directory".into()));
    }

    let found = find(storage, dir, name, kind);
    let status = match found.as_slice() {
        [] => Err(FsuError::NotFound(format!("{}/{}", dir, name))),
        [entry] => Ok(entry.size),
        entries => Err(FsuError::AmbiguousMatch {
            name: name.to_string(),
            count: entries.len(),
        }),
    };
    found.release();
    status
}

/// Delete one file; the storage error is passed through unchanged
pub fn delete<S: Storage>(storage: &S, path: &str) -> FsuResult<()> {
    require_path(path)?;
    debug!("Deleting (unlinking) file {}", path);
    storage.unlink(path).map_err(FsuError::Storage)
}

pub fn delete_in<S: Storage>(storage: &S, dir: &str, name: &str, config: &FsuConfig) -> FsuResult<()> {
    let path = resolve(dir, name, config)?;
    delete(storage, &path)
}

/// Size in bytes of the entry at `path`, from `stat` alone
pub fn size<S: Storage>(storage: &S, path: &str) -> FsuResult<u64> {
    require_path(path)?;
    match storage.stat(path) {
        Ok(entry) => Ok(entry.size),
        Err(e) => {
            warn!("{} not found: {}", path, e);
            Err(FsuError::NotFound(path.to_string()))
        }
    }
}

pub fn size_in<S: Storage>(storage: &S, dir: &str, name: &str, config: &FsuConfig) -> FsuResult<u64> {
    let path = resolve(dir, name, config)?;
    size(storage, &path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Faults, MemoryStorage};

    fn setup() -> (MemoryStorage, FsuConfig) {
        (MemoryStorage::mounted("/lfs"), FsuConfig::default())
    }

    #[test]
    fn test_write_truncates_longer_file() {
        let (storage, config) = setup();
        storage.insert_file("/lfs/a.txt", b"a much longer previous body");

        assert_eq!(write(&storage, "/lfs/a.txt", b"short", &config).unwrap(), 5);
        assert_eq!(storage.contents("/lfs/a.txt").unwrap(), b"short");
        assert_eq!(size(&storage, "/lfs/a.txt").unwrap(), 5);
    }

    #[test]
    fn test_append_extends() {
        let (storage, config) = setup();
        append(&storage, "/lfs/log", b"one,", &config).unwrap();
        append(&storage, "/lfs/log", b"two", &config).unwrap();
        assert_eq!(storage.contents("/lfs/log").unwrap(), b"one,two");
    }

    #[test]
    fn test_read_with_offset() {
        let (storage, _) = setup();
        storage.insert_file("/lfs/data", b"0123456789");

        let mut buf = [0u8; 4];
        assert_eq!(read(&storage, "/lfs/data", 6, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"6789");

        let mut buf = [0u8; 16];
        assert_eq!(read(&storage, "/lfs/data", 8, &mut buf).unwrap(), 2);
    }

    #[test]
    fn test_read_past_end_of_file_is_empty() {
        let (storage, _) = setup();
        storage.insert_file("/lfs/data", b"0123456789");

        let mut buf = [0u8; 4];
        assert_eq!(read(&storage, "/lfs/data", 10, &mut buf).unwrap(), 0);
        assert_eq!(read(&storage, "/lfs/data", 20, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_checks_entry() {
        let (storage, _) = setup();
        storage.insert_file("/lfs/dir/f", b"x");
        let mut buf = [0u8; 4];

        assert!(matches!(
            read(&storage, "/lfs/missing", 0, &mut buf),
            Err(FsuError::NotFound(_))
        ));
        assert!(matches!(
            read(&storage, "/lfs/dir", 0, &mut buf),
            Err(FsuError::IsADirectory(_))
        ));
    }

    #[test]
    fn test_short_write_is_disk_full() {
        let (storage, config) = setup();
        storage.set_faults(Faults {
            write_limit: Some(4),
            ..Faults::default()
        });
        assert!(matches!(
            write(&storage, "/lfs/big", b"0123456789", &config),
            Err(FsuError::DiskFull {
                written: 4,
                requested: 10
            })
        ));
    }

    #[test]
    fn test_silent_short_write_caught_by_size_check() {
        let (storage, mut config) = setup();
        storage.set_faults(Faults {
            silent_write_limit: Some(3),
            ..Faults::default()
        });
        assert!(matches!(
            write(&storage, "/lfs/f", b"12345678", &config),
            Err(FsuError::IoError(_))
        ));

        config.rewrite_size_check = false;
        assert_eq!(write(&storage, "/lfs/f", b"12345678", &config).unwrap(), 8);
    }

    #[test]
    fn test_close_failure_reported_only_without_earlier_error() {
        let (storage, config) = setup();
        storage.set_faults(Faults {
            fail_close: true,
            ..Faults::default()
        });
        assert!(matches!(
            append(&storage, "/lfs/f", b"abc", &config),
            Err(FsuError::IoError(_))
        ));

        storage.set_faults(Faults {
            fail_close: true,
            write_limit: Some(1),
            ..Faults::default()
        });
        assert!(matches!(
            append(&storage, "/lfs/f", b"abc", &config),
            Err(FsuError::DiskFull { .. })
        ));
    }

    #[test]
    fn test_exists_unique() {
        let (storage, _) = setup();
        storage.insert_file("/lfs/app_1.0.bin", b"12345");
        storage.insert_file("/lfs/app_2.0.bin", b"123");
        storage.insert_file("/lfs/cfg.json", b"{}");

        assert_eq!(
            exists_unique(&storage, "/lfs", "cfg", EntryKind::File).unwrap(),
            2
        );
        assert!(matches!(
            exists_unique(&storage, "/lfs", "app_", EntryKind::File),
            Err(FsuError::AmbiguousMatch { count: 2, .. })
        ));
        assert!(matches!(
            exists_unique(&storage, "/lfs", "cfg", EntryKind::Directory),
            Err(FsuError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_passes_storage_error_through() {
        let (storage, _) = setup();
        assert!(matches!(
            delete(&storage, "/lfs/none"),
            Err(FsuError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[test]
    fn test_name_forms() {
        let (storage, config) = setup();
        write_in(&storage, "/lfs", "n.txt", b"hello", &config).unwrap();
        append_in(&storage, "/lfs", "n.txt", b"!", &config).unwrap();
        assert_eq!(size_in(&storage, "/lfs", "n.txt", &config).unwrap(), 6);

        let mut buf = [0u8; 8];
        assert_eq!(read_in(&storage, "/lfs", "n.txt", &mut buf, &config).unwrap(), 6);
        assert_eq!(&buf[..6], b"hello!");

        delete_in(&storage, "/lfs", "n.txt", &config).unwrap();
        assert!(!storage.exists("/lfs/n.txt"));
    }
}
