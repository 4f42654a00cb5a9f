//! Host directory backend
//!
//! Maps the volume's mount point onto a directory of the host file system.

use log::{debug, info};
use std::fs::{self, File, OpenOptions, ReadDir};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::StorageError;
use crate::storage::api::Storage;
use crate::storage::types::{DirEntry, OpenMode, VolumeStats};

/// Storage backed by a host directory
pub struct HostStorage {
    mount_point: String,
    root: PathBuf,
    mounted: AtomicBool,
}

/// Open file on a host volume
pub struct HostFile {
    file: File,
    writable: bool,
}

/// Open directory on a host volume
pub struct HostDir {
    entries: ReadDir,
}

impl HostStorage {
    pub fn new(mount_point: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            mount_point: mount_point.into(),
            root: root.into(),
            mounted: AtomicBool::new(false),
        }
    }

    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Translate a volume path into a host path below the root
    fn real_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        if !self.mounted.load(Ordering::Acquire) {
            return Err(StorageError::NotMounted);
        }

        let relative = if path == self.mount_point {
            ""
        } else {
            path.strip_prefix(self.mount_point.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?
        };

        let mut real = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => real.push(part),
                Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(path.to_string())),
            }
        }
        Ok(real)
    }

    fn entry_from_metadata(name: String, metadata: &fs::Metadata) -> DirEntry {
        if metadata.is_dir() {
            DirEntry::directory(name)
        } else {
            DirEntry::file(name, metadata.len())
        }
    }
}

impl Storage for HostStorage {
    type File = HostFile;
    type Dir = HostDir;

    fn mount(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        if !self.root.is_dir() {
            return Err(StorageError::NotADirectory(
                self.root.to_string_lossy().to_string(),
            ));
        }
        self.mounted.store(true, Ordering::Release);
        info!(
            "Mounted {} at host directory {}",
            self.mount_point,
            self.root.display()
        );
        Ok(())
    }

    fn statvfs(&self, path: &str) -> Result<VolumeStats, StorageError> {
        let real = self.real_path(path)?;

        #[cfg(unix)]
        {
            use rustix::fs::statvfs;

            let stat = statvfs(real.as_path())
                .map_err(|e| StorageError::from(io::Error::from(e)))?;

            Ok(VolumeStats {
                block_size: stat.f_bsize,
                fragment_size: stat.f_frsize,
                free_blocks: stat.f_bfree,
            })
        }

        #[cfg(not(unix))]
        {
            let _ = real;
            Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Unsupported,
                "volume statistics are not available on this platform",
            )))
        }
    }

    fn open(&self, path: &str, mode: OpenMode) -> Result<Self::File, StorageError> {
        let real = self.real_path(path)?;
        if real.is_dir() {
            return Err(StorageError::IsADirectory(path.to_string()));
        }

        let file = OpenOptions::new()
            .read(mode.read)
            .write(mode.write && !mode.append)
            .append(mode.append)
            .create(mode.create)
            .open(&real)?;
        debug!("Opened {} ({:?})", path, mode);

        Ok(HostFile {
            file,
            writable: mode.write,
        })
    }

    fn read(&self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, StorageError> {
        let mut filled = 0;
        while filled < buf.len() {
            match file.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    fn write(&self, file: &mut Self::File, buf: &[u8]) -> Result<usize, StorageError> {
        let mut written = 0;
        while written < buf.len() {
            match file.file.write(&buf[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if written > 0 => {
                    debug!("Write stopped after {} bytes: {}", written, e);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(written)
    }

    fn seek(&self, file: &mut Self::File, offset: u64) -> Result<(), StorageError> {
        file.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn truncate(&self, file: &mut Self::File, len: u64) -> Result<(), StorageError> {
        file.file.set_len(len)?;
        Ok(())
    }

    fn close(&self, file: Self::File) -> Result<(), StorageError> {
        if file.writable {
            file.file.sync_all()?;
        }
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<DirEntry, StorageError> {
        let real = self.real_path(path)?;
        let metadata = fs::metadata(&real)?;
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Ok(Self::entry_from_metadata(name, &metadata))
    }

    fn opendir(&self, path: &str) -> Result<Self::Dir, StorageError> {
        let real = self.real_path(path)?;
        if real.is_file() {
            return Err(StorageError::NotADirectory(path.to_string()));
        }
        Ok(HostDir {
            entries: fs::read_dir(&real)?,
        })
    }

    fn readdir(&self, dir: &mut Self::Dir) -> Result<DirEntry, StorageError> {
        match dir.entries.next() {
            Some(entry) => {
                let entry = entry?;
                let metadata = entry.metadata()?;
                let name = entry.file_name().to_string_lossy().to_string();
                Ok(Self::entry_from_metadata(name, &metadata))
            }
            None => Ok(DirEntry::end()),
        }
    }

    fn closedir(&self, _dir: Self::Dir) -> Result<(), StorageError> {
        Ok(())
    }

    fn mkdir(&self, path: &str) -> Result<(), StorageError> {
        let real = self.real_path(path)?;
        fs::create_dir(&real)?;
        debug!("Created directory {}", path);
        Ok(())
    }

    fn unlink(&self, path: &str) -> Result<(), StorageError> {
        let real = self.real_path(path)?;
        if real.is_dir() {
            fs::remove_dir(&real)?;
        } else {
            fs::remove_file(&real)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_path_requires_mount() {
        let storage = HostStorage::new("/lfs", "/tmp/unused");
        assert!(matches!(
            storage.real_path("/lfs/a"),
            Err(StorageError::NotMounted)
        ));
    }

    #[test]
    fn test_real_path_stays_under_root() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = HostStorage::new("/lfs", tmp.path());
        storage.mount().unwrap();

        assert_eq!(storage.real_path("/lfs").unwrap(), tmp.path());
        assert_eq!(
            storage.real_path("/lfs/a/b.txt").unwrap(),
            tmp.path().join("a").join("b.txt")
        );
        assert!(storage.real_path("/lfs/../etc").is_err());
        assert!(storage.real_path("/lfsx/a").is_err());
        assert!(storage.real_path("/other").is_err());
    }

    #[test]
    fn test_mount_creates_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("lfs_root");
        let storage = HostStorage::new("/lfs", &root);

        storage.mount().unwrap();
        assert!(root.is_dir());
        assert!(storage.stat("/lfs").unwrap().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_statvfs_reports_volume() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = HostStorage::new("/lfs", tmp.path());
        assert!(matches!(
            storage.statvfs("/lfs"),
            Err(StorageError::NotMounted)
        ));

        storage.mount().unwrap();
        let stats = storage.statvfs("/lfs").unwrap();
        assert!(stats.block_size > 0);
        assert!(stats.fragment_size > 0);
    }
}
