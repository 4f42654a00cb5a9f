//! In-memory backend
//!
//! A volume held entirely in memory, with fault injection for exercising
//! short writes, short reads, failing unlinks and directories that change
//! between two enumeration passes.

use log::{debug, info};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Mutex, MutexGuard};

use crate::error::StorageError;
use crate::storage::api::Storage;
use crate::storage::types::{DirEntry, OpenMode, VolumeStats};

const BLOCK_SIZE: u64 = 4096;
const DEFAULT_CAPACITY_BLOCKS: u64 = 256;

/// Failures injected into a `MemoryStorage`
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Number of upcoming mount attempts that fail
    pub fail_mounts: usize,
    /// The Nth unlink call (1-based, counted from now) fails
    pub fail_unlink_at: Option<usize>,
    /// Each write call accepts at most this many bytes
    pub write_limit: Option<usize>,
    /// Each write call reports success but keeps at most this many bytes,
    /// dropping everything after them
    pub silent_write_limit: Option<usize>,
    /// Each read call returns at most this many bytes
    pub read_limit: Option<usize>,
    /// Every close call fails after the handle is released
    pub fail_close: bool,
    /// On the Nth opendir call (1-based, counted from now) remove this entry first
    pub remove_on_opendir: Option<(usize, String)>,
    /// The Nth readdir call (1-based, counted from now) fails
    pub fail_readdir_at: Option<usize>,
}

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct Counters {
    mounts: usize,
    mkdirs: usize,
    unlinks: usize,
    opendirs: usize,
    readdirs: usize,
}

#[derive(Debug)]
struct Volume {
    mounted: bool,
    nodes: BTreeMap<String, Node>,
    faults: Faults,
    counters: Counters,
}

/// Open file on a memory volume
#[derive(Debug)]
pub struct MemoryFile {
    path: String,
    position: usize,
    mode: OpenMode,
}

/// Open directory on a memory volume; iteration resumes after `last`
#[derive(Debug)]
pub struct MemoryDir {
    path: String,
    last: Option<String>,
}

/// Storage held in memory
#[derive(Debug)]
pub struct MemoryStorage {
    mount_point: String,
    capacity_blocks: u64,
    volume: Mutex<Volume>,
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => "",
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl MemoryStorage {
    pub fn new(mount_point: impl Into<String>) -> Self {
        let mount_point = mount_point.into();
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        nodes.insert(mount_point.clone(), Node::Dir);

        Self {
            mount_point,
            capacity_blocks: DEFAULT_CAPACITY_BLOCKS,
            volume: Mutex::new(Volume {
                mounted: false,
                nodes,
                faults: Faults::default(),
                counters: Counters::default(),
            }),
        }
    }

    /// Create a volume that is already mounted
    pub fn mounted(mount_point: impl Into<String>) -> Self {
        let storage = Self::new(mount_point);
        storage.lock().mounted = true;
        storage
    }

    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    fn lock(&self) -> MutexGuard<'_, Volume> {
        self.volume.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_faults(&self, faults: Faults) {
        let mut volume = self.lock();
        volume.faults = faults;
        volume.counters.unlinks = 0;
        volume.counters.opendirs = 0;
        volume.counters.readdirs = 0;
    }

    pub fn clear_faults(&self) {
        self.set_faults(Faults::default());
    }

    /// Insert a file directly, creating missing parent directories
    pub fn insert_file(&self, path: &str, data: &[u8]) {
        let mut volume = self.lock();
        let mut parent = parent_of(path);
        let mut missing = Vec::new();
        while !parent.is_empty() && parent != "/" && !volume.nodes.contains_key(parent) {
            missing.push(parent.to_string());
            parent = parent_of(parent);
        }
        for dir in missing {
            volume.nodes.insert(dir, Node::Dir);
        }
        volume
            .nodes
            .insert(path.to_string(), Node::File(data.to_vec()));
    }

    /// Contents of a file, if it exists
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        match self.lock().nodes.get(path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(path)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.lock().nodes.get(path), Some(Node::Dir))
    }

    /// Number of successful `mount` calls
    pub fn mount_count(&self) -> usize {
        self.lock().counters.mounts
    }

    /// Number of successful `mkdir` calls
    pub fn mkdir_count(&self) -> usize {
        self.lock().counters.mkdirs
    }

    fn check_mounted(volume: &Volume) -> Result<(), StorageError> {
        if volume.mounted {
            Ok(())
        } else {
            Err(StorageError::NotMounted)
        }
    }

    fn check_parent(volume: &Volume, path: &str) -> Result<(), StorageError> {
        let parent = parent_of(path);
        match volume.nodes.get(parent) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(StorageError::NotADirectory(parent.to_string())),
            None => Err(StorageError::NotFound(parent.to_string())),
        }
    }

    fn used_blocks(volume: &Volume) -> u64 {
        volume
            .nodes
            .values()
            .map(|node| match node {
                Node::File(data) => (data.len() as u64).div_ceil(BLOCK_SIZE),
                Node::Dir => 1,
            })
            .sum()
    }

    fn injected(message: &str) -> StorageError {
        StorageError::Io(io::Error::other(message.to_string()))
    }
}

impl Storage for MemoryStorage {
    type File = MemoryFile;
    type Dir = MemoryDir;

    fn mount(&self) -> Result<(), StorageError> {
        let mut volume = self.lock();
        if volume.faults.fail_mounts > 0 {
            volume.faults.fail_mounts -= 1;
            return Err(Self::injected("injected mount failure"));
        }
        volume.mounted = true;
        volume.counters.mounts += 1;
        info!("Mounted memory volume at {}", self.mount_point);
        Ok(())
    }

    fn statvfs(&self, _path: &str) -> Result<VolumeStats, StorageError> {
        let volume = self.lock();
        Self::check_mounted(&volume)?;
        Ok(VolumeStats {
            block_size: BLOCK_SIZE,
            fragment_size: BLOCK_SIZE,
            free_blocks: self
                .capacity_blocks
                .saturating_sub(Self::used_blocks(&volume)),
        })
    }

    fn open(&self, path: &str, mode: OpenMode) -> Result<Self::File, StorageError> {
        let mut volume = self.lock();
        Self::check_mounted(&volume)?;

        let position = match volume.nodes.get(path) {
            Some(Node::Dir) => return Err(StorageError::IsADirectory(path.to_string())),
            Some(Node::File(data)) => {
                if mode.append {
                    data.len()
                } else {
                    0
                }
            }
            None if mode.create => {
                Self::check_parent(&volume, path)?;
                volume.nodes.insert(path.to_string(), Node::File(Vec::new()));
                0
            }
            None => return Err(StorageError::NotFound(path.to_string())),
        };

        Ok(MemoryFile {
            path: path.to_string(),
            position,
            mode,
        })
    }

    fn read(&self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, StorageError> {
        let volume = self.lock();
        if !file.mode.read {
            return Err(StorageError::Io(io::Error::from(io::ErrorKind::PermissionDenied)));
        }
        let data = match volume.nodes.get(&file.path) {
            Some(Node::File(data)) => data,
            _ => return Err(StorageError::NotFound(file.path.clone())),
        };

        if file.position >= data.len() {
            return Ok(0);
        }
        let available = data.len() - file.position;
        let mut count = buf.len().min(available);
        if let Some(limit) = volume.faults.read_limit {
            count = count.min(limit);
        }
        buf[..count].copy_from_slice(&data[file.position..file.position + count]);
        file.position += count;
        Ok(count)
    }

    fn write(&self, file: &mut Self::File, buf: &[u8]) -> Result<usize, StorageError> {
        let mut volume = self.lock();
        if !file.mode.write {
            return Err(StorageError::Io(io::Error::from(io::ErrorKind::PermissionDenied)));
        }

        let accepted = match volume.faults.write_limit {
            Some(limit) => buf.len().min(limit),
            None => buf.len(),
        };
        let stored = match volume.faults.silent_write_limit {
            Some(limit) => accepted.min(limit),
            None => accepted,
        };

        let data = match volume.nodes.get_mut(&file.path) {
            Some(Node::File(data)) => data,
            _ => return Err(StorageError::NotFound(file.path.clone())),
        };
        if file.mode.append {
            file.position = data.len();
        }
        let end = file.position + stored;
        if data.len() < end {
            data.resize(end, 0);
        }
        data[file.position..end].copy_from_slice(&buf[..stored]);
        if stored < accepted {
            data.truncate(end);
        }
        file.position += accepted;
        Ok(accepted)
    }

    fn seek(&self, file: &mut Self::File, offset: u64) -> Result<(), StorageError> {
        file.position = usize::try_from(offset)
            .map_err(|_| StorageError::InvalidPath(file.path.clone()))?;
        Ok(())
    }

    fn truncate(&self, file: &mut Self::File, len: u64) -> Result<(), StorageError> {
        let mut volume = self.lock();
        let len = usize::try_from(len).map_err(|_| StorageError::NoSpace)?;
        match volume.nodes.get_mut(&file.path) {
            Some(Node::File(data)) => {
                data.resize(len, 0);
                Ok(())
            }
            _ => Err(StorageError::NotFound(file.path.clone())),
        }
    }

    fn close(&self, file: Self::File) -> Result<(), StorageError> {
        if self.lock().faults.fail_close {
            return Err(Self::injected("injected close failure"));
        }
        debug!("Closed {}", file.path);
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<DirEntry, StorageError> {
        let volume = self.lock();
        Self::check_mounted(&volume)?;
        match volume.nodes.get(path) {
            Some(Node::File(data)) => Ok(DirEntry::file(name_of(path), data.len() as u64)),
            Some(Node::Dir) => Ok(DirEntry::directory(name_of(path))),
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }

    fn opendir(&self, path: &str) -> Result<Self::Dir, StorageError> {
        let mut volume = self.lock();
        Self::check_mounted(&volume)?;

        volume.counters.opendirs += 1;
        let call = volume.counters.opendirs;
        if let Some((at, victim)) = volume.faults.remove_on_opendir.clone() {
            if at == call {
                debug!("Removing {} before opendir #{}", victim, call);
                volume.nodes.remove(&victim);
            }
        }

        match volume.nodes.get(path) {
            Some(Node::Dir) => Ok(MemoryDir {
                path: path.to_string(),
                last: None,
            }),
            Some(Node::File(_)) => Err(StorageError::NotADirectory(path.to_string())),
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }

    fn readdir(&self, dir: &mut Self::Dir) -> Result<DirEntry, StorageError> {
        let mut volume = self.lock();
        volume.counters.readdirs += 1;
        if volume.faults.fail_readdir_at == Some(volume.counters.readdirs) {
            return Err(Self::injected("injected readdir failure"));
        }

        let prefix = if dir.path.ends_with('/') {
            dir.path.clone()
        } else {
            format!("{}/", dir.path)
        };

        let next = volume
            .nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| key.len() > prefix.len() && !key[prefix.len()..].contains('/'))
            .find(|(key, _)| dir.last.as_deref().is_none_or(|last| key.as_str() > last));

        match next {
            Some((key, node)) => {
                dir.last = Some(key.clone());
                let name = &key[prefix.len()..];
                Ok(match node {
                    Node::File(data) => DirEntry::file(name, data.len() as u64),
                    Node::Dir => DirEntry::directory(name),
                })
            }
            None => Ok(DirEntry::end()),
        }
    }

    fn closedir(&self, _dir: Self::Dir) -> Result<(), StorageError> {
        Ok(())
    }

    fn mkdir(&self, path: &str) -> Result<(), StorageError> {
        let mut volume = self.lock();
        Self::check_mounted(&volume)?;
        if volume.nodes.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        Self::check_parent(&volume, path)?;
        volume.nodes.insert(path.to_string(), Node::Dir);
        volume.counters.mkdirs += 1;
        Ok(())
    }

    fn unlink(&self, path: &str) -> Result<(), StorageError> {
        let mut volume = self.lock();
        Self::check_mounted(&volume)?;

        volume.counters.unlinks += 1;
        if volume.faults.fail_unlink_at == Some(volume.counters.unlinks) {
            return Err(Self::injected("injected unlink failure"));
        }

        match volume.nodes.get(path) {
            None => Err(StorageError::NotFound(path.to_string())),
            Some(Node::Dir) => {
                let prefix = format!("{}/", path);
                if volume.nodes.keys().any(|key| key.starts_with(&prefix)) {
                    return Err(StorageError::Io(io::Error::from(
                        io::ErrorKind::DirectoryNotEmpty,
                    )));
                }
                volume.nodes.remove(path);
                Ok(())
            }
            Some(Node::File(_)) => {
                volume.nodes.remove(path);
                Ok(())
            }
        }
    }
}
