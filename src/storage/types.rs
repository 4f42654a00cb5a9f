//! Storage types
//!
//! Values exchanged across the storage boundary.

/// Classification of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Single-letter tag used in listings
    pub fn tag(&self) -> char {
        match self {
            EntryKind::File => 'F',
            EntryKind::Directory => 'D',
        }
    }
}

/// A directory entry as reported by `stat` and `readdir`
///
/// `readdir` signals the end of a directory with an entry whose name is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    /// File size in bytes (0 for directories)
    pub size: u64,
}

impl DirEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: 0,
        }
    }

    /// The end-of-directory marker
    pub fn end() -> Self {
        Self::file(String::new(), 0)
    }

    pub fn is_end(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Flags passed to `Storage::open`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub append: bool,
}

impl OpenMode {
    pub const fn new() -> Self {
        Self {
            read: false,
            write: false,
            create: false,
            append: false,
        }
    }

    pub const fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub const fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    pub const fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub const fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Open an existing file for reading
    pub const fn read_only() -> Self {
        Self::new().read(true)
    }

    /// Create if missing, write from the start
    pub const fn rewrite() -> Self {
        Self::new().write(true).create(true)
    }

    /// Create if missing, write at the end
    pub const fn append_mode() -> Self {
        Self::new().write(true).create(true).append(true)
    }
}

/// Volume statistics reported by `statvfs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeStats {
    /// Optimal transfer block size
    pub block_size: u64,
    /// Allocation unit size
    pub fragment_size: u64,
    pub free_blocks: u64,
}
