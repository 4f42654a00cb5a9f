//! File system utilities over an embedded flash volume
//!
//! Path normalization, name resolution, directory search, whole-file I/O,
//! streaming digests and directory management, all written against the
//! `Storage` trait so they run on the device volume or a host directory.

pub mod config;
pub mod digest;
pub mod dirs;
pub mod error;
pub mod files;
pub mod find;
pub mod mount;
pub mod path;
pub mod shell;
pub mod storage;
pub mod utils;

pub use config::FsuConfig;
pub use error::{FsuError, FsuResult, StorageError};
pub use mount::MountGate;
pub use storage::{DirEntry, EntryKind, HostStorage, MemoryStorage, Storage};
