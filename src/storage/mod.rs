//! Storage boundary
//!
//! The storage API the utility layer is written against, and the backends
//! that implement it.

pub mod api;
pub mod host;
pub mod memory;
pub mod types;

pub use api::Storage;
pub use host::HostStorage;
pub use memory::{Faults, MemoryStorage};
pub use types::{DirEntry, EntryKind, OpenMode, VolumeStats};
