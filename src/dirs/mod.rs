//! Directory management
//!
//! Recursive creation, bulk deletion and listings built on the storage
//! directory primitives.

mod operations;

pub use operations::{delete_matching, last_history_file, list_directory, mkdir, mkdir_recursive};
