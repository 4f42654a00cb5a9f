//! Files module
//!
//! Whole-file operations by absolute path or by directory and name.

mod operations;

pub(crate) use operations::close_after;
pub use operations::{
    append, append_in, delete, delete_in, exists_unique, read, read_in, size, size_in, write,
    write_in,
};
