//! Find module
//!
//! Enumerates directory entries matching a name substring and entry kind.

mod operations;
mod results;

pub(crate) use operations::for_each_entry;
pub use operations::find;
pub use results::EntrySet;
