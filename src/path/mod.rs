//! Path module
//!
//! Pure string handling for absolute paths: normalization and
//! directory/name resolution. No storage access happens here.

mod normalize;
mod resolve;

pub use normalize::normalize;
pub use resolve::{JoinedPath, join, resolve};
