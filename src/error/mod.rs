//! Error handling
//!
//! Defines error types and errno translation for the utility layer.

pub mod handlers;
pub mod types;

pub use types::*;
