//! Digest module
//!
//! Computes a hash or checksum over a file by streaming it through an
//! accumulator in fixed-size chunks.

pub mod accumulator;
mod operations;

#[cfg(feature = "hash")]
pub use accumulator::Sha256Accumulator;
pub use accumulator::{Accumulator, Algorithm, Crc32Accumulator, DigestValue, HASH_SIZE};
pub use operations::{digest, digest_in, digest_into};
