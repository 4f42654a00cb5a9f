//! Digest accumulators
//!
//! Streaming state for the supported hash and checksum algorithms. An
//! accumulator is fed chunks in order and consumed by `finalize`.

use std::fmt;

use crate::config::FsuConfig;
use crate::error::{FsuError, FsuResult};

/// Size of a SHA-256 digest in bytes
pub const HASH_SIZE: usize = 32;

/// Streaming digest state
pub trait Accumulator {
    fn update(&mut self, chunk: &[u8]);

    fn finalize(self: Box<Self>) -> DigestValue;
}

/// Digest algorithms the engine can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// SHA-256 cryptographic hash
    Sha256,
    /// CRC-32 (IEEE) checksum
    Crc32,
}

/// Output of a digest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestValue {
    Sha256([u8; HASH_SIZE]),
    Crc32(u32),
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Crc32 => "crc32",
        }
    }

    /// The value reported before, or instead of, a completed run
    pub fn zeroed(&self) -> DigestValue {
        match self {
            Algorithm::Sha256 => DigestValue::Sha256([0; HASH_SIZE]),
            Algorithm::Crc32 => DigestValue::Crc32(0),
        }
    }

    /// Bytes read per chunk for this algorithm
    pub fn chunk_size(&self, config: &FsuConfig) -> usize {
        match self {
            Algorithm::Sha256 => config.hash_chunk_size,
            Algorithm::Crc32 => config.checksum_chunk_size,
        }
    }

    /// Fresh accumulator for this algorithm
    pub fn accumulator(&self) -> FsuResult<Box<dyn Accumulator>> {
        match self {
            #[cfg(feature = "hash")]
            Algorithm::Sha256 => Ok(Box::new(Sha256Accumulator::new())),
            #[cfg(not(feature = "hash"))]
            Algorithm::Sha256 => Err(FsuError::Unsupported("sha256 support is not compiled in")),
            Algorithm::Crc32 => Ok(Box::new(Crc32Accumulator::new())),
        }
    }
}

impl DigestValue {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            DigestValue::Sha256(_) => Algorithm::Sha256,
            DigestValue::Crc32(_) => Algorithm::Crc32,
        }
    }

    pub fn to_hex(&self) -> String {
        match self {
            DigestValue::Sha256(hash) => hex::encode(hash),
            DigestValue::Crc32(checksum) => hex::encode(checksum.to_be_bytes()),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            DigestValue::Sha256(hash) => hash.iter().all(|&b| b == 0),
            DigestValue::Crc32(checksum) => *checksum == 0,
        }
    }
}

impl fmt::Display for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Algorithm {
    type Err = FsuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Algorithm::Sha256),
            "crc32" => Ok(Algorithm::Crc32),
            other => Err(FsuError::InvalidInput(format!("unknown algorithm {}", other))),
        }
    }
}

#[cfg(feature = "hash")]
pub struct Sha256Accumulator {
    hasher: sha2::Sha256,
}

#[cfg(feature = "hash")]
impl Sha256Accumulator {
    pub fn new() -> Self {
        use sha2::Digest;
        Self {
            hasher: sha2::Sha256::new(),
        }
    }
}

#[cfg(feature = "hash")]
impl Default for Sha256Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "hash")]
impl Accumulator for Sha256Accumulator {
    fn update(&mut self, chunk: &[u8]) {
        use sha2::Digest;
        self.hasher.update(chunk);
    }

    fn finalize(self: Box<Self>) -> DigestValue {
        use sha2::Digest;
        DigestValue::Sha256(self.hasher.finalize().into())
    }
}

pub struct Crc32Accumulator {
    hasher: crc32fast::Hasher,
}

impl Crc32Accumulator {
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }
}

impl Default for Crc32Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator for Crc32Accumulator {
    fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    fn finalize(self: Box<Self>) -> DigestValue {
        DigestValue::Crc32(self.hasher.finalize())
    }
}
