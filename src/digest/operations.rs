//! Streaming file digests
//!
//! The file is read in fixed-size chunks and fed to an accumulator, so the
//! memory used does not depend on the file size.

use log::{debug, error};

use crate::config::FsuConfig;
use crate::digest::accumulator::{Accumulator, Algorithm, DigestValue};
use crate::error::{FsuError, FsuResult};
use crate::files::close_after;
use crate::path::resolve;
use crate::storage::{OpenMode, Storage};

/// Digest the first `size` bytes of the file at `path`.
///
/// `size` is the exact expected length: a short read is an error.
pub fn digest<S: Storage>(
    storage: &S,
    path: &str,
    size: u64,
    algorithm: Algorithm,
    config: &FsuConfig,
) -> FsuResult<DigestValue> {
    let mut out = algorithm.zeroed();
    digest_into(storage, path, size, algorithm, config, &mut out)?;
    Ok(out)
}

/// Digest into `out`, which is zeroed first and stays zeroed on failure
pub fn digest_into<S: Storage>(
    storage: &S,
    path: &str,
    size: u64,
    algorithm: Algorithm,
    config: &FsuConfig,
    out: &mut DigestValue,
) -> FsuResult<()> {
    *out = algorithm.zeroed();

    if path.is_empty() {
        return Err(FsuError::InvalidInput("empty path".into()));
    }
    let accumulator = algorithm.accumulator()?;

    let mut file = storage.open(path, OpenMode::read_only())?;
    let result = stream(
        storage,
        &mut file,
        path,
        size,
        algorithm.chunk_size(config),
        accumulator,
    );
    let closed = storage.close(file);
    *out = close_after(result, closed, path)?;

    debug!("{} {} = {}", algorithm.name(), path, out);
    Ok(())
}

/// Digest `dir/name`
pub fn digest_in<S: Storage>(
    storage: &S,
    dir: &str,
    name: &str,
    size: u64,
    algorithm: Algorithm,
    config: &FsuConfig,
) -> FsuResult<DigestValue> {
    let path = resolve(dir, name, config)?;
    digest(storage, &path, size, algorithm, config)
}

fn stream<S: Storage>(
    storage: &S,
    file: &mut S::File,
    path: &str,
    size: u64,
    chunk_size: usize,
    mut accumulator: Box<dyn Accumulator>,
) -> FsuResult<DigestValue> {
    if chunk_size == 0 && size > 0 {
        return Err(FsuError::InvalidInput("zero chunk size".into()));
    }

    let buffer_len = usize::try_from(size).map_or(chunk_size, |size| size.min(chunk_size));
    let mut buffer: Vec<u8> = Vec::new();
    if let Err(e) = buffer.try_reserve_exact(buffer_len) {
        error!("Unable to allocate {} byte digest buffer: {}", buffer_len, e);
        return Err(FsuError::OutOfMemory(format!("{} byte digest buffer", buffer_len)));
    }
    buffer.resize(buffer_len, 0);

    let mut remaining = size;
    while remaining > 0 {
        let length = usize::try_from(remaining).map_or(buffer_len, |rem| rem.min(buffer_len));
        let bytes_read = match storage.read(file, &mut buffer[..length]) {
            Ok(n) => n,
            Err(e) => {
                error!("Read of {} failed with {} bytes left: {}", path, remaining, e);
                return Err(FsuError::IoError(format!("read {}: {}", path, e)));
            }
        };
        if bytes_read != length {
            error!(
                "Short read of {}: {} of {} bytes with {} left",
                path, bytes_read, length, remaining
            );
            return Err(FsuError::IoError(format!(
                "short read of {} ({} of {} bytes)",
                path, bytes_read, length
            )));
        }
        accumulator.update(&buffer[..length]);
        remaining -= length as u64;
    }

    Ok(accumulator.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Faults, MemoryStorage};

    fn setup(body: &[u8]) -> (MemoryStorage, FsuConfig) {
        let storage = MemoryStorage::mounted("/lfs");
        storage.insert_file("/lfs/fw.bin", body);
        let config = FsuConfig {
            hash_chunk_size: 4,
            checksum_chunk_size: 3,
            ..FsuConfig::default()
        };
        (storage, config)
    }

    #[test]
    fn test_crc32_over_several_chunks() {
        let (storage, config) = setup(b"123456789");
        let value = digest(&storage, "/lfs/fw.bin", 9, Algorithm::Crc32, &config).unwrap();
        assert_eq!(value, DigestValue::Crc32(0xcbf4_3926));
    }

    #[cfg(feature = "hash")]
    #[test]
    fn test_sha256_of_empty_file_is_not_zero() {
        let (storage, config) = setup(b"");
        let value = digest(&storage, "/lfs/fw.bin", 0, Algorithm::Sha256, &config).unwrap();
        assert!(!value.is_zero());
        assert_eq!(
            value.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_size_larger_than_file_is_io_error_and_zeroed() {
        let (storage, config) = setup(b"123456789");
        let mut out = DigestValue::Crc32(0xdead_beef);
        let result = digest_into(&storage, "/lfs/fw.bin", 12, Algorithm::Crc32, &config, &mut out);
        assert!(matches!(result, Err(FsuError::IoError(_))));
        assert_eq!(out, DigestValue::Crc32(0));
    }

    #[test]
    fn test_short_read_aborts() {
        let (storage, config) = setup(b"123456789");
        storage.set_faults(Faults {
            read_limit: Some(2),
            ..Faults::default()
        });
        assert!(matches!(
            digest(&storage, "/lfs/fw.bin", 9, Algorithm::Crc32, &config),
            Err(FsuError::IoError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let (storage, config) = setup(b"");
        assert!(matches!(
            digest(&storage, "/lfs/none", 1, Algorithm::Crc32, &config),
            Err(FsuError::NotFound(_))
        ));
    }

    #[test]
    fn test_prefix_digest() {
        let (storage, config) = setup(b"123456789trailing");
        let value = digest_in(&storage, "/lfs", "fw.bin", 9, Algorithm::Crc32, &config).unwrap();
        assert_eq!(value, DigestValue::Crc32(0xcbf4_3926));
    }
}
