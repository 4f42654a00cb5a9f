//! Configuration management for the file system utilities
//!
//! Values are loaded once at startup from an optional `fsu.toml` with
//! `FSU_*` environment overrides, e.g. `FSU_HASH_CHUNK_SIZE=4096`.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Utility layer configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FsuConfig {
    /// Root of the single namespace, e.g. `/lfs`
    pub mount_point: String,

    /// Host directory backing the mount point (binary only)
    pub host_root: String,

    /// Buffer size for directory paths, terminator included
    pub max_path_size: usize,

    /// Buffer size for file names, terminator included
    pub max_file_name_size: usize,

    /// Bytes fed to the hash accumulator per read
    pub hash_chunk_size: usize,

    /// Bytes fed to the checksum accumulator per read
    pub checksum_chunk_size: usize,

    /// Re-stat rewritten files and fail when the size is not the one requested
    pub rewrite_size_check: bool,
}

impl Default for FsuConfig {
    fn default() -> Self {
        Self {
            mount_point: "/lfs".to_string(),
            host_root: "./lfs_root".to_string(),
            max_path_size: 128,
            max_file_name_size: 64,
            hash_chunk_size: 1024,
            checksum_chunk_size: 1024,
            rewrite_size_check: true,
        }
    }
}

impl FsuConfig {
    /// Load configuration from fsu.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("fsu").required(false))
            .add_source(Environment::with_prefix("FSU").try_parsing(true))
            .build()?;

        let config: FsuConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Longest absolute path (directory + separator + name) in characters
    pub fn max_abs_path_len(&self) -> usize {
        (self.max_path_size + self.max_file_name_size).saturating_sub(2)
    }

    /// Longest file name in characters
    pub fn max_file_name_len(&self) -> usize {
        self.max_file_name_size.saturating_sub(1)
    }

    /// Get the host root as PathBuf
    pub fn host_root_path(&self) -> PathBuf {
        PathBuf::from(&self.host_root)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !self.mount_point.starts_with('/') || self.mount_point.len() < 2 {
            return Err(config::ConfigError::Message(
                "mount_point must be an absolute path below /".into(),
            ));
        }

        if self.mount_point.ends_with('/') || self.mount_point[1..].contains('/') {
            return Err(config::ConfigError::Message(
                "mount_point must be a single path segment without a trailing slash".into(),
            ));
        }

        if self.max_path_size <= self.mount_point.len() {
            return Err(config::ConfigError::Message(
                "max_path_size must leave room beyond the mount point".into(),
            ));
        }

        if self.max_file_name_size < 2 {
            return Err(config::ConfigError::Message(
                "max_file_name_size must be at least 2".into(),
            ));
        }

        if self.hash_chunk_size == 0 || self.checksum_chunk_size == 0 {
            return Err(config::ConfigError::Message(
                "chunk sizes must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FsuConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_abs_path_len(), 190);
        assert_eq!(config.max_file_name_len(), 63);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = FsuConfig {
            hash_chunk_size: 0,
            ..FsuConfig::default()
        };
        assert!(config.validate().is_err());

        let config = FsuConfig {
            mount_point: "lfs".into(),
            ..FsuConfig::default()
        };
        assert!(config.validate().is_err());

        let config = FsuConfig {
            mount_point: "/lfs/".into(),
            ..FsuConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
