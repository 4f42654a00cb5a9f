//! Name resolution
//!
//! Builds absolute paths from a directory and an entry name.

use crate::config::FsuConfig;
use crate::error::{FsuError, FsuResult};

/// Result of joining a directory and a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedPath {
    /// `dir/name`, cut to the capacity
    pub path: String,
    /// Length the untruncated result would have had
    pub required: usize,
}

impl JoinedPath {
    pub fn is_truncated(&self) -> bool {
        self.path.len() < self.required
    }
}

/// Join `dir` and `name` as `dir/name`, keeping at most `capacity` bytes.
///
/// The result reports the length the full path would have needed, so callers
/// detect truncation by comparing it with the capacity.
pub fn join(dir: &str, name: &str, capacity: usize) -> FsuResult<JoinedPath> {
    if dir.is_empty() || name.is_empty() {
        return Err(FsuError::InvalidInput("missing directory or name".into()));
    }

    let required = dir.len() + 1 + name.len();
    let mut path = String::with_capacity(required.min(capacity));
    path.push_str(dir);
    path.push('/');
    path.push_str(name);

    if path.len() > capacity {
        let mut cut = capacity;
        while !path.is_char_boundary(cut) {
            cut -= 1;
        }
        path.truncate(cut);
    }

    Ok(JoinedPath { path, required })
}

/// Join `dir` and `name`, failing instead of truncating
pub fn resolve(dir: &str, name: &str, config: &FsuConfig) -> FsuResult<String> {
    let max_name = config.max_file_name_len();
    if name.len() > max_name {
        return Err(FsuError::TooLong {
            len: name.len(),
            max: max_name,
        });
    }

    let max = config.max_abs_path_len();
    let joined = join(dir, name, max)?;
    if joined.is_truncated() {
        return Err(FsuError::TooLong {
            len: joined.required,
            max,
        });
    }
    Ok(joined.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        let joined = join("/lfs", "app.bin", 64).unwrap();
        assert_eq!(joined.path, "/lfs/app.bin");
        assert_eq!(joined.required, 12);
        assert!(!joined.is_truncated());
    }

    #[test]
    fn test_join_truncates_and_reports_full_length() {
        let joined = join("/lfs", "abcdef", 8).unwrap();
        assert_eq!(joined.path, "/lfs/abc");
        assert_eq!(joined.required, 11);
        assert!(joined.is_truncated());
    }

    #[test]
    fn test_join_respects_char_boundaries() {
        let joined = join("/lfs", "ééé", 6).unwrap();
        assert_eq!(joined.path, "/lfs/");
        assert!(joined.is_truncated());
    }

    #[test]
    fn test_join_missing_input() {
        assert!(matches!(join("", "a", 8), Err(FsuError::InvalidInput(_))));
        assert!(matches!(join("/lfs", "", 8), Err(FsuError::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_bounds() {
        let config = FsuConfig {
            max_path_size: 8,
            max_file_name_size: 6,
            ..FsuConfig::default()
        };
        assert_eq!(resolve("/lfs", "a.txt", &config).unwrap(), "/lfs/a.txt");
        assert!(matches!(
            resolve("/lfs", "abcdef", &config),
            Err(FsuError::TooLong { len: 6, max: 5 })
        ));
        assert!(matches!(
            resolve("/lfs/deep", "a.txt", &config),
            Err(FsuError::TooLong { len: 15, max: 12 })
        ));
    }
}
