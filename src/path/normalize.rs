//! Absolute path normalization
//!
//! Collapses repeated separators and resolves `.` and `..` segments in a
//! single left-to-right pass over the input.

use crate::error::{FsuError, FsuResult};

/// Normalize an absolute path.
///
/// Runs of `/` collapse to one. Each time the output ends in `/../`, the
/// output is rewound to just after the separator that precedes the segment
/// being removed. That separator may not be the leading one: the first
/// segment is the mount point and cannot be climbed out of. Each time the
/// output ends in `/./`, the `.` segment is dropped.
///
/// `.` or `..` as the final segment without a trailing separator is kept
/// as written.
pub fn normalize(path_in: &str, max_len: usize) -> FsuResult<String> {
    if path_in.is_empty() {
        return Err(FsuError::InvalidInput("empty path".into()));
    }

    let input = path_in.as_bytes();
    if input.len() > max_len {
        return Err(FsuError::TooLong {
            len: input.len(),
            max: max_len,
        });
    }

    let mut out: Vec<u8> = Vec::with_capacity(input.len());
    for (i, &c) in input.iter().enumerate() {
        if i > 0 && c == b'/' && input[i - 1] == b'/' {
            continue;
        }
        out.push(c);

        let j = out.len();
        if j >= 4 && &out[j - 4..] == b"/../" {
            match out[..j - 4].iter().rposition(|&b| b == b'/') {
                Some(k) if k > 0 => out.truncate(k + 1),
                _ => return Err(FsuError::MalformedTraversal(path_in.to_string())),
            }
        }

        let j = out.len();
        if j >= 3 && &out[j - 3..] == b"/./" {
            out.truncate(j - 2);
        }
    }

    // Cuts only happen right after an ASCII separator
    String::from_utf8(out).map_err(|_| FsuError::InvalidInput(path_in.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 190;

    #[test]
    fn test_clean_paths_unchanged() {
        for path in ["/lfs", "/lfs/a", "/lfs/a/b.txt", "/lfs/dir/", "/lfs/a.b/c..d"] {
            assert_eq!(normalize(path, MAX).unwrap(), path);
        }
    }

    #[test]
    fn test_collapse_and_resolve() {
        assert_eq!(normalize("/a//b/./c/../d", MAX).unwrap(), "/a/b/d");
        assert_eq!(normalize("//lfs///x", MAX).unwrap(), "/lfs/x");
        assert_eq!(normalize("/lfs/./././f", MAX).unwrap(), "/lfs/f");
        assert_eq!(normalize("/lfs/a/b/../../c", MAX).unwrap(), "/lfs/c");
    }

    #[test]
    fn test_traversal_above_root() {
        assert!(matches!(
            normalize("/a/../b", MAX),
            Err(FsuError::MalformedTraversal(_))
        ));
        assert!(matches!(
            normalize("/../lfs", MAX),
            Err(FsuError::MalformedTraversal(_))
        ));
        assert!(matches!(
            normalize("/lfs/a/../../b", MAX),
            Err(FsuError::MalformedTraversal(_))
        ));
    }

    #[test]
    fn test_trailing_dot_segments_kept() {
        assert_eq!(normalize("/lfs/a/.", MAX).unwrap(), "/lfs/a/.");
        assert_eq!(normalize("/lfs/a/..", MAX).unwrap(), "/lfs/a/..");
    }

    #[test]
    fn test_length_bound() {
        let long = format!("/lfs/{}", "x".repeat(MAX));
        assert!(matches!(
            normalize(&long, MAX),
            Err(FsuError::TooLong { .. })
        ));
        let exact = format!("/{}", "x".repeat(MAX - 1));
        assert_eq!(normalize(&exact, MAX).unwrap(), exact);
        assert!(matches!(normalize("", MAX), Err(FsuError::InvalidInput(_))));
    }
}
