//! Directory enumeration
//!
//! Matching entries are collected in two passes: the first counts them, the
//! second fills exactly that many slots. A directory that shrinks between the
//! passes yields a shorter set; one that grows is cut at the first count.

use log::{debug, error, warn};

use crate::error::StorageError;
use crate::find::results::EntrySet;
use crate::storage::{DirEntry, EntryKind, Storage};

/// Visit the entries of `dir` in enumeration order.
///
/// Stops at the end of the directory, when `visit` returns `false`, or at the
/// first read error. The directory is closed on every path.
pub(crate) fn for_each_entry<S, F>(storage: &S, dir: &str, mut visit: F) -> Result<(), StorageError>
where
    S: Storage,
    F: FnMut(DirEntry) -> bool,
{
    let mut handle = storage.opendir(dir)?;
    debug!("{} opendir", dir);

    let result = loop {
        match storage.readdir(&mut handle) {
            Ok(entry) if entry.is_end() => break Ok(()),
            Ok(entry) => {
                if !visit(entry) {
                    break Ok(());
                }
            }
            Err(e) => break Err(e),
        }
    };

    if let Err(e) = storage.closedir(handle) {
        warn!("Unable to close directory {}: {}", dir, e);
    }
    result
}

fn is_match(entry: &DirEntry, name: &str, kind: EntryKind) -> bool {
    entry.kind == kind && entry.name.contains(name)
}

/// Find the entries of `dir` of the given kind whose name contains `name`.
///
/// An empty `name` matches every entry of that kind. Does not descend into
/// subdirectories.
pub fn find<S: Storage>(storage: &S, dir: &str, name: &str, kind: EntryKind) -> EntrySet {
    if dir.is_empty() {
        error!("Invalid directory path");
        return EntrySet::empty();
    }

    let mut count = 0usize;
    if let Err(e) = for_each_entry(storage, dir, |entry| {
        if is_match(&entry, name, kind) {
            count += 1;
        }
        true
    }) {
        error!("Counting entries of {} stopped: {}", dir, e);
    }

    if count == 0 {
        debug!("No entries of {} match '{}'", dir, name);
        return EntrySet::empty();
    }

    let mut entries: Vec<DirEntry> = Vec::new();
    if let Err(e) = entries.try_reserve_exact(count) {
        error!("Unable to allocate {} directory entries: {}", count, e);
        return EntrySet::empty();
    }

    if let Err(e) = for_each_entry(storage, dir, |entry| {
        if is_match(&entry, name, kind) {
            debug!(" {} {}", entry.size, entry.name);
            entries.push(entry);
        }
        entries.len() < count
    }) {
        error!("Unexpected file find error in {}: {}", dir, e);
    }

    if entries.len() < count {
        warn!(
            "{} changed during enumeration: counted {}, filled {}",
            dir,
            count,
            entries.len()
        );
    }
    debug!("Found {} matching entries", entries.len());

    EntrySet::from(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Faults, MemoryStorage};

    fn volume() -> MemoryStorage {
        let storage = MemoryStorage::mounted("/lfs");
        storage.insert_file("/lfs/boot.log", b"1");
        storage.insert_file("/lfs/app.bin", b"22");
        storage.insert_file("/lfs/net.log", b"333");
        storage.insert_file("/lfs/logs/old.txt", b"4444");
        storage
    }

    #[test]
    fn test_find_by_substring_and_kind() {
        let storage = volume();

        let files = find(&storage, "/lfs", "log", EntryKind::File);
        let names: Vec<&str> = files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["boot.log", "net.log"]);

        let dirs = find(&storage, "/lfs", "log", EntryKind::Directory);
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs.get(0).unwrap().name, "logs");
    }

    #[test]
    fn test_empty_substring_matches_all_of_kind() {
        let storage = volume();
        assert_eq!(find(&storage, "/lfs", "", EntryKind::File).len(), 3);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let storage = volume();
        let set = find(&storage, "/lfs/none", "", EntryKind::File);
        assert!(set.is_empty());
        set.release();
    }

    #[test]
    fn test_shrinks_when_directory_changes_between_passes() {
        let storage = volume();
        storage.set_faults(Faults {
            remove_on_opendir: Some((2, "/lfs/net.log".into())),
            ..Faults::default()
        });

        let set = find(&storage, "/lfs", "log", EntryKind::File);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().name, "boot.log");
    }

    #[test]
    fn test_read_error_in_fill_pass_keeps_filled_entries() {
        let storage = volume();
        // First pass reads app.bin, boot.log, logs, net.log and the end
        // marker; the fourth read of the second pass (net.log) fails
        storage.set_faults(Faults {
            fail_readdir_at: Some(9),
            ..Faults::default()
        });

        let set = find(&storage, "/lfs", "log", EntryKind::File);
        let names: Vec<&str> = set.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["boot.log"]);
    }

    #[test]
    fn test_read_error_in_count_pass_limits_fill() {
        let storage = volume();
        storage.set_faults(Faults {
            fail_readdir_at: Some(3),
            ..Faults::default()
        });

        let set = find(&storage, "/lfs", "", EntryKind::File);
        let names: Vec<&str> = set.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["app.bin", "boot.log"]);
    }

    #[test]
    fn test_release_then_find_again() {
        let storage = volume();

        let first = find(&storage, "/lfs", "log", EntryKind::File);
        let expected = first.clone();
        assert_eq!(first.len(), 2);
        first.release();

        let second = find(&storage, "/lfs", "log", EntryKind::File);
        assert_eq!(second, expected);
        second.release();

        EntrySet::empty().release();
    }
}
