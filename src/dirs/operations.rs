//! Directory lifecycle operations
//!
//! Directory creation, bulk deletion by name match and directory listings.

use log::{debug, error, warn};

use crate::config::FsuConfig;
use crate::error::{FsuError, FsuResult};
use crate::find::{find, for_each_entry};
use crate::path::{normalize, resolve};
use crate::storage::{DirEntry, EntryKind, Storage};

/// Create the directory at `abs_path`.
///
/// Succeeds without changes when it already exists. With `recursive`, every
/// missing directory along the path is created; otherwise only the last one
/// is, and missing parents make the underlying create fail.
pub fn mkdir_recursive<S: Storage>(
    storage: &S,
    abs_path: &str,
    recursive: bool,
    config: &FsuConfig,
) -> FsuResult<()> {
    let path = normalize(abs_path, config.max_abs_path_len())?;

    match storage.stat(&path) {
        Ok(entry) if entry.is_dir() => return Ok(()),
        Ok(_) => {
            warn!("{} is file not directory", abs_path);
            return Err(FsuError::NotADirectory(path));
        }
        Err(_) => {}
    }

    let target = path.trim_end_matches('/');
    if target.is_empty() {
        return Err(FsuError::InvalidInput(abs_path.to_string()));
    }

    let mut ends: Vec<usize> = target
        .match_indices('/')
        .map(|(i, _)| i)
        .filter(|&i| i > 0)
        .collect();
    ends.push(target.len());

    let last = ends.len() - 1;
    for (n, &end) in ends.iter().enumerate() {
        if !recursive && n != last {
            continue;
        }

        let segment = &target[..end];
        match storage.stat(segment) {
            Ok(entry) if entry.is_dir() => {}
            Ok(_) => {
                warn!("{} is file not directory", segment);
                return Err(FsuError::NotADirectory(segment.to_string()));
            }
            Err(_) => {
                storage.mkdir(segment).map_err(|e| {
                    error!("Unable to create directory {}: {}", segment, e);
                    FsuError::from(e)
                })?;
                debug!("Created directory {}", segment);
            }
        }
    }

    Ok(())
}

/// Create the single directory `dir/name`
pub fn mkdir<S: Storage>(storage: &S, dir: &str, name: &str, config: &FsuConfig) -> FsuResult<()> {
    let path = resolve(dir, name, config)?;
    mkdir_recursive(storage, &path, false, config)
}

/// Delete every file in `dir` whose name contains `name`.
///
/// An empty `name` deletes every file. Stops at the first failed unlink and
/// returns the number of files removed up to that point.
pub fn delete_matching<S: Storage>(
    storage: &S,
    dir: &str,
    name: &str,
    config: &FsuConfig,
) -> FsuResult<usize> {
    if dir.is_empty() {
        error!("Invalid path or name");
        return Err(FsuError::InvalidInput("empty directory".into()));
    }

    let found = find(storage, dir, name, EntryKind::File);
    let mut deleted = 0;
    for entry in &found {
        let path = match resolve(dir, &entry.name, config) {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping the rest of {}: {}", dir, e);
                break;
            }
        };

        debug!("Deleting (unlinking) file {}", path);
        if let Err(e) = storage.unlink(&path) {
            warn!(
                "Deleted {} of {} matching files in {} before failure: {}",
                deleted,
                found.len(),
                dir,
                e
            );
            break;
        }
        deleted += 1;
    }
    found.release();

    Ok(deleted)
}

/// Log every entry of `dir` at debug level and return them
pub fn list_directory<S: Storage>(storage: &S, dir: &str) -> FsuResult<Vec<DirEntry>> {
    if dir.is_empty() {
        error!("Invalid path");
        return Err(FsuError::InvalidInput("empty directory".into()));
    }

    let mut entries = Vec::new();
    let result = for_each_entry(storage, dir, |entry| {
        debug!("  {} {} {}", entry.kind.tag(), entry.size, entry.name);
        entries.push(entry);
        true
    });
    debug!("End of files");

    result?;
    Ok(entries)
}

/// Highest number `N` among entries of `dir` named `<prefix>N...`, or 0
pub fn last_history_file<S: Storage>(storage: &S, dir: &str, prefix: &str) -> FsuResult<u32> {
    if dir.is_empty() || prefix.is_empty() {
        error!("Invalid path");
        return Err(FsuError::InvalidInput("empty directory or prefix".into()));
    }

    let mut highest = 0;
    for_each_entry(storage, dir, |entry| {
        if let Some(number) = history_number(&entry.name, prefix) {
            debug!("name: {}", entry.name);
            highest = highest.max(number);
        }
        true
    })?;

    Ok(highest)
}

fn history_number(name: &str, prefix: &str) -> Option<u32> {
    let rest = name.strip_prefix(prefix)?;
    let digits: &str = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    digits.parse().ok()
}
