use log::info;

use crate::config::FsuConfig;
use crate::digest::{Algorithm, digest};
use crate::dirs::{delete_matching, last_history_file, list_directory, mkdir_recursive};
use crate::error::FsuResult;
use crate::error::handlers::{error_to_errno, handle_error};
use crate::files::{append, delete, exists_unique, read, size, write};
use crate::find::find;
use crate::shell::parser::{Command, CommandResult};
use crate::storage::{DirEntry, EntryKind, Storage};

// Run a single command against the storage and format the reply
pub fn handle_command<S: Storage>(
    storage: &S,
    command: Command,
    config: &FsuConfig,
) -> CommandResult {
    let result = match command {
        Command::Quit => return CommandResult::Quit,
        Command::Usage(usage) => Ok(format!("usage: {}", usage)),
        Command::Unknown(cmd) => Ok(format!("unknown command: {}", cmd)),
        Command::Ls(dir) => list_directory(storage, &dir).map(|entries| format_entries(&entries)),
        Command::Find { dir, name, kind } => {
            let found = find(storage, &dir, &name, kind);
            Ok(format_entries(found.as_slice()))
        }
        Command::Read { path, offset } => handle_read(storage, &path, offset),
        Command::Write { path, data } => {
            write(storage, &path, data.as_bytes(), config).map(|n| format!("wrote {} bytes", n))
        }
        Command::Append { path, data } => {
            append(storage, &path, data.as_bytes(), config).map(|n| format!("appended {} bytes", n))
        }
        Command::Rm(path) => delete(storage, &path).map(|_| "deleted".to_string()),
        Command::RmAll { dir, name } => {
            delete_matching(storage, &dir, &name, config).map(|n| format!("deleted {} files", n))
        }
        Command::Size(path) => size(storage, &path).map(|n| n.to_string()),
        Command::Exists { dir, name } => {
            exists_unique(storage, &dir, &name, EntryKind::File)
                .map(|n| format!("exists, {} bytes", n))
        }
        Command::Digest {
            algorithm,
            path,
            size: length,
        } => handle_digest(storage, &path, length, algorithm, config),
        Command::Mkdir { path, recursive } => {
            mkdir_recursive(storage, &path, recursive, config).map(|_| "created".to_string())
        }
        Command::History { dir, prefix } => {
            last_history_file(storage, &dir, &prefix).map(|n| n.to_string())
        }
    };

    match result {
        Ok(reply) => CommandResult::Reply(reply),
        Err(e) => {
            handle_error(&e);
            CommandResult::Reply(format!("error {}: {}", error_to_errno(&e), e))
        }
    }
}

fn handle_read<S: Storage>(storage: &S, path: &str, offset: u64) -> FsuResult<String> {
    let total = size(storage, path)?;
    let length = usize::try_from(total.saturating_sub(offset)).unwrap_or(usize::MAX);
    let mut buf = vec![0u8; length];
    let n = read(storage, path, offset, &mut buf)?;
    buf.truncate(n);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn handle_digest<S: Storage>(
    storage: &S,
    path: &str,
    length: Option<u64>,
    algorithm: Algorithm,
    config: &FsuConfig,
) -> FsuResult<String> {
    let length = match length {
        Some(length) => length,
        None => size(storage, path)?,
    };
    let value = digest(storage, path, length, algorithm, config)?;
    info!("{} of {} ({} bytes) computed", algorithm.name(), path, length);
    Ok(value.to_hex())
}

fn format_entries(entries: &[DirEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{} {:>8} {}", entry.kind.tag(), entry.size, entry.name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parser::parse_command;
    use crate::storage::MemoryStorage;

    fn run(storage: &MemoryStorage, line: &str) -> String {
        match handle_command(storage, parse_command(line), &FsuConfig::default()) {
            CommandResult::Reply(reply) => reply,
            CommandResult::Quit => "quit".to_string(),
        }
    }

    #[test]
    fn test_write_then_read_back() {
        let storage = MemoryStorage::mounted("/lfs");
        assert_eq!(run(&storage, "write /lfs/note hello world"), "wrote 11 bytes");
        assert_eq!(run(&storage, "append /lfs/note !"), "appended 1 bytes");
        assert_eq!(run(&storage, "read /lfs/note"), "hello world!");
        assert_eq!(run(&storage, "read /lfs/note 6"), "world!");
        assert_eq!(run(&storage, "read /lfs/note 100"), "");
        assert_eq!(run(&storage, "size /lfs/note"), "12");
    }

    #[test]
    fn test_errors_report_errno() {
        let storage = MemoryStorage::mounted("/lfs");
        assert!(run(&storage, "size /lfs/missing").starts_with("error -2:"));
        assert!(run(&storage, "mkdir /lfs/../../x").starts_with("error -22:"));
    }

    #[test]
    fn test_digest_defaults_to_file_size() {
        let storage = MemoryStorage::mounted("/lfs");
        storage.insert_file("/lfs/fw.bin", b"123456789");
        assert_eq!(run(&storage, "crc32 /lfs/fw.bin"), "cbf43926");
    }

    #[test]
    fn test_listing_and_quit() {
        let storage = MemoryStorage::mounted("/lfs");
        storage.insert_file("/lfs/a.log", b"abc");
        assert_eq!(run(&storage, "ls /lfs"), "F        3 a.log");
        assert_eq!(run(&storage, "find /lfs log"), "F        3 a.log");
        assert_eq!(run(&storage, "quit"), "quit");
    }
}
