use crate::digest::Algorithm;
use crate::storage::EntryKind;

// Command enum to represent shell commands
#[derive(Debug, PartialEq)]
pub enum Command {
    Quit,
    Ls(String),
    Find { dir: String, name: String, kind: EntryKind },
    Read { path: String, offset: u64 },
    Write { path: String, data: String },
    Append { path: String, data: String },
    Rm(String),
    RmAll { dir: String, name: String },
    Size(String),
    Exists { dir: String, name: String },
    Digest { algorithm: Algorithm, path: String, size: Option<u64> },
    Mkdir { path: String, recursive: bool },
    History { dir: String, prefix: String },
    Usage(&'static str),
    Unknown(String),
}

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    Quit,
    Reply(String),
}

// Parse raw command line into Command enum
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_lowercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "quit" | "q" => Command::Quit,
        "ls" => match words(arg).as_slice() {
            [dir] => Command::Ls(dir.to_string()),
            _ => Command::Usage("ls <dir>"),
        },
        "find" => match words(arg).as_slice() {
            ["-d", dir] => find(dir, "", EntryKind::Directory),
            ["-d", dir, name] => find(dir, name, EntryKind::Directory),
            [dir] => find(dir, "", EntryKind::File),
            [dir, name] => find(dir, name, EntryKind::File),
            _ => Command::Usage("find [-d] <dir> [name]"),
        },
        "read" => match words(arg).as_slice() {
            [path] => Command::Read {
                path: path.to_string(),
                offset: 0,
            },
            [path, offset] => match offset.parse() {
                Ok(offset) => Command::Read {
                    path: path.to_string(),
                    offset,
                },
                Err(_) => Command::Usage("read <path> [offset]"),
            },
            _ => Command::Usage("read <path> [offset]"),
        },
        "write" => match split_data(arg) {
            Some((path, data)) => Command::Write { path, data },
            None => Command::Usage("write <path> <text>"),
        },
        "append" => match split_data(arg) {
            Some((path, data)) => Command::Append { path, data },
            None => Command::Usage("append <path> <text>"),
        },
        "rm" => match words(arg).as_slice() {
            [path] => Command::Rm(path.to_string()),
            _ => Command::Usage("rm <path>"),
        },
        "rmall" => match words(arg).as_slice() {
            [dir] => Command::RmAll {
                dir: dir.to_string(),
                name: String::new(),
            },
            [dir, name] => Command::RmAll {
                dir: dir.to_string(),
                name: name.to_string(),
            },
            _ => Command::Usage("rmall <dir> [name]"),
        },
        "size" => match words(arg).as_slice() {
            [path] => Command::Size(path.to_string()),
            _ => Command::Usage("size <path>"),
        },
        "exists" => match words(arg).as_slice() {
            [dir, name] => Command::Exists {
                dir: dir.to_string(),
                name: name.to_string(),
            },
            _ => Command::Usage("exists <dir> <name>"),
        },
        "sha256" | "crc32" => {
            let algorithm = match cmd.as_str() {
                "sha256" => Algorithm::Sha256,
                _ => Algorithm::Crc32,
            };
            match words(arg).as_slice() {
                [path] => Command::Digest {
                    algorithm,
                    path: path.to_string(),
                    size: None,
                },
                [path, size] => match size.parse() {
                    Ok(size) => Command::Digest {
                        algorithm,
                        path: path.to_string(),
                        size: Some(size),
                    },
                    Err(_) => Command::Usage("sha256|crc32 <path> [size]"),
                },
                _ => Command::Usage("sha256|crc32 <path> [size]"),
            }
        }
        "mkdir" => match words(arg).as_slice() {
            [path] => Command::Mkdir {
                path: path.to_string(),
                recursive: false,
            },
            ["-p", path] => Command::Mkdir {
                path: path.to_string(),
                recursive: true,
            },
            _ => Command::Usage("mkdir [-p] <path>"),
        },
        "history" => match words(arg).as_slice() {
            [dir, prefix] => Command::History {
                dir: dir.to_string(),
                prefix: prefix.to_string(),
            },
            _ => Command::Usage("history <dir> <prefix>"),
        },
        _ => Command::Unknown(trimmed.to_string()),
    }
}

fn words(arg: &str) -> Vec<&str> {
    arg.split_whitespace().collect()
}

fn find(dir: &str, name: &str, kind: EntryKind) -> Command {
    Command::Find {
        dir: dir.to_string(),
        name: name.to_string(),
        kind,
    }
}

// Path is the first word, everything after it is written as-is
fn split_data(arg: &str) -> Option<(String, String)> {
    let mut parts = arg.splitn(2, char::is_whitespace);
    let path = parts.next().filter(|p| !p.is_empty())?;
    let data = parts.next().unwrap_or("");
    Some((path.to_string(), data.to_string()))
}
