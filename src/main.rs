//! fsutil - Entry Point
//!
//! Mounts a host directory as the flash volume and runs file system utility
//! commands read from stdin.

use log::{error, info};
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use fsutil::config::FsuConfig;
use fsutil::mount::MountGate;
use fsutil::shell::{CommandResult, handle_command, parse_command};
use fsutil::storage::HostStorage;
use fsutil::utils::logging::setup_logging;

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match FsuConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let storage = Arc::new(HostStorage::new(
        config.mount_point.clone(),
        config.host_root_path(),
    ));
    let gate = MountGate::new();
    if let Err(e) = gate.mount(storage.as_ref(), &config.mount_point) {
        error!("Mount failed: {}", e);
        process::exit(1);
    }

    info!(
        "Serving {} from {} (type 'quit' to exit)",
        config.mount_point, config.host_root
    );

    if let Err(e) = run_shell(storage, config).await {
        error!("Shell terminated: {}", e);
        process::exit(1);
    }
}

async fn run_shell(storage: Arc<HostStorage>, config: Arc<FsuConfig>) -> std::io::Result<()> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();

    loop {
        stdout.write_all(b"fsu> ").await?;
        stdout.flush().await?;

        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = parse_command(&line);
        let storage = Arc::clone(&storage);
        let config = Arc::clone(&config);
        let result =
            tokio::task::spawn_blocking(move || handle_command(storage.as_ref(), command, &config))
                .await
                .map_err(std::io::Error::other)?;

        match result {
            CommandResult::Quit => return Ok(()),
            CommandResult::Reply(reply) => {
                stdout.write_all(reply.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
        }
    }
}
