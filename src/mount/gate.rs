//! Mount gate
//!
//! Mounts the volume at most once per gate. The state lives behind a shared
//! lock so several callers, or a test, can hold the same gate state.

use log::{error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{FsuError, FsuResult};
use crate::storage::Storage;

/// Whether the volume behind a gate has been mounted
#[derive(Debug, Default)]
pub struct MountState {
    pub mounted: bool,
}

/// Serializes mount attempts and remembers a successful one
#[derive(Debug, Clone, Default)]
pub struct MountGate {
    state: Arc<Mutex<MountState>>,
}

impl MountGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate over an existing shared state
    pub fn with_state(state: Arc<Mutex<MountState>>) -> Self {
        Self { state }
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    fn lock(&self) -> MutexGuard<'_, MountState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Mount lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Mount `storage` unless this gate already did.
    ///
    /// A failed attempt leaves the gate unmounted so a later call retries.
    pub fn mount<S: Storage>(&self, storage: &S, mount_point: &str) -> FsuResult<()> {
        let mut state = self.lock();
        if state.mounted {
            return Ok(());
        }

        if let Err(e) = storage.mount() {
            error!("Error mounting {}: {}", mount_point, e);
            return Err(FsuError::from(e));
        }
        state.mounted = true;
        info!("Mounted {}", mount_point);

        match storage.statvfs(mount_point) {
            Ok(stats) => {
                info!("Block size: {} bytes", stats.block_size);
                info!("Allocation unit: {} bytes", stats.fragment_size);
                info!("Free blocks: {}", stats.free_blocks);
            }
            Err(e) => warn!("Volume statistics for {} unavailable: {}", mount_point, e),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Faults, MemoryStorage};
    use std::thread;

    #[test]
    fn test_mount_is_idempotent() {
        let storage = MemoryStorage::new("/lfs");
        let gate = MountGate::new();

        gate.mount(&storage, "/lfs").unwrap();
        gate.mount(&storage, "/lfs").unwrap();
        assert!(gate.is_mounted());
        assert_eq!(storage.mount_count(), 1);
    }

    #[test]
    fn test_failed_mount_is_retried() {
        let storage = MemoryStorage::new("/lfs");
        storage.set_faults(Faults {
            fail_mounts: 1,
            ..Faults::default()
        });
        let gate = MountGate::new();

        assert!(gate.mount(&storage, "/lfs").is_err());
        assert!(!gate.is_mounted());
        gate.mount(&storage, "/lfs").unwrap();
        assert!(gate.is_mounted());
        assert_eq!(storage.mount_count(), 1);
    }

    #[test]
    fn test_concurrent_callers_mount_once() {
        let storage = Arc::new(MemoryStorage::new("/lfs"));
        let state = Arc::new(Mutex::new(MountState::default()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let storage = Arc::clone(&storage);
                let gate = MountGate::with_state(Arc::clone(&state));
                thread::spawn(move || gate.mount(storage.as_ref(), "/lfs"))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(storage.mount_count(), 1);
        assert!(state.lock().unwrap().mounted);
    }
}
