/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;
use std::sync::Mutex;

use log::warn;
use serde::{Deserialize, Serialize};

use filog_types::Status;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct PersistedStatus {
    status: Status,
    version: u64,
}

/// Authoritative logging status, owned by the logger process. Every change
/// bumps the version so polling clients can detect it cheaply.
pub(crate) struct StatusStore {
    path: PathBuf,
    initial: Status,
    cached: Mutex<Option<PersistedStatus>>,
}

impl StatusStore {
    pub(crate) fn new(path: PathBuf, initial: Status) -> Self {
        StatusStore {
            path,
            initial,
            cached: Mutex::new(None),
        }
    }

    pub(crate) fn get(&self) -> (Status, u64) {
        let mut cached = self.cached.lock().unwrap_or_else(|p| p.into_inner());
        let entry = cached.get_or_insert_with(|| self.load());
        (entry.status, entry.version)
    }

    pub(crate) fn set(&self, status: Status) -> u64 {
        let mut cached = self.cached.lock().unwrap_or_else(|p| p.into_inner());
        let entry = cached.get_or_insert_with(|| self.load());
        if entry.status != status {
            entry.status = status;
            entry.version += 1;
            self.persist(*entry);
        }
        entry.version
    }

    fn load(&self) -> PersistedStatus {
        match std::fs::read(&self.path) {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        "corrupt status file {}, falling back to initial status: {e}",
                        self.path.display()
                    );
                    self.initial_entry()
                }
            },
            Err(_) => self.initial_entry(),
        }
    }

    fn initial_entry(&self) -> PersistedStatus {
        PersistedStatus {
            status: self.initial,
            version: 0,
        }
    }

    fn persist(&self, entry: PersistedStatus) {
        let data = match serde_json::to_vec(&entry) {
            Ok(data) => data,
            Err(e) => {
                warn!("failed to encode status entry: {e}");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, data) {
            warn!(
                "failed to persist status to {}: {e}",
                self.path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_initial() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.json"), Status::CrashOnly);
        assert_eq!(store.get(), (Status::CrashOnly, 0));
    }

    #[test]
    fn set_bumps_version_once_per_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.json"), Status::Enabled);
        assert_eq!(store.set(Status::Disabled), 1);
        // same value again is a no-op
        assert_eq!(store.set(Status::Disabled), 1);
        assert_eq!(store.set(Status::Enabled), 2);
        assert_eq!(store.get(), (Status::Enabled, 2));
    }

    #[test]
    fn survives_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let store = StatusStore::new(path.clone(), Status::Enabled);
        store.set(Status::CrashOnly);

        let reloaded = StatusStore::new(path, Status::Enabled);
        assert_eq!(reloaded.get(), (Status::CrashOnly, 1));
    }

    #[test]
    fn corrupt_file_falls_back_to_initial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, b"not json").unwrap();
        let store = StatusStore::new(path, Status::Disabled);
        assert_eq!(store.get(), (Status::Disabled, 0));
    }
}
