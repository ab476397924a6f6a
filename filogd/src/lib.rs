/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::os::unix::net::UnixListener;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use log::{info, warn};

use filog::{LogWriter, RollingFile};
use filog_types::LogRecord;

pub mod config;
pub mod opts;
pub mod stdlog;

mod backend;
mod crash;
mod frontend;
mod store;

use config::FilogdConfig;
use frontend::FrontendStats;
use store::StatusStore;

pub(crate) struct Shared {
    store: StatusStore,
    writer: Arc<Mutex<LogWriter>>,
    record_sender: flume::Sender<LogRecord>,
    frontend_stats: FrontendStats,
}

impl Shared {
    /// Hand records to the backend writer thread. Blocks when the channel
    /// is full, applying backpressure to the peer instead of dropping.
    fn enqueue(&self, records: Vec<LogRecord>) -> usize {
        let mut count = 0;
        for record in records {
            if self.record_sender.send(record).is_err() {
                warn!("backend writer thread is gone, dropping records");
                break;
            }
            count += 1;
        }
        self.frontend_stats.add_record_accepted_n(count);
        count
    }
}

pub struct Daemon {
    shared: Arc<Shared>,
}

impl Daemon {
    pub fn frontend_conn_total(&self) -> u64 {
        self.shared.frontend_stats.conn_total()
    }

    pub fn frontend_request_total(&self) -> u64 {
        self.shared.frontend_stats.request_total()
    }

    pub fn frontend_request_invalid(&self) -> u64 {
        self.shared.frontend_stats.request_invalid()
    }

    pub fn frontend_request_oversize(&self) -> u64 {
        self.shared.frontend_stats.request_oversize()
    }

    pub fn frontend_record_accepted(&self) -> u64 {
        self.shared.frontend_stats.record_accepted()
    }
}

/// Bring the whole daemon up: rolling file writer, status store, backend
/// writer thread, crash hook and the socket frontend. Threads are detached
/// and live for the rest of the process.
pub fn spawn(mut config: FilogdConfig) -> anyhow::Result<Daemon> {
    std::fs::create_dir_all(&config.rolling.dir).context(format!(
        "failed to create log dir {}",
        config.rolling.dir.display()
    ))?;
    // absolute paths, so file listings are meaningful to other processes
    config.rolling.dir = std::fs::canonicalize(&config.rolling.dir).context(format!(
        "failed to resolve log dir {}",
        config.rolling.dir.display()
    ))?;

    let store = StatusStore::new(config.status_file_path(), config.initial_status);
    let status = store.get().0;

    let formatter = config.formatter.build(&config.header);
    let strategy = RollingFile::new(config.rolling.clone(), formatter).context(format!(
        "failed to set up rolling file set in {}",
        config.rolling.dir.display()
    ))?;
    let writer = Arc::new(Mutex::new(LogWriter::new(strategy, status)));

    crash::install(writer.clone());

    let (record_sender, record_receiver) = flume::bounded::<LogRecord>(config.channel.capacity);
    backend::spawn(&config.channel.thread_name, record_receiver, writer.clone())?;

    // a stale socket file from a previous run would fail the bind
    if config.listen_path.exists() {
        let _ = std::fs::remove_file(&config.listen_path);
    }
    let listener = UnixListener::bind(&config.listen_path).context(format!(
        "failed to bind unix socket {}",
        config.listen_path.display()
    ))?;

    let shared = Arc::new(Shared {
        store,
        writer,
        record_sender,
        frontend_stats: FrontendStats::default(),
    });
    frontend::spawn(listener, shared.clone())?;

    info!(
        "file log daemon up, listening on {}, logging to {} with status {status}",
        config.listen_path.display(),
        config.rolling.dir.display()
    );
    Ok(Daemon { shared })
}
