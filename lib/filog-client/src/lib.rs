/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Posting side of the cross-process logging system.
//!
//! A process creates one [`LogContext`] at startup and keeps it for its
//! whole lifetime. Posting never blocks: records go into a bounded channel
//! and a single background dispatcher thread delivers them to the logger
//! process in batches, degrading gracefully when the logger is slow,
//! oversized payloads are rejected, or the logger process is gone.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use flume::{Receiver, Sender, TrySendError};

use filog_proto::{Request, Response};
use filog_types::{current_tid, now_millis, ChannelConfig, LogRecord, LogStats, Priority, Status};

mod crash;
mod drain;
mod transport;
mod worker;

pub use crash::install_crash_handler;
pub use drain::FilogDrain;

use transport::Transport;

/// Longest message accepted as a single record, in characters; longer
/// messages are split into chunks of this size before enqueueing.
pub const MAX_MESSAGE_CHUNK: usize = 20000;

/// Most records sent in one transport call.
pub const MAX_RECORDS_PER_CALL: usize = 1000;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Unix socket the logger process listens on.
    pub socket_path: PathBuf,
    pub channel: ChannelConfig,
    /// Identifies this process in crash records.
    pub process_name: String,
    /// Idle interval after which the dispatcher refreshes the cached status.
    pub idle_poll_interval: Duration,
    /// Bounded wait for in-flight dispatcher work during a crash flush.
    pub crash_flush_timeout: Duration,
}

impl ClientConfig {
    pub fn new<P: Into<PathBuf>>(socket_path: P) -> Self {
        ClientConfig {
            socket_path: socket_path.into(),
            channel: ChannelConfig::default(),
            process_name: default_process_name(),
            idle_poll_interval: Duration::from_secs(2),
            crash_flush_timeout: Duration::from_secs(3),
        }
    }
}

fn default_process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| format!("process-{}", std::process::id()))
}

/// Process-lifetime logging context. Created once at process start, shared
/// by reference, never torn down.
pub struct LogContext {
    config: ClientConfig,
    sender: Sender<LogRecord>,
    receiver: Receiver<LogRecord>,
    status: StatusCache,
    stats: Arc<LogStats>,
    dispatch_busy: Arc<AtomicBool>,
}

impl LogContext {
    /// Validate the configuration, spawn the dispatcher thread and hand the
    /// context out. Configuration problems are fatal here, nothing later on
    /// the posting path ever is.
    pub fn setup(config: ClientConfig) -> anyhow::Result<Arc<LogContext>> {
        if config.socket_path.as_os_str().is_empty() {
            return Err(anyhow!("logger socket path is not set"));
        }
        let ctx = Arc::new(LogContext::new(config));
        worker::spawn(Arc::clone(&ctx))?;
        Ok(ctx)
    }

    fn new(config: ClientConfig) -> Self {
        let (sender, receiver) = flume::bounded::<LogRecord>(config.channel.capacity);
        LogContext {
            config,
            sender,
            receiver,
            status: StatusCache::default(),
            stats: Arc::new(LogStats::default()),
            dispatch_busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stats(&self) -> Arc<LogStats> {
        Arc::clone(&self.stats)
    }

    pub(crate) fn receiver(&self) -> &Receiver<LogRecord> {
        &self.receiver
    }

    pub(crate) fn dispatch_busy(&self) -> &Arc<AtomicBool> {
        &self.dispatch_busy
    }

    /// Post one log entry. Never blocks; a no-op when the effective status
    /// does not admit `priority`.
    pub fn post_log(&self, priority: Priority, tag: &str, message: &str) {
        if !self.effective_status().admits(priority) {
            return;
        }
        let pid = std::process::id();
        let tid = current_tid();
        let timestamp = now_millis();
        for chunk in chunk_message(message) {
            self.enqueue(LogRecord {
                priority,
                tag: tag.to_string(),
                message: chunk,
                pid,
                tid,
                timestamp,
            });
        }
    }

    /// Post a pre-built record, splitting over-long messages.
    pub fn post_record(&self, record: LogRecord) {
        if !self.effective_status().admits(record.priority) {
            return;
        }
        if record.message.len() <= MAX_MESSAGE_CHUNK {
            self.enqueue(record);
            return;
        }
        let LogRecord {
            priority,
            tag,
            message,
            pid,
            tid,
            timestamp,
        } = record;
        for chunk in chunk_message(&message) {
            self.enqueue(LogRecord {
                priority,
                tag: tag.clone(),
                message: chunk,
                pid,
                tid,
                timestamp,
            });
        }
    }

    fn enqueue(&self, record: LogRecord) {
        self.stats.io.add_total();
        match self.sender.try_send(record) {
            Ok(_) => {}
            Err(TrySendError::Full(_)) => self.stats.drop.add_channel_overflow(),
            Err(TrySendError::Disconnected(_)) => self.stats.drop.add_channel_closed(),
        }
    }

    /// The cached status, lazily loaded from the logger process on first
    /// use. An unreachable logger reads as `Disabled` until the next
    /// refresh succeeds.
    pub fn status(&self) -> Status {
        self.effective_status()
    }

    pub(crate) fn effective_status(&self) -> Status {
        self.status.get_or_load(|| {
            match Transport::oneshot(&self.config.socket_path, &Request::GetStatus) {
                Ok(Response::Status { status, version }) => Some((status, version)),
                _ => None,
            }
        })
    }

    /// Request a status change: the local cache is updated optimistically,
    /// the persisted value and other processes follow within one poll
    /// round-trip.
    pub fn set_status(&self, status: Status) -> anyhow::Result<()> {
        self.status.store(status, None);
        match Transport::oneshot(&self.config.socket_path, &Request::SetStatus { status })? {
            Response::Status { status, version } => {
                self.status.store(status, Some(version));
                Ok(())
            }
            rsp => Err(anyhow!("unexpected response: {rsp:?}")),
        }
    }

    /// Absolute paths of all current log files, order unspecified.
    pub fn load_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        match Transport::oneshot(&self.config.socket_path, &Request::ListFiles)? {
            Response::Files { paths } => Ok(paths),
            rsp => Err(anyhow!("unexpected response: {rsp:?}")),
        }
    }

    pub(crate) fn refresh_status(&self, transport: &mut Transport) {
        match transport.call(&Request::GetStatus) {
            Ok(Response::Status { status, version }) => {
                self.status.store(status, Some(version));
            }
            Ok(rsp) => {
                log::debug!("unexpected status response: {rsp:?}");
                transport.reset();
            }
            Err(e) => {
                log::debug!("status refresh failed: {e}");
                transport.reset();
            }
        }
    }
}

/// Per-process cached `{status, version}` replica of the logger process's
/// persisted value.
#[derive(Default)]
struct StatusCache {
    inner: Mutex<Option<(Status, u64)>>,
}

impl StatusCache {
    fn get_or_load<F>(&self, load: F) -> Status
    where
        F: FnOnce() -> Option<(Status, u64)>,
    {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if let Some((status, _)) = *guard {
            return status;
        }
        let loaded = load().unwrap_or((Status::Disabled, 0));
        *guard = Some(loaded);
        loaded.0
    }

    fn store(&self, status: Status, version: Option<u64>) {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let version = version.or_else(|| guard.map(|(_, v)| v)).unwrap_or(0);
        *guard = Some((status, version));
    }
}

pub(crate) fn chunk_message(message: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut len = 0;
    for c in message.chars() {
        current.push(c);
        len += 1;
        if len == MAX_MESSAGE_CHUNK {
            chunks.push(std::mem::take(&mut current));
            len = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached_context(capacity: usize) -> LogContext {
        let mut config = ClientConfig::new("/nonexistent/filog.sock");
        config.channel.capacity = capacity;
        LogContext::new(config)
    }

    #[test]
    fn chunking_concatenates_back() {
        let message: String = ('a'..='z').cycle().take(45_000).collect();
        let chunks = chunk_message(&message);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), MAX_MESSAGE_CHUNK);
        assert_eq!(chunks[1].chars().count(), MAX_MESSAGE_CHUNK);
        assert_eq!(chunks[2].chars().count(), 5_000);
        assert_eq!(chunks.concat(), message);
    }

    #[test]
    fn chunking_respects_char_boundaries() {
        let message: String = "é".repeat(MAX_MESSAGE_CHUNK + 1);
        let chunks = chunk_message(&message);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], "é");
        assert_eq!(chunks.concat(), message);
    }

    #[test]
    fn empty_message_posts_nothing() {
        assert!(chunk_message("").is_empty());
    }

    #[test]
    fn unreachable_logger_reads_disabled_and_posts_nothing() {
        let ctx = detached_context(8);
        assert_eq!(ctx.status(), Status::Disabled);
        ctx.post_log(Priority::Error, "Test", "dropped");
        assert_eq!(ctx.receiver.len(), 0);
        // the failed load was cached, not retried per post
        ctx.post_log(Priority::Crash, "Crash", "dropped");
        assert_eq!(ctx.receiver.len(), 0);
    }

    #[test]
    fn enabled_status_enqueues_all_priorities() {
        let ctx = detached_context(8);
        ctx.status.store(Status::Enabled, Some(1));
        ctx.post_log(Priority::Verbose, "Test", "v");
        ctx.post_log(Priority::Error, "Test", "e");
        assert_eq!(ctx.receiver.len(), 2);
    }

    #[test]
    fn crash_only_admits_only_crash_tier() {
        let ctx = detached_context(8);
        ctx.status.store(Status::CrashOnly, Some(1));
        ctx.post_log(Priority::Error, "Test", "e");
        assert_eq!(ctx.receiver.len(), 0);
        ctx.post_log(Priority::Crash, "Crash", "boom");
        assert_eq!(ctx.receiver.len(), 1);
    }

    #[test]
    fn overflow_is_counted_not_blocking() {
        let ctx = detached_context(2);
        ctx.status.store(Status::Enabled, Some(1));
        for i in 0..5 {
            ctx.post_log(Priority::Info, "Test", &format!("m{i}"));
        }
        assert_eq!(ctx.receiver.len(), 2);
        let snap = ctx.stats.snapshot();
        assert_eq!(snap.io.total, 5);
        assert_eq!(snap.drop.channel_overflow, 3);
    }

    #[test]
    fn long_post_becomes_ordered_chunks() {
        let ctx = detached_context(8);
        ctx.status.store(Status::Enabled, Some(1));
        let message = "b".repeat(MAX_MESSAGE_CHUNK + 10);
        ctx.post_log(Priority::Info, "Test", &message);
        let first = ctx.receiver.recv().unwrap();
        let second = ctx.receiver.recv().unwrap();
        assert_eq!(first.message.len(), MAX_MESSAGE_CHUNK);
        assert_eq!(second.message.len(), 10);
        assert_eq!(format!("{}{}", first.message, second.message), message);
        assert_eq!(first.timestamp, second.timestamp);
    }
}
