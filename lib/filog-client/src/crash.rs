/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::panic::PanicHookInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use filog_types::{LogRecord, Priority};

use super::transport::{bulk_attempt, deliver_chunk, Transport};
use super::{LogContext, MAX_RECORDS_PER_CALL};

const CRASH_LOG_TAG: &str = "Crash";

/// Install the crash capture hook for this process, chained in front of the
/// pre-existing panic hook: the previous hook always runs afterwards, so
/// other crash-reporting integrations still fire.
///
/// Only the first panic in a process is captured; installation itself is
/// also once-only.
pub fn install_crash_handler(ctx: Arc<LogContext>) {
    static INSTALLED: AtomicBool = AtomicBool::new(false);
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let latch = AtomicBool::new(false);
    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if !latch.swap(true, Ordering::SeqCst) {
            ctx.flush_on_crash(info);
        }
        prev(info);
    }));
}

impl LogContext {
    /// Best-effort synchronous flush inside the panic window: wait briefly
    /// for in-flight dispatcher work, drain the pending channel, append the
    /// crash record and deliver over a fresh connection. Bounded by the
    /// configured crash flush timeout, never by a retry loop.
    pub(crate) fn flush_on_crash(&self, info: &PanicHookInfo) {
        if !self.effective_status().admits(Priority::Crash) {
            return;
        }

        let deadline = Instant::now() + self.config().crash_flush_timeout;
        while self.dispatch_busy().load(Ordering::Acquire) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }

        let stats = self.stats();
        let mut pending: Vec<LogRecord> = self.receiver().try_iter().collect();
        stats.io.add_total();
        pending.push(LogRecord::new(
            Priority::Crash,
            CRASH_LOG_TAG,
            crash_message(info, &self.config().process_name),
        ));

        let mut transport = Transport::new(self.config().socket_path.clone());
        let mut attempt = bulk_attempt(&mut transport);
        for chunk in pending.chunks(MAX_RECORDS_PER_CALL) {
            deliver_chunk(chunk, &stats, &mut attempt);
        }
    }
}

fn crash_message(info: &PanicHookInfo, process_name: &str) -> String {
    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("<unnamed>").to_string();
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("panic");
    let location = info
        .location()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "<unknown>".to_string());
    format!(
        "FATAL PANIC: {thread_name}\nProcess: {process_name}, PID: {}\npanicked at {location}: {payload}",
        std::process::id()
    )
}
