/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::panic::PanicHookInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError};

use filog::LogWriter;
use filog_types::{LogRecord, Priority};

const CRASH_LOG_TAG: &str = "Crash";

/// The logger process writes its own crash record straight through the
/// writer, no transport involved. Chained in front of the pre-existing
/// panic hook, which always runs afterwards.
pub(crate) fn install(writer: Arc<Mutex<LogWriter>>) {
    static INSTALLED: AtomicBool = AtomicBool::new(false);
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let latch = AtomicBool::new(false);
    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if !latch.swap(true, Ordering::SeqCst) {
            let record = crash_record(info);
            write_crash_record(&writer, &record);
        }
        prev(info);
    }));
}

/// The panicking thread may be the writer thread itself, still holding the
/// lock; a blocking acquire here would self-deadlock with the lock held, so
/// on contention the record is given up and the previous hook runs.
fn write_crash_record(writer: &Mutex<LogWriter>, record: &LogRecord) {
    match writer.try_lock() {
        Ok(w) => w.print_record(record),
        Err(TryLockError::Poisoned(p)) => p.into_inner().print_record(record),
        Err(TryLockError::WouldBlock) => {}
    }
}

fn crash_record(info: &PanicHookInfo) -> LogRecord {
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
    let message = format!(
        "FATAL PANIC: {thread_name}\nProcess: {}, PID: {}\npanicked at {location}: {payload}",
        env!("CARGO_PKG_NAME"),
        std::process::id()
    );
    LogRecord::new(Priority::Crash, CRASH_LOG_TAG, message)
}
