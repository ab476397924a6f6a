/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Ordinal log severity, lower is more severe.
///
/// `Crash` is the tier reserved for terminal-failure records captured by the
/// crash handler; regular application code should not post at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Crash,
    Assert,
    Error,
    Warn,
    Info,
    Debug,
    Verbose,
}

impl Priority {
    /// The single-letter code used in rendered log lines.
    pub fn as_code(&self) -> char {
        match self {
            Priority::Assert => 'A',
            Priority::Warn => 'W',
            Priority::Info => 'I',
            Priority::Debug => 'D',
            Priority::Verbose => 'V',
            Priority::Error | Priority::Crash => 'E',
        }
    }
}

/// One immutable log entry, created at post time and destroyed once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub priority: Priority,
    pub tag: String,
    pub message: String,
    pub pid: u32,
    pub tid: u32,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl LogRecord {
    pub fn new<T, M>(priority: Priority, tag: T, message: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        LogRecord {
            priority,
            tag: tag.into(),
            message: message.into(),
            pid: std::process::id(),
            tid: current_tid(),
            timestamp: now_millis(),
        }
    }
}

/// Unix epoch milliseconds, the clock every record timestamp comes from.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn current_tid() -> u32 {
    #[cfg(target_os = "linux")]
    {
        rustix::thread::gettid().as_raw_nonzero().get() as u32
    }
    #[cfg(not(target_os = "linux"))]
    {
        0
    }
}
