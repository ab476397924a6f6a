/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod config;
mod record;
mod stats;
mod status;

pub use config::{
    ChannelConfig, HeaderInfo, RollingFileConfig, DEFAULT_LOG_FILE_BASE_NAME,
    DEFAULT_LOG_FILE_EXT, DEFAULT_MAX_LOG_FILE_BACKUP, DEFAULT_MAX_LOG_FILE_SIZE,
};
pub use record::{current_tid, now_millis, LogRecord, Priority};
pub use stats::{LogDropSnapshot, LogDropStats, LogIoSnapshot, LogIoStats, LogSnapshot, LogStats};
pub use status::Status;
