/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

pub const DEFAULT_MAX_LOG_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const DEFAULT_MAX_LOG_FILE_BACKUP: usize = 10;
pub const DEFAULT_LOG_FILE_BASE_NAME: &str = "application";
pub const DEFAULT_LOG_FILE_EXT: &str = "log";

/// On-disk layout of one rotating file set. Immutable once the owning
/// process is initialized.
#[derive(Clone, Debug)]
pub struct RollingFileConfig {
    pub dir: PathBuf,
    pub base_name: String,
    pub ext: String,
    pub max_file_size: u64,
    pub max_backup: usize,
}

impl RollingFileConfig {
    pub fn with_dir<P: Into<PathBuf>>(dir: P) -> Self {
        RollingFileConfig {
            dir: dir.into(),
            base_name: DEFAULT_LOG_FILE_BASE_NAME.to_string(),
            ext: DEFAULT_LOG_FILE_EXT.to_string(),
            max_file_size: DEFAULT_MAX_LOG_FILE_SIZE,
            max_backup: DEFAULT_MAX_LOG_FILE_BACKUP,
        }
    }

    /// The embedding configuration stores the size cap in megabytes,
    /// fractional values allowed.
    pub fn set_max_file_size_in_mb(&mut self, mb: f64) {
        self.max_file_size = (mb * 1024.0 * 1024.0) as u64;
    }
}

#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub capacity: usize,
    pub thread_name: String,
}

impl ChannelConfig {
    pub fn with_name(thread_name: &str) -> Self {
        ChannelConfig {
            capacity: 1024,
            thread_name: thread_name.to_string(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig::with_name("filog-post")
    }
}

/// Identity written once at the top of every fresh log file.
#[derive(Clone, Debug, Default)]
pub struct HeaderInfo {
    pub app_name: String,
    pub app_version: String,
}
