/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use filog_types::{LogRecord, Status};

use super::RollingFile;

/// Status-gated front of the rolling strategy.
///
/// Holds the logger process's live status; records not admitted by it are
/// discarded before they reach the disk.
pub struct LogWriter {
    strategy: RollingFile,
    status: Status,
}

impl LogWriter {
    pub fn new(strategy: RollingFile, status: Status) -> Self {
        LogWriter { strategy, status }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn strategy(&self) -> &RollingFile {
        &self.strategy
    }

    pub fn print_record(&self, record: &LogRecord) {
        if self.status.admits(record.priority) {
            self.strategy.print_record(record);
        }
    }

    pub fn print_batch(&self, mut records: Vec<LogRecord>) {
        records.retain(|r| self.status.admits(r.priority));
        self.strategy.print_batch(&records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormatterKind;
    use filog_types::{HeaderInfo, Priority, RollingFileConfig};
    use tempfile::TempDir;

    fn new_writer(dir: &std::path::Path, status: Status) -> LogWriter {
        let config = RollingFileConfig::with_dir(dir);
        let formatter = FormatterKind::Default.build(&HeaderInfo::default());
        LogWriter::new(RollingFile::new(config, formatter).unwrap(), status)
    }

    fn read_primary(dir: &std::path::Path) -> String {
        std::fs::read_to_string(dir.join("application.log")).unwrap_or_default()
    }

    #[test]
    fn disabled_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let writer = new_writer(tmp.path(), Status::Disabled);
        writer.print_record(&LogRecord::new(Priority::Crash, "Crash", "boom"));
        writer.print_batch(vec![LogRecord::new(Priority::Error, "T", "e")]);
        assert!(!tmp.path().join("application.log").exists());
    }

    #[test]
    fn crash_only_filters_batch() {
        let tmp = TempDir::new().unwrap();
        let writer = new_writer(tmp.path(), Status::CrashOnly);
        writer.print_batch(vec![
            LogRecord::new(Priority::Error, "T", "regular error"),
            LogRecord::new(Priority::Crash, "Crash", "fatal"),
            LogRecord::new(Priority::Verbose, "T", "noise"),
        ]);
        let content = read_primary(tmp.path());
        assert!(content.contains("E/Crash: fatal"));
        assert!(!content.contains("regular error"));
        assert!(!content.contains("noise"));
    }

    #[test]
    fn enabled_admits_all() {
        let tmp = TempDir::new().unwrap();
        let mut writer = new_writer(tmp.path(), Status::Disabled);
        writer.set_status(Status::Enabled);
        writer.print_batch(vec![
            LogRecord::new(Priority::Verbose, "T", "v"),
            LogRecord::new(Priority::Assert, "T", "a"),
        ]);
        let content = read_primary(tmp.path());
        assert!(content.contains("V/T: v"));
        assert!(content.contains("A/T: a"));
    }
}
