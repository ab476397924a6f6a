/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use filog_types::{LogRecord, RollingFileConfig};

use super::BoxLogFormatter;

/// Append-only rotating text log storage.
///
/// Only ever driven from a single thread at a time; the file set indices are
/// contiguous from 0, index 0 is the file currently written to, higher
/// indices are strictly older.
pub struct RollingFile {
    formatter: BoxLogFormatter,
    config: RollingFileConfig,
}

impl RollingFile {
    /// Fails if the log directory cannot be created, which is a fatal
    /// configuration problem for the embedding process.
    pub fn new(config: RollingFileConfig, formatter: BoxLogFormatter) -> io::Result<Self> {
        fs::create_dir_all(&config.dir)?;
        Ok(RollingFile { formatter, config })
    }

    pub fn config(&self) -> &RollingFileConfig {
        &self.config
    }

    pub fn print_record(&self, record: &LogRecord) {
        self.print_formatted(&self.formatter.format_record(record));
    }

    pub fn print_batch(&self, records: &[LogRecord]) {
        if records.is_empty() {
            return;
        }
        self.print_formatted(&self.formatter.format_batch(records));
    }

    fn print_formatted(&self, text: &str) {
        self.rotate_if_needed();
        let primary = self.indexed_path(0);
        if !self.append_with_result(&primary, text) {
            self.retry_append(&primary, text);
        }
    }

    fn append_with_result(&self, path: &Path, text: &str) -> bool {
        match self.try_append(path, text) {
            Ok(_) => true,
            Err(e) => {
                warn!("append to {} failed: {e}", path.display());
                false
            }
        }
    }

    fn try_append(&self, path: &Path, text: &str) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        let mut w = BufWriter::new(file);
        if is_empty {
            writeln!(w, "{}", self.formatter.header())?;
        }
        writeln!(w, "{text}")?;
        w.flush()
    }

    /// Recover from a failed write by evicting backups one at a time,
    /// oldest first, retrying after each deletion. Exhaustion drops the
    /// write; callers never see the failure.
    fn retry_append(&self, primary: &Path, text: &str) {
        for i in (0..=self.config.max_backup).rev() {
            let file_to_delete = self.indexed_path(i);
            if delete_if_exists(&file_to_delete) {
                debug!("retrying append after deleting {}", file_to_delete.display());
                if self.append_with_result(primary, text) {
                    debug!("retry succeeded");
                    return;
                }
            }
        }
        warn!("log line dropped, write retry exhausted");
    }

    fn rotate_if_needed(&self) {
        if self.primary_len() > self.config.max_file_size {
            self.rotate();
        }
    }

    fn primary_len(&self) -> u64 {
        fs::metadata(self.indexed_path(0)).map(|m| m.len()).unwrap_or(0)
    }

    fn rotate(&self) {
        debug!("rotating {} file set", self.config.base_name);
        self.delete_unnecessary_files();
        if self.config.max_backup == 0 {
            delete_if_exists(&self.indexed_path(0));
            return;
        }
        for i in (0..self.config.max_backup).rev() {
            let target = self.indexed_path(i);
            if target.exists() {
                let next = self.indexed_path(i + 1);
                delete_if_exists(&next);
                if let Err(e) = fs::rename(&target, &next) {
                    warn!("rename {} -> {} failed: {e}", target.display(), next.display());
                }
            } else {
                // close the gap left by a missing intermediate file
                for j in i + 2..=self.config.max_backup {
                    let shifted = self.indexed_path(j);
                    if !shifted.exists() {
                        break;
                    }
                    let down = self.indexed_path(j - 1);
                    if let Err(e) = fs::rename(&shifted, &down) {
                        warn!("rename {} -> {} failed: {e}", shifted.display(), down.display());
                    }
                }
            }
        }
    }

    /// A shrunk max_backup configuration may leave files above the current
    /// capacity behind; rotation removes them first.
    fn delete_unnecessary_files(&self) {
        for (index, path) in self.indexed_files() {
            if index > self.config.max_backup {
                debug!("removing out-of-capacity file {}", path.display());
                delete_if_exists(&path);
            }
        }
    }

    /// All files currently in the set, directory listing order.
    pub fn log_file_list(&self) -> Vec<PathBuf> {
        self.indexed_files().map(|(_, path)| path).collect()
    }

    fn indexed_files(&self) -> impl Iterator<Item = (usize, PathBuf)> + '_ {
        let entries = fs::read_dir(&self.config.dir)
            .map(|d| d.collect::<Vec<_>>())
            .unwrap_or_default();
        entries.into_iter().filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name();
            let index = self.backup_index(name.to_str()?)?;
            Some((index, entry.path()))
        })
    }

    /// `base.ext` is index 0, `base_N.ext` is index N > 0. Anything else is
    /// not part of the file set.
    fn backup_index(&self, name: &str) -> Option<usize> {
        let stem = name.strip_suffix(&self.config.ext)?.strip_suffix('.')?;
        if stem == self.config.base_name {
            return Some(0);
        }
        let n = stem.strip_prefix(&self.config.base_name)?.strip_prefix('_')?;
        let index: usize = n.parse().ok()?;
        if index > 0 { Some(index) } else { None }
    }

    fn indexed_path(&self, index: usize) -> PathBuf {
        let name = if index > 0 {
            format!("{}_{index}.{}", self.config.base_name, self.config.ext)
        } else {
            format!("{}.{}", self.config.base_name, self.config.ext)
        };
        self.config.dir.join(name)
    }
}

fn delete_if_exists(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    match fs::remove_file(path) {
        Ok(_) => true,
        Err(e) => {
            warn!("could not delete {}: {e}", path.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormatterKind;
    use filog_types::{HeaderInfo, Priority};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn new_strategy(dir: &Path, max_file_size: u64, max_backup: usize) -> RollingFile {
        let mut config = RollingFileConfig::with_dir(dir);
        config.max_file_size = max_file_size;
        config.max_backup = max_backup;
        let formatter = FormatterKind::Default.build(&HeaderInfo {
            app_name: "test".to_string(),
            app_version: "0.0.0".to_string(),
        });
        RollingFile::new(config, formatter).unwrap()
    }

    fn record(message: &str) -> LogRecord {
        LogRecord::new(Priority::Info, "Test", message)
    }

    fn file_names(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn dir_created_on_construction() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/log");
        assert!(!dir.exists());
        new_strategy(&dir, 100, 2);
        assert!(dir.is_dir());
    }

    #[test]
    fn header_written_once_per_file() {
        let tmp = TempDir::new().unwrap();
        let strategy = new_strategy(tmp.path(), 1 << 20, 2);
        strategy.print_record(&record("first"));
        strategy.print_record(&record("second"));

        let content = fs::read_to_string(tmp.path().join("application.log")).unwrap();
        assert_eq!(content.matches("AppName: test").count(), 1);
        assert!(content.starts_with("AppName: test\n"));
        assert!(content.contains("I/Test: first"));
        assert!(content.contains("I/Test: second"));
    }

    #[test]
    fn round_trip_through_file() {
        let tmp = TempDir::new().unwrap();
        let strategy = new_strategy(tmp.path(), 1 << 20, 2);
        let r = record("needle in the haystack");
        strategy.print_record(&r);

        let content = fs::read_to_string(tmp.path().join("application.log")).unwrap();
        assert!(content.contains("I/Test: needle in the haystack"));
        assert!(content.contains(&format!("{}-{}", r.pid, r.tid)));
    }

    #[test]
    fn rotation_scenario_two_backups() {
        let tmp = TempDir::new().unwrap();
        let strategy = new_strategy(tmp.path(), 100, 2);
        // every record formats to well over 100 bytes, so each print after
        // the first starts with a rotation
        let big = "x".repeat(200);
        for _ in 0..4 {
            strategy.print_record(&record(&big));
        }

        let names = file_names(tmp.path());
        assert!(names.contains("application.log"));
        assert!(names.contains("application_1.log"));
        assert!(names.contains("application_2.log"));
        assert!(!names.contains("application_3.log"));
    }

    #[test]
    fn primary_is_fresh_after_rotation() {
        let tmp = TempDir::new().unwrap();
        let strategy = new_strategy(tmp.path(), 100, 2);
        let big = "y".repeat(200);
        strategy.print_record(&record(&big));
        strategy.print_record(&record("after rotation"));

        let primary = fs::read_to_string(tmp.path().join("application.log")).unwrap();
        assert!(!primary.contains(&big));
        assert!(primary.starts_with("AppName: test\n"));
        assert!(primary.contains("I/Test: after rotation"));

        let backup = fs::read_to_string(tmp.path().join("application_1.log")).unwrap();
        assert!(backup.contains(&big));
    }

    #[test]
    fn zero_backup_truncates_in_place() {
        let tmp = TempDir::new().unwrap();
        let strategy = new_strategy(tmp.path(), 100, 0);
        let big = "z".repeat(200);
        strategy.print_record(&record(&big));
        strategy.print_record(&record("fresh"));

        let names = file_names(tmp.path());
        assert_eq!(names.len(), 1);
        let primary = fs::read_to_string(tmp.path().join("application.log")).unwrap();
        assert!(!primary.contains(&big));
        assert!(primary.contains("I/Test: fresh"));
    }

    #[test]
    fn rotation_heals_index_gaps() {
        let tmp = TempDir::new().unwrap();
        let strategy = new_strategy(tmp.path(), 100, 3);
        fs::write(tmp.path().join("application.log"), "p".repeat(200)).unwrap();
        // base_1 is missing on purpose
        fs::write(tmp.path().join("application_2.log"), "old-2").unwrap();

        strategy.print_record(&record("trigger"));

        let names = file_names(tmp.path());
        assert!(names.contains("application.log"));
        assert!(names.contains("application_1.log"));
        assert!(names.contains("application_2.log"));
        assert!(!names.contains("application_3.log"));
        // the pre-existing primary moved to index 1, the old index 2 stayed
        // the oldest
        let b1 = fs::read_to_string(tmp.path().join("application_1.log")).unwrap();
        assert!(b1.starts_with("ppp"));
        let b2 = fs::read_to_string(tmp.path().join("application_2.log")).unwrap();
        assert_eq!(b2, "old-2");
    }

    #[test]
    fn rotation_removes_files_beyond_capacity() {
        let tmp = TempDir::new().unwrap();
        let strategy = new_strategy(tmp.path(), 100, 2);
        fs::write(tmp.path().join("application.log"), "q".repeat(200)).unwrap();
        fs::write(tmp.path().join("application_5.log"), "orphan").unwrap();
        fs::write(tmp.path().join("application_9.log"), "orphan").unwrap();

        strategy.print_record(&record("trigger"));

        let names = file_names(tmp.path());
        assert!(!names.contains("application_5.log"));
        assert!(!names.contains("application_9.log"));
        assert!(names.contains("application.log"));
        assert!(names.contains("application_1.log"));
    }

    #[test]
    fn enumeration_is_idempotent_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let strategy = new_strategy(tmp.path(), 1 << 20, 3);
        strategy.print_record(&record("a"));
        fs::write(tmp.path().join("application_1.log"), "b").unwrap();
        fs::write(tmp.path().join("unrelated.txt"), "nope").unwrap();
        fs::write(tmp.path().join("application_x.log"), "nope").unwrap();

        let first: BTreeSet<PathBuf> = strategy.log_file_list().into_iter().collect();
        let second: BTreeSet<PathBuf> = strategy.log_file_list().into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|p| {
            let n = p.file_name().unwrap().to_string_lossy();
            n == "application.log" || n == "application_1.log"
        }));
    }

    #[test]
    fn write_failure_evicts_backups_then_drops() {
        let tmp = TempDir::new().unwrap();
        let strategy = new_strategy(tmp.path(), 1 << 20, 2);
        // make the primary un-openable for append
        fs::create_dir(tmp.path().join("application.log")).unwrap();
        fs::write(tmp.path().join("application_1.log"), "b1").unwrap();
        fs::write(tmp.path().join("application_2.log"), "b2").unwrap();

        strategy.print_record(&record("doomed"));

        // recovery deleted the backups trying to free space, the write was
        // dropped without panicking
        let names = file_names(tmp.path());
        assert!(!names.contains("application_1.log"));
        assert!(!names.contains("application_2.log"));
        assert!(tmp.path().join("application.log").is_dir());
    }
}
