/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::Write;

use chrono::{Local, TimeZone};

use filog_types::{HeaderInfo, LogRecord};

mod default;
mod prefixed;

pub(crate) use default::DefaultFormatter;
pub(crate) use prefixed::PrefixedFormatter;

pub trait LogFormatter {
    /// One-time block written at the top of every fresh log file.
    fn header(&self) -> &str;

    fn format_record(&self, record: &LogRecord) -> String;

    fn format_batch(&self, records: &[LogRecord]) -> String {
        let mut out = String::new();
        for (i, r) in records.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_record(r));
        }
        out
    }
}

pub type BoxLogFormatter = Box<dyn LogFormatter + Send>;

/// Compile-time registered formatter variants, selected by configuration at
/// startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatterKind {
    /// every message line carries the full prefix
    #[default]
    Default,
    /// one prefix, continuation lines indented
    Prefixed,
}

impl FormatterKind {
    pub fn from_name(s: &str) -> Option<FormatterKind> {
        match s {
            "default" => Some(FormatterKind::Default),
            "prefixed" => Some(FormatterKind::Prefixed),
            _ => None,
        }
    }

    pub fn build(&self, info: &HeaderInfo) -> BoxLogFormatter {
        let header = build_header(info);
        match self {
            FormatterKind::Default => Box::new(DefaultFormatter::new(header)),
            FormatterKind::Prefixed => Box::new(PrefixedFormatter::new(header)),
        }
    }
}

fn build_header(info: &HeaderInfo) -> String {
    let mut header = String::with_capacity(128);
    let _ = write!(header, "AppName: {}", info.app_name);
    let _ = write!(header, "\nVersion: {}", info.app_version);
    #[cfg(unix)]
    {
        let uts = rustix::system::uname();
        let _ = write!(
            header,
            "\nOS: {} {}",
            uts.sysname().to_string_lossy(),
            uts.release().to_string_lossy()
        );
        let _ = write!(header, "\nMachine: {}", uts.machine().to_string_lossy());
        let _ = write!(header, "\nHost: {}", uts.nodename().to_string_lossy());
    }
    header
}

pub(crate) fn format_date(timestamp_millis: i64) -> String {
    let dt = Local
        .timestamp_millis_opt(timestamp_millis)
        .single()
        .unwrap_or_else(Local::now);
    dt.format("%m-%d %H:%M:%S%.3f").to_string()
}

pub(crate) fn format_prefix(record: &LogRecord) -> String {
    format!(
        "{} {}-{} {}/{}: ",
        format_date(record.timestamp),
        record.pid,
        record.tid,
        record.priority.as_code(),
        record.tag
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use filog_types::Priority;

    pub(super) fn test_record(message: &str) -> LogRecord {
        LogRecord {
            priority: Priority::Info,
            tag: "Test".to_string(),
            message: message.to_string(),
            pid: 11,
            tid: 22,
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn header_identity() {
        let info = HeaderInfo {
            app_name: "demo".to_string(),
            app_version: "1.2.3".to_string(),
        };
        let header = build_header(&info);
        assert!(header.starts_with("AppName: demo\nVersion: 1.2.3"));
        assert!(!header.ends_with('\n'));
    }

    #[test]
    fn header_cached_per_formatter() {
        let info = HeaderInfo::default();
        let f = FormatterKind::Default.build(&info);
        let a = f.header().as_ptr();
        let b = f.header().as_ptr();
        assert_eq!(a, b);
    }

    #[test]
    fn batch_join() {
        let f = FormatterKind::Default.build(&HeaderInfo::default());
        let records = vec![test_record("one"), test_record("two")];
        let out = f.format_batch(&records);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("I/Test: one"));
        assert!(lines[1].ends_with("I/Test: two"));
    }

    #[test]
    fn kind_from_name() {
        assert_eq!(FormatterKind::from_name("default"), Some(FormatterKind::Default));
        assert_eq!(FormatterKind::from_name("prefixed"), Some(FormatterKind::Prefixed));
        assert_eq!(FormatterKind::from_name("xml"), None);
    }
}
