/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use filog_types::LogRecord;

use super::{format_prefix, LogFormatter};

/// Renders every line of a multi-line message with the full prefix, so each
/// output line is self-describing.
pub(crate) struct DefaultFormatter {
    header: String,
}

impl DefaultFormatter {
    pub(crate) fn new(header: String) -> Self {
        DefaultFormatter { header }
    }
}

impl LogFormatter for DefaultFormatter {
    fn header(&self) -> &str {
        &self.header
    }

    fn format_record(&self, record: &LogRecord) -> String {
        let prefix = format_prefix(record);
        let mut out = String::with_capacity(record.message.len() + prefix.len());
        for (i, line) in record.message.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&prefix);
            out.push_str(line);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_record;
    use super::*;

    #[test]
    fn single_line_layout() {
        let f = DefaultFormatter::new(String::new());
        let out = f.format_record(&test_record("hello world"));
        assert!(out.ends_with(" 11-22 I/Test: hello world"));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn every_line_gets_the_prefix() {
        let f = DefaultFormatter::new(String::new());
        let out = f.format_record(&test_record("first\nsecond"));
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("I/Test: first"));
        assert!(lines[1].ends_with("I/Test: second"));
        // both lines carry the identical prefix
        let p0 = lines[0].strip_suffix("first").unwrap();
        let p1 = lines[1].strip_suffix("second").unwrap();
        assert_eq!(p0, p1);
    }

    #[test]
    fn trailing_newline_yields_empty_prefixed_line() {
        let f = DefaultFormatter::new(String::new());
        let out = f.format_record(&test_record("done\n"));
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("I/Test: "));
    }
}
