/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use filog_types::LogRecord;

use super::{format_prefix, LogFormatter};

const LINE_SEPARATOR: &str = "\n    ";

/// Renders one prefix per record; continuation lines are indented under it.
pub(crate) struct PrefixedFormatter {
    header: String,
}

impl PrefixedFormatter {
    pub(crate) fn new(header: String) -> Self {
        PrefixedFormatter { header }
    }
}

impl LogFormatter for PrefixedFormatter {
    fn header(&self) -> &str {
        &self.header
    }

    fn format_record(&self, record: &LogRecord) -> String {
        let prefix = format_prefix(record);
        let mut out = String::with_capacity(record.message.len() + prefix.len());
        out.push_str(&prefix);
        for (i, line) in record.message.split('\n').enumerate() {
            if i > 0 {
                out.push_str(LINE_SEPARATOR);
            }
            out.push_str(line);
        }
        out
    }
}
