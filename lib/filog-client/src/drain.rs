/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use slog::{Drain, Level, OwnedKVList, Record};

use filog_types::Priority;

use super::LogContext;

/// `slog` drain that feeds a posting context, so an application's existing
/// structured logging can be persisted by the logger process unchanged.
pub struct FilogDrain {
    ctx: Arc<LogContext>,
}

impl FilogDrain {
    pub fn new(ctx: Arc<LogContext>) -> Self {
        FilogDrain { ctx }
    }
}

impl Drain for FilogDrain {
    type Ok = ();
    type Err = slog::Never;

    fn log(&self, record: &Record, _logger_values: &OwnedKVList) -> Result<(), Self::Err> {
        let priority = match record.level() {
            Level::Critical => Priority::Assert,
            Level::Error => Priority::Error,
            Level::Warning => Priority::Warn,
            Level::Info => Priority::Info,
            Level::Debug => Priority::Debug,
            Level::Trace => Priority::Verbose,
        };
        let tag = if record.tag().is_empty() {
            record.module()
        } else {
            record.tag()
        };
        self.ctx.post_log(priority, tag, &record.msg().to_string());
        Ok(())
    }
}
