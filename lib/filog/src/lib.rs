/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Durable, size-bounded, crash-tolerant rolling-file log storage.
//!
//! This crate is the storage side of the system: records delivered to the
//! logger process are rendered by a [`LogFormatter`] and appended to a
//! rotating file set by the [`RollingFile`] strategy, gated by the
//! process-wide [`filog_types::Status`] through [`LogWriter`].

mod format;
mod strategy;
mod writer;

pub use format::{BoxLogFormatter, FormatterKind, LogFormatter};
pub use strategy::RollingFile;
pub use writer::LogWriter;
