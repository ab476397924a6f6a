/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::Context;
use log::debug;

use filog::LogWriter;
use filog_types::LogRecord;

const MAX_BATCH_SIZE: usize = 1024;

/// The single thread with write access to the rolling file set.
pub(crate) fn spawn(
    thread_name: &str,
    receiver: flume::Receiver<LogRecord>,
    writer: Arc<Mutex<LogWriter>>,
) -> anyhow::Result<()> {
    thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || run(receiver, writer))
        .context("failed to spawn backend writer thread")?;
    Ok(())
}

fn run(receiver: flume::Receiver<LogRecord>, writer: Arc<Mutex<LogWriter>>) {
    let mut batch: Vec<LogRecord> = Vec::with_capacity(MAX_BATCH_SIZE);
    while let Ok(record) = receiver.recv() {
        batch.push(record);
        while batch.len() < MAX_BATCH_SIZE {
            let Ok(record) = receiver.try_recv() else {
                break;
            };
            batch.push(record);
        }
        writer
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .print_batch(std::mem::take(&mut batch));
        batch = Vec::with_capacity(MAX_BATCH_SIZE);
    }
    debug!("backend writer thread exiting, all senders dropped");
}
