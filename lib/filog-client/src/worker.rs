/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use flume::RecvTimeoutError;

use filog_types::LogRecord;

use super::transport::{bulk_attempt, deliver_chunk, Transport};
use super::{LogContext, MAX_RECORDS_PER_CALL};

pub(crate) fn spawn(ctx: Arc<LogContext>) -> anyhow::Result<()> {
    let thread_name = ctx.config().channel.thread_name.clone();
    let dispatcher = Dispatcher {
        transport: Transport::new(ctx.config().socket_path.clone()),
        recv_buf: Vec::with_capacity(MAX_RECORDS_PER_CALL),
        last_status_refresh: Instant::now(),
        ctx,
    };
    std::thread::Builder::new()
        .name(thread_name)
        .spawn(move || dispatcher.run_to_end())?;
    Ok(())
}

/// The single long-lived background worker of a posting process: drains the
/// pending channel in batches, transports them, and keeps the cached status
/// fresh at least once per poll interval, busy or idle.
struct Dispatcher {
    ctx: Arc<LogContext>,
    transport: Transport,
    recv_buf: Vec<LogRecord>,
    last_status_refresh: Instant,
}

impl Dispatcher {
    fn run_to_end(mut self) {
        loop {
            match self
                .ctx
                .receiver()
                .recv_timeout(self.ctx.config().idle_poll_interval)
            {
                Ok(record) => {
                    self.ctx.dispatch_busy().store(true, Ordering::Release);
                    self.recv_buf.push(record);
                    self.drain_and_send();
                    self.ctx.dispatch_busy().store(false, Ordering::Release);
                    // a steady producer keeps this branch hot, the status
                    // still has to stay fresh within one poll interval
                    if self.last_status_refresh.elapsed() >= self.ctx.config().idle_poll_interval
                    {
                        self.refresh_status();
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.refresh_status();
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn refresh_status(&mut self) {
        self.ctx.refresh_status(&mut self.transport);
        self.last_status_refresh = Instant::now();
    }

    /// Snapshot everything currently queued, then transport it in bounded
    /// chunks.
    fn drain_and_send(&mut self) {
        while let Ok(record) = self.ctx.receiver().try_recv() {
            self.recv_buf.push(record);
        }

        let stats = self.ctx.stats();
        let mut attempt = bulk_attempt(&mut self.transport);
        for chunk in self.recv_buf.chunks(MAX_RECORDS_PER_CALL) {
            deliver_chunk(chunk, &stats, &mut attempt);
        }
        self.recv_buf.clear();
    }
}
