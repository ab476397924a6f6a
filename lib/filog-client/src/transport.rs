/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, BufReader};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use filog_proto::{read_frame, write_frame, FrameError, RejectKind, Request, Response};
use filog_types::{LogRecord, LogStats};

/// Lazily-connected handle to the logger process, released and recreated
/// whenever a failure is detected.
pub(crate) struct Transport {
    path: PathBuf,
    conn: Option<Conn>,
}

struct Conn {
    writer: UnixStream,
    reader: BufReader<UnixStream>,
}

impl Transport {
    pub(crate) fn new(path: PathBuf) -> Self {
        Transport { path, conn: None }
    }

    fn connect(&mut self) -> io::Result<&mut Conn> {
        if self.conn.is_none() {
            let stream = UnixStream::connect(&self.path)?;
            let reader = BufReader::new(stream.try_clone()?);
            self.conn = Some(Conn {
                writer: stream,
                reader,
            });
        }
        Ok(self.conn.as_mut().unwrap())
    }

    pub(crate) fn reset(&mut self) {
        self.conn = None;
    }

    pub(crate) fn call(&mut self, req: &Request) -> io::Result<Response> {
        let conn = self.connect()?;
        write_frame(&mut conn.writer, req)?;
        match read_frame::<_, Response>(&mut conn.reader) {
            Ok(Some(rsp)) => Ok(rsp),
            Ok(None) => Err(io::ErrorKind::ConnectionAborted.into()),
            Err(FrameError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    /// One request over a short-lived connection, for control operations
    /// outside the dispatcher.
    pub(crate) fn oneshot(path: &Path, req: &Request) -> io::Result<Response> {
        Transport::new(path.to_path_buf()).call(req)
    }
}

/// Outcome of one delivery attempt, as the retry policy sees it.
pub(crate) enum DeliverResult {
    Accepted(usize),
    TooLarge,
    Unreachable,
}

/// A delivery attempt over `transport`, resetting the connection on any
/// failure other than an explicit payload rejection.
pub(crate) fn bulk_attempt(
    transport: &mut Transport,
) -> impl FnMut(&[LogRecord]) -> DeliverResult + '_ {
    move |records| {
        let req = Request::BulkInsert {
            records: records.to_vec(),
        };
        match transport.call(&req) {
            Ok(Response::Accepted { count }) => DeliverResult::Accepted(count),
            Ok(Response::Error {
                kind: RejectKind::PayloadTooLarge,
                ..
            }) => DeliverResult::TooLarge,
            Ok(rsp) => {
                debug!("unexpected bulk insert response: {rsp:?}");
                transport.reset();
                DeliverResult::Unreachable
            }
            Err(e) => {
                debug!("bulk insert transport failed: {e}");
                transport.reset();
                DeliverResult::Unreachable
            }
        }
    }
}

/// Deliver one chunk under the degradation policy: an oversized payload is
/// bisected and each half retried; an unreachable logger gets exactly one
/// reconnect-and-retry. Total attempts stay O(len), forward progress is
/// guaranteed.
pub(crate) fn deliver_chunk<F>(records: &[LogRecord], stats: &LogStats, attempt: &mut F)
where
    F: FnMut(&[LogRecord]) -> DeliverResult,
{
    deliver_inner(records, stats, attempt, false)
}

fn deliver_inner<F>(records: &[LogRecord], stats: &LogStats, attempt: &mut F, reconnected: bool)
where
    F: FnMut(&[LogRecord]) -> DeliverResult,
{
    if records.is_empty() {
        return;
    }
    match attempt(records) {
        DeliverResult::Accepted(n) => {
            stats.io.add_passed_n(n);
            stats
                .io
                .add_size(records.iter().map(|r| r.message.len()).sum());
        }
        DeliverResult::TooLarge => {
            if records.len() <= 1 {
                warn!("dropping one record, payload too large even alone");
                stats.drop.add_payload_oversize_n(records.len());
            } else {
                let mid = records.len() / 2;
                deliver_inner(&records[..mid], stats, attempt, false);
                deliver_inner(&records[mid..], stats, attempt, false);
            }
        }
        DeliverResult::Unreachable => {
            if reconnected {
                warn!("dropping {} records, logger process unreachable", records.len());
                stats.drop.add_peer_unreachable_n(records.len());
            } else {
                deliver_inner(records, stats, attempt, true);
            }
        }
    }
}
