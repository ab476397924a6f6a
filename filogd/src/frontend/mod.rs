/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use log::{debug, warn};

use filog_proto::{FrameError, RejectKind, Request, Response, read_frame, write_frame};

mod stats;
pub(crate) use stats::FrontendStats;

use crate::Shared;

pub(crate) fn spawn(listener: UnixListener, shared: Arc<Shared>) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("filog-accept".to_string())
        .spawn(move || accept_loop(listener, shared))
        .context("failed to spawn frontend accept thread")?;
    Ok(())
}

fn accept_loop(listener: UnixListener, shared: Arc<Shared>) {
    loop {
        match listener.accept() {
            Ok((stream, _addr)) => {
                shared.frontend_stats.add_conn_total();
                let shared = shared.clone();
                let r = thread::Builder::new()
                    .name("filog-conn".to_string())
                    .spawn(move || {
                        if let Err(e) = serve_connection(stream, &shared) {
                            debug!("connection closed with error: {e}");
                        }
                    });
                if let Err(e) = r {
                    warn!("failed to spawn connection thread: {e}");
                }
            }
            Err(e) => warn!("accept failed: {e}"),
        }
    }
}

fn serve_connection(mut stream: UnixStream, shared: &Shared) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    loop {
        let rsp = match read_frame::<_, Request>(&mut reader) {
            Ok(Some(req)) => {
                shared.frontend_stats.add_request_total();
                handle_request(req, shared)
            }
            Ok(None) => return Ok(()),
            Err(FrameError::TooLarge) => {
                shared.frontend_stats.add_request_oversize();
                Response::reject(
                    RejectKind::PayloadTooLarge,
                    "request frame exceeds the size limit",
                )
            }
            Err(FrameError::Decode(e)) => {
                shared.frontend_stats.add_request_invalid();
                Response::reject(RejectKind::InvalidRequest, format!("invalid request: {e}"))
            }
            Err(FrameError::Io(e)) => return Err(e),
        };
        write_frame(&mut stream, &rsp)?;
    }
}

fn handle_request(req: Request, shared: &Shared) -> Response {
    match req {
        Request::Insert { record } => {
            let count = shared.enqueue(vec![record]);
            Response::Accepted { count }
        }
        Request::BulkInsert { records } => {
            let count = shared.enqueue(records);
            Response::Accepted { count }
        }
        Request::GetStatus => {
            let (status, version) = shared.store.get();
            Response::Status { status, version }
        }
        Request::SetStatus { status } => {
            let version = shared.store.set(status);
            shared
                .writer
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .set_status(status);
            Response::Status { status, version }
        }
        Request::ListFiles => {
            let paths = shared
                .writer
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .strategy()
                .log_file_list();
            Response::Files { paths }
        }
        Request::Delete => Response::reject(
            RejectKind::Unsupported,
            "log files are removed by rotation only",
        ),
    }
}
