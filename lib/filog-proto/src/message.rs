/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use filog_types::{LogRecord, Status};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Insert { record: LogRecord },
    BulkInsert { records: Vec<LogRecord> },
    GetStatus,
    SetStatus { status: Status },
    ListFiles,
    Delete,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "rsp", rename_all = "snake_case")]
pub enum Response {
    Accepted { count: usize },
    Status { status: Status, version: u64 },
    Files { paths: Vec<PathBuf> },
    Error { kind: RejectKind, message: String },
}

impl Response {
    pub fn reject(kind: RejectKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectKind {
    PayloadTooLarge,
    InvalidRequest,
    Unsupported,
}
