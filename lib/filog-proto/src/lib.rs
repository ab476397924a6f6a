/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Wire protocol between posting processes and the logger process.
//!
//! Requests and responses travel as newline-delimited JSON frames over a
//! unix stream socket. A frame may never exceed [`MAX_FRAME_SIZE`]; the
//! reader discards oversized frames without buffering them so the
//! connection stays usable for the error reply.

mod frame;
mod message;

pub use frame::{read_frame, write_frame, FrameError, MAX_FRAME_SIZE};
pub use message::{RejectKind, Request, Response};
