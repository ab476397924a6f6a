/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, BufRead, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Hard ceiling for one serialized frame, newline excluded.
pub const MAX_FRAME_SIZE: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame exceeds {MAX_FRAME_SIZE} bytes")]
    TooLarge,
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io failed: {0}")]
    Io(#[from] io::Error),
}

pub fn write_frame<W: Write, T: Serialize>(w: &mut W, v: &T) -> io::Result<()> {
    let mut buf = serde_json::to_vec(v).map_err(io::Error::other)?;
    buf.push(b'\n');
    w.write_all(&buf)?;
    w.flush()
}

/// Read one frame. Returns `Ok(None)` on clean EOF between frames.
///
/// An over-long line is consumed up to its terminating newline but never
/// kept in memory, so the caller can answer with a reject and keep reading.
pub fn read_frame<R: BufRead, T: DeserializeOwned>(r: &mut R) -> Result<Option<T>, FrameError> {
    let mut line: Vec<u8> = Vec::new();
    let mut oversize = false;

    loop {
        let consumed;
        let mut terminated = false;
        {
            let chunk = r.fill_buf()?;
            if chunk.is_empty() {
                if oversize {
                    return Err(FrameError::TooLarge);
                }
                if line.is_empty() {
                    return Ok(None);
                }
                return Err(FrameError::Io(io::ErrorKind::UnexpectedEof.into()));
            }
            match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    if !oversize {
                        line.extend_from_slice(&chunk[..pos]);
                    }
                    consumed = pos + 1;
                    terminated = true;
                }
                None => {
                    if !oversize {
                        line.extend_from_slice(chunk);
                    }
                    consumed = chunk.len();
                }
            }
        }
        r.consume(consumed);

        if line.len() > MAX_FRAME_SIZE {
            oversize = true;
            line.clear();
        }
        if terminated {
            if oversize {
                return Err(FrameError::TooLarge);
            }
            let v = serde_json::from_slice(&line)?;
            return Ok(Some(v));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn round_trip() {
        let mut buf: Vec<u8> = Vec::new();
        write_frame(&mut buf, &"first").unwrap();
        write_frame(&mut buf, &"second").unwrap();

        let mut r = BufReader::new(buf.as_slice());
        let a: Option<String> = read_frame(&mut r).unwrap();
        assert_eq!(a.as_deref(), Some("first"));
        let b: Option<String> = read_frame(&mut r).unwrap();
        assert_eq!(b.as_deref(), Some("second"));
        let c: Option<String> = read_frame(&mut r).unwrap();
        assert!(c.is_none());
    }

    #[test]
    fn oversize_is_discarded_not_fatal() {
        let mut buf: Vec<u8> = Vec::new();
        buf.push(b'"');
        buf.resize(MAX_FRAME_SIZE + 16, b'x');
        buf.extend_from_slice(b"\"\n");
        write_frame(&mut buf, &"after").unwrap();

        // small read buffer to exercise the incremental discard path
        let mut r = BufReader::with_capacity(64, buf.as_slice());
        match read_frame::<_, String>(&mut r) {
            Err(FrameError::TooLarge) => {}
            other => panic!("expected TooLarge, got {other:?}"),
        }
        let next: Option<String> = read_frame(&mut r).unwrap();
        assert_eq!(next.as_deref(), Some("after"));
    }

    #[test]
    fn truncated_frame_is_io_error() {
        let mut r = BufReader::new(&b"\"no newline"[..]);
        match read_frame::<_, String>(&mut r) {
            Err(FrameError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn bad_json_is_decode_error() {
        let mut r = BufReader::new(&b"{not json}\n"[..]);
        assert!(matches!(
            read_frame::<_, String>(&mut r),
            Err(FrameError::Decode(_))
        ));
    }
}
