/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct LogSnapshot {
    pub io: LogIoSnapshot,
    pub drop: LogDropSnapshot,
}

#[derive(Default, Debug, Eq, PartialEq)]
pub struct LogIoSnapshot {
    pub total: u64,
    pub passed: u64,
    pub size: u64,
}

#[derive(Default, Debug, Eq, PartialEq)]
pub struct LogDropSnapshot {
    pub channel_closed: u64,
    pub channel_overflow: u64,
    pub peer_unreachable: u64,
    pub payload_oversize: u64,
}

#[derive(Default)]
pub struct LogStats {
    pub io: LogIoStats,
    pub drop: LogDropStats,
}

impl LogStats {
    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            io: self.io.snapshot(),
            drop: self.drop.snapshot(),
        }
    }
}

#[derive(Default)]
pub struct LogIoStats {
    total: AtomicU64,
    passed: AtomicU64,
    size: AtomicU64,
}

impl LogIoStats {
    pub fn snapshot(&self) -> LogIoSnapshot {
        LogIoSnapshot {
            total: self.total.load(Ordering::Relaxed),
            passed: self.passed.load(Ordering::Relaxed),
            size: self.size.load(Ordering::Relaxed),
        }
    }

    pub fn add_total(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_total_n(&self, n: usize) {
        self.total.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_passed_n(&self, n: usize) {
        self.passed.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_size(&self, size: usize) {
        self.size.fetch_add(size as u64, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct LogDropStats {
    channel_closed: AtomicU64,
    channel_overflow: AtomicU64,
    peer_unreachable: AtomicU64,
    payload_oversize: AtomicU64,
}

impl LogDropStats {
    pub fn snapshot(&self) -> LogDropSnapshot {
        LogDropSnapshot {
            channel_closed: self.channel_closed.load(Ordering::Relaxed),
            channel_overflow: self.channel_overflow.load(Ordering::Relaxed),
            peer_unreachable: self.peer_unreachable.load(Ordering::Relaxed),
            payload_oversize: self.payload_oversize.load(Ordering::Relaxed),
        }
    }

    pub fn add_channel_closed(&self) {
        self.channel_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_channel_overflow(&self) {
        self.channel_overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_peer_unreachable_n(&self, n: usize) {
        self.peer_unreachable.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_payload_oversize_n(&self, n: usize) {
        self.payload_oversize.fetch_add(n as u64, Ordering::Relaxed);
    }
}
