/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub(crate) struct FrontendStats {
    conn_total: AtomicU64,
    request_total: AtomicU64,
    request_invalid: AtomicU64,
    request_oversize: AtomicU64,
    record_accepted: AtomicU64,
}

impl FrontendStats {
    pub(crate) fn add_conn_total(&self) {
        self.conn_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_request_total(&self) {
        self.request_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_request_invalid(&self) {
        self.request_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_request_oversize(&self) {
        self.request_oversize.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_record_accepted_n(&self, n: usize) {
        self.record_accepted.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn conn_total(&self) -> u64 {
        self.conn_total.load(Ordering::Relaxed)
    }

    pub(crate) fn request_total(&self) -> u64 {
        self.request_total.load(Ordering::Relaxed)
    }

    pub(crate) fn request_invalid(&self) -> u64 {
        self.request_invalid.load(Ordering::Relaxed)
    }

    pub(crate) fn request_oversize(&self) -> u64 {
        self.request_oversize.load(Ordering::Relaxed)
    }

    pub(crate) fn record_accepted(&self) -> u64 {
        self.record_accepted.load(Ordering::Relaxed)
    }
}
