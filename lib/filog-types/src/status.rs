/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Priority;

/// The process-wide logging switch.
///
/// Ordered as a verbosity lattice: `Disabled < CrashOnly < Enabled`. Any
/// state may be set from any other, the ordering only matters for admission
/// checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Disabled,
    CrashOnly,
    Enabled,
}

impl Status {
    pub fn admits(&self, priority: Priority) -> bool {
        match self {
            Status::Disabled => false,
            Status::CrashOnly => priority == Priority::Crash,
            Status::Enabled => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Disabled => "disabled",
            Status::CrashOnly => "crash_only",
            Status::Enabled => "enabled",
        }
    }

    pub fn from_name(s: &str) -> Option<Status> {
        match s {
            "disabled" => Some(Status::Disabled),
            "crash_only" | "crash-only" => Some(Status::CrashOnly),
            "enabled" => Some(Status::Enabled),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
