// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default per-step budget. Kept below the usual five minute message lock so a stuck
/// step never outlives the processing attempt.
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 90;
/// Default time the finalizer gets to report after a cancellation.
pub const DEFAULT_FINALIZER_GRACE_SECS: u64 = 10;
/// Default bounded wait for telemetry after a module restart.
pub const DEFAULT_TELEMETRY_WAIT_SECS: u64 = 30;
/// Default interval between telemetry polls during the wait.
pub const DEFAULT_TELEMETRY_POLL_INTERVAL_SECS: u64 = 5;
/// Default number of alerts processed at the same time.
pub const DEFAULT_MAX_CONCURRENT_ALERTS: usize = 4;
/// Default notification channel for feedback reports.
pub const DEFAULT_NOTIFICATION_CHANNEL: &str = "connectivity-ops";
/// Default window in which a repeated report for the same alert is not sent again.
pub const DEFAULT_ACTIVE_ALERT_TTL_SECS: u64 = 3600;
/// Default bound for the resolver and device mapping calls made before a run starts.
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 30;
