// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for feedback delivery events.
//!
//! This module contains message types for logging events related to:
//! * Report delivery per notification channel
//! * Suppression of alerts that are already active on a channel

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Report delivered to one channel.
///
/// # Log Level
/// `info!` - Important operational event
pub struct FeedbackDelivered<'a> {
    pub channel: &'a str,
    pub alert_key: &'a str,
}

impl Display for FeedbackDelivered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Feedback report '{}' delivered to '{}'", self.alert_key, self.channel)
    }
}

impl StructuredLog for FeedbackDelivered<'_> {
    fn log(&self) {
        tracing::info!(
            channel = self.channel,
            alert_key = self.alert_key,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "feedback_delivered",
            span_name = name,
            channel = self.channel,
            alert_key = self.alert_key,
        )
    }
}

/// Same alert was raised on the channel within its active alert window.
///
/// # Log Level
/// `info!` - Expected on redelivery
///
/// # Example
/// ```
/// use connector_remediation::observability::messages::notification::FeedbackSuppressed;
///
/// let msg = FeedbackSuppressed {
///     channel: "connectivity-ops",
///     alert_key: "c-17:unresolved",
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Feedback report 'c-17:unresolved' already active on 'connectivity-ops', not sent again"
/// );
/// ```
pub struct FeedbackSuppressed<'a> {
    pub channel: &'a str,
    pub alert_key: &'a str,
}

impl Display for FeedbackSuppressed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Feedback report '{}' already active on '{}', not sent again",
            self.alert_key, self.channel
        )
    }
}

impl StructuredLog for FeedbackSuppressed<'_> {
    fn log(&self) {
        tracing::info!(
            channel = self.channel,
            alert_key = self.alert_key,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "feedback_suppressed",
            span_name = name,
            channel = self.channel,
            alert_key = self.alert_key,
        )
    }
}

/// Delivery to one channel failed; the other channels are still served.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct FeedbackDeliveryFailed<'a> {
    pub channel: &'a str,
    pub alert_key: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for FeedbackDeliveryFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to deliver feedback report '{}' to '{}': {}",
            self.alert_key, self.channel, self.error
        )
    }
}

impl StructuredLog for FeedbackDeliveryFailed<'_> {
    fn log(&self) {
        tracing::error!(
            channel = self.channel,
            alert_key = self.alert_key,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "feedback_delivery_failed",
            span_name = name,
            channel = self.channel,
            alert_key = self.alert_key,
        )
    }
}

/// Active alert store could not be read or written. Delivery goes ahead.
///
/// # Log Level
/// `warn!` - Degraded, a duplicate report may be sent
pub struct ActiveAlertStoreUnavailable<'a> {
    pub key: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ActiveAlertStoreUnavailable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Active alert store unavailable for '{}': {}", self.key, self.error)
    }
}

impl StructuredLog for ActiveAlertStoreUnavailable<'_> {
    fn log(&self) {
        tracing::warn!(
            key = self.key,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "active_alert_store_unavailable",
            span_name = name,
            key = self.key,
        )
    }
}
