//
//  enterprise-cli
//  api/retry.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Retry Policy
//!
//! Bounded exponential backoff for transient failures (429, 5xx, network).
//!
//! The delay before attempt `n` (for `n >= 2`) is
//! `base_delay * multiplier^(n - 2)`, capped at `max_delay`. A `Retry-After`
//! hint on a rate-limited response replaces the computed delay (and is
//! clamped to the same cap).
//!
//! | Attempt | Delay (base 500ms, x2, cap 30s) |
//! |---------|---------------------------------|
//! | 1 | none |
//! | 2 | 500ms |
//! | 3 | 1s |
//! | 4 | 2s |

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::HttpSettings;

/// Bounded retry schedule applied by the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Builds the policy from the `[http]` settings.
    pub fn from_settings(settings: &HttpSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            multiplier: settings.multiplier,
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }

    /// Computed backoff before attempt `attempt` (1-based).
    ///
    /// # Returns
    ///
    /// `Duration::ZERO` for the first attempt, otherwise
    /// `min(base_delay * multiplier^(attempt - 2), max_delay)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let millis = self.base_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay before attempt `attempt`, preferring the server's hint when present.
    pub fn delay_before(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint.min(self.max_delay),
            None => self.backoff(attempt),
        }
    }
}

/// Parses a `Retry-After` header value.
///
/// Accepts delta-seconds (`"2"`) or an HTTP date
/// (`"Wed, 21 Oct 2026 07:28:00 GMT"`). Dates in the past yield zero.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    if let Ok(seconds) = value.parse::<f64>() {
        if seconds.is_finite() && seconds >= 0.0 {
            return Some(Duration::from_millis((seconds * 1000.0) as u64));
        }
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&Utc) - Utc::now();
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(2), Duration::from_millis(100));
        assert_eq!(policy.backoff(3), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(350));
        assert_eq!(policy.backoff(5), Duration::from_millis(350));
    }

    #[test]
    fn test_hint_takes_precedence() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_before(2, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(policy.delay_before(2, None), Duration::from_millis(500));
    }

    #[test]
    fn test_hint_is_clamped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_before(2, Some(Duration::from_secs(3600))),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after("0.5"), Some(Duration::from_millis(500)));
        assert_eq!(
            parse_retry_after("Mon, 01 Jan 2001 00:00:00 GMT"),
            Some(Duration::ZERO)
        );
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_none_makes_one_attempt() {
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }
}
