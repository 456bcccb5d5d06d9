// ABOUTME: Per-subject rate limiting for coach turns
// ABOUTME: Fixed-window limiter on DashMap plus the 429 error and X-RateLimit headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Rate Limiting
//!
//! Turns are rate limited per authenticated subject before any orchestration
//! starts. The limiter is a collaborator behind [`RateLimiter`]; the
//! reference implementation counts requests in fixed windows.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::errors::AppError;

/// HTTP header names for rate limiting
pub mod headers {
    /// Quota per window
    pub const X_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
    /// Requests left in the window
    pub const X_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
    /// Window reset as a Unix timestamp
    pub const X_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
    /// Seconds until a retry may succeed
    pub const RETRY_AFTER: &str = "retry-after";
}

/// Result of one rate-limit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub ok: bool,
    /// Quota per window
    pub limit: u32,
    /// Requests left in the window
    pub remaining: u32,
    /// When the window resets
    pub reset_at: DateTime<Utc>,
    /// Milliseconds until a retry may succeed, when refused
    pub retry_after_ms: Option<u64>,
}

impl RateLimitDecision {
    /// Seconds to advertise in `Retry-After`, rounded up
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after_ms.map(|ms| ms.div_ceil(1000).max(1))
    }

    /// `X-RateLimit-*` and `Retry-After` headers
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.limit.to_string()) {
            map.insert(headers::X_RATE_LIMIT_LIMIT, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.remaining.to_string()) {
            map.insert(headers::X_RATE_LIMIT_REMAINING, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.reset_at.timestamp().to_string()) {
            map.insert(headers::X_RATE_LIMIT_RESET, value);
        }
        if let Some(secs) = self.retry_after_secs() {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                map.insert(headers::RETRY_AFTER, value);
            }
        }
        map
    }

    /// The 429 error for a refused request
    #[must_use]
    pub fn to_error(&self) -> AppError {
        AppError::rate_limit_exceeded(self.limit, self.reset_at.to_rfc3339())
    }
}

/// Admission check for coach turns
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request for `subject` and decide whether it may proceed
    async fn check(&self, subject: &str) -> RateLimitDecision;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    count: u32,
}

/// Fixed-window limiter keyed by subject
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl InMemoryRateLimiter {
    /// Allow `limit` requests per `window`
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    /// Decide at `now`
    #[must_use]
    pub fn check_at(&self, subject: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let window_len =
            chrono::Duration::from_std(self.window).unwrap_or_else(|_| chrono::Duration::seconds(60));

        let mut entry = self.windows.entry(subject.to_owned()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if now >= entry.started_at + window_len {
            *entry = Window {
                started_at: now,
                count: 0,
            };
        }

        let reset_at = entry.started_at + window_len;
        if entry.count >= self.limit {
            let retry_after_ms = (reset_at - now).num_milliseconds().max(0) as u64;
            return RateLimitDecision {
                ok: false,
                limit: self.limit,
                remaining: 0,
                reset_at,
                retry_after_ms: Some(retry_after_ms),
            };
        }

        entry.count += 1;
        RateLimitDecision {
            ok: true,
            limit: self.limit,
            remaining: self.limit - entry.count,
            reset_at,
            retry_after_ms: None,
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, subject: &str) -> RateLimitDecision {
        self.check_at(subject, Utc::now())
    }
}
