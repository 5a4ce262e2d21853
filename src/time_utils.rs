// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and call deadlines.

use crate::error::AppError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::future::Future;
use std::time::Duration;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time as RFC3339.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Await `call`, failing with `on_timeout` if it does not finish within `limit`.
pub async fn bounded<T, F>(
    limit: Duration,
    what: &'static str,
    call: F,
    on_timeout: fn(String) -> AppError,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation = what,
                limit_ms = limit.as_millis() as u64,
                "External call timed out"
            );
            Err(on_timeout(format!("{} timed out after {:?}", what, limit)))
        }
    }
}
