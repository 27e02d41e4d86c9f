// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fixed-interval readiness polling.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Interval and total budget of a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSchedule {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn from_secs(interval_secs: u64, timeout_secs: u64) -> Self {
        Self::new(
            Duration::from_secs(interval_secs),
            Duration::from_secs(timeout_secs),
        )
    }

    /// Number of queries the loop issues: `timeout / interval`, never less than one
    pub fn attempts(&self) -> u32 {
        let interval = self.interval.as_nanos();
        if interval == 0 {
            return 1;
        }
        let attempts = self.timeout.as_nanos() / interval;
        u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
    }
}

/// Result of a polling loop. A timeout is not an error; callers decide how loud to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready { value: T, attempts: u32 },
    TimedOut { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            PollOutcome::Ready { value, .. } => Some(value),
            PollOutcome::TimedOut { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            PollOutcome::Ready { value, .. } => Some(value),
            PollOutcome::TimedOut { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::TimedOut { attempts } => *attempts,
        }
    }
}

/// Query `query` every `schedule.interval` until it yields a value or the attempt
/// budget is spent. Query errors count as "not ready yet".
pub async fn poll_until<T, E, F, Fut>(
    description: &str,
    schedule: PollSchedule,
    mut query: F,
) -> PollOutcome<T>
where
    T: Display,
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, E>>,
{
    let budget = schedule.attempts();

    for attempt in 1..=budget {
        match query().await {
            Ok(Some(value)) => {
                info!("{} ready after {} attempt(s): {}", description, attempt, value);
                return PollOutcome::Ready {
                    value,
                    attempts: attempt,
                };
            }
            Ok(None) => {
                debug!("{} not ready ({}/{})", description, attempt, budget);
            }
            Err(e) => {
                debug!(error = %e, "{} query failed ({}/{})", description, attempt, budget);
            }
        }

        if attempt < budget {
            sleep(schedule.interval).await;
        }
    }

    warn!(
        "Timed out after {} attempt(s) ({:?}) waiting for {}",
        budget, schedule.timeout, description
    );
    PollOutcome::TimedOut { attempts: budget }
}

/// Treat empty strings the same as absent values
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
