//! Vote-cooldown countdown rendering.
//!
//! The breakdown is a pure function of the target time, the session start
//! captured when the consuming view mounted, and the number of 1-second ticks
//! since. "Now" is re-derived as `session_start + elapsed_ticks` instead of
//! re-reading a live clock, so a paused and resumed view stays in sync with
//! the tick counter that drives its re-render.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

/// Remaining whole days/hours/minutes/seconds until a target time, clamped at
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub const ZERO: Countdown = Countdown {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Break down the time remaining until `target` as seen after
    /// `elapsed_ticks` seconds from `session_start`. Total over all inputs;
    /// a target at or before the derived "now" yields all zeros.
    pub fn remaining(
        target: DateTime<Utc>,
        session_start: DateTime<Utc>,
        elapsed_ticks: u64,
    ) -> Countdown {
        let now = session_start + Duration::seconds(elapsed_ticks as i64);
        let left = (target - now).num_seconds();
        if left <= 0 {
            return Countdown::ZERO;
        }
        Countdown {
            days: left / 86_400,
            hours: (left % 86_400) / 3_600,
            minutes: (left % 3_600) / 60,
            seconds: left % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Countdown::ZERO
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(
                f,
                "{}d {:02}:{:02}:{:02}",
                self.days, self.hours, self.minutes, self.seconds
            )
        } else {
            write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
        }
    }
}

/// Drives countdown re-renders: bumps a shared tick counter once per second
/// until stopped. Stopping (or dropping) aborts the task so no timer leaks
/// when the owning view goes inactive.
#[derive(Debug)]
pub struct Ticker {
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start() -> Self {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            // The first tick of a tokio interval fires immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });
        debug!("Started countdown ticker");
        Self {
            ticks,
            handle: Some(handle),
        }
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Stopped countdown ticker");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
