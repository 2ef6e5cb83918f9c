//! Wall-clock access and the bootstrap synchronization gate.
//!
//! The scheduler only ever asks "what time of day is it"; it gets that
//! through the [`Clock`] trait so tests can pin the answer.  Production uses
//! [`SystemClock`] (chrono local time; the host's TZ database applies).
//!
//! [`wait_for_sync`] is the bootstrap gate: embedded deployments come up
//! with an epoch-era clock until NTP fixes it, and peak-window decisions
//! made against such a clock are garbage.  The gate polls until the year
//! looks plausible, then lets bootstrap continue.  It gives up after a
//! bounded number of attempts; running with an implausible clock is the
//! caller's call to make, not a fatal condition.

use std::time::Duration;

use chrono::{DateTime, Datelike, Local, Timelike};
use tokio::time::sleep;
use tracing::info;

use crate::window::TimeOfDay;

// ── Constants ─────────────────────────────────────────────────────────────────

/// A clock reporting a year before this has clearly not been synchronized.
pub const MIN_PLAUSIBLE_YEAR: i32 = 2016;

/// Delay between synchronization polls.
pub const SYNC_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of polls before [`wait_for_sync`] gives up.
pub const SYNC_MAX_ATTEMPTS: u32 = 10;

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Source of wall-clock readings.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Current hour/minute, the only reading the scheduler consumes.
    fn time_of_day(&self) -> TimeOfDay {
        let now = self.now();
        TimeOfDay::new(now.hour() as u8, now.minute() as u8)
    }
}

/// Production clock: the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

// ── Synchronization gate ──────────────────────────────────────────────────────

/// Poll `clock` until it reports a plausible year, sleeping
/// [`SYNC_POLL_INTERVAL`] between polls.
///
/// Returns `true` as soon as the clock looks synchronized, `false` after
/// `max_attempts` implausible readings.  Never returns an error: whether to
/// proceed with an unsynchronized clock is the caller's decision.
pub async fn wait_for_sync(clock: &dyn Clock, max_attempts: u32) -> bool {
    let mut attempt = 0;
    loop {
        let now = clock.now();
        if now.year() >= MIN_PLAUSIBLE_YEAR {
            info!(time = %now.format("%Y-%m-%d %H:%M:%S"), "wall clock is synchronized");
            return true;
        }

        attempt += 1;
        if attempt >= max_attempts {
            return false;
        }

        info!(
            attempt,
            max_attempts, "waiting for wall-clock synchronization"
        );
        sleep(SYNC_POLL_INTERVAL).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
