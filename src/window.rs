/*
SPDX-FileCopyrightText: Copyright 2026 IFPE
SPDX-License-Identifier: MIT
*/

//! Time-of-day values and the peak-window membership test.
//!
//! Everything here is pure arithmetic over minutes-since-midnight so the
//! peak/standard decision can be tested independently of any clock or
//! scheduler state.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Minutes in a day; [`TimeOfDay::minutes_since_midnight`] is always below this.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why an `"HH:MM"` string could not be turned into a [`TimeOfDay`].
///
/// Carries the offending input or value so ingress logging can show exactly
/// what was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    /// The string is not two `:`-separated decimal fields.
    #[error("time must look like \"HH:MM\", got '{0}'")]
    Shape(String),

    /// Hour field parsed but is not in `0..=23`.
    #[error("hour {0} out of range (0-23)")]
    HourOutOfRange(u32),

    /// Minute field parsed but is not in `0..=59`.
    #[error("minute {0} out of range (0-59)")]
    MinuteOutOfRange(u32),
}

// ── TimeOfDay ─────────────────────────────────────────────────────────────────

/// A wall-clock time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build from already-validated components.
    ///
    /// # Panics
    /// Panics in debug builds if `hour > 23` or `minute > 59`.  Callers that
    /// start from untrusted text must go through [`FromStr`] instead.
    pub fn new(hour: u8, minute: u8) -> Self {
        debug_assert!(hour <= 23, "hour {hour} out of range");
        debug_assert!(minute <= 59, "minute {minute} out of range");
        Self { hour, minute }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// `hour * 60 + minute`, in `0..MINUTES_PER_DAY`.
    pub fn minutes_since_midnight(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    /// Parses `"HH:MM"`.  Single-digit fields (`"8:05"`, `"8:5"`) are
    /// accepted; ranges are enforced after the numeric parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| TimeParseError::Shape(s.to_string()))?;

        let hour: u32 = h
            .trim()
            .parse()
            .map_err(|_| TimeParseError::Shape(s.to_string()))?;
        let minute: u32 = m
            .trim()
            .parse()
            .map_err(|_| TimeParseError::Shape(s.to_string()))?;

        if hour > 23 {
            return Err(TimeParseError::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(TimeParseError::MinuteOutOfRange(minute));
        }

        Ok(TimeOfDay::new(hour as u8, minute as u8))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// ── PeakWindow ────────────────────────────────────────────────────────────────

/// A configured daily interval during which the alternate (peak) durations
/// apply.
///
/// Both endpoints are inclusive.  `start > end` is a legal window that wraps
/// past midnight (e.g. `22:00` to `06:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakWindow {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl PeakWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    /// Membership test over minutes-since-midnight.
    ///
    /// * `start <= end`: inside iff `start <= now <= end`.
    /// * `start > end` (wraps midnight): inside iff `now >= start` or
    ///   `now <= end`.
    pub fn contains(&self, now: TimeOfDay) -> bool {
        let now = now.minutes_since_midnight();
        let start = self.start.minutes_since_midnight();
        let end = self.end.minutes_since_midnight();

        if start <= end {
            start <= now && now <= end
        } else {
            now >= start || now <= end
        }
    }
}

impl fmt::Display for PeakWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
