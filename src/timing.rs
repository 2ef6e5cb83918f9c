//! The live signal timing record and its shared store.
//!
//! [`SignalTiming`] holds the four phase durations plus the optional peak
//! window.  It starts all-zero/unset at boot and is only ever written by the
//! config ingress, one field-group at a time.  The scheduler reads a
//! [`snapshot`](TimingStore::snapshot) at each cycle boundary and otherwise
//! never touches the store, so a write landing mid-cycle is simply picked up
//! by the next cycle.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::window::{PeakWindow, TimeOfDay};

// ── SignalTiming ──────────────────────────────────────────────────────────────

/// Point-in-time copy of the controller's timing configuration.
///
/// The three field-groups (standard durations, peak durations, peak window)
/// are replaced independently; the window group is a single
/// `Option<PeakWindow>` so a half-set window cannot exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalTiming {
    /// Car-green duration outside the peak window, in seconds.
    pub standard_car_secs: u32,
    /// Pedestrian-red duration outside the peak window, in seconds.
    pub standard_pedestrian_secs: u32,
    /// Car-green duration inside the peak window, in seconds.
    pub peak_car_secs: u32,
    /// Pedestrian-red duration inside the peak window, in seconds.
    pub peak_pedestrian_secs: u32,
    /// Daily peak interval; `None` until a window update has been received.
    pub peak_window: Option<PeakWindow>,
}

impl SignalTiming {
    /// The scheduler may only run a cycle against a valid record: all four
    /// durations strictly positive and the peak window set.
    ///
    /// A zero duration is storable (it is what an explicit `0` on the wire
    /// writes) but keeps the signal out of service until corrected.
    pub fn is_valid(&self) -> bool {
        self.standard_car_secs > 0
            && self.standard_pedestrian_secs > 0
            && self.peak_car_secs > 0
            && self.peak_pedestrian_secs > 0
            && self.peak_window.is_some()
    }
}

// ── TimingStore ───────────────────────────────────────────────────────────────

/// Shared home of the live [`SignalTiming`] record.
///
/// Writers (the ingress task) and the single reader (the scheduler) go
/// through the internal mutex, so neither side can observe a torn
/// field-group.  Critical sections are a single record assignment or copy;
/// there is no await point while the lock is held.
#[derive(Debug, Default)]
pub struct TimingStore {
    inner: Mutex<SignalTiming>,
}

impl TimingStore {
    /// Creates a store with everything unset; [`SignalTiming::is_valid`] is
    /// `false` until all three field-groups have been written.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the standard (off-peak) duration pair.
    pub fn update_standard(&self, car_secs: u32, pedestrian_secs: u32) {
        let mut timing = self.locked();
        timing.standard_car_secs = car_secs;
        timing.standard_pedestrian_secs = pedestrian_secs;
    }

    /// Replace the peak duration pair.
    pub fn update_peak(&self, car_secs: u32, pedestrian_secs: u32) {
        let mut timing = self.locked();
        timing.peak_car_secs = car_secs;
        timing.peak_pedestrian_secs = pedestrian_secs;
    }

    /// Replace the peak window (both endpoints together).
    pub fn update_window(&self, start: TimeOfDay, end: TimeOfDay) {
        self.locked().peak_window = Some(PeakWindow::new(start, end));
    }

    /// Consistent point-in-time copy for the scheduler.
    pub fn snapshot(&self) -> SignalTiming {
        *self.locked()
    }

    /// A poisoned lock still guards a whole, usable record (every write is a
    /// plain field assignment on a `Copy` type), so recover the guard rather
    /// than propagate the poison.
    fn locked(&self) -> MutexGuard<'_, SignalTiming> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
