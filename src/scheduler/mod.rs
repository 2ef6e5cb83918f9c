/*
SPDX-FileCopyrightText: Copyright 2026 IFPE
SPDX-License-Identifier: MIT
*/

//! The phase-cycling state machine.
//!
//! [`PhaseScheduler`] runs the controller's single control loop:
//!
//! ```text
//!             invalid snapshot (2 s poll)
//!          ┌────────────────────────────┐
//!          ▼                            │
//!       Waiting ────────────────────────┘
//!          │ valid snapshot: select peak/standard pair
//!          ▼
//!       Green ──car secs──► Amber ──5 s──► Red ──pedestrian secs──┐
//!          ▲                                                      │
//!          └────────── revalidate + reselect at boundary ◄────────┘
//! ```
//!
//! Durations are selected once per cycle, at Green entry: the peak pair when
//! the wall clock falls inside the configured window, otherwise the standard
//! pair.  A running phase is never interrupted or re-timed; configuration
//! written mid-cycle is picked up at the next Green boundary, so any update
//! takes effect within one full cycle.  If the record has turned invalid at
//! that boundary the loop drops back to `Waiting` instead of starting a
//! cycle.
//!
//! At each phase entry, in order: lamp lines are set, the phase event is
//! published, then the scheduler sleeps the full phase duration.  The loop
//! has no terminal state and no error path; bad input never reaches it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::signal::{LightBank, Phase, PhaseEvent};
use crate::timing::{SignalTiming, TimingStore};
use crate::window::TimeOfDay;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Amber phase length in seconds.  A design constant of the installation,
/// deliberately not reachable from config messages.
pub const AMBER_SECS: u64 = 5;

/// How often the scheduler re-checks an invalid timing record while held in
/// `Waiting`.
pub const WAITING_POLL_INTERVAL: Duration = Duration::from_secs(2);

// ── Cycle selection ───────────────────────────────────────────────────────────

/// The durations chosen for one full cycle, fixed at Green entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTimings {
    pub car: Duration,
    pub pedestrian: Duration,
    /// Whether the peak pair was selected (diagnostic only).
    pub peak: bool,
}

/// Pick the durations for the next cycle, or `None` while the record is
/// invalid (which holds the scheduler in `Waiting`).
pub fn select_timings(timing: &SignalTiming, now: TimeOfDay) -> Option<CycleTimings> {
    if !timing.is_valid() {
        return None;
    }
    let window = timing.peak_window?;

    let peak = window.contains(now);
    let (car_secs, pedestrian_secs) = if peak {
        (timing.peak_car_secs, timing.peak_pedestrian_secs)
    } else {
        (timing.standard_car_secs, timing.standard_pedestrian_secs)
    };

    Some(CycleTimings {
        car: Duration::from_secs(u64::from(car_secs)),
        pedestrian: Duration::from_secs(u64::from(pedestrian_secs)),
        peak,
    })
}

// ── PhaseScheduler ────────────────────────────────────────────────────────────

/// Drives the Green/Amber/Red cycle against the shared timing store.
///
/// Owns the lamp boundary and the event sender; shares the store and the
/// clock.  Constructed once at bootstrap and consumed by [`run`](Self::run).
pub struct PhaseScheduler {
    store: Arc<TimingStore>,
    clock: Arc<dyn Clock>,
    lights: Box<dyn LightBank>,
    events: mpsc::Sender<PhaseEvent>,
}

impl PhaseScheduler {
    pub fn new(
        store: Arc<TimingStore>,
        clock: Arc<dyn Clock>,
        lights: Box<dyn LightBank>,
        events: mpsc::Sender<PhaseEvent>,
    ) -> Self {
        Self {
            store,
            clock,
            lights,
            events,
        }
    }

    /// Run the control loop forever.
    pub async fn run(mut self) {
        info!(
            amber_secs = AMBER_SECS,
            poll_secs = WAITING_POLL_INTERVAL.as_secs(),
            "phase scheduler starting"
        );
        loop {
            self.step().await;
        }
    }

    /// One loop iteration: either a full Waiting poll or a full
    /// Green→Amber→Red cycle.
    async fn step(&mut self) {
        let snapshot = self.store.snapshot();

        match select_timings(&snapshot, self.clock.time_of_day()) {
            None => {
                warn!("timing configuration incomplete, signal held out of service");
                sleep(WAITING_POLL_INTERVAL).await;
            }
            Some(timings) => {
                debug!(
                    peak = timings.peak,
                    car_secs = timings.car.as_secs(),
                    pedestrian_secs = timings.pedestrian.as_secs(),
                    "cycle timings selected"
                );
                self.enter(Phase::Green, timings.car).await;
                self.enter(Phase::Amber, Duration::from_secs(AMBER_SECS)).await;
                self.enter(Phase::Red, timings.pedestrian).await;
            }
        }
    }

    /// Enter `phase` and hold it for `duration`.
    ///
    /// Effect order is part of the contract: lamp lines settle first, the
    /// event goes out second, and only then does the phase sleep begin.
    /// Publication never blocks the loop; if the sink cannot take the event
    /// it is dropped with a warning.
    async fn enter(&mut self, phase: Phase, duration: Duration) {
        self.lights.apply(phase.levels());

        let event = PhaseEvent::new(phase, duration);
        if let Err(e) = self.events.try_send(event) {
            warn!(phase = %phase, error = %e, "phase event dropped, sink unavailable");
        }

        info!(phase = %phase, seconds = duration.as_secs(), "phase entered");
        sleep(duration).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::LampLevels;
    use chrono::{DateTime, Local, TimeZone};
    use std::sync::Mutex;
    use tokio::time::Instant;

    // ── Test helpers ──────────────────────────────────────────────────────────

    struct FixedClock(DateTime<Local>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            self.0
        }
    }

    struct RecordingLights(Arc<Mutex<Vec<LampLevels>>>);

    impl LightBank for RecordingLights {
        fn apply(&mut self, levels: LampLevels) {
            self.0.lock().unwrap().push(levels);
        }
    }

    fn t(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute)
    }

    /// standard (30, 20), peak (45, 25), window 08:00 to 18:00.
    fn loaded_store() -> Arc<TimingStore> {
        let store = Arc::new(TimingStore::new());
        store.update_standard(30, 20);
        store.update_peak(45, 25);
        store.update_window(t(8, 0), t(18, 0));
        store
    }

    /// Scheduler with a pinned clock, a recording lamp bank, and an event
    /// channel of the given capacity.
    fn scheduler_at(
        hour: u8,
        minute: u8,
        store: Arc<TimingStore>,
        capacity: usize,
    ) -> (
        PhaseScheduler,
        mpsc::Receiver<PhaseEvent>,
        Arc<Mutex<Vec<LampLevels>>>,
    ) {
        let clock = Local
            .with_ymd_and_hms(2026, 8, 23, u32::from(hour), u32::from(minute), 0)
            .unwrap();
        let levels = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel(capacity);
        let scheduler = PhaseScheduler::new(
            store,
            Arc::new(FixedClock(clock)),
            Box::new(RecordingLights(Arc::clone(&levels))),
            tx,
        );
        (scheduler, rx, levels)
    }

    fn drain(rx: &mut mpsc::Receiver<PhaseEvent>) -> Vec<PhaseEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // ── select_timings ────────────────────────────────────────────────────────

    #[test]
    fn selects_peak_pair_inside_window() {
        let timings = select_timings(&loaded_store().snapshot(), t(9, 0)).unwrap();
        assert!(timings.peak);
        assert_eq!(timings.car, Duration::from_secs(45));
        assert_eq!(timings.pedestrian, Duration::from_secs(25));
    }

    #[test]
    fn selects_standard_pair_outside_window() {
        let timings = select_timings(&loaded_store().snapshot(), t(7, 0)).unwrap();
        assert!(!timings.peak);
        assert_eq!(timings.car, Duration::from_secs(30));
        assert_eq!(timings.pedestrian, Duration::from_secs(20));
    }

    #[test]
    fn selects_peak_pair_on_window_bounds() {
        let snapshot = loaded_store().snapshot();
        assert!(select_timings(&snapshot, t(8, 0)).unwrap().peak);
        assert!(select_timings(&snapshot, t(18, 0)).unwrap().peak);
        assert!(!select_timings(&snapshot, t(7, 59)).unwrap().peak);
    }

    #[test]
    fn selects_peak_pair_across_midnight() {
        let store = loaded_store();
        store.update_window(t(22, 0), t(6, 0));
        let snapshot = store.snapshot();

        assert!(select_timings(&snapshot, t(23, 30)).unwrap().peak);
        assert!(select_timings(&snapshot, t(6, 0)).unwrap().peak);
        assert!(!select_timings(&snapshot, t(7, 0)).unwrap().peak);
    }

    #[test]
    fn selection_requires_a_valid_record() {
        assert!(select_timings(&SignalTiming::default(), t(9, 0)).is_none());

        let store = TimingStore::new();
        store.update_standard(30, 20);
        store.update_peak(45, 25);
        assert!(
            select_timings(&store.snapshot(), t(9, 0)).is_none(),
            "no window, no cycle"
        );

        store.update_window(t(8, 0), t(18, 0));
        store.update_peak(0, 25);
        assert!(
            select_timings(&store.snapshot(), t(9, 0)).is_none(),
            "zero duration, no cycle"
        );
    }

    // ── Cycle execution ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn cycle_runs_green_amber_red_with_selected_durations() {
        // 09:00 is inside the window, so the peak pair (45, 25) applies.
        let (mut scheduler, mut rx, levels) = scheduler_at(9, 0, loaded_store(), 8);

        let started = Instant::now();
        scheduler.step().await;
        assert_eq!(started.elapsed(), Duration::from_secs(45 + AMBER_SECS + 25));

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                PhaseEvent { state: Phase::Green, seconds: 45 },
                PhaseEvent { state: Phase::Amber, seconds: AMBER_SECS },
                PhaseEvent { state: Phase::Red, seconds: 25 },
            ]
        );

        let levels = levels.lock().unwrap();
        assert_eq!(
            *levels,
            vec![
                Phase::Green.levels(),
                Phase::Amber.levels(),
                Phase::Red.levels(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn off_peak_cycle_uses_standard_durations() {
        let (mut scheduler, mut rx, _levels) = scheduler_at(7, 0, loaded_store(), 8);

        let started = Instant::now();
        scheduler.step().await;
        assert_eq!(started.elapsed(), Duration::from_secs(30 + AMBER_SECS + 20));

        let events = drain(&mut rx);
        assert_eq!(events[0].seconds, 30);
        assert_eq!(events[2].seconds, 20);
    }

    // ── Waiting state ─────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn waiting_polls_and_emits_nothing() {
        let (mut scheduler, mut rx, levels) =
            scheduler_at(9, 0, Arc::new(TimingStore::new()), 8);

        let started = Instant::now();
        scheduler.step().await;
        scheduler.step().await;

        assert_eq!(started.elapsed(), 2 * WAITING_POLL_INTERVAL);
        assert!(drain(&mut rx).is_empty());
        assert!(levels.lock().unwrap().is_empty(), "lamps untouched while waiting");
    }

    #[tokio::test(start_paused = true)]
    async fn first_valid_poll_enters_green_with_no_extra_delay() {
        let store = Arc::new(TimingStore::new());
        let (mut scheduler, mut rx, _levels) = scheduler_at(9, 0, Arc::clone(&store), 8);

        // One invalid poll...
        scheduler.step().await;
        assert!(drain(&mut rx).is_empty());

        // ...config lands during the wait; the very next step cycles.
        store.update_standard(30, 20);
        store.update_peak(45, 25);
        store.update_window(t(8, 0), t(18, 0));

        let started = Instant::now();
        scheduler.step().await;
        assert_eq!(started.elapsed(), Duration::from_secs(45 + AMBER_SECS + 25));
        assert_eq!(drain(&mut rx).first().map(|e| e.state), Some(Phase::Green));
    }

    // ── Cycle boundaries ──────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn durations_updated_mid_cycle_apply_from_next_cycle() {
        let (mut scheduler, mut rx, _levels) = scheduler_at(7, 0, loaded_store(), 8);

        scheduler.step().await;
        let first = drain(&mut rx);
        assert_eq!(first[0].seconds, 30);

        // The write lands between cycles here; during a phase it would sit in
        // the store until this same boundary is reached.
        scheduler.store.update_standard(10, 12);

        let started = Instant::now();
        scheduler.step().await;
        assert_eq!(started.elapsed(), Duration::from_secs(10 + AMBER_SECS + 12));

        let second = drain(&mut rx);
        assert_eq!(second[0].seconds, 10);
        assert_eq!(second[2].seconds, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidated_config_drops_back_to_waiting_at_boundary() {
        let (mut scheduler, mut rx, _levels) = scheduler_at(9, 0, loaded_store(), 8);

        scheduler.step().await;
        assert_eq!(drain(&mut rx).len(), 3);

        scheduler.store.update_standard(0, 20);

        let started = Instant::now();
        scheduler.step().await;
        assert_eq!(started.elapsed(), WAITING_POLL_INTERVAL);
        assert!(drain(&mut rx).is_empty(), "no phases while invalid");
    }

    // ── Event sink behaviour ──────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn full_event_sink_never_stalls_the_cycle() {
        // Capacity 1 and no consumer: Amber and Red events are dropped.
        let (mut scheduler, mut rx, levels) = scheduler_at(9, 0, loaded_store(), 1);

        let started = Instant::now();
        scheduler.step().await;
        assert_eq!(started.elapsed(), Duration::from_secs(45 + AMBER_SECS + 25));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1, "only the first event fit the sink");
        assert_eq!(events[0].state, Phase::Green);
        assert_eq!(levels.lock().unwrap().len(), 3, "lamps still cycled");
    }
}
