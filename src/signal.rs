/*
SPDX-FileCopyrightText: Copyright 2026 IFPE
SPDX-License-Identifier: MIT
*/

//! Signal-domain vocabulary: phases, lamp lines, and the published event.
//!
//! ```text
//! PhaseScheduler ──(LampLevels)──► LightBank      – three physical lines
//!                ──(PhaseEvent)──► event channel  – wire-ready JSON payload
//! ```
//!
//! The phase enum carries both faces of a phase: its lamp levels (what the
//! hardware shows) and its wire label (what subscribers see).  Wire labels
//! are the Portuguese ones used on the broker; logs stay in English.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::LampPins;

// ── Phase ─────────────────────────────────────────────────────────────────────

/// One of the three signal phases.
///
/// Serializes to its wire label (`"verde"` / `"amarelo"` / `"vermelho"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Cars flow; pedestrians wait.
    #[serde(rename = "verde")]
    Green,
    /// Transition; fixed short duration.
    #[serde(rename = "amarelo")]
    Amber,
    /// Cars stop; pedestrians cross.
    #[serde(rename = "vermelho")]
    Red,
}

impl Phase {
    /// Lamp lines for this phase: exactly one line on.
    pub fn levels(self) -> LampLevels {
        match self {
            Phase::Green => LampLevels {
                green: true,
                ..LampLevels::OFF
            },
            Phase::Amber => LampLevels {
                amber: true,
                ..LampLevels::OFF
            },
            Phase::Red => LampLevels {
                red: true,
                ..LampLevels::OFF
            },
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Green => "green",
            Phase::Amber => "amber",
            Phase::Red => "red",
        };
        f.write_str(name)
    }
}

// ── Lamp boundary ─────────────────────────────────────────────────────────────

/// Desired state of the three binary lamp lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampLevels {
    pub green: bool,
    pub amber: bool,
    pub red: bool,
}

impl LampLevels {
    /// All lines off; applied once at bootstrap before the first phase.
    pub const OFF: LampLevels = LampLevels {
        green: false,
        amber: false,
        red: false,
    };
}

/// Boundary to the physical lamp outputs.
///
/// One call per phase entry; all three lines must have settled when the call
/// returns, since the scheduler starts the phase sleep immediately after.
pub trait LightBank: Send {
    fn apply(&mut self, levels: LampLevels);
}

/// Host-side [`LightBank`] that logs the line changes it would drive.
///
/// Carries the configured pin numbers so the log lines match the wiring
/// diagram; an on-target implementation replaces this behind the same trait.
pub struct LoggingLights {
    pins: LampPins,
}

impl LoggingLights {
    pub fn new(pins: LampPins) -> Self {
        Self { pins }
    }
}

impl LightBank for LoggingLights {
    fn apply(&mut self, levels: LampLevels) {
        debug!(
            "lamp lines: green(gpio {})={} amber(gpio {})={} red(gpio {})={}",
            self.pins.green,
            levels.green as u8,
            self.pins.amber,
            levels.amber as u8,
            self.pins.red,
            levels.red as u8,
        );
    }
}

// ── PhaseEvent ────────────────────────────────────────────────────────────────

/// Published once at each phase entry.
///
/// Wire shape: `{"estadoAtual": "verde", "segundos": 45}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseEvent {
    /// Phase just entered.
    #[serde(rename = "estadoAtual")]
    pub state: Phase,
    /// How long the phase will hold, in whole seconds.
    #[serde(rename = "segundos")]
    pub seconds: u64,
}

impl PhaseEvent {
    pub fn new(state: Phase, duration: Duration) -> Self {
        Self {
            state,
            seconds: duration.as_secs(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
