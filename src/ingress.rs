/*
SPDX-FileCopyrightText: Copyright 2026 IFPE
SPDX-License-Identifier: MIT
*/

//! Config ingress: inbound topic messages → [`TimingStore`] updates.
//!
//! A config payload is a JSON object carrying up to three optional
//! field-groups:
//!
//! ```json
//! {
//!   "tempoPadrao":      { "carro": 30, "pedestre": 20 },
//!   "tempoHorarioPico": { "carro": 45, "pedestre": 25 },
//!   "horarioPico":      { "inicio": "08:00", "fim": "18:00" }
//! }
//! ```
//!
//! Field names are the Portuguese ones published on the broker; anglicized
//! spellings (`standardTimes` / `peakTimes` / `peakWindow`, `car` /
//! `pedestrian`, `start` / `end`) are accepted as aliases.
//!
//! Groups are independent: each present group is decoded on its own, and a
//! malformed group (wrong type, missing sub-field, bad `"HH:MM"`) is logged
//! and skipped while the remaining groups still apply.  Only a payload that
//! is not a JSON object at all is rejected outright, and even then the
//! store is left untouched; there are no retries.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::timing::TimingStore;
use crate::window::TimeOfDay;

// ── Inbound unit ──────────────────────────────────────────────────────────────

/// One topic-addressed message as delivered by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why an entire payload was discarded.
///
/// Group-level problems never reach this type; they are absorbed as
/// per-group skips.
#[derive(Debug, Error)]
pub enum IngressError {
    /// The payload is not a JSON object of the expected shape.
    #[error("config payload is not a JSON object: {0}")]
    Malformed(#[from] serde_json::Error),
}

// ── Wire-shape types (private) ────────────────────────────────────────────────

/// Top level of a config payload.  Groups are held as raw JSON so each one
/// can be decoded, and fail, independently.
#[derive(Debug, Deserialize)]
struct ConfigMessage {
    #[serde(rename = "tempoPadrao", alias = "standardTimes")]
    standard: Option<Value>,
    #[serde(rename = "tempoHorarioPico", alias = "peakTimes")]
    peak: Option<Value>,
    #[serde(rename = "horarioPico", alias = "peakWindow")]
    window: Option<Value>,
}

/// A car/pedestrian duration pair, in seconds.
#[derive(Debug, Deserialize)]
struct DurationsGroup {
    #[serde(alias = "car")]
    carro: u32,
    #[serde(alias = "pedestrian")]
    pedestre: u32,
}

/// The peak window endpoints as `"HH:MM"` strings.
#[derive(Debug, Deserialize)]
struct WindowGroup {
    #[serde(alias = "start")]
    inicio: String,
    #[serde(alias = "end")]
    fim: String,
}

// ── Payload application ───────────────────────────────────────────────────────

/// Which field-groups a payload actually updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedGroups {
    pub standard: bool,
    pub peak: bool,
    pub window: bool,
}

impl AppliedGroups {
    pub fn any(self) -> bool {
        self.standard || self.peak || self.window
    }
}

/// Decode `payload` and apply each well-formed field-group to `store`.
///
/// Returns which groups were applied.  Malformed groups are logged and
/// skipped; a payload that fails the top-level decode returns
/// [`IngressError::Malformed`] without touching the store.
pub fn apply_payload(
    payload: &[u8],
    store: &TimingStore,
) -> Result<AppliedGroups, IngressError> {
    let message: ConfigMessage = serde_json::from_slice(payload)?;
    let mut applied = AppliedGroups::default();

    if let Some(value) = message.standard {
        match serde_json::from_value::<DurationsGroup>(value) {
            Ok(group) => {
                store.update_standard(group.carro, group.pedestre);
                applied.standard = true;
                info!(
                    car_secs = group.carro,
                    pedestrian_secs = group.pedestre,
                    "standard durations updated"
                );
            }
            Err(e) => warn!(error = %e, "skipping malformed standard durations group"),
        }
    }

    if let Some(value) = message.peak {
        match serde_json::from_value::<DurationsGroup>(value) {
            Ok(group) => {
                store.update_peak(group.carro, group.pedestre);
                applied.peak = true;
                info!(
                    car_secs = group.carro,
                    pedestrian_secs = group.pedestre,
                    "peak durations updated"
                );
            }
            Err(e) => warn!(error = %e, "skipping malformed peak durations group"),
        }
    }

    if let Some(value) = message.window {
        match decode_window(value) {
            Ok((start, end)) => {
                store.update_window(start, end);
                applied.window = true;
                info!(start = %start, end = %end, "peak window updated");
            }
            Err(reason) => warn!(error = %reason, "skipping malformed peak window group"),
        }
    }

    Ok(applied)
}

/// Decode the window group: both endpoints must be present and parse as
/// in-range `"HH:MM"`, otherwise the whole group is rejected (no partial
/// endpoint write is possible).
fn decode_window(value: Value) -> Result<(TimeOfDay, TimeOfDay), String> {
    let group: WindowGroup =
        serde_json::from_value(value).map_err(|e| e.to_string())?;
    let start: TimeOfDay = group.inicio.parse().map_err(|e| format!("inicio: {e}"))?;
    let end: TimeOfDay = group.fim.parse().map_err(|e| format!("fim: {e}"))?;
    Ok((start, end))
}

// ── Ingress task ──────────────────────────────────────────────────────────────

/// Message loop: drains `rx`, applies payloads addressed to
/// `command_topic`, ignores the rest.  Runs until the channel closes.
pub async fn run_ingress(
    mut rx: mpsc::Receiver<InboundMessage>,
    command_topic: String,
    store: Arc<TimingStore>,
) {
    info!(topic = %command_topic, "config ingress listening");

    while let Some(message) = rx.recv().await {
        if message.topic != command_topic {
            debug!(topic = %message.topic, "ignoring message on foreign topic");
            continue;
        }

        match apply_payload(&message.payload, &store) {
            Ok(applied) if applied.any() => {
                debug!(
                    standard = applied.standard,
                    peak = applied.peak,
                    window = applied.window,
                    "config message applied"
                );
            }
            Ok(_) => debug!("config message carried no recognized groups"),
            Err(e) => warn!(error = %e, "discarding malformed config message"),
        }
    }

    info!("inbound channel closed, config ingress stopping");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
