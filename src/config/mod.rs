//! Site description loading.
//!
//! A site file tells one controller who it is and how it is wired: the topic
//! names it listens and publishes on, and the GPIO pins of its lamp lines.
//! It never carries live timing values; those only ever arrive over the
//! message channel.
//!
//! The expected YAML structure is:
//! ```yaml
//! signal_id: "Semaforo1"
//! command_topic: "Ifpe/Semaforo/Semaforo1"           # optional, derived
//! state_topic: "Ifpe/Semaforo/Semaforo1/estadoAtual" # optional, derived
//! lamps:
//!   green_pin: 21
//!   amber_pin: 19
//!   red_pin: 18
//! ```
//!
//! Every field is optional: omitted topics are derived from `signal_id`,
//! omitted pins fall back to the reference wiring.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// Topic namespace shared by every signal of the deployment.
pub const TOPIC_PREFIX: &str = "Ifpe/Semaforo";

const DEFAULT_SIGNAL_ID: &str = "Semaforo1";

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// Kept private: callers work with [`SiteConfig`] instead.
#[derive(Debug, Default, Deserialize)]
struct SiteFile {
    signal_id: Option<String>,
    command_topic: Option<String>,
    state_topic: Option<String>,
    lamps: Option<LampPinsEntry>,
}

/// Lamp pins as they appear in the YAML file; each individually optional.
#[derive(Debug, Default, Deserialize)]
struct LampPinsEntry {
    green_pin: Option<u8>,
    amber_pin: Option<u8>,
    red_pin: Option<u8>,
}

// ── Public data structures ────────────────────────────────────────────────────

/// GPIO pin numbers of the three lamp lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampPins {
    pub green: u8,
    pub amber: u8,
    pub red: u8,
}

impl Default for LampPins {
    /// The reference wiring of the deployed boards.
    fn default() -> Self {
        Self {
            green: 21,
            amber: 19,
            red: 18,
        }
    }
}

/// Identity and wiring of one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Name of this signal within the deployment (last topic segment).
    pub signal_id: String,
    /// Topic carrying inbound config messages for this signal.
    pub command_topic: String,
    /// Topic this signal publishes phase events on.
    pub state_topic: String,
    /// Lamp line wiring.
    pub lamps: LampPins,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::for_signal(DEFAULT_SIGNAL_ID)
    }
}

impl SiteConfig {
    /// Fully-derived configuration for a signal id:
    /// `Ifpe/Semaforo/<id>` for commands, `<command>/estadoAtual` for state,
    /// reference lamp wiring.
    pub fn for_signal(signal_id: impl Into<String>) -> Self {
        let signal_id = signal_id.into();
        let command_topic = format!("{TOPIC_PREFIX}/{signal_id}");
        let state_topic = format!("{command_topic}/estadoAtual");
        Self {
            signal_id,
            command_topic,
            state_topic,
            lamps: LampPins::default(),
        }
    }

    /// Parse `path` and resolve all defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.  Missing fields are not errors; they fall back
    /// as documented in the module doc.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading site description from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open site file: {}", path.display()))?;

        let file: SiteFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        Ok(Self::resolve(file))
    }

    /// Fill every omitted field from the derivation rules.
    fn resolve(file: SiteFile) -> Self {
        let signal_id = file
            .signal_id
            .unwrap_or_else(|| DEFAULT_SIGNAL_ID.to_string());

        let command_topic = file
            .command_topic
            .unwrap_or_else(|| format!("{TOPIC_PREFIX}/{signal_id}"));

        // State derives from the effective command topic, so a customized
        // command topic carries through.
        let state_topic = file
            .state_topic
            .unwrap_or_else(|| format!("{command_topic}/estadoAtual"));

        let defaults = LampPins::default();
        let pins = file.lamps.unwrap_or_default();
        let lamps = LampPins {
            green: pins.green_pin.unwrap_or(defaults.green),
            amber: pins.amber_pin.unwrap_or(defaults.amber),
            red: pins.red_pin.unwrap_or(defaults.red),
        };

        Self {
            signal_id,
            command_topic,
            state_topic,
            lamps,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
