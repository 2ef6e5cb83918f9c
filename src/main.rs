/*
SPDX-FileCopyrightText: Copyright 2026 IFPE
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use semaforo::clock::{self, SystemClock};
use semaforo::config::SiteConfig;
use semaforo::ingress::{self, InboundMessage};
use semaforo::scheduler::PhaseScheduler;
use semaforo::signal::{LampLevels, LightBank, LoggingLights, PhaseEvent};
use semaforo::timing::TimingStore;

/// Inbound config messages waiting for the ingress task.
const INBOUND_CAPACITY: usize = 16;

/// Phase events waiting for the publisher.
const EVENT_CAPACITY: usize = 16;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Semaforo traffic-signal controller.
///
/// Example:
///   semaforo --site site.yaml
///
/// Config messages are read as JSON lines on stdin (the broker bridge feeds
/// this in deployment); phase events are written as `<topic> <payload>`
/// lines on stdout.
#[derive(Debug, Parser)]
#[command(
    name = "semaforo",
    about = "Peak-aware traffic-signal controller",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML site description file.
    #[arg(short = 'c', long = "site")]
    site: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Semaforo controller starting up...");

    // ── Parse CLI arguments ───────────────────────────────────────────────────
    let cli = Cli::parse();

    // ── Load site description ─────────────────────────────────────────────────
    let site = match &cli.site {
        Some(path) => match SiteConfig::load_from_file(path) {
            Ok(site) => site,
            Err(e) => {
                error!("Failed to load site description: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No site description file provided, using default site settings");
            SiteConfig::default()
        }
    };

    info!(
        signal_id     = %site.signal_id,
        command_topic = %site.command_topic,
        state_topic   = %site.state_topic,
        green_pin     = site.lamps.green,
        amber_pin     = site.lamps.amber,
        red_pin       = site.lamps.red,
        "Configuration"
    );

    // ── Wait for a plausible wall clock ───────────────────────────────────────
    // Peak selection is meaningless against an unsynchronized clock, so give
    // synchronization a bounded head start before the loop begins.
    if !clock::wait_for_sync(&SystemClock, clock::SYNC_MAX_ATTEMPTS).await {
        warn!("wall clock still implausible, peak selection may be wrong until it synchronizes");
    }

    // All lamp lines off until the first phase is entered.
    let mut lights = LoggingLights::new(site.lamps);
    lights.apply(LampLevels::OFF);

    // ── Wire the core ─────────────────────────────────────────────────────────
    let store = Arc::new(TimingStore::new());
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);

    tokio::spawn(ingress::run_ingress(
        inbound_rx,
        site.command_topic.clone(),
        Arc::clone(&store),
    ));
    tokio::spawn(read_console_commands(inbound_tx, site.command_topic.clone()));
    tokio::spawn(publish_events(event_rx, site.state_topic.clone()));

    PhaseScheduler::new(store, Arc::new(SystemClock), Box::new(lights), event_tx)
        .run()
        .await;
}

// ── Console transport bridge ──────────────────────────────────────────────────

/// Feed stdin lines to the ingress channel as messages on `topic`.
///
/// Stands in for the broker bridge: one JSON config payload per line.  Ends
/// quietly on EOF; the controller keeps running on whatever configuration it
/// has.
async fn read_console_commands(tx: mpsc::Sender<InboundMessage>, topic: String) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let message = InboundMessage {
                    topic: topic.clone(),
                    payload: line.into_bytes(),
                };
                if tx.send(message).await.is_err() {
                    // Ingress is gone; nothing left to feed.
                    break;
                }
            }
            Ok(None) => {
                info!("stdin closed, no further console config messages");
                break;
            }
            Err(e) => {
                warn!(error = %e, "failed reading console input");
                break;
            }
        }
    }
}

/// Print each phase event as a `<topic> <payload>` line on stdout.
async fn publish_events(mut rx: mpsc::Receiver<PhaseEvent>, topic: String) {
    while let Some(event) = rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(payload) => println!("{topic} {payload}"),
            Err(e) => warn!(error = %e, "failed to serialise phase event"),
        }
    }
}
