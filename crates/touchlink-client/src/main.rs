//! Touchlink client application entry point.
//!
//! Wires together the configuration, the input session, and the command
//! sink, then runs the Tokio event loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()             -- TOML config with per-field defaults
//!  └─ InputSession::new()       -- gesture machines + cursor model + emitter
//!  └─ event dispatch loop
//!       ├─ SessionEvent          -> InputSession::handle_event
//!       ├─ tick interval         -> deferred clicks / deferred button-ups
//!       └─ poll interval         -> server position request (when idle)
//! ```
//!
//! # Event sources
//!
//! In a full deployment two collaborators feed the `SessionEvent` queue:
//! the surface layer (contact lifecycle, mode buttons, stick regions,
//! keyboard keys) and the transport (session-established and position
//! reports). Both are external to this crate; this binary owns the queue,
//! the timers, and the dispatch discipline – one event handled to
//! completion at a time, in arrival order.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use touchlink_client::application::emitter::CommandSink;
use touchlink_client::application::session::{InputSession, SessionEvent};
use touchlink_client::infrastructure::config::load_config;
use touchlink_client::infrastructure::sink::FramedChannelSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("loading configuration")?;

    // Initialise structured logging; RUST_LOG overrides the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.client.log_level.clone())),
        )
        .init();

    info!("Touchlink client starting");

    // ── Outbound command path ─────────────────────────────────────────────────
    // Commands are framed by the sink and drained by the transport task. The
    // stub here logs frame sizes; a deployment replaces it with the real
    // connection writer.
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let sink = Arc::new(FramedChannelSink::new(frame_tx)) as Arc<dyn CommandSink>;
    tokio::spawn(async move {
        let mut sent = 0u64;
        while let Some(frame) = frame_rx.recv().await {
            sent += 1;
            debug!(bytes = frame.len(), sent, "outbound command frame");
        }
    });

    // ── Session ───────────────────────────────────────────────────────────────
    let mut session = InputSession::new(sink, config.session_settings());
    info!(session = %session.id(), "input session created");

    // ── Inbound event queue ───────────────────────────────────────────────────
    // The surface layer and the transport hold the sender side.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let _surface_handle = event_tx;

    let mut tick = tokio::time::interval(config.tick_interval());
    let mut poll = tokio::time::interval(config.position_poll_interval());

    info!("Touchlink client ready; waiting for surface events");

    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(event) => session.handle_event(event),
                    None => break,
                }
            }
            _ = tick.tick() => {
                session.on_tick(std::time::Instant::now());
            }
            _ = poll.tick() => {
                if session.should_poll_position() {
                    // Hook point: the transport requests the authoritative
                    // pointer position here and later enqueues the
                    // PositionReport it receives.
                    debug!(cursor = ?session.cursor_position(), "position poll window");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    info!("Touchlink client stopped");
    Ok(())
}
