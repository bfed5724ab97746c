// main.rs - Headless runner: control keys on stdin, events to the log

use std::io::BufRead;

use anyhow::{Context, Result};
use clap::Parser;
use gol::cli::Args;
use gol::{Event, Key};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let params = args.params();
    params.validate().context("invalid arguments")?;
    let store = args.store().context("failed to prepare the starting board")?;

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let (keys_tx, keys) = mpsc::channel(10);
    read_keys(keys_tx);

    let run = tokio::spawn(gol::run(params, store, events_tx, keys));

    let mut summary = None;
    while let Some(event) = events.recv().await {
        match &event {
            Event::CellFlipped { .. } => trace!(%event),
            Event::TurnComplete { .. } => debug!(%event),
            Event::FinalTurnComplete { turn, alive } => {
                summary = Some((*turn, alive.len()));
                info!(%event);
            }
            _ => info!(%event),
        }
    }

    run.await.context("engine task panicked")?.context("run failed")?;
    if let Some((turn, alive)) = summary {
        println!("Completed {turn} turns, {alive} cells alive");
    }
    Ok(())
}

/// Forwards `s`, `p` and `q` typed on stdin. Runs on its own thread because
/// a stdin read cannot be interrupted; it dies with the process.
fn read_keys(keys: mpsc::Sender<Key>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            for c in line.trim().chars() {
                match Key::try_from(c) {
                    Ok(key) => {
                        if keys.blocking_send(key).is_err() {
                            return;
                        }
                    }
                    Err(other) => warn!("unknown key {other:?}, expected s, p or q"),
                }
            }
        }
    });
}
