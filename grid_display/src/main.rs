// main.rs - Windowed viewer: runs the engine in the background and draws its events

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use eframe::egui;
use egui::Color32;
use gol::cli::Args;
use gol::{Event, GolError, Key, State};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod ui; // eframe::App for GridApp

fn main() -> Result<()> {
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

    let runtime = Runtime::new().context("failed to start the tokio runtime")?;
    let (events_tx, events) = mpsc::unbounded_channel();
    let (keys, keys_rx) = mpsc::channel(10);
    let run = runtime.spawn(gol::run(params.clone(), store, events_tx, keys_rx));

    let app = GridApp::new(params.width, params.height, runtime, run, events, keys);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 900.0]),
        ..Default::default()
    };

    // eframe's error type is not Send + Sync, so keep only its message
    eframe::run_native(
        "Game of Life",
        options,
        Box::new(|_cc| Box::new(app)),
    )
    .map_err(|e| anyhow!("window failed: {e}"))
}

/// The viewer's copy of the board, rebuilt purely from `CellFlipped` events.
pub struct GridApp {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<bool>,

    pub turn: usize,
    pub reported_alive: Option<usize>,
    pub state: State,
    pub last_saved: Option<String>,
    pub outcome: Option<String>,

    pub live_color: Color32,
    pub dead_color: Color32,

    events: mpsc::UnboundedReceiver<Event>,
    keys: mpsc::Sender<Key>,
    run: Option<JoinHandle<Result<(), GolError>>>,
    runtime: Runtime,
}

impl GridApp {
    fn new(
        width: usize,
        height: usize,
        runtime: Runtime,
        run: JoinHandle<Result<(), GolError>>,
        events: mpsc::UnboundedReceiver<Event>,
        keys: mpsc::Sender<Key>,
    ) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
            turn: 0,
            reported_alive: None,
            state: State::Executing,
            last_saved: None,
            outcome: None,
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
            events,
            keys,
            run: Some(run),
            runtime,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn send_key(&self, key: Key) {
        if self.keys.try_send(key).is_err() {
            tracing::warn!(?key, "control key dropped");
        }
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::CellFlipped { cell, .. } => {
                let i = cell.y * self.width + cell.x;
                self.cells[i] = !self.cells[i];
            }
            Event::TurnComplete { turn } => self.turn = turn,
            Event::AliveCellsCount { count, .. } => self.reported_alive = Some(count),
            Event::ImageOutputComplete { filename, .. } => self.last_saved = Some(filename),
            Event::StateChange { state, .. } => self.state = state,
            Event::FinalTurnComplete { turn, alive } => {
                self.turn = turn;
                self.reported_alive = Some(alive.len());
            }
        }
    }

    /// Applies every event received since the last frame.
    pub fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.collect_outcome();
                    break;
                }
            }
        }
    }

    fn collect_outcome(&mut self) {
        let Some(run) = self.run.take() else { return };
        let outcome = match self.runtime.block_on(run) {
            Ok(Ok(())) => format!("Finished after {} turns", self.turn),
            Ok(Err(e)) => format!("Run failed: {e}"),
            Err(e) => format!("Engine task failed: {e}"),
        };
        tracing::info!(%outcome);
        self.outcome = Some(outcome);
    }

    pub fn live_cells(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}
