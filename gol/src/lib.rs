// lib.rs - Conway's Game of Life on a toroidal board, one worker per band of rows

pub mod cli;
pub mod control;
pub mod distributor;
pub mod error;
pub mod event;
pub mod grid;
pub mod io;
pub mod params;
pub mod partition;
pub mod patterns;
pub mod pgm;
pub mod reporter;
pub mod rules;
pub mod worker;

use tokio::sync::mpsc;
use tracing::info;

pub use control::Key;
pub use error::GolError;
pub use event::{Event, State};
pub use grid::{ALIVE, Cell, DEAD, Grid};
pub use io::{MemoryStore, PgmStore, Storage};
pub use params::Params;

/// Runs a whole simulation.
///
/// Validates `params`, starts the I/O task over `store`, loads the starting
/// board, runs the turn loop (steered by `key_presses`) and saves the final
/// board. Every event is sent to `events`, which is closed before this returns.
pub async fn run<S: Storage>(
    params: Params,
    store: S,
    events: mpsc::UnboundedSender<Event>,
    key_presses: mpsc::Receiver<Key>,
) -> Result<(), GolError> {
    params.validate()?;
    info!(board = %params.input_name(), turns = params.turns, threads = params.threads, "run starting");

    let (io, io_task) = io::start(store);
    let outcome = distributor::distributor(params, io, events, key_presses).await;
    io_task.await?;
    outcome
}
