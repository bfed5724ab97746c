// distributor.rs - Turn coordinator: runs the turn loop across band workers
//
// The coordinator is the only writer of the board. Each turn it hands an
// immutable snapshot to one worker per band, waits for every band, and swaps
// the merged board in. Pause/quit requests arrive from the control listener;
// population reports go out from the reporter. Both are stopped and joined
// before the event channel is closed.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::control::{ControlListener, Key};
use crate::error::GolError;
use crate::event::{Event, State};
use crate::grid::Grid;
use crate::io::IoHandle;
use crate::params::Params;
use crate::partition::{Band, partition};
use crate::pgm::Image;
use crate::reporter::reporter;
use crate::worker::{self, BandResult};

/// Board published after each committed turn. `alive` is always the alive
/// count of `world`, and `world` is the board after `turn` completed turns.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub turn: usize,
    pub alive: usize,
    pub world: Arc<Grid>,
}

pub(crate) struct Distributor {
    params: Params,
    bands: Vec<Band>,
    world: Arc<Grid>,
    turn: usize,
    state: State,
    events: mpsc::UnboundedSender<Event>,
    requests: mpsc::UnboundedReceiver<State>,
    progress: watch::Sender<Snapshot>,
}

impl Distributor {
    pub(crate) fn new(
        params: Params,
        world: Grid,
        events: mpsc::UnboundedSender<Event>,
        requests: mpsc::UnboundedReceiver<State>,
    ) -> Result<Self, GolError> {
        let bands = partition(params.height, params.threads)?;
        let world = Arc::new(world);
        let (progress, _) = watch::channel(Snapshot {
            turn: 0,
            alive: world.alive_count(),
            world: Arc::clone(&world),
        });
        Ok(Self {
            params,
            bands,
            world,
            turn: 0,
            state: State::Executing,
            events,
            requests,
            progress,
        })
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.progress.subscribe()
    }

    pub(crate) fn events(&self) -> mpsc::UnboundedSender<Event> {
        self.events.clone()
    }

    pub(crate) fn turn(&self) -> usize {
        self.turn
    }

    pub(crate) fn world(&self) -> &Grid {
        &self.world
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }

    /// Lets a consumer starting from an empty board catch up.
    pub(crate) fn announce_initial_cells(&self) {
        for cell in self.world.alive_cells() {
            self.emit(Event::CellFlipped { turn: 0, cell });
        }
    }

    /// Runs turns until the configured count is reached or quit is requested.
    pub(crate) async fn run_turns(&mut self) -> Result<(), GolError> {
        while self.turn < self.params.turns {
            let request = match self.state {
                // Nothing to compute, so wait for the next request
                State::Paused => match self.requests.recv().await {
                    Some(next) => Some(next),
                    None => {
                        warn!(turn = self.turn, "control channel closed while paused");
                        Some(State::Quitting)
                    }
                },
                _ => self.requests.try_recv().ok(),
            };
            if let Some(next) = request {
                self.change_state(next);
            }

            match self.state {
                State::Quitting => break,
                State::Paused => continue,
                State::Executing => self.step().await?,
            }
        }
        Ok(())
    }

    fn change_state(&mut self, next: State) {
        if next == self.state || self.state == State::Quitting {
            return;
        }
        info!(turn = self.turn, from = %self.state, to = %next, "state change");
        self.state = next;
        // The terminal Quitting event is sent by the shutdown sequence
        if next != State::Quitting {
            self.emit(Event::StateChange {
                turn: self.turn,
                state: next,
            });
        }
    }

    /// Computes one turn and commits it.
    async fn step(&mut self) -> Result<(), GolError> {
        let turn = self.turn + 1;

        let results: Vec<BandResult> = if self.bands.len() == 1 {
            // Run inline, but still yield per row so the listener and reporter get scheduled
            vec![worker::worker(self.bands[0], Arc::clone(&self.world), turn).await]
        } else {
            let handles: Vec<_> = self
                .bands
                .iter()
                .map(|&band| tokio::spawn(worker::worker(band, Arc::clone(&self.world), turn)))
                .collect();

            // Barrier: joined in band order, whatever order they finish in
            let mut results = Vec::with_capacity(handles.len());
            for handle in handles {
                results.push(handle.await?);
            }
            results
        };

        let mut parts = Vec::with_capacity(results.len());
        for result in results {
            for cell in result.flipped {
                self.emit(Event::CellFlipped { turn, cell });
            }
            parts.push((result.band, result.cells));
        }

        self.world = Arc::new(Grid::from_bands(self.params.width, self.params.height, parts));
        self.turn = turn;
        let alive = self.world.alive_count();
        self.progress.send_replace(Snapshot {
            turn,
            alive,
            world: Arc::clone(&self.world),
        });
        debug!(turn, alive, "turn complete");
        self.emit(Event::TurnComplete { turn });
        Ok(())
    }

    /// Saves the board, reports the final turn and closes the event channel.
    async fn finish(self, io: &IoHandle) -> Result<(), GolError> {
        let turn = self.turn;
        let filename = self.params.output_name();
        let image = Image::new(
            self.world.width(),
            self.world.height(),
            self.world.as_bytes().to_vec(),
        );
        io.output(filename.clone(), image).await?;
        self.emit(Event::ImageOutputComplete { turn, filename });

        self.emit(Event::FinalTurnComplete {
            turn,
            alive: self.world.alive_cells(),
        });

        // Make sure the output has been written before exiting
        io.check_idle().await?;

        self.emit(Event::StateChange {
            turn,
            state: State::Quitting,
        });
        info!(turn, "run finished");
        Ok(())
    }
}

/// Loads the starting board, runs every turn and performs the shutdown
/// sequence. `events` is closed when this returns.
pub async fn distributor(
    params: Params,
    io: IoHandle,
    events: mpsc::UnboundedSender<Event>,
    key_presses: mpsc::Receiver<Key>,
) -> Result<(), GolError> {
    let name = params.input_name();
    let image = io.input(name.clone()).await?;
    if (image.width, image.height) != (params.width, params.height) {
        return Err(GolError::Dimensions {
            name,
            width: params.width,
            height: params.height,
            found_width: image.width,
            found_height: image.height,
        });
    }
    let world = Grid::from_bytes(params.width, params.height, &image.pixels);

    let (requests_tx, requests) = mpsc::unbounded_channel();
    let mut distributor = Distributor::new(params.clone(), world, events, requests)?;
    distributor.announce_initial_cells();
    info!(
        width = params.width,
        height = params.height,
        turns = params.turns,
        threads = params.threads,
        alive = distributor.world().alive_count(),
        "starting turn loop"
    );

    let cancel = CancellationToken::new();
    let reporter = tokio::spawn(reporter(
        params.report_interval,
        distributor.subscribe(),
        distributor.events(),
        cancel.clone(),
    ));
    let listener = ControlListener::new(
        params,
        io.clone(),
        distributor.subscribe(),
        distributor.events(),
        requests_tx,
    );
    let listener = tokio::spawn(listener.run(key_presses, cancel.clone()));

    let outcome = distributor.run_turns().await;

    // Nothing else may send once the channel is closed
    cancel.cancel();
    reporter.await?;
    listener.await?;
    outcome?;

    debug!(turn = distributor.turn(), "turn loop finished");
    distributor.finish(&io).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::patterns;

    fn collect(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn run_to_end(world: &Grid, turns: usize, threads: usize) -> (Grid, Vec<Event>) {
        let params = Params::new(world.width(), world.height(), turns, threads);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let (_requests_tx, requests) = mpsc::unbounded_channel();
        let mut distributor = Distributor::new(params, world.clone(), events_tx, requests).unwrap();
        distributor.run_turns().await.unwrap();
        assert_eq!(distributor.turn(), turns);
        (distributor.world().clone(), collect(&mut events))
    }

    #[tokio::test]
    async fn parallel_matches_serial() {
        let world = patterns::random(37, 23, 42);
        let (serial, serial_events) = run_to_end(&world, 20, 1).await;
        for threads in 2..=23 {
            let (parallel, parallel_events) = run_to_end(&world, 20, threads).await;
            assert_eq!(parallel, serial, "{threads} threads");
            assert_eq!(parallel_events, serial_events, "{threads} threads");
        }
    }

    #[tokio::test]
    async fn flips_precede_their_turn_complete() {
        let world = patterns::random(16, 16, 7);
        let (_, events) = run_to_end(&world, 10, 4).await;

        let mut completed = 0;
        for event in events {
            match event {
                Event::CellFlipped { turn, .. } => assert_eq!(turn, completed + 1),
                Event::TurnComplete { turn } => {
                    assert_eq!(turn, completed + 1);
                    completed = turn;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(completed, 10);
    }

    #[tokio::test]
    async fn flips_replay_the_board() {
        let world = patterns::random(20, 12, 3);
        let (end, events) = run_to_end(&world, 8, 3).await;
        let mut replayed = world.clone();
        for event in events {
            if let Event::CellFlipped { cell, .. } = event {
                let alive = replayed.is_alive(cell.x, cell.y);
                replayed.set(cell.x, cell.y, !alive);
            }
        }
        assert_eq!(replayed, end);
    }

    #[tokio::test]
    async fn snapshots_track_committed_turns() {
        let world = patterns::random(16, 16, 11);
        let params = Params::new(16, 16, 5, 2);
        let (events_tx, _events) = mpsc::unbounded_channel();
        let (_requests_tx, requests) = mpsc::unbounded_channel();
        let mut distributor = Distributor::new(params, world, events_tx, requests).unwrap();
        let progress = distributor.subscribe();
        distributor.run_turns().await.unwrap();

        let snapshot = progress.borrow().clone();
        assert_eq!(snapshot.turn, 5);
        assert_eq!(snapshot.alive, snapshot.world.alive_count());
        assert_eq!(*snapshot.world, *distributor.world());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_the_turn_and_resume_continues() {
        let world = patterns::random(16, 16, 5);
        let params = Params::new(16, 16, 3, 4);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let mut distributor = Distributor::new(params, world, events_tx, requests).unwrap();

        requests_tx.send(State::Paused).unwrap();
        let task = tokio::spawn(async move {
            distributor.run_turns().await.unwrap();
            distributor
        });

        assert_eq!(
            events.recv().await,
            Some(Event::StateChange {
                turn: 0,
                state: State::Paused
            })
        );
        // While paused nothing happens, however long we wait
        let idle = tokio::time::timeout(Duration::from_secs(60), events.recv()).await;
        assert!(idle.is_err());

        requests_tx.send(State::Executing).unwrap();
        let distributor = task.await.unwrap();
        assert_eq!(distributor.turn(), 3);

        let events = collect(&mut events);
        assert_eq!(
            events[0],
            Event::StateChange {
                turn: 0,
                state: State::Executing
            }
        );
        let turns: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                Event::TurnComplete { turn } => Some(*turn),
                _ => None,
            })
            .collect();
        assert_eq!(turns, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn quit_stops_before_the_next_turn() {
        let world = patterns::random(16, 16, 9);
        let params = Params::new(16, 16, 1_000, 2);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let mut distributor = Distributor::new(params, world, events_tx, requests).unwrap();

        requests_tx.send(State::Quitting).unwrap();
        distributor.run_turns().await.unwrap();
        assert_eq!(distributor.turn(), 0);
        // Quitting is announced by the shutdown sequence, not the loop
        assert!(collect(&mut events).is_empty());
    }

    #[tokio::test]
    async fn single_band_turns_let_other_tasks_run() {
        let world = patterns::random(32, 32, 4);
        let params = Params::new(32, 32, 1_000, 1);
        let (events_tx, _events) = mpsc::unbounded_channel();
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let mut distributor = Distributor::new(params, world, events_tx, requests).unwrap();

        // Only gets polled if the turn loop yields
        let quitter = tokio::spawn(async move {
            requests_tx.send(State::Quitting).unwrap();
            requests_tx
        });
        distributor.run_turns().await.unwrap();
        assert!(distributor.turn() < 1_000, "ran all {} turns", distributor.turn());
        quitter.await.unwrap();
    }

    #[tokio::test]
    async fn quit_while_paused() {
        let world = patterns::random(8, 8, 1);
        let params = Params::new(8, 8, 50, 1);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let mut distributor = Distributor::new(params, world, events_tx, requests).unwrap();

        requests_tx.send(State::Paused).unwrap();
        requests_tx.send(State::Quitting).unwrap();
        distributor.run_turns().await.unwrap();
        assert_eq!(distributor.turn(), 0);
        assert_eq!(
            collect(&mut events),
            vec![Event::StateChange {
                turn: 0,
                state: State::Paused
            }]
        );
    }

    #[tokio::test]
    async fn closed_control_channel_ends_a_pause() {
        let world = patterns::random(8, 8, 1);
        let params = Params::new(8, 8, 50, 2);
        let (events_tx, _events) = mpsc::unbounded_channel();
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let mut distributor = Distributor::new(params, world, events_tx, requests).unwrap();

        requests_tx.send(State::Paused).unwrap();
        drop(requests_tx);
        distributor.run_turns().await.unwrap();
        assert_eq!(distributor.turn(), 0);
    }
}
