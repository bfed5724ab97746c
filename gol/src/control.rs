// control.rs - Turns control keys into state requests and snapshot saves

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::distributor::Snapshot;
use crate::error::GolError;
use crate::event::{Event, State};
use crate::io::IoHandle;
use crate::params::Params;
use crate::pgm::Image;

/// Control tokens accepted while a run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Save the current board without changing state
    Save,
    /// Toggle between executing and paused
    Pause,
    Quit,
}

impl TryFrom<char> for Key {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_lowercase() {
            's' => Ok(Key::Save),
            'p' => Ok(Key::Pause),
            'q' => Ok(Key::Quit),
            other => Err(other),
        }
    }
}

/// Long-lived task consuming keys for the whole run.
pub struct ControlListener {
    params: Params,
    io: IoHandle,
    progress: watch::Receiver<Snapshot>,
    events: mpsc::UnboundedSender<Event>,
    requests: mpsc::UnboundedSender<State>,
    paused: bool,
}

impl ControlListener {
    pub fn new(
        params: Params,
        io: IoHandle,
        progress: watch::Receiver<Snapshot>,
        events: mpsc::UnboundedSender<Event>,
        requests: mpsc::UnboundedSender<State>,
    ) -> Self {
        Self {
            params,
            io,
            progress,
            events,
            requests,
            paused: false,
        }
    }

    /// Runs until `cancel` fires or the key source closes.
    pub async fn run(mut self, mut keys: mpsc::Receiver<Key>, cancel: CancellationToken) {
        loop {
            let key = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                key = keys.recv() => match key {
                    Some(key) => key,
                    None => {
                        debug!("control input closed");
                        break;
                    }
                },
            };
            if let Err(e) = self.handle(key).await {
                warn!(?key, error = %e, "control request failed");
            }
        }
        debug!("control listener stopped");
    }

    async fn handle(&mut self, key: Key) -> Result<(), GolError> {
        match key {
            Key::Save => self.save().await,
            Key::Pause => {
                self.paused = !self.paused;
                if self.paused {
                    self.request(State::Paused);
                } else {
                    info!("Continuing");
                    self.request(State::Executing);
                }
                Ok(())
            }
            Key::Quit => {
                self.request(State::Quitting);
                Ok(())
            }
        }
    }

    fn request(&self, state: State) {
        if self.requests.send(state).is_err() {
            debug!(%state, "turn loop no longer listening");
        }
    }

    /// Writes the latest published board and waits for the write to land.
    async fn save(&self) -> Result<(), GolError> {
        let snapshot = self.progress.borrow().clone();
        let filename = self.params.snapshot_name(snapshot.turn);
        let world = &snapshot.world;
        let image = Image::new(world.width(), world.height(), world.as_bytes().to_vec());
        self.io.output(filename.clone(), image).await?;
        self.io.check_idle().await?;
        info!(turn = snapshot.turn, %filename, "snapshot saved");
        let event = Event::ImageOutputComplete {
            turn: snapshot.turn,
            filename,
        };
        if self.events.send(event).is_err() {
            debug!("event receiver dropped before the save was announced");
        }
        Ok(())
    }
}
