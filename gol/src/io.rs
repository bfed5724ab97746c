// io.rs - Board loading and saving, served by a dedicated I/O task

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::GolError;
use crate::pgm::{self, Image};

/// Where boards are read from and written to. Called only from the I/O task.
pub trait Storage: Send + 'static {
    fn load(&mut self, name: &str) -> Result<Image, GolError>;
    fn save(&mut self, name: &str, image: &Image) -> Result<(), GolError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn load(&mut self, name: &str) -> Result<Image, GolError> {
        (**self).load(name)
    }

    fn save(&mut self, name: &str, image: &Image) -> Result<(), GolError> {
        (**self).save(name, image)
    }
}

/// Reads `<images>/<name>.pgm`, writes `<out>/<name>.pgm`.
#[derive(Debug, Clone)]
pub struct PgmStore {
    images: PathBuf,
    out: PathBuf,
}

impl PgmStore {
    pub fn new(images: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Self {
        Self {
            images: images.into(),
            out: out.into(),
        }
    }
}

impl Storage for PgmStore {
    fn load(&mut self, name: &str) -> Result<Image, GolError> {
        let path = self.images.join(format!("{name}.pgm"));
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GolError::NotFound {
                    name: path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        pgm::decode(name, &bytes)
    }

    fn save(&mut self, name: &str, image: &Image) -> Result<(), GolError> {
        std::fs::create_dir_all(&self.out)?;
        let bytes = pgm::encode(name, image)?;
        std::fs::write(self.out.join(format!("{name}.pgm")), bytes)?;
        Ok(())
    }
}

/// Images kept in memory. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    images: Arc<Mutex<HashMap<String, Image>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, image: Image) {
        self.lock().insert(name.into(), image);
    }

    pub fn get(&self, name: &str) -> Option<Image> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Image>> {
        self.images.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStore {
    fn load(&mut self, name: &str) -> Result<Image, GolError> {
        self.get(name).ok_or_else(|| GolError::NotFound {
            name: name.to_string(),
        })
    }

    fn save(&mut self, name: &str, image: &Image) -> Result<(), GolError> {
        self.insert(name, image.clone());
        Ok(())
    }
}

enum IoCommand {
    Input {
        filename: String,
        reply: oneshot::Sender<Result<Image, GolError>>,
    },
    Output {
        filename: String,
        image: Image,
    },
    CheckIdle {
        reply: oneshot::Sender<Result<(), GolError>>,
    },
}

/// Sending side of the I/O task. The task exits once every handle is dropped.
#[derive(Clone)]
pub struct IoHandle {
    commands: mpsc::Sender<IoCommand>,
}

impl IoHandle {
    async fn send(&self, command: IoCommand) -> Result<(), GolError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| GolError::IoClosed)
    }

    pub async fn input(&self, filename: impl Into<String>) -> Result<Image, GolError> {
        let (reply, response) = oneshot::channel();
        self.send(IoCommand::Input {
            filename: filename.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| GolError::IoClosed)?
    }

    /// Queues a write. Failures surface from the next `check_idle`.
    pub async fn output(&self, filename: impl Into<String>, image: Image) -> Result<(), GolError> {
        self.send(IoCommand::Output {
            filename: filename.into(),
            image,
        })
        .await
    }

    /// Waits until every write queued before this call has finished.
    pub async fn check_idle(&self) -> Result<(), GolError> {
        let (reply, response) = oneshot::channel();
        self.send(IoCommand::CheckIdle { reply }).await?;
        response.await.map_err(|_| GolError::IoClosed)?
    }
}

/// Starts the I/O task on the blocking pool.
pub fn start<S: Storage>(store: S) -> (IoHandle, JoinHandle<()>) {
    let (commands, rx) = mpsc::channel(16);
    let task = tokio::task::spawn_blocking(move || serve(store, rx));
    (IoHandle { commands }, task)
}

fn serve<S: Storage>(mut store: S, mut commands: mpsc::Receiver<IoCommand>) {
    let mut failure: Option<GolError> = None;
    while let Some(command) = commands.blocking_recv() {
        match command {
            IoCommand::Input { filename, reply } => {
                debug!(%filename, "loading board");
                let _ = reply.send(store.load(&filename));
            }
            IoCommand::Output { filename, image } => match store.save(&filename, &image) {
                Ok(()) => info!(%filename, "board saved"),
                Err(e) => {
                    error!(%filename, error = %e, "failed to save board");
                    // Keep the first failure until someone checks
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            },
            IoCommand::CheckIdle { reply } => {
                let _ = reply.send(failure.take().map_or(Ok(()), Err));
            }
        }
    }
    debug!("I/O task stopped");
}
