// cli.rs - Command-line arguments shared by the headless and windowed binaries

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::GolError;
use crate::grid::Grid;
use crate::io::{PgmStore, Storage};
use crate::params::Params;
use crate::patterns;
use crate::pgm::Image;

#[derive(Debug, Clone, Parser)]
#[command(about = "Conway's Game of Life on a toroidal board, computed in parallel bands")]
pub struct Args {
    /// Board width in cells
    #[arg(long, default_value_t = 512)]
    pub width: usize,

    /// Board height in cells
    #[arg(long, default_value_t = 512)]
    pub height: usize,

    /// Number of turns to run
    #[arg(long, default_value_t = 1000)]
    pub turns: usize,

    /// Worker bands per turn
    #[arg(short = 't', long, default_value_t = 8)]
    pub threads: usize,

    /// Milliseconds between alive-cell reports
    #[arg(long, default_value_t = 2000)]
    pub report_interval_ms: u64,

    /// Directory holding `<W>x<H>.pgm` starting boards
    #[arg(long, default_value = "images")]
    pub images: PathBuf,

    /// Directory saved boards are written to
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    /// Start from a named pattern instead of an image
    #[arg(long, conflicts_with = "seed")]
    pub pattern: Option<String>,

    /// Start from a random board generated from this seed
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    pub fn params(&self) -> Params {
        Params::new(self.width, self.height, self.turns, self.threads)
            .with_report_interval(Duration::from_millis(self.report_interval_ms))
    }

    /// Storage for the run: images on disk, optionally with the starting
    /// board replaced by a generated one.
    pub fn store(&self) -> Result<Box<dyn Storage>, GolError> {
        let disk = PgmStore::new(&self.images, &self.out);
        let seeded = match (&self.pattern, self.seed) {
            (Some(name), _) => Some(patterns::find(name)?.centred(self.width, self.height)),
            (None, Some(seed)) => Some(patterns::random(self.width, self.height, seed)),
            (None, None) => None,
        };
        Ok(match seeded {
            Some(grid) => Box::new(Seeded::new(self.params().input_name(), grid, disk)),
            None => Box::new(disk),
        })
    }
}

/// Serves a generated board under the input key and defers everything else.
struct Seeded<S> {
    name: String,
    image: Image,
    inner: S,
}

impl<S> Seeded<S> {
    fn new(name: String, grid: Grid, inner: S) -> Self {
        let image = Image::new(grid.width(), grid.height(), grid.as_bytes().to_vec());
        Self { name, image, inner }
    }
}

impl<S: Storage> Storage for Seeded<S> {
    fn load(&mut self, name: &str) -> Result<Image, GolError> {
        if name == self.name {
            return Ok(self.image.clone());
        }
        self.inner.load(name)
    }

    fn save(&mut self, name: &str, image: &Image) -> Result<(), GolError> {
        self.inner.save(name, image)
    }
}
