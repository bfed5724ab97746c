// worker.rs - Computes the next generation for one band of rows

use std::sync::Arc;

use tracing::trace;

use crate::grid::{ALIVE, Cell, DEAD, Grid};
use crate::partition::Band;
use crate::rules;

/// Next-generation rows for one band, plus the cells that flipped in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandResult {
    pub band: Band,
    /// `band.len() * width` bytes, row-major
    pub cells: Vec<u8>,
    /// Flipped cells in row-major order, in board coordinates
    pub flipped: Vec<Cell>,
}

fn compute_row(world: &Grid, y: usize, cells: &mut Vec<u8>, flipped: &mut Vec<Cell>) {
    for x in 0..world.width() {
        let transition = rules::evolve(world, x, y);
        cells.push(if transition.alive { ALIVE } else { DEAD });
        if transition.flipped {
            flipped.push(Cell::new(x, y));
        }
    }
}

/// Serial computation of `band` against an immutable snapshot.
pub fn compute_band(world: &Grid, band: Band) -> BandResult {
    let mut cells = Vec::with_capacity(band.len() * world.width());
    let mut flipped = Vec::new();
    for y in band.rows() {
        compute_row(world, y, &mut cells, &mut flipped);
    }
    BandResult { band, cells, flipped }
}

/// Band task spawned once per band per turn. Reads only `world` and yields
/// back to the scheduler after every row.
pub async fn worker(band: Band, world: Arc<Grid>, turn: usize) -> BandResult {
    let mut cells = Vec::with_capacity(band.len() * world.width());
    let mut flipped = Vec::new();
    for y in band.rows() {
        compute_row(&world, y, &mut cells, &mut flipped);
        tokio::task::yield_now().await; // Cooperative yielding
    }
    trace!(turn, %band, flips = flipped.len(), "band computed");
    BandResult { band, cells, flipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glider() -> Grid {
        let mut grid = Grid::new(8, 8);
        for (x, y) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
            grid.set(x, y, true);
        }
        grid
    }

    #[test]
    fn whole_board_band() {
        let world = glider();
        let result = compute_band(&world, Band::new(0, 8));
        let next = Grid::from_bytes(8, 8, &result.cells);
        assert_eq!(
            next.alive_cells(),
            vec![
                Cell::new(0, 1),
                Cell::new(2, 1),
                Cell::new(1, 2),
                Cell::new(2, 2),
                Cell::new(1, 3)
            ]
        );
        assert_eq!(
            result.flipped,
            vec![Cell::new(1, 0), Cell::new(0, 1), Cell::new(0, 2), Cell::new(1, 3)]
        );
    }

    #[test]
    fn band_only_covers_its_rows() {
        let world = glider();
        let full = compute_band(&world, Band::new(0, 8));
        let part = compute_band(&world, Band::new(2, 5));
        assert_eq!(part.cells.len(), 3 * 8);
        assert_eq!(&part.cells[..], &full.cells[2 * 8..5 * 8]);
        assert!(part.flipped.iter().all(|c| (2..5).contains(&c.y)));
    }

    #[tokio::test]
    async fn async_worker_matches_serial() {
        let world = Arc::new(glider());
        let band = Band::new(1, 4);
        let expected = compute_band(&world, band);
        let result = worker(band, Arc::clone(&world), 1).await;
        assert_eq!(result, expected);
    }
}
