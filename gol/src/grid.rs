// grid.rs - Board storage for Conway's Game of Life

use std::fmt;

use crate::partition::Band;

pub const ALIVE: u8 = 255;
pub const DEAD: u8 = 0;

/// A cell coordinate, `0 <= x < width`, `0 <= y < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fixed-size toroidal board stored row-major, one byte per cell.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// An all-dead board.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![DEAD; width * height],
        }
    }

    /// Builds a board from row-major bytes; any non-zero byte is alive.
    pub fn from_bytes(width: usize, height: usize, bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), width * height, "byte count must match board size");
        let cells = bytes
            .iter()
            .map(|&b| if b != DEAD { ALIVE } else { DEAD })
            .collect();
        Self { width, height, cells }
    }

    /// Concatenates computed bands, in increasing row order, into a new board.
    ///
    /// Panics if the bands leave a gap, overlap, or do not cover the board:
    /// that can only come from a broken partitioner.
    pub fn from_bands(width: usize, height: usize, bands: Vec<(Band, Vec<u8>)>) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        let mut next_row = 0;
        for (band, rows) in bands {
            assert_eq!(band.start, next_row, "band {band} does not start at row {next_row}");
            assert_eq!(rows.len(), band.len() * width, "band {band} has the wrong size");
            cells.extend(rows);
            next_row = band.end;
        }
        assert_eq!(next_row, height, "bands stop at row {next_row} of {height}");
        Self { width, height, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.width + x]
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == ALIVE
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        self.cells[y * self.width + x] = if alive { ALIVE } else { DEAD };
    }

    /// Row-major bytes of the whole board.
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == ALIVE).count()
    }

    /// Alive cells in row-major order.
    pub fn alive_cells(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == ALIVE)
            .map(|(i, _)| Cell::new(i % self.width, i / self.width))
            .collect()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {}x{}", self.width, self.height)?;
        for row in self.cells.chunks(self.width) {
            let line: String = row
                .iter()
                .map(|&c| if c == ALIVE { '#' } else { '.' })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
