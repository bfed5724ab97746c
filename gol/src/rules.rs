// rules.rs - B3/S23 rule over a toroidal board

use crate::grid::Grid;

/// Outcome of advancing one cell by one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub alive: bool,
    /// The cell changed state
    pub flipped: bool,
}

/// Alive cells among the 8 neighbours of `(x, y)`, wrapping on both axes.
///
/// Boards narrower or shorter than 3 cells are fine: the same cell can be
/// reached through more than one offset and is then counted once per offset.
pub fn neighbour_count(grid: &Grid, x: usize, y: usize) -> u8 {
    let (width, height) = (grid.width(), grid.height());
    let mut count = 0;
    // Offsets are added modulo the board size, so `size - 1` steps back one cell
    for (j, dy) in [height - 1, 0, 1].into_iter().enumerate() {
        for (i, dx) in [width - 1, 0, 1].into_iter().enumerate() {
            if i == 1 && j == 1 {
                continue;
            }
            let nx = (x + dx) % width;
            let ny = (y + dy) % height;
            if grid.is_alive(nx, ny) {
                count += 1;
            }
        }
    }
    count
}

/// Survival on 2 or 3 neighbours, birth on exactly 3.
pub fn next_state(alive: bool, neighbours: u8) -> bool {
    match (alive, neighbours) {
        (true, 2) | (true, 3) => true, // Survival
        (false, 3) => true,            // Birth
        _ => false,                    // Death or stays dead
    }
}

pub fn evolve(grid: &Grid, x: usize, y: usize) -> Transition {
    let current = grid.is_alive(x, y);
    let alive = next_state(current, neighbour_count(grid, x, y));
    Transition {
        alive,
        flipped: alive != current,
    }
}
