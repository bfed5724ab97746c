// event.rs - Events the engine emits to whoever is watching the run

use std::fmt;

use crate::grid::Cell;

/// Execution state of the turn loop. `Quitting` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Executing,
    Paused,
    Quitting,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Executing => write!(f, "Executing"),
            State::Paused => write!(f, "Paused"),
            State::Quitting => write!(f, "Quitting"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `cell` changed state while computing `turn`
    CellFlipped { turn: usize, cell: Cell },
    TurnComplete { turn: usize },
    /// Periodic population report
    AliveCellsCount { turn: usize, count: usize },
    ImageOutputComplete { turn: usize, filename: String },
    StateChange { turn: usize, state: State },
    FinalTurnComplete { turn: usize, alive: Vec<Cell> },
}

impl Event {
    /// Completed turns at the moment the event was produced.
    pub fn turn(&self) -> usize {
        match self {
            Event::CellFlipped { turn, .. }
            | Event::TurnComplete { turn }
            | Event::AliveCellsCount { turn, .. }
            | Event::ImageOutputComplete { turn, .. }
            | Event::StateChange { turn, .. }
            | Event::FinalTurnComplete { turn, .. } => *turn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::CellFlipped { turn, cell } => write!(f, "turn {turn}: cell {cell} flipped"),
            Event::TurnComplete { turn } => write!(f, "turn {turn} complete"),
            Event::AliveCellsCount { turn, count } => {
                write!(f, "turn {turn}: {count} alive cells")
            }
            Event::ImageOutputComplete { turn, filename } => {
                write!(f, "turn {turn}: wrote {filename}")
            }
            Event::StateChange { turn, state } => write!(f, "turn {turn}: {state}"),
            Event::FinalTurnComplete { turn, alive } => {
                write!(f, "final turn {turn}: {} alive cells", alive.len())
            }
        }
    }
}
