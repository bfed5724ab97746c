// params.rs - Immutable per-run configuration

use std::time::Duration;

use crate::error::GolError;

pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(2);

/// Board size, run length and parallelism for one run.
/// Built once before the coordinator starts and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    pub width: usize,
    pub height: usize,
    pub turns: usize,
    pub threads: usize,
    pub report_interval: Duration,
}

impl Params {
    pub fn new(width: usize, height: usize, turns: usize, threads: usize) -> Self {
        Self {
            width,
            height,
            turns,
            threads,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Rejects anything that would make a turn impossible to compute.
    pub fn validate(&self) -> Result<(), GolError> {
        if self.width == 0 || self.height == 0 {
            return Err(GolError::config(format!(
                "board must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.turns == 0 {
            return Err(GolError::config("turns must be positive"));
        }
        if self.threads == 0 {
            return Err(GolError::config("threads must be positive"));
        }
        if self.threads > self.height {
            return Err(GolError::config(format!(
                "{} threads would leave empty bands on a board {} rows high",
                self.threads, self.height
            )));
        }
        if self.report_interval.is_zero() {
            return Err(GolError::config("report interval must be non-zero"));
        }
        Ok(())
    }

    /// Key the loader uses for the starting board.
    pub fn input_name(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Key the saver uses for the board left at shutdown.
    pub fn output_name(&self) -> String {
        self.snapshot_name(self.turns)
    }

    /// Key for a board saved after `turn` completed turns.
    pub fn snapshot_name(&self, turn: usize) -> String {
        format!("{}x{}x{}", self.width, self.height, turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_thread_per_row() {
        assert!(Params::new(16, 16, 1, 16).validate().is_ok());
        assert!(Params::new(1, 1, 1, 1).validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_values() {
        assert!(Params::new(0, 16, 10, 1).validate().is_err());
        assert!(Params::new(16, 0, 10, 1).validate().is_err());
        assert!(Params::new(16, 16, 0, 1).validate().is_err());
        assert!(Params::new(16, 16, 10, 0).validate().is_err());
        let silent = Params::new(16, 16, 10, 1).with_report_interval(Duration::ZERO);
        assert!(silent.validate().is_err());
    }

    #[test]
    fn rejects_more_threads_than_rows() {
        let err = Params::new(64, 4, 10, 5).validate().unwrap_err();
        assert!(matches!(err, GolError::Config { .. }));
    }

    #[test]
    fn file_names() {
        let params = Params::new(512, 256, 100, 8);
        assert_eq!(params.input_name(), "512x256");
        assert_eq!(params.output_name(), "512x256x100");
        assert_eq!(params.snapshot_name(7), "512x256x7");
    }
}
