// partition.rs - Splits the board's rows into one band per worker

use std::fmt;
use std::ops::Range;

use crate::error::GolError;

/// Half-open row range `[start, end)` handed to one worker for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub start: usize,
    pub end: usize,
}

impl Band {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Cuts `[0, height)` into `threads` contiguous bands of `height / threads`
/// rows; the last band also takes the `height % threads` leftover rows.
pub fn partition(height: usize, threads: usize) -> Result<Vec<Band>, GolError> {
    if threads == 0 {
        return Err(GolError::config("cannot partition rows between zero workers"));
    }
    if threads > height {
        return Err(GolError::config(format!(
            "{threads} workers cannot share {height} rows without an empty band"
        )));
    }

    let rows = height / threads;
    let bands = (0..threads)
        .map(|i| {
            let start = i * rows;
            let end = if i + 1 == threads { height } else { start + rows };
            Band::new(start, end)
        })
        .collect();
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles(bands: &[Band], height: usize) {
        let mut next = 0;
        for band in bands {
            assert_eq!(band.start, next);
            assert!(!band.is_empty());
            next = band.end;
        }
        assert_eq!(next, height);
    }

    #[test]
    fn even_split() {
        let bands = partition(16, 4).unwrap();
        assert_eq!(
            bands,
            vec![Band::new(0, 4), Band::new(4, 8), Band::new(8, 12), Band::new(12, 16)]
        );
    }

    #[test]
    fn last_band_takes_the_remainder() {
        let bands = partition(10, 3).unwrap();
        assert_eq!(bands, vec![Band::new(0, 3), Band::new(3, 6), Band::new(6, 10)]);
    }

    #[test]
    fn tiles_every_height() {
        for height in 1..=40 {
            for threads in 1..=height {
                let bands = partition(height, threads).unwrap();
                assert_eq!(bands.len(), threads);
                assert_tiles(&bands, height);
            }
        }
    }

    #[test]
    fn rejects_bad_thread_counts() {
        assert!(partition(8, 0).is_err());
        assert!(partition(8, 9).is_err());
    }
}
