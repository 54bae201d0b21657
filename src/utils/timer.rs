//! Timer utilities
//!
//! Records how long each pipeline step took.

use std::time::Duration;
use tokio::time::Instant;

/// Stopwatch with lap timing
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    last: Instant,
    laps: Vec<(String, Duration)>,
}

impl Stopwatch {
    /// Create a new stopwatch
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            laps: Vec::new(),
        }
    }

    /// Close the current lap under `label` and start the next one
    pub fn lap(&mut self, label: impl Into<String>) -> Duration {
        let now = Instant::now();
        let lap = now - self.last;
        self.last = now;
        self.laps.push((label.into(), lap));
        lap
    }

    /// Get total elapsed time
    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    /// Consume the stopwatch, keeping only the laps
    pub fn into_laps(self) -> Vec<(String, Duration)> {
        self.laps
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_laps_are_not_cumulative() {
        let mut sw = Stopwatch::new();
        tokio::time::sleep(Duration::from_secs(10)).await;
        sw.lap("first");
        tokio::time::sleep(Duration::from_secs(5)).await;
        sw.lap("second");

        assert_eq!(sw.total(), Duration::from_secs(15));
        let laps = sw.into_laps();
        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].1, Duration::from_secs(10));
        assert_eq!(laps[1].1, Duration::from_secs(5));
    }
}
