//! Throughput statistics for load generation

use tokio::time::Instant;

/// Counters for one reporting interval
#[derive(Clone, Debug)]
pub struct LoadWindow {
    started: Instant,
    successes: u64,
    errors: u64,
}

impl LoadWindow {
    pub fn start(now: Instant) -> Self {
        Self {
            started: now,
            successes: 0,
            errors: 0,
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn record_success(&mut self) {
        self.successes += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn requests(&self) -> u64 {
        self.successes + self.errors
    }

    /// Share of failed requests, 0.0 when nothing was sent
    pub fn error_rate(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            n => self.errors as f64 / n as f64,
        }
    }

    /// Wall time per request over the window, in seconds
    pub fn average_duration_secs(&self, now: Instant) -> f64 {
        match self.requests() {
            0 => 0.0,
            n => now.duration_since(self.started).as_secs_f64() / n as f64,
        }
    }

    pub fn summary_line(&self, now: Instant) -> String {
        format!(
            "numRequests {}, successCount {}, errorCount {}, error rate: {:.5}, average request duration: {:.5} Sec",
            self.requests(),
            self.successes,
            self.errors,
            self.error_rate(),
            self.average_duration_secs(now)
        )
    }
}

/// Counters over a whole load run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadTotals {
    pub successes: u64,
    pub errors: u64,
}

impl LoadTotals {
    pub fn requests(&self) -> u64 {
        self.successes + self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_summary_line() {
        let start = Instant::now();
        let mut window = LoadWindow::start(start);
        for _ in 0..3 {
            window.record_success();
        }
        window.record_error();

        let line = window.summary_line(start + Duration::from_secs(10));
        assert_eq!(
            line,
            "numRequests 4, successCount 3, errorCount 1, error rate: 0.25000, average request duration: 2.50000 Sec"
        );
    }

    #[test]
    fn test_empty_window_has_no_nan() {
        let start = Instant::now();
        let window = LoadWindow::start(start);
        assert_eq!(window.error_rate(), 0.0);
        assert_eq!(window.average_duration_secs(start + Duration::from_secs(10)), 0.0);
    }
}
