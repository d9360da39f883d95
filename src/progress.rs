//! Progress logging for long sequential scans

use log::info;

/// Default number of records between progress messages
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Counts processed records and logs each time an interval boundary is crossed
///
/// # Example
/// ```
/// use matefilter::ProgressLogger;
///
/// let mut progress = ProgressLogger::new("Processed reads").with_interval(100);
/// for _ in 0..250 {
///     progress.record(); // logs at 100 and 200
/// }
/// progress.finish(); // logs "Processed reads 250 (complete)"
/// assert_eq!(progress.count(), 250);
/// ```
#[derive(Debug)]
pub struct ProgressLogger {
    message: String,
    interval: u64,
    count: u64,
}
impl ProgressLogger {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            interval: DEFAULT_PROGRESS_INTERVAL,
            count: 0,
        }
    }

    /// Sets the logging interval; zero disables interval messages
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Counts one record, returning `true` if a message was logged
    pub fn record(&mut self) -> bool {
        self.count += 1;
        if self.interval > 0 && self.count % self.interval == 0 {
            info!("{} {}", self.message, self.count);
            return true;
        }
        false
    }

    /// Logs the final count unless it was just logged
    pub fn finish(&self) {
        let on_boundary = self.interval > 0 && self.count % self.interval == 0;
        if self.count > 0 && !on_boundary {
            info!("{} {} (complete)", self.message, self.count);
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod testing {
    use super::*;

    #[test]
    fn test_record_reports_boundaries() {
        let mut progress = ProgressLogger::new("Test").with_interval(10);
        let logged = (0..25).filter(|_| progress.record()).count();
        assert_eq!(logged, 2);
        assert_eq!(progress.count(), 25);
    }

    #[test]
    fn test_zero_interval_never_logs() {
        let mut progress = ProgressLogger::new("Test").with_interval(0);
        assert!((0..100).all(|_| !progress.record()));
        progress.finish();
    }
}
