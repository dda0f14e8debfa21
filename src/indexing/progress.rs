//! Statistics for workspace indexing runs

use std::time::{Duration, Instant};

/// Keep at most this many error messages.
const MAX_ERRORS: usize = 100;

/// Statistics collected during indexing
#[derive(Debug, Default)]
pub struct IndexStats {
    /// Files parsed and stored
    pub files_indexed: usize,

    /// Files whose stored copy was already up to date
    pub files_unchanged: usize,

    /// Files that failed to index
    pub files_failed: usize,

    /// Indexed documents whose file no longer exists
    pub files_removed: usize,

    /// Symbols declared by the indexed files
    pub symbols_found: usize,

    pub elapsed: Duration,

    /// First errors encountered, as `(uri, message)`
    pub errors: Vec<(String, String)>,

    start_time: Option<Instant>,
}

impl IndexStats {
    /// Create new stats and start timing
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed = start.elapsed();
        }
    }

    pub fn add_error(&mut self, uri: String, error: String) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push((uri, error));
        }
        self.files_failed += 1;
    }

    /// Print a human-readable summary to stdout
    pub fn display(&self) {
        println!("\nIndexing Complete:");
        println!("  Files indexed: {}", self.files_indexed);
        println!("  Files unchanged: {}", self.files_unchanged);
        println!("  Files removed: {}", self.files_removed);
        println!("  Files failed: {}", self.files_failed);
        println!("  Symbols found: {}", self.symbols_found);
        println!("  Time elapsed: {:.2}s", self.elapsed.as_secs_f64());

        if self.files_indexed > 0 && !self.elapsed.is_zero() {
            let files_per_sec = self.files_indexed as f64 / self.elapsed.as_secs_f64();
            println!("  Performance: {files_per_sec:.0} files/second");
        }

        if !self.errors.is_empty() {
            println!("\nErrors (showing first {}):", self.errors.len().min(5));
            for (uri, error) in self.errors.iter().take(5) {
                println!("  {uri}: {error}");
            }
            if self.errors.len() > 5 {
                println!("  ... and {} more errors", self.errors.len() - 5);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_limiting() {
        let mut stats = IndexStats::new();
        for i in 0..150 {
            stats.add_error(format!("file:///f{i}.php"), format!("Error {i}"));
        }

        assert_eq!(stats.errors.len(), MAX_ERRORS);
        assert_eq!(stats.files_failed, 150);
    }

    #[test]
    fn test_stop_timing_is_idempotent() {
        let mut stats = IndexStats::new();
        std::thread::sleep(Duration::from_millis(2));
        stats.stop_timing();
        let elapsed = stats.elapsed;
        assert!(elapsed >= Duration::from_millis(2));

        stats.stop_timing();
        assert_eq!(stats.elapsed, elapsed);
        stats.display();
    }
}
