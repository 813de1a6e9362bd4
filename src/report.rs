use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::verdict_cache::CacheStats;

/// Summary of a finished search, written as JSON by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub seed: String,
    pub prime: String,
    pub digits: usize,
    pub changed_digits: usize,
    pub attempts: u64,
    pub rounds: u32,
    pub elapsed_secs: f64,
    pub cache: CacheStats,
    pub timestamp: String,
}

impl SearchReport {
    /// Create a new report stamped with the local time
    ///
    /// # Examples
    ///
    /// ```
    /// use prime_art::{CacheStats, SearchReport};
    ///
    /// let cache = CacheStats { entries: 3, hits: 0, misses: 3, hit_rate: 0.0 };
    /// let report = SearchReport::new("8888", "8887", 3, 8, 0.01, cache);
    /// assert_eq!(report.changed_digits, 1);
    /// ```
    pub fn new(
        seed: &str,
        prime: &str,
        attempts: u64,
        rounds: u32,
        elapsed_secs: f64,
        cache: CacheStats,
    ) -> Self {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        SearchReport {
            seed: seed.to_string(),
            prime: prime.to_string(),
            digits: prime.len(),
            changed_digits: changed_digits(seed, prime),
            attempts,
            rounds,
            elapsed_secs,
            cache,
            timestamp,
        }
    }

    /// Save report to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        crate::io_utils::save_json(self, path)
    }

    /// Load report from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        crate::io_utils::load_json(path)
    }

    /// Attempts per second, zero when no time was measured
    pub fn rate(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.attempts as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

/// Number of positions where two equal-length digit strings differ
pub fn changed_digits(seed: &str, prime: &str) -> usize {
    seed.chars().zip(prime.chars()).filter(|(a, b)| a != b).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> CacheStats {
        CacheStats {
            entries: 40,
            hits: 40,
            misses: 40,
            hit_rate: 0.5,
        }
    }

    #[test]
    fn test_changed_digits() {
        assert_eq!(changed_digits("123456", "123456"), 0);
        assert_eq!(changed_digits("123456", "723457"), 2);
    }

    #[test]
    fn test_rate() {
        let report = SearchReport::new("6", "7", 10, 8, 2.0, stats());
        assert_eq!(report.rate(), 5.0);
        let instant = SearchReport::new("6", "7", 10, 8, 0.0, stats());
        assert_eq!(instant.rate(), 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let report = SearchReport::new("888888", "888883", 42, 8, 0.5, stats());
        report.save(&path).unwrap();

        let loaded = SearchReport::load(&path).unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.digits, 6);
        assert_eq!(loaded.changed_digits, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SearchReport::load(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
