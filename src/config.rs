use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::alphabet::Alphabet;
use crate::error::{Result, SearchError};
use crate::primality::DEFAULT_ROUNDS;
use crate::search::{
    PerturbationSearch, SearchConfig, DEFAULT_MAX_CHANGES, DEFAULT_PROGRESS_INTERVAL,
};
use crate::verdict_cache::VerdictCache;

/// Settings for one prime search, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
    #[serde(default = "default_max_changes")]
    pub max_changes: usize,
    /// `null` keeps every verdict for the life of the search
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: Option<usize>,
    /// Fixed seed for reproducible runs
    #[serde(default)]
    pub rng_seed: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_alphabet() -> String {
    Alphabet::decimal().to_string()
}

fn default_rounds() -> u32 {
    DEFAULT_ROUNDS
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

fn default_max_changes() -> usize {
    DEFAULT_MAX_CHANGES
}

fn default_cache_capacity() -> Option<usize> {
    Some(1_000_000)
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            alphabet: default_alphabet(),
            rounds: DEFAULT_ROUNDS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            max_changes: DEFAULT_MAX_CHANGES,
            cache_capacity: default_cache_capacity(),
            rng_seed: None,
            timeout_secs: None,
        }
    }
}

impl SearchSettings {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        crate::io_utils::load_json(path)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        crate::io_utils::save_json(self, path)
    }

    /// Check the settings and return the parsed alphabet
    pub fn validate(&self) -> Result<Alphabet> {
        if self.rounds == 0 {
            return Err(SearchError::invalid("rounds must be at least 1"));
        }
        if self.progress_interval == 0 {
            return Err(SearchError::invalid("progress_interval must be at least 1"));
        }
        if self.max_changes == 0 {
            return Err(SearchError::invalid("max_changes must be at least 1"));
        }
        Alphabet::new(&self.alphabet)
    }

    /// Build a ready-to-run search and its alphabet
    pub fn build(&self) -> Result<(PerturbationSearch, Alphabet)> {
        let alphabet = self.validate()?;

        let search = match self.rng_seed {
            Some(seed) => PerturbationSearch::with_seed(seed),
            None => PerturbationSearch::new(),
        };

        let cache = match self.cache_capacity {
            Some(capacity) => VerdictCache::with_capacity(capacity),
            None => VerdictCache::unbounded(),
        };

        let search = search
            .config(SearchConfig {
                progress_interval: self.progress_interval,
                max_changes: self.max_changes,
            })
            .rounds(self.rounds)
            .cache(cache);

        Ok((search, alphabet))
    }
}
