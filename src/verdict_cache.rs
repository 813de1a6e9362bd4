use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Memoized primality verdicts, keyed by the exact tested value.
///
/// `capacity: None` grows without bound. With a capacity, the oldest
/// entries are evicted in a batch once the bound is exceeded. A capacity of
/// zero disables storage entirely (every lookup misses).
#[derive(Debug, Clone)]
pub struct VerdictCache {
    verdicts: HashMap<BigUint, bool>,
    insertion_order: VecDeque<BigUint>,
    capacity: Option<usize>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl CacheStats {
    /// Total number of lookups, i.e. how many times the oracle was consulted.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl VerdictCache {
    pub fn unbounded() -> Self {
        VerdictCache {
            verdicts: HashMap::new(),
            insertion_order: VecDeque::new(),
            capacity: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn with_capacity(max_size: usize) -> Self {
        VerdictCache {
            capacity: Some(max_size),
            ..Self::unbounded()
        }
    }

    pub fn disabled() -> Self {
        Self::with_capacity(0)
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Look up a previously stored verdict
    pub fn check(&mut self, value: &BigUint) -> Option<bool> {
        match self.verdicts.get(value) {
            Some(&verdict) => {
                self.hits += 1;
                Some(verdict)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a verdict for a value
    pub fn record(&mut self, value: BigUint, verdict: bool) {
        if self.capacity == Some(0) {
            return;
        }

        if self.verdicts.insert(value.clone(), verdict).is_none() {
            self.insertion_order.push_back(value);
        }

        self.evict_if_needed();
    }

    /// Evict the oldest entries once the cache exceeds its capacity
    pub fn evict_if_needed(&mut self) {
        let Some(max_size) = self.capacity else {
            return;
        };

        if self.verdicts.len() > max_size {
            // Drop an extra fifth so eviction doesn't run on every insert
            let excess = self.verdicts.len() - max_size + max_size / 5;
            let to_remove = excess.min(self.verdicts.len());

            for _ in 0..to_remove {
                if let Some(oldest) = self.insertion_order.pop_front() {
                    self.verdicts.remove(&oldest);
                }
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.verdicts.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate(),
        }
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Forget all verdicts and reset the counters
    pub fn clear(&mut self) {
        self.verdicts.clear();
        self.insertion_order.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }
}
