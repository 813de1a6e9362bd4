use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::alphabet::Alphabet;
use crate::error::{Result, SearchError};
use crate::primality::{parse_digits, PrimalityOracle};
use crate::verdict_cache::VerdictCache;

pub const DEFAULT_PROGRESS_INTERVAL: u64 = 20;
pub const DEFAULT_MAX_CHANGES: usize = 2;

/// Snapshot of an in-flight search, emitted at the throttle cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Candidates tested so far, the seed included. Starts at 1.
    pub attempts: u64,
    pub candidate: String,
    pub changed_index: Option<usize>,
}

/// Receives progress events from a running search.
pub trait ProgressSink {
    fn report(&mut self, progress: &SearchProgress);
}

impl<F> ProgressSink for F
where
    F: FnMut(&SearchProgress),
{
    fn report(&mut self, progress: &SearchProgress) {
        self(progress)
    }
}

/// Forwards progress events into a tokio channel.
///
/// A dropped receiver is not an error; the search keeps going.
pub struct ChannelSink(pub UnboundedSender<SearchProgress>);

impl ProgressSink for ChannelSink {
    fn report(&mut self, progress: &SearchProgress) {
        let _ = self.0.send(progress.clone());
    }
}

/// Discards progress events.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _progress: &SearchProgress) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Active,
    Cancelled,
    Completed,
}

const ACTIVE: u8 = 0;
const CANCELLED: u8 = 1;
const COMPLETED: u8 = 2;

/// Cooperative cancellation token for one search.
///
/// Clones share state. Moves from `Active` to either `Cancelled` or
/// `Completed` exactly once.
#[derive(Debug, Clone, Default)]
pub struct SearchHandle {
    state: Arc<AtomicU8>,
}

impl SearchHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `false` if the search already finished
    /// or was already cancelled.
    pub fn cancel(&self) -> bool {
        self.transition(CANCELLED)
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == SearchState::Cancelled
    }

    pub fn state(&self) -> SearchState {
        match self.state.load(Ordering::Acquire) {
            ACTIVE => SearchState::Active,
            CANCELLED => SearchState::Cancelled,
            _ => SearchState::Completed,
        }
    }

    fn complete(&self) -> bool {
        self.transition(COMPLETED)
    }

    fn transition(&self, to: u8) -> bool {
        self.state
            .compare_exchange(ACTIVE, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn is_cancelled(handle: Option<&SearchHandle>) -> bool {
    handle.is_some_and(SearchHandle::is_cancelled)
}

/// Marks the handle completed; `false` means a cancel got there first.
fn complete(handle: Option<&SearchHandle>) -> bool {
    handle.map_or(true, SearchHandle::complete)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Attempts between progress events; each event is also a yield point
    pub progress_interval: u64,
    /// Upper bound on digits rewritten per candidate
    pub max_changes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            max_changes: DEFAULT_MAX_CHANGES,
        }
    }
}

/// Rough number of attempts a `digits`-long seed needs before hitting a
/// prime, from the average prime gap near `10^digits`. Not a guarantee.
pub fn estimated_attempts(digits: usize) -> f64 {
    1.15 * digits.saturating_sub(1) as f64
}

/// Rewrite 1 to `max_changes` random positions of `seed`.
///
/// Positions are drawn independently, so two draws may land on the same
/// index. A multi-digit seed starting with `'0'` always has its leading
/// digit rewritten, and that rewrite counts against `max_changes`.
///
/// Returns the new candidate and the last index written, or `None` when the
/// alphabet cannot supply a digit.
pub fn perturb<R: Rng + ?Sized>(
    seed: &[char],
    alphabet: &Alphabet,
    max_changes: usize,
    rng: &mut R,
) -> Option<(String, usize)> {
    if seed.is_empty() {
        return None;
    }

    let mut digits = seed.to_vec();
    let mut changes = rng.gen_range(1..=max_changes.max(1));
    let mut last_changed = 0;

    // A zero-led seed spends its first change on the leading digit
    if digits.len() > 1 && digits[0] == '0' {
        digits[0] = alphabet.pick_leading(rng)?;
        changes -= 1;
    }

    for _ in 0..changes {
        let pos = rng.gen_range(0..digits.len());
        digits[pos] = if pos == 0 && digits.len() > 1 {
            alphabet.pick_leading(rng)?
        } else {
            alphabet.pick(rng)?
        };
        last_changed = pos;
    }

    Some((digits.into_iter().collect(), last_changed))
}

/// Randomized local search for a probable prime close to a seed.
pub struct PerturbationSearch<R: Rng = StdRng> {
    oracle: PrimalityOracle<R>,
    rng: R,
    config: SearchConfig,
}

impl PerturbationSearch<StdRng> {
    pub fn new() -> Self {
        Self::from_parts(PrimalityOracle::new(), StdRng::from_entropy(), SearchConfig::default())
    }

    /// Fully reproducible search: both the witness and perturbation streams
    /// derive from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_parts(
            PrimalityOracle::with_seed(seed),
            StdRng::seed_from_u64(seed.rotate_left(32) ^ 0x9e37_79b9_7f4a_7c15),
            SearchConfig::default(),
        )
    }
}

impl Default for PerturbationSearch<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PerturbationSearch<R> {
    pub fn from_parts(oracle: PrimalityOracle<R>, rng: R, config: SearchConfig) -> Self {
        PerturbationSearch { oracle, rng, config }
    }

    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Miller–Rabin rounds used by the underlying oracle
    pub fn rounds(mut self, rounds: u32) -> Self {
        self.oracle = self.oracle.rounds(rounds);
        self
    }

    pub fn cache(mut self, cache: VerdictCache) -> Self {
        self.oracle = self.oracle.cache(cache);
        self
    }

    pub fn oracle(&self) -> &PrimalityOracle<R> {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut PrimalityOracle<R> {
        &mut self.oracle
    }

    /// Search for a probable prime reachable from `seed` by rewriting a few
    /// digits with `alphabet`.
    ///
    /// Every candidate is a perturbation of the original seed. Every
    /// `progress_interval` attempts the search reports progress, checks
    /// `handle` and yields to the runtime; no other iteration suspends.
    /// Once cancellation is observed no further progress is reported.
    pub async fn find_prime<P: ProgressSink>(
        &mut self,
        seed: &str,
        alphabet: &Alphabet,
        mut progress: P,
        handle: Option<&SearchHandle>,
    ) -> Result<String> {
        if seed.is_empty() {
            return Err(SearchError::invalid("seed digit string is empty"));
        }
        if seed.len() > 1 && !alphabet.has_nonzero() {
            return Err(SearchError::invalid(format!(
                "alphabet '{}' has no non-zero digit; \
                 a {}-digit candidate would need a leading zero",
                alphabet,
                seed.len()
            )));
        }
        if is_cancelled(handle) {
            return Err(SearchError::Cancelled);
        }

        // A zero-led seed is not itself an acceptable answer
        let value = parse_digits(seed)?;
        let zero_led = seed.len() > 1 && seed.starts_with('0');
        if !zero_led && self.oracle.is_prime(&value) {
            if !complete(handle) {
                return Err(SearchError::Cancelled);
            }
            progress.report(&SearchProgress {
                attempts: 1,
                candidate: seed.to_string(),
                changed_index: None,
            });
            info!(digits = seed.len(), "seed is already a probable prime");
            return Ok(seed.to_string());
        }

        let interval = self.config.progress_interval.max(1);
        let seed_digits: Vec<char> = seed.chars().collect();
        let mut attempts: u64 = 1;

        debug!(
            digits = seed.len(),
            alphabet = %alphabet,
            expected_attempts = estimated_attempts(seed.len()),
            "starting perturbation search"
        );

        loop {
            attempts += 1;

            let (candidate, changed) =
                perturb(&seed_digits, alphabet, self.config.max_changes, &mut self.rng)
                    .ok_or_else(|| SearchError::Internal {
                        candidate: seed.to_string(),
                        attempts,
                        reason: format!("alphabet '{}' produced no replacement digit", alphabet),
                    })?;
            let value = parse_digits(&candidate)?;

            if self.oracle.is_prime(&value) {
                if !complete(handle) {
                    debug!(attempts, "search cancelled before completion");
                    return Err(SearchError::Cancelled);
                }
                progress.report(&SearchProgress {
                    attempts,
                    candidate: candidate.clone(),
                    changed_index: Some(changed),
                });
                info!(attempts, digits = candidate.len(), "probable prime found");
                return Ok(candidate);
            }

            if attempts % interval == 0 {
                if is_cancelled(handle) {
                    debug!(attempts, "search cancelled");
                    return Err(SearchError::Cancelled);
                }

                progress.report(&SearchProgress {
                    attempts,
                    candidate,
                    changed_index: Some(changed),
                });

                tokio::task::yield_now().await;

                if is_cancelled(handle) {
                    debug!(attempts, "search cancelled while suspended");
                    return Err(SearchError::Cancelled);
                }
            }
        }
    }
}
