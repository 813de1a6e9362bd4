use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{Result, SearchError};
use crate::verdict_cache::{CacheStats, VerdictCache};

pub const DEFAULT_ROUNDS: u32 = 8;

/// Parse a decimal digit string into a `BigUint`.
///
/// Only ASCII digits are accepted. `BigUint`'s own parser tolerates `_`
/// separators and a leading `+`, which are not valid digit strings here.
pub fn parse_digits(digits: &str) -> Result<BigUint> {
    if digits.is_empty() {
        return Err(SearchError::invalid("digit string is empty"));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(SearchError::invalid(format!(
            "'{}' is not a decimal digit string (found '{}')",
            digits, bad
        )));
    }

    BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| SearchError::invalid(format!("cannot parse '{}' as an integer", digits)))
}

/// Calculates `base^exponent mod modulus` by square-and-multiply.
///
/// Every product is reduced modulo `modulus`, so operands never grow past
/// twice the modulus width.
pub fn power_mod(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    if modulus.is_one() {
        return BigUint::zero();
    }

    let mut result = BigUint::one();
    let mut base = base % modulus;
    let mut exponent = exponent.clone();

    while !exponent.is_zero() {
        if (&exponent % 2u32).is_one() {
            result = (&result * &base) % modulus;
        }
        exponent >>= 1u32;
        if !exponent.is_zero() {
            base = (&base * &base) % modulus;
        }
    }

    result
}

/// Draw a Miller–Rabin witness uniformly from `[2, n - 2]`.
///
/// Rejection sampling over a value with the same bit length as the range
/// size keeps the draw uniform for any width of `n`. Requires `n >= 5`.
pub fn random_witness<R: Rng + ?Sized>(n: &BigUint, rng: &mut R) -> BigUint {
    debug_assert!(*n >= BigUint::from(5u32));

    // Number of values in [2, n - 2]
    let span = n - 3u32;
    let bits = span.bits();

    loop {
        let candidate = rng.gen_biguint(bits);
        if candidate < span {
            return candidate + 2u32;
        }
    }
}

/// Split `n - 1` into `d * 2^s` with `d` odd.
fn decompose(n: &BigUint) -> (BigUint, u64) {
    let mut d = n - 1u32;
    let mut s = 0u64;
    while (&d % 2u32).is_zero() {
        d >>= 1u32;
        s += 1;
    }
    (d, s)
}

/// One Miller–Rabin round. Returns `true` when `a` proves `n` composite.
fn witnesses_composite(
    a: &BigUint,
    d: &BigUint,
    s: u64,
    n: &BigUint,
    n_minus_one: &BigUint,
) -> bool {
    let mut x = power_mod(a, d, n);

    if x.is_one() || x == *n_minus_one {
        return false;
    }

    for _ in 1..s {
        x = (&x * &x) % n;
        if x == *n_minus_one {
            return false;
        }
    }

    true
}

/// Miller–Rabin probabilistic primality test, without memoization.
///
/// `false` means `n` is certainly composite (or ≤ 1). `true` means `n` passed
/// `rounds` random witnesses, which a composite does with probability at most
/// `4^-rounds`.
pub fn is_probable_prime<R: Rng + ?Sized>(n: &BigUint, rounds: u32, rng: &mut R) -> bool {
    if *n <= BigUint::one() {
        return false;
    }
    if *n <= BigUint::from(3u32) {
        return true;
    }
    if (n % 2u32).is_zero() || (n % 3u32).is_zero() {
        return false;
    }
    if *n < BigUint::from(10u32) {
        // Only 5 and 7 remain below 10
        return true;
    }

    let n_minus_one = n - 1u32;
    let (d, s) = decompose(n);

    for _ in 0..rounds.max(1) {
        let a = random_witness(n, rng);
        if witnesses_composite(&a, &d, s, n, &n_minus_one) {
            return false;
        }
    }

    true
}

/// Classify many digit strings in parallel.
///
/// Each test runs with its own thread-local RNG and no shared cache, so
/// workers never contend. Results come back in input order.
pub fn classify_many<S: AsRef<str> + Sync>(numbers: &[S], rounds: u32) -> Vec<Result<bool>> {
    numbers
        .par_iter()
        .map(|number| {
            let value = parse_digits(number.as_ref())?;
            Ok(is_probable_prime(&value, rounds, &mut rand::thread_rng()))
        })
        .collect()
}

/// Miller–Rabin tester that owns its verdict cache and random source.
///
/// Callers needing isolation between searches construct a fresh oracle.
#[derive(Debug)]
pub struct PrimalityOracle<R: Rng = StdRng> {
    rounds: u32,
    cache: VerdictCache,
    rng: R,
}

impl PrimalityOracle<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Oracle with a reproducible witness sequence
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for PrimalityOracle<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PrimalityOracle<R> {
    pub fn with_rng(rng: R) -> Self {
        PrimalityOracle {
            rounds: DEFAULT_ROUNDS,
            cache: VerdictCache::unbounded(),
            rng,
        }
    }

    /// Set the number of Miller–Rabin rounds; zero is treated as one
    pub fn rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    pub fn cache(mut self, cache: VerdictCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn round_count(&self) -> u32 {
        self.rounds
    }

    pub fn is_prime(&mut self, n: &BigUint) -> bool {
        if let Some(verdict) = self.cache.check(n) {
            return verdict;
        }

        let verdict = is_probable_prime(n, self.rounds, &mut self.rng);
        self.cache.record(n.clone(), verdict);
        verdict
    }

    /// Validate and test a decimal digit string
    pub fn is_prime_str(&mut self, digits: &str) -> Result<bool> {
        let value = parse_digits(digits)?;
        Ok(self.is_prime(&value))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
