//! Property-based tests for the primality and perturbation primitives.
//!
//! Run with `cargo test --test property_tests`; raise `PROPTEST_CASES` for a
//! more thorough pass.

use num_bigint::BigUint;
use prime_art::{is_probable_prime, perturb, power_mod, Alphabet, PrimalityOracle};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn trial_division(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

proptest! {
    /// power_mod(b, e, m) == b^e mod m
    #[test]
    fn prop_power_mod_matches_modpow(
        base in 0u64..u64::MAX,
        exp in 0u64..100_000,
        modulus in 1u64..u64::MAX,
    ) {
        let (b, e, m) = (BigUint::from(base), BigUint::from(exp), BigUint::from(modulus));
        prop_assert_eq!(power_mod(&b, &e, &m), b.modpow(&e, &m));
    }

    /// With 20 rounds a composite slips through with probability below 1e-12.
    #[test]
    fn prop_oracle_agrees_with_trial_division(n in 0u64..10_000, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert_eq!(is_probable_prime(&BigUint::from(n), 20, &mut rng), trial_division(n));
    }

    /// Repeated queries never flip a verdict.
    #[test]
    fn prop_cached_verdict_is_stable(n in 0u64..1_000_000, seed in any::<u64>()) {
        let mut oracle = PrimalityOracle::with_seed(seed);
        let value = BigUint::from(n);
        let first = oracle.is_prime(&value);
        prop_assert_eq!(oracle.is_prime(&value), first);
        prop_assert_eq!(oracle.is_prime_str(&n.to_string()).unwrap(), first);
    }

    /// Perturbation keeps the length, rewrites at most `max_changes` digits
    /// with alphabet members, and never leads with '0' on multi-digit output.
    #[test]
    fn prop_perturb_shape(
        seed_digits in "[0-9]{2,40}",
        alphabet in "[0-9]{1,10}",
        max_changes in 1usize..4,
        rng_seed in any::<u64>(),
    ) {
        let alphabet = Alphabet::new(&alphabet).unwrap();
        prop_assume!(alphabet.has_nonzero());

        let mut rng = StdRng::seed_from_u64(rng_seed);
        let seed: Vec<char> = seed_digits.chars().collect();
        let (candidate, changed) = perturb(&seed, &alphabet, max_changes, &mut rng).unwrap();

        prop_assert_eq!(candidate.len(), seed.len());
        prop_assert!(changed < seed.len());

        let diffs: Vec<char> = candidate
            .chars()
            .zip(seed.iter())
            .filter(|(a, b)| a != *b)
            .map(|(a, _)| a)
            .collect();
        prop_assert!(diffs.len() <= max_changes);
        prop_assert!(diffs.iter().all(|&d| alphabet.contains(d)));

        if candidate.len() > 1 {
            prop_assert!(!candidate.starts_with('0'));
        }
    }
}
