use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SearchError};

/// The set of digits a perturbation may write into a candidate.
///
/// Holds 1 to 10 distinct ASCII digits in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alphabet {
    digits: Vec<char>,
    nonzero: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet from its textual form, e.g. `"13579"`.
    ///
    /// Repeated digits collapse into one; anything that isn't an ASCII digit
    /// is rejected.
    pub fn new(digits_text: &str) -> Result<Self> {
        if let Some(bad) = digits_text.chars().find(|c| !c.is_ascii_digit()) {
            return Err(SearchError::invalid(format!(
                "alphabet '{}' contains non-digit '{}'",
                digits_text, bad
            )));
        }

        let mut digits: Vec<char> = digits_text.chars().collect();
        digits.sort_unstable();
        digits.dedup();

        if digits.is_empty() {
            return Err(SearchError::invalid("alphabet must contain at least one digit"));
        }

        let nonzero = digits.iter().copied().filter(|&d| d != '0').collect();
        Ok(Alphabet { digits, nonzero })
    }

    /// All ten decimal digits
    pub fn decimal() -> Self {
        Alphabet {
            digits: ('0'..='9').collect(),
            nonzero: ('1'..='9').collect(),
        }
    }

    pub fn digits(&self) -> &[char] {
        &self.digits
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn contains(&self, digit: char) -> bool {
        self.digits.contains(&digit)
    }

    pub fn has_nonzero(&self) -> bool {
        !self.nonzero.is_empty()
    }

    /// Uniform draw from the whole alphabet
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<char> {
        self.digits.choose(rng).copied()
    }

    /// Uniform draw for the leading position of a multi-digit candidate.
    ///
    /// Excludes `'0'`; an alphabet made only of `'0'` has nothing else to
    /// offer and yields `'0'`.
    pub fn pick_leading<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<char> {
        if self.nonzero.is_empty() {
            return self.digits.first().copied();
        }
        self.nonzero.choose(rng).copied()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::decimal()
    }
}

impl FromStr for Alphabet {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Alphabet::new(s)
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in &self.digits {
            write!(f, "{}", digit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_sorts_and_dedups() {
        let alphabet = Alphabet::new("97131").unwrap();
        assert_eq!(alphabet.digits(), &['1', '3', '7', '9']);
        assert_eq!(alphabet.to_string(), "1379");
        assert_eq!(alphabet.len(), 4);
    }

    #[test]
    fn test_rejects_bad_alphabets() {
        assert!(matches!(Alphabet::new(""), Err(SearchError::InvalidInput(_))));
        assert!(matches!(Alphabet::new("12a"), Err(SearchError::InvalidInput(_))));
        assert!(matches!("1 2".parse::<Alphabet>(), Err(SearchError::InvalidInput(_))));
    }

    #[test]
    fn test_default_is_decimal() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.to_string(), "0123456789");
        assert!(alphabet.has_nonzero());
        assert_eq!(Alphabet::new("0123456789").unwrap(), alphabet);
    }

    #[test]
    fn test_pick_stays_in_alphabet() {
        let mut rng = StdRng::seed_from_u64(3);
        let alphabet = Alphabet::new("058").unwrap();
        for _ in 0..200 {
            let digit = alphabet.pick(&mut rng).unwrap();
            assert!(alphabet.contains(digit));
        }
    }

    #[test]
    fn test_pick_leading_avoids_zero() {
        let mut rng = StdRng::seed_from_u64(4);
        let alphabet = Alphabet::new("01").unwrap();
        for _ in 0..200 {
            assert_eq!(alphabet.pick_leading(&mut rng), Some('1'));
        }
    }

    #[test]
    fn test_zero_only_alphabet_falls_back_to_zero() {
        let mut rng = StdRng::seed_from_u64(5);
        let alphabet = Alphabet::new("000").unwrap();
        assert!(!alphabet.has_nonzero());
        assert_eq!(alphabet.pick_leading(&mut rng), Some('0'));
    }
}
