//! Sparse ordering keys for tokens.
//!
//! Token positions are stored, not implied by line order, so a token can be
//! put between two neighbours without touching anything else.
//!
//! ## Representation
//!
//! A [`SequenceIndex`] is a fraction in base 2^32: an integer part followed by
//! any number of fractional digits, each a `u32`. Trailing zero digits are
//! never stored, which makes the derived lexicographic order on the digit
//! vector the same as numeric order.
//!
//! ```text
//! 1                       -> [1]
//! 1.0000000001            -> [1, 1]
//! 1.2147483647            -> [1, 2147483647]   (halfway to 2)
//! 1.2147483647.0000000005 -> [1, 2147483647, 5]
//! 2                       -> [2]
//! ```
//!
//! There is always room for another key between two distinct keys; the
//! digit vector just grows by one.
//!
//! ## Text Form
//!
//! Every fractional digit is written as exactly ten decimal places. A
//! fractional digit is below 10^10, so with one fractional digit the string
//! is a decimal number whose numeric order is the key order: a column that
//! stores `1.2147483647` as a number sorts it between `1` and `2`. Deeper
//! keys keep the extra dots and compare correctly only as keys.

use std::fmt;
use std::str::FromStr;

/// Decimal places per fractional digit; `u32::MAX` has ten.
const FRACTION_WIDTH: usize = 10;

/// A sortable token position that admits insertion between any two keys.
///
/// ```rust
/// use glosa::SequenceIndex;
///
/// let a = SequenceIndex::from_position(1);
/// let b = SequenceIndex::from_position(2);
/// let mid = SequenceIndex::between(&a, &b).unwrap();
///
/// assert!(a < mid && mid < b);
/// assert_eq!(mid.to_string().parse::<SequenceIndex>().unwrap(), mid);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceIndex(Vec<u32>);

impl SequenceIndex {
    /// The key for the `n`th token of a freshly numbered text.
    #[must_use]
    pub fn from_position(n: usize) -> Self {
        Self(vec![u32::try_from(n).unwrap_or(u32::MAX)])
    }

    fn from_digits(mut digits: Vec<u32>) -> Self {
        while digits.len() > 1 && digits.last() == Some(&0) {
            digits.pop();
        }
        if digits.is_empty() {
            digits.push(0);
        }
        Self(digits)
    }

    fn digit(&self, i: usize) -> u32 {
        self.0.get(i).copied().unwrap_or(0)
    }

    /// A key strictly between `lower` and `upper`.
    ///
    /// Returns `None` when `lower >= upper`.
    #[must_use]
    pub fn between(lower: &Self, upper: &Self) -> Option<Self> {
        if lower >= upper {
            return None;
        }

        let mut digits = Vec::with_capacity(lower.0.len().max(upper.0.len()) + 1);
        let mut i = 0;
        loop {
            let lo = lower.digit(i);
            let hi = upper.digit(i);
            if lo == hi {
                digits.push(lo);
                i += 1;
                continue;
            }

            // First differing digit; lo < hi because both are normalized.
            if hi - lo > 1 {
                digits.push(lo + (hi - lo) / 2);
                return Some(Self::from_digits(digits));
            }
            digits.push(lo);
            return Some(Self::ascend(lower, digits, i + 1));
        }
    }

    /// The next key after `self` with nothing in between yet.
    #[must_use]
    pub fn after(&self) -> Self {
        match self.0[0].checked_add(1) {
            Some(next) => Self(vec![next]),
            None => Self::ascend(self, vec![u32::MAX], 1),
        }
    }

    /// Extend `digits` (a copy of `lower`'s first `i` digits) until it is
    /// greater than `lower`.
    fn ascend(lower: &Self, mut digits: Vec<u32>, mut i: usize) -> Self {
        loop {
            let lo = lower.digit(i);
            if u32::MAX - lo > 1 {
                digits.push(lo + (u32::MAX - lo) / 2);
                return Self::from_digits(digits);
            }
            digits.push(lo);
            i += 1;
        }
    }

    /// Number of stored digits, 1 for integer keys.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for SequenceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut digits = self.0.iter();
        if let Some(first) = digits.next() {
            write!(f, "{first}")?;
        }
        for d in digits {
            write!(f, ".{d:010}")?;
        }
        Ok(())
    }
}

/// A sequence index string that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sequence index {0:?}")]
pub struct ParseSequenceIndexError(String);

impl FromStr for SequenceIndex {
    type Err = ParseSequenceIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .split('.')
            .enumerate()
            .map(|(i, d)| {
                let width_ok = if i == 0 {
                    !d.is_empty()
                } else {
                    d.len() == FRACTION_WIDTH
                };
                if !width_ok || !d.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                d.parse::<u32>().ok()
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ParseSequenceIndexError(s.to_string()))?;
        Ok(Self::from_digits(digits))
    }
}
