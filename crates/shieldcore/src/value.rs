//! Values, blinding factors and value ranges.
//!
//! A commitment hides its value behind a [`Blinding`] factor $r$:
//! `cm = [v]V + [ask]K + [r]R`. Range statements bound the hidden value
//! with a public [`ValueRange`].

use core::fmt;

use ff::{Field as _, PrimeField as _};
use pasta_curves::pallas;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::MAX_VALUE;

// =============================================================================
// Blinding factor (r)
// =============================================================================

/// Commitment blinding factor $r$, the randomness in the Pedersen commitment.
///
/// Draw a fresh one per commitment with [`random`](Self::random). Reusing a
/// blinding factor across two commitments to different values leaks their
/// difference.
///
/// Stored as the canonical scalar encoding so it can be scrubbed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Blinding([u8; 32]);

impl Blinding {
    /// Generate a fresh uniformly random blinding factor.
    pub fn random(rng: &mut (impl RngCore + CryptoRng)) -> Self {
        Self(pallas::Scalar::random(rng).to_repr())
    }

    /// The blinding scalar.
    pub(crate) fn scalar(&self) -> pallas::Scalar {
        // Constructors only admit canonical encodings.
        Option::from(pallas::Scalar::from_repr(self.0)).unwrap_or(pallas::Scalar::ZERO)
    }
}

impl From<pallas::Scalar> for Blinding {
    fn from(scalar: pallas::Scalar) -> Self {
        Self(scalar.to_repr())
    }
}

impl TryFrom<[u8; 32]> for Blinding {
    type Error = &'static str;

    fn try_from(bytes: [u8; 32]) -> Result<Self, Self::Error> {
        Option::<pallas::Scalar>::from(pallas::Scalar::from_repr(bytes))
            .map(Self::from)
            .ok_or("non-canonical blinding scalar")
    }
}

impl fmt::Debug for Blinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Blinding(..)")
    }
}

// =============================================================================
// Value range
// =============================================================================

/// An inclusive public bound `min <= v <= max` on a committed value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct ValueRange {
    /// Smallest admissible value.
    pub min: u64,
    /// Largest admissible value.
    pub max: u64,
}

impl ValueRange {
    /// `[min, max]`.
    #[must_use]
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// `[value, value]`: the value is public.
    #[must_use]
    pub const fn exact(value: u64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// `[0, MAX_VALUE]`: only non-negativity and the global bound are claimed.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            min: 0,
            max: MAX_VALUE,
        }
    }

    /// Whether `min <= max`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Whether `value` lies in the range.
    #[must_use]
    pub const fn contains(&self, value: u64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Width `max - min`, or `None` for an empty range.
    #[must_use]
    pub const fn width(&self) -> Option<u64> {
        self.max.checked_sub(self.min)
    }

    /// Number of bits $n$ such that `width < 2^n`.
    ///
    /// The range argument proves both $d = v - \text{min} \in [0, 2^n)$ and
    /// $d + \text{offset} \in [0, 2^n)$ with
    /// $\text{offset} = 2^n - 1 - \text{width}$.
    #[must_use]
    pub const fn bits(&self) -> Option<u32> {
        match self.width() {
            Some(width) => Some(u64::BITS - width.leading_zeros()),
            None => None,
        }
    }

    /// Shift that lifts `d <= width` into `d + offset < 2^n`.
    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        match (self.width(), self.bits()) {
            (Some(width), Some(bits)) => Some(bit_mask(bits) - width),
            (_, _) => None,
        }
    }
}

/// $2^n - 1$ without overflow for $n = 64$.
#[must_use]
pub(crate) const fn bit_mask(bits: u32) -> u64 {
    if bits == 0 {
        0
    } else {
        u64::MAX >> (u64::BITS - bits)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn bits_cover_the_width() {
        assert_eq!(ValueRange::new(0, 1000).bits(), Some(10), "1000 < 2^10");
        assert_eq!(ValueRange::new(0, 10).bits(), Some(4), "10 < 2^4");
        assert_eq!(ValueRange::exact(7).bits(), Some(0), "zero width needs no bits");
        assert_eq!(ValueRange::new(0, u64::MAX).bits(), Some(64), "full width");
        assert_eq!(ValueRange::new(2, 1).bits(), None, "empty range");
    }

    #[test]
    fn offset_for_full_width_is_zero() {
        assert_eq!(ValueRange::new(0, u64::MAX).offset(), Some(0), "2^64 - 1 - (2^64 - 1)");
        assert_eq!(ValueRange::new(0, 1000).offset(), Some(23), "1023 - 1000");
    }

    #[test]
    fn blinding_rejects_non_canonical_bytes() {
        assert!(Blinding::try_from([0xffu8; 32]).is_err(), "above modulus");
    }

    proptest! {
        /// Every value in range lifts into [0, 2^n) on both sides.
        #[test]
        fn lifted_values_fit_in_bits(min in 0u64..1_000_000, width in 0u64..1_000_000, pick in 0u64..1_000_000) {
            let range = ValueRange::new(min, min + width);
            let delta = pick % (width + 1);
            let bits = range.bits().unwrap();
            let offset = range.offset().unwrap();
            prop_assert!(delta <= bit_mask(bits));
            prop_assert!(delta + offset <= bit_mask(bits));
        }
    }
}
