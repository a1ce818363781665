//! Shielded value commitments.
//!
//! A commitment binds a value to its owner and hides both:
//!
//! $$\mathsf{cm} = [v]\,\mathcal{V} + [\mathsf{ask}]\,\mathcal{K} + [r]\,\mathcal{R}$$
//!
//! - **Hiding**: $r$ is uniform in $\mathbb{F}_q$, so $\mathsf{cm}$ is a
//!   uniform group element independent of $(v, \mathsf{ask})$.
//! - **Binding**: two distinct openings of the same $\mathsf{cm}$ would
//!   reveal a discrete-log relation between the hash-to-curve generators.
//!
//! Commitments are appended to the external accumulator and become public
//! inputs of proof statements.

use core::hash::{Hash, Hasher};

use pasta_curves::{group::GroupEncoding as _, pallas};
use serde::{Deserialize, Serialize};

use crate::{
    constants::MAX_VALUE, error::ProofError, keys::OwnerSecret, params::Params, value::Blinding,
};

/// A value commitment $\mathsf{cm}$ (a Pallas point).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(into = "[u8; 32]", try_from = "[u8; 32]")]
pub struct Commitment(pallas::Point);

impl Commitment {
    /// Commit to `value` owned by `owner` under `blinding`.
    ///
    /// Deterministic in its inputs: the same triple always yields the same
    /// commitment. Fails with [`ProofError::ValueOutOfRange`] above
    /// [`MAX_VALUE`].
    pub fn commit(
        params: &Params,
        value: u64,
        owner: &OwnerSecret,
        blinding: &Blinding,
    ) -> Result<Self, ProofError> {
        if value > MAX_VALUE {
            return Err(ProofError::ValueOutOfRange {
                value,
                max: MAX_VALUE,
            });
        }
        Ok(Self::from_scalars(
            params,
            pallas::Scalar::from(value),
            owner.authorizing_scalar(),
            blinding.scalar(),
        ))
    }

    pub(crate) fn from_scalars(
        params: &Params,
        value: pallas::Scalar,
        ask: pallas::Scalar,
        blinding: pallas::Scalar,
    ) -> Self {
        Self(
            *params.value_base() * value
                + *params.owner_base() * ask
                + *params.blinding_base() * blinding,
        )
    }

    pub(crate) const fn point(&self) -> &pallas::Point {
        &self.0
    }

    /// Compressed 32-byte encoding.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

impl Hash for Commitment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl From<Commitment> for [u8; 32] {
    fn from(cm: Commitment) -> Self {
        cm.to_bytes()
    }
}

impl TryFrom<[u8; 32]> for Commitment {
    type Error = &'static str;

    fn try_from(bytes: [u8; 32]) -> Result<Self, Self::Error> {
        Option::from(pallas::Point::from_bytes(&bytes))
            .map(Self)
            .ok_or("invalid commitment encoding")
    }
}

impl From<pallas::Point> for Commitment {
    fn from(point: pallas::Point) -> Self {
        Self(point)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;

    fn params() -> Params {
        Params::derive()
    }

    #[test]
    fn rejects_values_above_max() {
        let mut rng = StdRng::seed_from_u64(0);
        let owner = OwnerSecret::random(&mut rng);
        let blinding = Blinding::random(&mut rng);
        let err = Commitment::commit(&params(), MAX_VALUE + 1, &owner, &blinding).unwrap_err();
        assert!(matches!(err, ProofError::ValueOutOfRange { .. }), "got {err}");
        Commitment::commit(&params(), MAX_VALUE, &owner, &blinding).unwrap();
    }

    /// Changing any one input changes the commitment.
    #[test]
    fn binds_every_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let owner = OwnerSecret::random(&mut rng);
        let other_owner = OwnerSecret::random(&mut rng);
        let blinding = Blinding::random(&mut rng);
        let other_blinding = Blinding::random(&mut rng);
        let p = params();

        let base = Commitment::commit(&p, 100, &owner, &blinding).unwrap();
        assert_ne!(base, Commitment::commit(&p, 101, &owner, &blinding).unwrap(), "value");
        assert_ne!(base, Commitment::commit(&p, 100, &other_owner, &blinding).unwrap(), "owner");
        assert_ne!(base, Commitment::commit(&p, 100, &owner, &other_blinding).unwrap(), "blinding");
    }

    /// Commitments to the same value under fresh blindings look like random
    /// bytes: bit frequencies match those of commitments to a far-away value
    /// and both sit at one half.
    #[test]
    fn hiding_bit_distribution() {
        const SAMPLES: u64 = 512;
        // Compressed x-coordinates are below p < 2^255; the top byte is biased.
        const BITS_PER_SAMPLE: u64 = 31 * 8;

        let mut rng = StdRng::seed_from_u64(2);
        let p = params();
        let owner = OwnerSecret::random(&mut rng);

        let mut count_set_bits = |value: u64| -> u64 {
            (0..SAMPLES)
                .map(|_| {
                    let blinding = Blinding::random(&mut rng);
                    let bytes = Commitment::commit(&p, value, &owner, &blinding).unwrap().to_bytes();
                    bytes.iter().take(31).map(|byte| u64::from(byte.count_ones())).sum::<u64>()
                })
                .sum()
        };

        let small = count_set_bits(100);
        let large = count_set_bits(1_000_000_000);

        let expected = SAMPLES * BITS_PER_SAMPLE / 2;
        // sigma = sqrt(n/4) ~ 178; allow well over 5 sigma.
        let tolerance = 1_500;
        assert!(small.abs_diff(expected) < tolerance, "value 100: {small} set bits");
        assert!(large.abs_diff(expected) < tolerance, "value 1e9: {large} set bits");
        assert!(small.abs_diff(large) < 2 * tolerance, "distributions agree");
    }

    #[test]
    fn fresh_blindings_never_collide() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = params();
        let owner = OwnerSecret::random(&mut rng);
        let seen: std::collections::HashSet<Commitment> = (0u8..64)
            .map(|_| Commitment::commit(&p, 100, &owner, &Blinding::random(&mut rng)).unwrap())
            .collect();
        assert_eq!(seen.len(), 64, "no repeated commitments");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn commit_is_deterministic(value in 0u64..=MAX_VALUE, seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let owner = OwnerSecret::random(&mut rng);
            let blinding = Blinding::random(&mut rng);
            let p = params();
            let lhs = Commitment::commit(&p, value, &owner, &blinding).unwrap();
            let rhs = Commitment::commit(&p, value, &owner, &blinding).unwrap();
            prop_assert_eq!(lhs, rhs);
            prop_assert_eq!(Commitment::try_from(lhs.to_bytes()).unwrap(), lhs);
        }
    }
}
