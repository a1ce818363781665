//! Nullifiers and the spent-set seam.
//!
//! $$\mathsf{nf} = [\mathsf{ask}]\,H_{nf}(\mathsf{cm})$$
//!
//! $H_{nf}$ hashes the commitment encoding to a Pallas point under
//! [`NULLIFIER_DOMAIN`]. Keyed by $\mathsf{ask}$ this is a DDH-based PRF:
//!
//! - **Deterministic**: one commitment, one owner, one nullifier.
//! - **Unlinkable**: without $\mathsf{ask}$, nullifiers of distinct
//!   commitments are indistinguishable from random points.
//! - **Provable**: the sigma backend shows in zero knowledge that the same
//!   $\mathsf{ask}$ appears in the commitment and keys the nullifier.
//!
//! Checking whether a nullifier was already spent is the caller's job, via
//! a [`NullifierSet`].

use core::hash::{Hash, Hasher};
use std::collections::HashSet;

use pasta_curves::{arithmetic::CurveExt as _, group::GroupEncoding as _, pallas};
use serde::{Deserialize, Serialize};

use crate::{commitment::Commitment, constants::NULLIFIER_DOMAIN, keys::OwnerSecret};

/// A spend nullifier (a Pallas point).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(into = "[u8; 32]", try_from = "[u8; 32]")]
pub struct Nullifier(pallas::Point);

impl Nullifier {
    /// Derive the nullifier that spends `cm` under `owner`.
    #[must_use]
    pub fn derive(cm: &Commitment, owner: &OwnerSecret) -> Self {
        Self(nullifier_base(cm) * owner.authorizing_scalar())
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

/// $H_{nf}(\mathsf{cm})$.
pub(crate) fn nullifier_base(cm: &Commitment) -> pallas::Point {
    pallas::Point::hash_to_curve(NULLIFIER_DOMAIN)(cm.to_bytes().as_slice())
}

impl Hash for Nullifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl From<Nullifier> for [u8; 32] {
    fn from(nf: Nullifier) -> Self {
        nf.to_bytes()
    }
}

impl TryFrom<[u8; 32]> for Nullifier {
    type Error = &'static str;

    fn try_from(bytes: [u8; 32]) -> Result<Self, Self::Error> {
        Option::from(pallas::Point::from_bytes(&bytes))
            .map(Self)
            .ok_or("invalid nullifier encoding")
    }
}

// =============================================================================
// Spent set
// =============================================================================

/// Persistent record of spent nullifiers.
///
/// Implementations back onto whatever store the deployment uses. Lookups
/// and inserts must be consistent with each other.
pub trait NullifierSet {
    /// Whether `nf` has been recorded as spent.
    fn contains(&self, nf: &Nullifier) -> bool;

    /// Record `nf` as spent. Returns `false` if it was already present.
    fn insert(&mut self, nf: Nullifier) -> bool;
}

impl<S: core::hash::BuildHasher> NullifierSet for HashSet<Nullifier, S> {
    fn contains(&self, nf: &Nullifier) -> bool {
        Self::contains(self, nf)
    }

    fn insert(&mut self, nf: Nullifier) -> bool {
        Self::insert(self, nf)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;
    use crate::{params::Params, value::Blinding};

    fn commitment(rng: &mut StdRng, owner: &OwnerSecret, value: u64) -> Commitment {
        Commitment::commit(&Params::derive(), value, owner, &Blinding::random(rng)).unwrap()
    }

    #[test]
    fn distinct_commitments_distinct_nullifiers() {
        let mut rng = StdRng::seed_from_u64(10);
        let owner = OwnerSecret::random(&mut rng);
        let nullifiers: HashSet<Nullifier> = (0..100)
            .map(|_| {
                let cm = commitment(&mut rng, &owner, 5);
                Nullifier::derive(&cm, &owner)
            })
            .collect();
        assert_eq!(nullifiers.len(), 100, "every commitment spends to its own nullifier");
    }

    #[test]
    fn nullifier_depends_on_owner() {
        let mut rng = StdRng::seed_from_u64(11);
        let owner = OwnerSecret::random(&mut rng);
        let other = OwnerSecret::random(&mut rng);
        let cm = commitment(&mut rng, &owner, 5);
        assert_ne!(
            Nullifier::derive(&cm, &owner),
            Nullifier::derive(&cm, &other),
            "a different secret yields a different nullifier"
        );
    }

    #[test]
    fn nullifier_is_not_the_commitment() {
        let mut rng = StdRng::seed_from_u64(12);
        let owner = OwnerSecret::random(&mut rng);
        let cm = commitment(&mut rng, &owner, 5);
        assert_ne!(
            Nullifier::derive(&cm, &owner).to_bytes(),
            cm.to_bytes(),
            "nullifier must not reveal the commitment"
        );
    }

    #[test]
    fn hash_set_tracks_spends() {
        let mut rng = StdRng::seed_from_u64(13);
        let owner = OwnerSecret::random(&mut rng);
        let nf = Nullifier::derive(&commitment(&mut rng, &owner, 1), &owner);

        let mut spent: HashSet<Nullifier> = HashSet::new();
        assert!(!NullifierSet::contains(&spent, &nf), "fresh set is empty");
        assert!(NullifierSet::insert(&mut spent, nf), "first spend records");
        assert!(NullifierSet::contains(&spent, &nf), "recorded spend is visible");
        assert!(!NullifierSet::insert(&mut spent, nf), "second spend is refused");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn derivation_is_deterministic(secret in any::<[u8; 32]>(), seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let owner = OwnerSecret::from(secret);
            let cm = commitment(&mut rng, &owner, 42);
            let lhs = Nullifier::derive(&cm, &owner);
            let rhs = Nullifier::derive(&cm, &OwnerSecret::from(secret));
            prop_assert_eq!(lhs, rhs);
            prop_assert_eq!(Nullifier::try_from(lhs.to_bytes()).unwrap(), lhs);
        }
    }
}
