//! Public statements.
//!
//! A [`Statement`] is the public half of a proof: what the verifier knows
//! and what the prover claims about it.
//!
//! | Field | Claim |
//! | ----- | ----- |
//! | `commitment` | the prover can open $\mathsf{cm}$ |
//! | `range` | the committed value lies in `[min, max]` |
//! | `nullifier` | $\mathsf{nf}$ is keyed by the same owner scalar |
//! | `membership` | $\mathsf{cm}$ is a leaf under `anchor` |
//! | `destination` | the value goes to this recipient or output |
//!
//! The [`StatementKind`] and the [`Destination`] are bound into the
//! transcript, so a proof for one kind of transfer never verifies as
//! another and a spend cannot be redirected.

use serde::{Deserialize, Serialize};

use crate::{
    accumulator::MerklePath,
    commitment::Commitment,
    constants::STATEMENT_DIGEST_PERSONALIZATION,
    nullifier::Nullifier,
    primitives::{Anchor, codec::Writer},
    proof::InvalidReason,
    value::ValueRange,
};

/// Which transfer a statement describes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Transparent value enters the shielded pool. The amount is public.
    Shield,
    /// Shielded value leaves the pool. The amount is public; the spent
    /// commitment is nullified.
    Unshield,
    /// Value moves within the pool. The amount stays hidden.
    PrivateTransfer,
}

impl StatementKind {
    /// One-byte canonical code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Shield => 1,
            Self::Unshield => 2,
            Self::PrivateTransfer => 3,
        }
    }
}

/// Where a statement sends its value.
///
/// A 32-byte public reference: the digest of a recipient address, or the
/// encoding of the output commitment a transfer creates.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Destination([u8; 32]);

impl From<[u8; 32]> for Destination {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Destination> for [u8; 32] {
    fn from(destination: Destination) -> Self {
        destination.0
    }
}

impl From<Commitment> for Destination {
    fn from(output: Commitment) -> Self {
        Self(output.to_bytes())
    }
}

impl Destination {
    /// A destination from its raw reference bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw reference bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Claim that a commitment is a leaf of the accumulator at `anchor`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Membership {
    /// Accumulator state the path leads to.
    pub anchor: Anchor,
    /// Authentication path from the commitment.
    pub path: MerklePath,
}

/// The public inputs a proof attests to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Statement {
    /// Transfer kind.
    pub kind: StatementKind,
    /// The commitment being opened.
    pub commitment: Commitment,
    /// Bound on the committed value.
    pub range: ValueRange,
    /// Spend nullifier, for statements that consume the commitment.
    pub nullifier: Option<Nullifier>,
    /// Accumulator membership claim.
    pub membership: Option<Membership>,
    /// Recipient or output the value is bound to.
    pub destination: Option<Destination>,
}

impl Statement {
    /// A bare range claim over `commitment`.
    #[must_use]
    pub const fn new(kind: StatementKind, commitment: Commitment, range: ValueRange) -> Self {
        Self {
            kind,
            commitment,
            range,
            nullifier: None,
            membership: None,
            destination: None,
        }
    }

    /// A new shielded output carrying a public `amount` to the shielded
    /// address `destination`.
    #[must_use]
    pub const fn shield(commitment: Commitment, amount: u64, destination: Destination) -> Self {
        Self {
            kind: StatementKind::Shield,
            commitment,
            range: ValueRange::exact(amount),
            nullifier: None,
            membership: None,
            destination: Some(destination),
        }
    }

    /// Spend `commitment` for a public `amount` paid to the public address
    /// `destination`.
    #[must_use]
    pub const fn unshield(
        commitment: Commitment,
        nullifier: Nullifier,
        amount: u64,
        membership: Membership,
        destination: Destination,
    ) -> Self {
        Self {
            kind: StatementKind::Unshield,
            commitment,
            range: ValueRange::exact(amount),
            nullifier: Some(nullifier),
            membership: Some(membership),
            destination: Some(destination),
        }
    }

    /// Spend `commitment` into the shielded `destination` without revealing
    /// its value.
    #[must_use]
    pub const fn private_transfer(
        commitment: Commitment,
        nullifier: Nullifier,
        membership: Membership,
        destination: Destination,
    ) -> Self {
        Self {
            kind: StatementKind::PrivateTransfer,
            commitment,
            range: ValueRange::any(),
            nullifier: Some(nullifier),
            membership: Some(membership),
            destination: Some(destination),
        }
    }

    /// Attach a nullifier.
    #[must_use]
    pub fn with_nullifier(mut self, nullifier: Nullifier) -> Self {
        self.nullifier = Some(nullifier);
        self
    }

    /// Bind a destination.
    #[must_use]
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Attach a membership claim.
    #[must_use]
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = Some(membership);
        self
    }

    /// Structural checks every backend applies before any cryptography:
    /// a non-empty range and a well-shaped membership path.
    pub fn check_shape(&self) -> Result<(), InvalidReason> {
        if self.range.is_empty() {
            return Err(InvalidReason::StatementMalformed);
        }
        if let Some(membership) = &self.membership {
            membership
                .path
                .root(&self.commitment)
                .ok_or(InvalidReason::StatementMalformed)?;
        }
        Ok(())
    }

    /// Whether the membership claim, if any, holds.
    pub(crate) fn membership_holds(&self) -> bool {
        self.membership
            .as_ref()
            .is_none_or(|membership| membership.path.leads_to(&self.commitment, &membership.anchor))
    }

    /// Canonical encoding, bound into every transcript.
    ///
    /// ```text
    /// kind u8 ‖ cm 32 ‖ min u64 ‖ max u64
    ///   ‖ 0x00 | 0x01 ‖ destination 32
    ///   ‖ 0x00 | 0x01 ‖ nf 32
    ///   ‖ 0x00 | 0x01 ‖ anchor 32 ‖ position u64 ‖ siblings 32·depth
    /// ```
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Writer::default();
        out.u8(self.kind.code())
            .bytes(&self.commitment.to_bytes())
            .u64(self.range.min)
            .u64(self.range.max);
        match &self.destination {
            Some(destination) => out.u8(1).bytes(destination.as_bytes()),
            None => out.u8(0),
        };
        match &self.nullifier {
            Some(nf) => out.u8(1).bytes(&nf.to_bytes()),
            None => out.u8(0),
        };
        match &self.membership {
            Some(membership) => {
                out.u8(1)
                    .bytes(membership.anchor.as_bytes())
                    .u64(membership.path.position());
                for sibling in membership.path.siblings() {
                    out.bytes(sibling);
                }
            }
            None => {
                out.u8(0);
            }
        }
        out.finish()
    }

    /// BLAKE2b-256 of [`canonical_bytes`](Self::canonical_bytes); names
    /// the statement in logs and envelope metadata.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let hash = blake2b_simd::Params::new()
            .hash_length(32)
            .personal(STATEMENT_DIGEST_PERSONALIZATION)
            .hash(&self.canonical_bytes());
        let mut digest = [0u8; 32];
        digest.copy_from_slice(hash.as_bytes());
        digest
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;
    use crate::{
        accumulator::{CommitmentAccumulator as _, MerkleAccumulator},
        keys::OwnerSecret,
        params::Params,
        value::Blinding,
    };

    fn commitment(seed: u64) -> Commitment {
        let mut rng = StdRng::seed_from_u64(seed);
        let owner = OwnerSecret::random(&mut rng);
        Commitment::commit(&Params::derive(), 9, &owner, &Blinding::random(&mut rng)).unwrap()
    }

    #[test]
    fn encoding_distinguishes_kinds_and_ranges() {
        let cm = commitment(30);
        let to = Destination::from([1u8; 32]);
        let shield = Statement::new(StatementKind::Shield, cm, ValueRange::exact(9));
        let bare = Statement::new(StatementKind::PrivateTransfer, cm, ValueRange::exact(9));
        let wider = Statement::new(StatementKind::Shield, cm, ValueRange::exact(10));
        assert_ne!(shield.canonical_bytes(), bare.canonical_bytes(), "kind is bound");
        assert_ne!(shield.canonical_bytes(), wider.canonical_bytes(), "range is bound");
        assert_eq!(shield.canonical_bytes().len(), 1 + 32 + 8 + 8 + 1 + 1 + 1, "no optional parts");
        assert_eq!(
            Statement::shield(cm, 9, to).canonical_bytes().len(),
            1 + 32 + 8 + 8 + 1 + 32 + 1 + 1,
            "destination flag and reference"
        );
    }

    #[test]
    fn encoding_binds_the_destination() {
        let cm = commitment(33);
        let alice = Statement::shield(cm, 9, Destination::from([1u8; 32]));
        let bob = Statement::shield(cm, 9, Destination::from([2u8; 32]));
        let nowhere = Statement::new(StatementKind::Shield, cm, ValueRange::exact(9));
        assert_ne!(alice.canonical_bytes(), bob.canonical_bytes(), "recipient is bound");
        assert_ne!(alice.canonical_bytes(), nowhere.canonical_bytes(), "presence is bound");
        assert_eq!(
            nowhere.with_destination(Destination::from([1u8; 32])),
            alice,
            "builder matches the constructor"
        );
    }

    #[test]
    fn digest_names_the_statement() {
        let cm = commitment(34);
        let to = Destination::from([5u8; 32]);
        let statement = Statement::shield(cm, 9, to);
        assert_eq!(statement.digest(), statement.clone().digest(), "deterministic");
        assert_ne!(statement.digest(), Statement::shield(cm, 8, to).digest(), "amount");
        assert_ne!(
            statement.digest(),
            Statement::shield(cm, 9, Destination::from([6u8; 32])).digest(),
            "destination"
        );
    }

    #[test]
    fn empty_range_is_malformed() {
        let statement = Statement::new(StatementKind::Shield, commitment(31), ValueRange::new(5, 4));
        assert_eq!(statement.check_shape(), Err(InvalidReason::StatementMalformed), "min > max");
    }

    #[test]
    fn membership_is_checked_against_the_anchor() {
        let cm = commitment(32);
        let mut acc = MerkleAccumulator::new();
        acc.insert(cm).unwrap();
        let path = acc.membership_proof(&cm).unwrap();

        let good = Statement::shield(cm, 9, Destination::from(cm)).with_membership(Membership {
            anchor: acc.root(),
            path: path.clone(),
        });
        assert!(good.check_shape().is_ok(), "well-shaped path");
        assert!(good.membership_holds(), "path leads to the anchor");

        let stale = Statement::shield(cm, 9, Destination::from(cm)).with_membership(Membership {
            anchor: Anchor::from([7u8; 32]),
            path: path.clone(),
        });
        assert!(!stale.membership_holds(), "path does not reach a foreign anchor");

        let truncated = Statement::shield(cm, 9, Destination::from(cm)).with_membership(Membership {
            anchor: acc.root(),
            path: MerklePath::new(0, path.siblings()[1..].to_vec()),
        });
        assert_eq!(truncated.check_shape(), Err(InvalidReason::StatementMalformed), "short path");
    }
}
