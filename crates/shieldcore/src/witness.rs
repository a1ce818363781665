//! Private prover inputs.

use core::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    commitment::Commitment,
    constants::MAX_VALUE,
    error::{ProofError, WitnessFault},
    keys::OwnerSecret,
    nullifier::Nullifier,
    params::Params,
    statement::Statement,
    value::Blinding,
};

/// An opening of a commitment: value, owner secret and blinding factor.
///
/// Lives only in the prover's memory. It has no serde impls, its `Debug`
/// prints nothing, and it is scrubbed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Witness {
    value: u64,
    owner: OwnerSecret,
    blinding: Blinding,
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Witness(..)")
    }
}

impl Witness {
    /// Bundle an opening.
    #[must_use]
    pub const fn new(value: u64, owner: OwnerSecret, blinding: Blinding) -> Self {
        Self {
            value,
            owner,
            blinding,
        }
    }

    pub(crate) const fn value(&self) -> u64 {
        self.value
    }

    pub(crate) const fn owner(&self) -> &OwnerSecret {
        &self.owner
    }

    pub(crate) const fn blinding(&self) -> &Blinding {
        &self.blinding
    }

    /// The commitment this witness opens.
    pub fn commitment(&self, params: &Params) -> Result<Commitment, ProofError> {
        Commitment::commit(params, self.value, &self.owner, &self.blinding)
    }

    /// The nullifier that spends `cm` under this witness's owner.
    #[must_use]
    pub fn nullifier(&self, cm: &Commitment) -> Nullifier {
        Nullifier::derive(cm, &self.owner)
    }

    /// Check that this witness satisfies `statement`.
    ///
    /// Run by every backend before proving so that a caller bug surfaces as
    /// a [`WitnessFault`] instead of a proof that fails to verify.
    pub fn satisfies(&self, params: &Params, statement: &Statement) -> Result<(), WitnessFault> {
        if statement.range.is_empty() {
            return Err(WitnessFault::EmptyRange);
        }
        if self.value > MAX_VALUE || !statement.range.contains(self.value) {
            return Err(WitnessFault::ValueOutOfRange);
        }
        let cm = self
            .commitment(params)
            .map_err(|_err| WitnessFault::ValueOutOfRange)?;
        if cm != statement.commitment {
            return Err(WitnessFault::CommitmentMismatch);
        }
        if statement
            .nullifier
            .is_some_and(|nf| nf != self.nullifier(&cm))
        {
            return Err(WitnessFault::NullifierMismatch);
        }
        if !statement.membership_holds() {
            return Err(WitnessFault::MembershipMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;
    use crate::{
        accumulator::{CommitmentAccumulator as _, MerkleAccumulator},
        primitives::Anchor,
        statement::{Membership, StatementKind},
        value::ValueRange,
    };

    fn witness(rng: &mut StdRng, value: u64) -> Witness {
        Witness::new(value, OwnerSecret::random(rng), Blinding::random(rng))
    }

    #[test]
    fn debug_is_redacted() {
        let mut rng = StdRng::seed_from_u64(40);
        assert_eq!(format!("{:?}", witness(&mut rng, 77)), "Witness(..)", "witness must not print");
    }

    #[test]
    fn faults_are_specific() {
        let mut rng = StdRng::seed_from_u64(41);
        let params = Params::derive();
        let wit = witness(&mut rng, 100);
        let cm = wit.commitment(&params).unwrap();
        let other = witness(&mut rng, 100).commitment(&params).unwrap();

        let check = |statement: &Statement| wit.satisfies(&params, statement);
        let kind = StatementKind::PrivateTransfer;

        assert_eq!(check(&Statement::new(kind, cm, ValueRange::new(0, 1000))), Ok(()), "ok");
        assert_eq!(
            check(&Statement::new(kind, cm, ValueRange::new(10, 0))),
            Err(WitnessFault::EmptyRange),
            "empty"
        );
        assert_eq!(
            check(&Statement::new(kind, cm, ValueRange::new(0, 10))),
            Err(WitnessFault::ValueOutOfRange),
            "too large"
        );
        assert_eq!(
            check(&Statement::new(StatementKind::Shield, other, ValueRange::exact(100))),
            Err(WitnessFault::CommitmentMismatch),
            "foreign commitment"
        );
        assert_eq!(
            check(
                &Statement::new(StatementKind::Shield, cm, ValueRange::exact(100))
                    .with_nullifier(Nullifier::derive(&other, wit.owner()))
            ),
            Err(WitnessFault::NullifierMismatch),
            "nullifier of another commitment"
        );

        let mut acc = MerkleAccumulator::new();
        acc.insert(cm).unwrap();
        let membership = Membership {
            anchor: Anchor::from([1u8; 32]),
            path: acc.membership_proof(&cm).unwrap(),
        };
        assert_eq!(
            check(
                &Statement::new(StatementKind::Shield, cm, ValueRange::exact(100))
                    .with_membership(membership)
            ),
            Err(WitnessFault::MembershipMismatch),
            "anchor not reached"
        );
    }
}
