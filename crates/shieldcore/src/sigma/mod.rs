//! Pedersen commitments with Fiat-Shamir sigma proofs.
//!
//! ## Relation
//!
//! For a statement $(\mathsf{cm}, [\text{min}, \text{max}], \mathsf{nf}?)$
//! the prover shows knowledge of $(v, \mathsf{ask}, r)$ with
//!
//! $$\mathsf{cm} = [v]\,\mathcal{V} + [\mathsf{ask}]\,\mathcal{K} + [r]\,\mathcal{R}
//! \qquad \mathsf{nf} = [\mathsf{ask}]\,H_{nf}(\mathsf{cm})
//! \qquad \text{min} \le v \le \text{max}$$
//!
//! ## Range
//!
//! Let $w = \text{max} - \text{min}$, $n$ the bit length of $w$ and
//! $\text{offset} = 2^n - 1 - w$. The prover decomposes $d = v - \text{min}$
//! and $e = d + \text{offset}$ into $n$ committed bits each
//! ([`range`]). Both lying in $[0, 2^n)$ pins $d$ to $[0, w]$.
//!
//! With $B = \sum 2^i B_i$ and $B' = \sum 2^i B'_i$ the verifier forms
//!
//! | Point | Equals | Proven with |
//! | ----- | ------ | ----------- |
//! | $Q = \mathsf{cm} - [\text{min}]\,\mathcal{V} - B$ | $[\mathsf{ask}]\,\mathcal{K} + [t]\,\mathcal{R}$ | $(z_{ask}, z_t)$ |
//! | $\mathsf{nf}$ | $[\mathsf{ask}]\,H_{nf}(\mathsf{cm})$ | $z_{ask}$ (shared) |
//! | $Q' = B + [\text{offset}]\,\mathcal{V} - B'$ | $[u]\,\mathcal{R}$ | $z_u$ |
//!
//! Sharing $z_{ask}$ between the first two rows is what links the
//! nullifier to the commitment's owner. The destination takes no part in
//! the relation; the transcript binds it.
//!
//! ## Challenge
//!
//! One BLAKE2b-512 challenge covers every sub-proof: the transcript absorbs
//! the parameter digest, the canonical statement, all bit commitments and
//! all first moves.
//!
//! Membership is not part of the relation: the commitment is public, so
//! the verifier walks the Merkle path itself.

mod encoding;
mod range;
mod transcript;

use ff::Field as _;
use pasta_curves::pallas;
use rand_core::CryptoRngCore;
use tracing::debug;

use self::{
    encoding::SigmaProof,
    range::{BitDecomposition, BitProof, weighted_sum},
    transcript::Transcript,
};
use crate::{
    error::{ProofError, WitnessFault},
    nullifier::nullifier_base,
    params::Params,
    proof::{BackendKind, InvalidReason, Proof, ProofBackend},
    statement::Statement,
    witness::Witness,
};

/// The Pedersen/sigma proof backend.
#[derive(Clone, Debug)]
pub struct SigmaBackend {
    params: Params,
}

impl SigmaBackend {
    /// A backend over `params`.
    #[must_use]
    pub const fn new(params: Params) -> Self {
        Self { params }
    }
}

/// Range shape shared by prover and verifier: $(n, \text{offset})$.
fn range_shape(statement: &Statement) -> Option<(u8, u64)> {
    let bits = u8::try_from(statement.range.bits()?).ok()?;
    Some((bits, statement.range.offset()?))
}

/// Points the outer proof speaks about: $(Q, Q')$.
fn linked_points<'pts>(
    params: &Params,
    statement: &Statement,
    offset: u64,
    value_bits: impl DoubleEndedIterator<Item = &'pts pallas::Point>,
    lifted_bits: impl DoubleEndedIterator<Item = &'pts pallas::Point>,
) -> (pallas::Point, pallas::Point) {
    let value_sum = weighted_sum(value_bits);
    let lifted_sum = weighted_sum(lifted_bits);
    let owner_part = *statement.commitment.point()
        - *params.value_base() * pallas::Scalar::from(statement.range.min)
        - value_sum;
    let lifted_gap = value_sum + *params.value_base() * pallas::Scalar::from(offset) - lifted_sum;
    (owner_part, lifted_gap)
}

impl ProofBackend for SigmaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::PedersenSigma
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn prove(
        &self,
        statement: &Statement,
        witness: &Witness,
        rng: &mut dyn CryptoRngCore,
    ) -> Result<Proof, ProofError> {
        witness.satisfies(&self.params, statement)?;
        let (bits, offset) = range_shape(statement).ok_or(WitnessFault::EmptyRange)?;
        let delta = witness
            .value()
            .checked_sub(statement.range.min)
            .ok_or(WitnessFault::ValueOutOfRange)?;
        let lifted = delta
            .checked_add(offset)
            .ok_or(WitnessFault::ValueOutOfRange)?;

        let value_bits = BitDecomposition::commit(&self.params, delta, bits, rng);
        let lifted_bits = BitDecomposition::commit(&self.params, lifted, bits, rng);

        let ask = witness.owner().authorizing_scalar();
        let owner_blind = witness.blinding().scalar() - value_bits.blind_sum();
        let lifted_blind = value_bits.blind_sum() - lifted_bits.blind_sum();

        let k_ask = pallas::Scalar::random(&mut *rng);
        let k_t = pallas::Scalar::random(&mut *rng);
        let k_u = pallas::Scalar::random(&mut *rng);

        let a_owner = *self.params.owner_base() * k_ask + *self.params.blinding_base() * k_t;
        let a_nullifier = statement
            .nullifier
            .map(|_| nullifier_base(&statement.commitment) * k_ask);
        let a_lifted = *self.params.blinding_base() * k_u;

        let mut transcript = Transcript::new(&self.params, statement);
        transcript
            .points(value_bits.commitments())
            .points(lifted_bits.commitments())
            .point(&a_owner)
            .points(a_nullifier.iter())
            .point(&a_lifted)
            .points(value_bits.first_moves())
            .points(lifted_bits.first_moves());
        let challenge = transcript.challenge();

        let proof = SigmaProof {
            challenge,
            z_ask: k_ask + challenge * ask,
            z_t: k_t + challenge * owner_blind,
            z_u: k_u + challenge * lifted_blind,
            bits,
            value_bits: value_bits.respond(&challenge),
            lifted_bits: lifted_bits.respond(&challenge),
        };
        let bytes = proof.to_bytes();
        debug!(
            kind = ?statement.kind,
            bits,
            proof_len = bytes.len(),
            "sigma proof generated"
        );
        Ok(Proof::from(bytes))
    }

    fn verify(&self, proof: &Proof, statement: &Statement) -> Result<(), InvalidReason> {
        statement.check_shape()?;
        if !statement.membership_holds() {
            return Err(InvalidReason::MembershipMismatch);
        }
        let decoded = SigmaProof::from_bytes(proof.as_bytes()).ok_or(InvalidReason::Malformed)?;
        let (bits, offset) = range_shape(statement).ok_or(InvalidReason::StatementMalformed)?;
        if decoded.bits != bits {
            return Err(InvalidReason::Rejected);
        }

        let challenge = decoded.challenge;
        let commitments = |proofs: &[BitProof]| -> Vec<pallas::Point> {
            proofs.iter().map(|bit| bit.commitment).collect()
        };
        let value_commitments = commitments(&decoded.value_bits);
        let lifted_commitments = commitments(&decoded.lifted_bits);
        let (owner_part, lifted_gap) = linked_points(
            &self.params,
            statement,
            offset,
            value_commitments.iter(),
            lifted_commitments.iter(),
        );

        let a_owner = *self.params.owner_base() * decoded.z_ask
            + *self.params.blinding_base() * decoded.z_t
            - owner_part * challenge;
        let a_nullifier = statement.nullifier.map(|nf| {
            nullifier_base(&statement.commitment) * decoded.z_ask - *nf.point() * challenge
        });
        let a_lifted = *self.params.blinding_base() * decoded.z_u - lifted_gap * challenge;
        let first_moves = |proofs: &[BitProof]| -> Vec<pallas::Point> {
            proofs
                .iter()
                .flat_map(|bit| bit.first_moves(&self.params, &challenge))
                .collect()
        };

        let mut transcript = Transcript::new(&self.params, statement);
        transcript
            .points(&value_commitments)
            .points(&lifted_commitments)
            .point(&a_owner)
            .points(a_nullifier.iter())
            .point(&a_lifted)
            .points(&first_moves(&decoded.value_bits))
            .points(&first_moves(&decoded.lifted_bits));

        if transcript.challenge() == challenge {
            Ok(())
        } else {
            Err(InvalidReason::Rejected)
        }
    }
}
