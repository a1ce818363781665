//! Fiat-Shamir transcript.

use ff::FromUniformBytes as _;
use pasta_curves::{group::GroupEncoding as _, pallas};

use crate::{constants::TRANSCRIPT_PERSONALIZATION, params::Params, statement::Statement};

/// BLAKE2b-512 sponge over the public parameters, the statement and every
/// prover message, in that order.
pub(super) struct Transcript(blake2b_simd::State);

impl Transcript {
    pub(super) fn new(params: &Params, statement: &Statement) -> Self {
        let encoded = statement.canonical_bytes();
        let mut state = blake2b_simd::Params::new()
            .hash_length(64)
            .personal(TRANSCRIPT_PERSONALIZATION)
            .to_state();
        state
            .update(&params.digest())
            .update(&u64::try_from(encoded.len()).unwrap_or(u64::MAX).to_le_bytes())
            .update(&encoded);
        Self(state)
    }

    pub(super) fn point(&mut self, point: &pallas::Point) -> &mut Self {
        self.0.update(&point.to_bytes());
        self
    }

    pub(super) fn points<'pts>(
        &mut self,
        points: impl IntoIterator<Item = &'pts pallas::Point>,
    ) -> &mut Self {
        for point in points {
            self.point(point);
        }
        self
    }

    /// Squeeze the challenge $c \in \mathbb{F}_q$.
    pub(super) fn challenge(&self) -> pallas::Scalar {
        pallas::Scalar::from_uniform_bytes(self.0.finalize().as_array())
    }
}

#[cfg(test)]
mod tests {
    use pasta_curves::group::Group as _;
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;
    use crate::{
        commitment::Commitment, keys::OwnerSecret, statement::Destination, value::Blinding,
    };

    #[test]
    fn challenge_binds_statement_and_messages() {
        let mut rng = StdRng::seed_from_u64(50);
        let params = Params::derive();
        let owner = OwnerSecret::random(&mut rng);
        let cm = Commitment::commit(&params, 3, &owner, &Blinding::random(&mut rng)).unwrap();
        let msg = pallas::Point::random(&mut rng);

        let to = Destination::from(cm);
        let mut base = Transcript::new(&params, &Statement::shield(cm, 3, to));
        let mut other_statement = Transcript::new(&params, &Statement::shield(cm, 4, to));
        let mut other_message = Transcript::new(&params, &Statement::shield(cm, 3, to));
        base.point(&msg);
        other_statement.point(&msg);
        other_message.point(&pallas::Point::generator());

        assert_ne!(base.challenge(), other_statement.challenge(), "statement is absorbed");
        assert_ne!(base.challenge(), other_message.challenge(), "messages are absorbed");
        assert_eq!(base.challenge(), base.challenge(), "squeezing does not consume");
    }
}
