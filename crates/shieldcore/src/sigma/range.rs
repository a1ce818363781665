//! Bit-decomposition range argument.
//!
//! To show $0 \le x < 2^n$ for a committed $x$, the prover commits to each
//! bit separately,
//!
//! $$B_i = [x_i]\,\mathcal{V} + [s_i]\,\mathcal{R}$$
//!
//! and proves for every $B_i$ that it opens to 0 **or** 1 with a
//! Cramer-Damgård-Schoenmakers OR-proof: knowledge of $s_i$ such that either
//! $B_i = [s_i]\,\mathcal{R}$ or $B_i - \mathcal{V} = [s_i]\,\mathcal{R}$.
//! The weighted sum $\sum 2^i B_i$ is then a commitment to $x$ under the
//! blinding $s = \sum 2^i s_i$, which the outer sigma protocol links to the
//! value commitment.
//!
//! Each OR-proof is two Schnorr transcripts over base $\mathcal{R}$ whose
//! challenges sum to the global challenge $c$. The branch the prover cannot
//! answer is simulated by choosing its challenge and response first.

use bitvec::{order::Lsb0, view::BitView as _};
use ff::Field as _;
use pasta_curves::{group::Group as _, pallas};
use rand_core::CryptoRngCore;

use crate::params::Params;

/// One bit's public commitment and OR-proof responses.
///
/// $c_1 = c - c_0$ is implied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct BitProof {
    pub(super) commitment: pallas::Point,
    pub(super) c0: pallas::Scalar,
    pub(super) z0: pallas::Scalar,
    pub(super) z1: pallas::Scalar,
}

impl BitProof {
    /// Recompute the first-move commitments $(A_0, A_1)$ a verifier absorbs.
    pub(super) fn first_moves(&self, params: &Params, challenge: &pallas::Scalar) -> [pallas::Point; 2] {
        let base = params.blinding_base();
        let c1 = *challenge - self.c0;
        let when_one = self.commitment - params.value_base();
        [
            *base * self.z0 - self.commitment * self.c0,
            *base * self.z1 - when_one * c1,
        ]
    }
}

/// Prover state for one committed bit between the first move and the
/// response.
#[derive(Debug)]
struct BitProver {
    bit: bool,
    blind: pallas::Scalar,
    commitment: pallas::Point,
    nonce: pallas::Scalar,
    simulated_challenge: pallas::Scalar,
    simulated_response: pallas::Scalar,
    first_moves: [pallas::Point; 2],
}

impl BitProver {
    fn new(params: &Params, bit: bool, rng: &mut dyn CryptoRngCore) -> Self {
        let base = params.blinding_base();
        let blind = pallas::Scalar::random(&mut *rng);
        let commitment = if bit {
            *params.value_base() + *base * blind
        } else {
            *base * blind
        };

        let nonce = pallas::Scalar::random(&mut *rng);
        let simulated_challenge = pallas::Scalar::random(&mut *rng);
        let simulated_response = pallas::Scalar::random(&mut *rng);
        let real = *base * nonce;
        let first_moves = if bit {
            // Simulate the zero branch: P0 = B.
            [*base * simulated_response - commitment * simulated_challenge, real]
        } else {
            // Simulate the one branch: P1 = B - V.
            let when_one = commitment - params.value_base();
            [real, *base * simulated_response - when_one * simulated_challenge]
        };

        Self {
            bit,
            blind,
            commitment,
            nonce,
            simulated_challenge,
            simulated_response,
            first_moves,
        }
    }

    fn respond(&self, challenge: &pallas::Scalar) -> BitProof {
        let (c0, z0, z1) = if self.bit {
            let c1 = *challenge - self.simulated_challenge;
            (
                self.simulated_challenge,
                self.simulated_response,
                self.nonce + c1 * self.blind,
            )
        } else {
            let c0 = *challenge - self.simulated_challenge;
            (c0, self.nonce + c0 * self.blind, self.simulated_response)
        };
        BitProof {
            commitment: self.commitment,
            c0,
            z0,
            z1,
        }
    }
}

/// Bit commitments to the low `bits` bits of a value, with their prover
/// state.
#[derive(Debug)]
pub(super) struct BitDecomposition {
    provers: Vec<BitProver>,
}

impl BitDecomposition {
    /// Commit to each of the low `bits` bits of `value`, least significant
    /// first.
    pub(super) fn commit(params: &Params, value: u64, bits: u8, rng: &mut dyn CryptoRngCore) -> Self {
        let provers = value
            .view_bits::<Lsb0>()
            .iter()
            .by_vals()
            .take(usize::from(bits))
            .map(|bit| BitProver::new(params, bit, &mut *rng))
            .collect();
        Self { provers }
    }

    /// The bit commitments $B_i$.
    pub(super) fn commitments(&self) -> impl DoubleEndedIterator<Item = &pallas::Point> {
        self.provers.iter().map(|prover| &prover.commitment)
    }

    /// The first moves $(A_{i,0}, A_{i,1})$, bit by bit.
    pub(super) fn first_moves(&self) -> impl Iterator<Item = &pallas::Point> {
        self.provers.iter().flat_map(|prover| prover.first_moves.iter())
    }

    /// $s = \sum 2^i s_i$, the blinding of $\sum 2^i B_i$.
    pub(super) fn blind_sum(&self) -> pallas::Scalar {
        self.provers
            .iter()
            .rev()
            .fold(pallas::Scalar::ZERO, |acc, prover| acc.double() + prover.blind)
    }

    pub(super) fn respond(&self, challenge: &pallas::Scalar) -> Vec<BitProof> {
        self.provers.iter().map(|prover| prover.respond(challenge)).collect()
    }
}

/// $\sum 2^i P_i$ by Horner's rule.
pub(super) fn weighted_sum<'pts>(
    points: impl DoubleEndedIterator<Item = &'pts pallas::Point>,
) -> pallas::Point {
    points.rev().fold(pallas::Point::identity(), |acc, point| acc.double() + point)
}
