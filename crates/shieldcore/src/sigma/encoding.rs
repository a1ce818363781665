//! Canonical proof bytes.
//!
//! ```text
//! c ‖ z_ask ‖ z_t ‖ z_u ‖ n:u8 ‖ n × (B ‖ c0 ‖ z0 ‖ z1) ‖ n × (B' ‖ c0 ‖ z0 ‖ z1)
//! ```

use pasta_curves::pallas;

use super::range::BitProof;
use crate::primitives::codec::{Reader, Writer};

const SCALAR_LEN: usize = 32;
const BIT_PROOF_LEN: usize = 4 * SCALAR_LEN;

/// Largest bit count a range over `u64` can need.
const MAX_BITS: u8 = 64;

/// A decoded sigma proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct SigmaProof {
    pub(super) challenge: pallas::Scalar,
    pub(super) z_ask: pallas::Scalar,
    pub(super) z_t: pallas::Scalar,
    pub(super) z_u: pallas::Scalar,
    pub(super) bits: u8,
    /// Bits of $d = v - \text{min}$.
    pub(super) value_bits: Vec<BitProof>,
    /// Bits of $d + \text{offset}$.
    pub(super) lifted_bits: Vec<BitProof>,
}

impl SigmaProof {
    pub(super) fn to_bytes(&self) -> Vec<u8> {
        let bit_count = usize::from(self.bits);
        let mut out = Writer::with_capacity(4 * SCALAR_LEN + 1 + 2 * bit_count * BIT_PROOF_LEN);
        out.scalar(&self.challenge)
            .scalar(&self.z_ask)
            .scalar(&self.z_t)
            .scalar(&self.z_u)
            .u8(self.bits);
        for bit in self.value_bits.iter().chain(&self.lifted_bits) {
            out.point(&bit.commitment)
                .scalar(&bit.c0)
                .scalar(&bit.z0)
                .scalar(&bit.z1);
        }
        out.finish()
    }

    /// Strict decoding: `None` on any non-canonical field, off-curve point,
    /// oversized bit count, or trailing byte.
    pub(super) fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut rd = Reader::new(bytes);
        let challenge = rd.scalar()?;
        let z_ask = rd.scalar()?;
        let z_t = rd.scalar()?;
        let z_u = rd.scalar()?;
        let bits = rd.u8()?;
        if bits > MAX_BITS {
            return None;
        }
        let value_bits = read_bits(&mut rd, bits)?;
        let lifted_bits = read_bits(&mut rd, bits)?;
        rd.finish()?;
        Some(Self {
            challenge,
            z_ask,
            z_t,
            z_u,
            bits,
            value_bits,
            lifted_bits,
        })
    }
}

fn read_bits(rd: &mut Reader<'_>, bits: u8) -> Option<Vec<BitProof>> {
    (0..bits)
        .map(|_| {
            Some(BitProof {
                commitment: rd.point()?,
                c0: rd.scalar()?,
                z0: rd.scalar()?,
                z1: rd.scalar()?,
            })
        })
        .collect()
}
