//! Owner secrets.
//!
//! An owner holds a 32-byte [`OwnerSecret`]. Everything else is derived from
//! it:
//!
//! ```text
//!  sk ──PRF^expand([0x01])──▶ ask ∈ F_q
//!  ask ──▶ commitment term [ask]·K
//!  ask ──▶ nullifier nf = [ask]·H_nf(cm)
//! ```
//!
//! The raw secret never leaves this module; callers only see the derived
//! scalar inside the crate.

use core::fmt;

use ff::{Field as _, FromUniformBytes as _};
use pasta_curves::pallas;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::PrfExpand;

/// A raw owner secret: 32 bytes of entropy with full spend authority.
///
/// Matches the representation of a wallet spending key (raw bytes, not a
/// field element) so the full 256-bit key space is preserved. Scrubbed on
/// drop; `Debug` never prints the bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct OwnerSecret([u8; 32]);

impl From<[u8; 32]> for OwnerSecret {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for OwnerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OwnerSecret(..)")
    }
}

impl OwnerSecret {
    /// Sample a fresh owner secret.
    pub fn random(rng: &mut (impl RngCore + CryptoRng)) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derive $\mathsf{ask} = \text{ToScalar}(\text{PRF}^{\text{expand}}_{sk}([0\text{x}01]))$.
    ///
    /// BLAKE2b-512 output reduced into $\mathbb{F}_q$ via `from_uniform_bytes`.
    /// A zero scalar would make every nullifier the identity;
    /// it occurs with negligible probability and is mapped to one.
    #[must_use]
    pub(crate) fn authorizing_scalar(&self) -> pallas::Scalar {
        let ask = pallas::Scalar::from_uniform_bytes(&PrfExpand::ASK.with(&self.0));
        if bool::from(ask.is_zero()) {
            pallas::Scalar::ONE
        } else {
            ask
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let sk = OwnerSecret::from([0xabu8; 32]);
        assert_eq!(format!("{sk:?}"), "OwnerSecret(..)", "secret bytes must not print");
    }

    #[test]
    fn scalar_derivation_is_deterministic() {
        let lhs = OwnerSecret::from([0x42u8; 32]).authorizing_scalar();
        let rhs = OwnerSecret::from([0x42u8; 32]).authorizing_scalar();
        let other = OwnerSecret::from([0x24u8; 32]).authorizing_scalar();
        assert_eq!(lhs, rhs, "same secret, same scalar");
        assert_ne!(lhs, other, "different secret, different scalar");
    }
}
