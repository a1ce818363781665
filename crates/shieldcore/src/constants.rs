//! Domain separators, personalizations, and protocol bounds.
//!
//! All BLAKE2b personalizations are exactly 16 bytes (the BLAKE2b
//! personal field width). Hash-to-curve domains use variable-length
//! strings under the `shieldcore:` namespace.

/// BLAKE2b-512 personalization for `PRF^expand`: key expansion from a raw
/// owner secret to child scalars.
pub const PRF_EXPAND_PERSONALIZATION: &[u8; 16] = b"Shield_ExpandSed";

/// BLAKE2b-512 personalization for the Fiat-Shamir transcript of the
/// sigma backend.
pub const TRANSCRIPT_PERSONALIZATION: &[u8; 16] = b"Shield-SigmaProf";

/// BLAKE2b-256 personalization for accumulator leaves.
pub const MERKLE_LEAF_PERSONALIZATION: &[u8; 16] = b"Shield-MerkleLea";

/// BLAKE2b-256 personalization for accumulator interior nodes.
pub const MERKLE_NODE_PERSONALIZATION: &[u8; 16] = b"Shield-MerkleNod";

/// BLAKE2b-256 personalization for envelope digests (proof metadata).
pub const ENVELOPE_DIGEST_PERSONALIZATION: &[u8; 16] = b"Shield-EnvDigest";

/// BLAKE2b-256 personalization for statement digests (proof metadata).
pub const STATEMENT_DIGEST_PERSONALIZATION: &[u8; 16] = b"Shield-StmtDiges";

/// BLAKE2b-256 personalization for the public parameter digest bound into
/// every transcript.
pub const PARAMS_DIGEST_PERSONALIZATION: &[u8; 16] = b"Shield-ParamsDig";

/// Hash-to-curve domain for the commitment generators `V`, `K`, `R`.
pub const GENERATOR_DOMAIN: &str = "shieldcore:generators";

/// Hash-to-curve domain for the nullifier base $H_{nf}(\mathsf{cm})$.
pub const NULLIFIER_DOMAIN: &str = "shieldcore:nullifier";

/// Maximum committed value.
///
/// Values are committed as scalars; bounding them far below the group order
/// rules out wrap-around openings.
pub const MAX_VALUE: u64 = i64::MAX.unsigned_abs();

/// Depth of the reference commitment accumulator.
pub const MERKLE_DEPTH: u8 = 32;

/// Default freshness window: 24 hours in milliseconds.
pub const DEFAULT_FRESHNESS_WINDOW_MS: u64 = 86_400_000;

/// Domain-separated key expansion from an owner secret.
///
/// `PRF^expand_sk(t) = BLAKE2b-512("Shield_ExpandSed", sk || t)`
#[derive(Clone, Copy, Debug)]
pub(crate) struct PrfExpand {
    domain_separator: u8,
}

impl PrfExpand {
    /// `[0x01]` -> `ask` (owner authorizing scalar)
    pub(crate) const ASK: Self = Self {
        domain_separator: 0x01,
    };

    /// Evaluate the PRF: `BLAKE2b-512("Shield_ExpandSed", sk || domain_sep)`.
    ///
    /// Returns 64 bytes suitable for unbiased reduction into either field
    /// via `FromUniformBytes`.
    pub(crate) fn with(self, sk: &[u8; 32]) -> [u8; 64] {
        *blake2b_simd::Params::new()
            .hash_length(64)
            .personal(PRF_EXPAND_PERSONALIZATION)
            .to_state()
            .update(sk)
            .update(&[self.domain_separator])
            .finalize()
            .as_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Expansion must be keyed: different secrets, different outputs.
    #[test]
    fn prf_expand_depends_on_secret() {
        let lhs = PrfExpand::ASK.with(&[0x42u8; 32]);
        let rhs = PrfExpand::ASK.with(&[0x43u8; 32]);
        assert_ne!(lhs, rhs, "distinct secrets must expand differently");
    }

    #[test]
    fn personalizations_are_distinct() {
        let all = [
            PRF_EXPAND_PERSONALIZATION,
            TRANSCRIPT_PERSONALIZATION,
            MERKLE_LEAF_PERSONALIZATION,
            MERKLE_NODE_PERSONALIZATION,
            ENVELOPE_DIGEST_PERSONALIZATION,
            STATEMENT_DIGEST_PERSONALIZATION,
            PARAMS_DIGEST_PERSONALIZATION,
        ];
        for (idx, lhs) in all.iter().enumerate() {
            for rhs in all.iter().skip(idx + 1) {
                assert_ne!(lhs, rhs, "personalizations must not collide");
            }
        }
    }
}
