//! Public parameters: the commitment generators.
//!
//! Three independent Pallas generators are derived by hash-to-curve, so no
//! party knows a discrete-log relation between them and no trusted setup is
//! needed:
//!
//! | Generator | Message | Role |
//! | --------- | ------- | ---- |
//! | $\mathcal{V}$ | `"V"` | value |
//! | $\mathcal{K}$ | `"K"` | owner scalar $\mathsf{ask}$ |
//! | $\mathcal{R}$ | `"R"` | blinding factor $r$ |
//!
//! Parameters are loaded once at process start and shared immutably by
//! every prover and verifier. They can be persisted to a setup file so that
//! deployments pin the exact generators they verify against.
//!
//! ## Setup file layout
//!
//! ```text
//! magic "SHPARAMS" (8) ‖ version u8 ‖ V (32) ‖ K (32) ‖ R (32)
//! ```

use std::{fs, io, path::Path};

use pasta_curves::{
    arithmetic::CurveExt as _,
    group::{Group as _, GroupEncoding as _},
    pallas,
};
use tracing::info;

use crate::{
    constants::{GENERATOR_DOMAIN, PARAMS_DIGEST_PERSONALIZATION},
    error::ProofError,
    primitives::codec::{Reader, Writer},
};

const MAGIC: &[u8; 8] = b"SHPARAMS";
const FILE_VERSION: u8 = 1;
const FILE_LEN: usize = 8 + 1 + 3 * 32;

/// The commitment generators $(\mathcal{V}, \mathcal{K}, \mathcal{R})$.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    value_base: pallas::Point,
    owner_base: pallas::Point,
    blinding_base: pallas::Point,
}

impl Params {
    /// Derive the canonical generators from [`GENERATOR_DOMAIN`].
    #[must_use]
    pub fn derive() -> Self {
        let hasher = pallas::Point::hash_to_curve(GENERATOR_DOMAIN);
        Self {
            value_base: hasher(b"V".as_slice()),
            owner_base: hasher(b"K".as_slice()),
            blinding_base: hasher(b"R".as_slice()),
        }
    }

    /// $\mathcal{V}$.
    #[must_use]
    pub const fn value_base(&self) -> &pallas::Point {
        &self.value_base
    }

    /// $\mathcal{K}$.
    #[must_use]
    pub const fn owner_base(&self) -> &pallas::Point {
        &self.owner_base
    }

    /// $\mathcal{R}$.
    #[must_use]
    pub const fn blinding_base(&self) -> &pallas::Point {
        &self.blinding_base
    }

    /// BLAKE2b-256 digest of the generators, bound into every transcript so
    /// that proofs never verify under different parameters.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let hash = blake2b_simd::Params::new()
            .hash_length(32)
            .personal(PARAMS_DIGEST_PERSONALIZATION)
            .to_state()
            .update(&self.value_base.to_bytes())
            .update(&self.owner_base.to_bytes())
            .update(&self.blinding_base.to_bytes())
            .finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(hash.as_bytes());
        out
    }

    /// Encode as a setup file.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Writer::with_capacity(FILE_LEN);
        out.bytes(MAGIC)
            .u8(FILE_VERSION)
            .point(&self.value_base)
            .point(&self.owner_base)
            .point(&self.blinding_base);
        out.finish()
    }

    /// Decode a setup file.
    ///
    /// Rejects a wrong magic or version, off-curve or identity generators,
    /// and repeated generators.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        let unavailable = |why: &str| ProofError::BackendUnavailable(format!("setup parameters {why}"));

        let mut rd = Reader::new(bytes);
        if rd.array::<8>().as_ref() != Some(MAGIC) {
            return Err(unavailable("have a bad magic"));
        }
        if rd.u8() != Some(FILE_VERSION) {
            return Err(unavailable("have an unsupported version"));
        }
        let (Some(value_base), Some(owner_base), Some(blinding_base), Some(())) =
            (rd.point(), rd.point(), rd.point(), rd.finish())
        else {
            return Err(unavailable("are truncated or not on the curve"));
        };

        let generators = [value_base, owner_base, blinding_base];
        if generators.iter().any(|gen_pt| bool::from(gen_pt.is_identity())) {
            return Err(unavailable("contain the identity"));
        }
        if value_base == owner_base || value_base == blinding_base || owner_base == blinding_base {
            return Err(unavailable("repeat a generator"));
        }

        Ok(Self {
            value_base,
            owner_base,
            blinding_base,
        })
    }

    /// Load parameters from a setup file.
    pub fn load(path: &Path) -> Result<Self, ProofError> {
        let bytes = fs::read(path).map_err(|err| {
            ProofError::BackendUnavailable(format!(
                "cannot read setup parameters {}: {err}",
                path.display()
            ))
        })?;
        let params = Self::from_bytes(&bytes)?;
        info!(path = %path.display(), "loaded setup parameters");
        Ok(params)
    }

    /// Write parameters to a setup file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.to_bytes())
    }
}
