//! Proofs and the proof backend capability.
//!
//! A [`Proof`] is an opaque byte blob. What it means is up to the
//! [`ProofBackend`] that produced it; the envelope records which one
//! ([`BackendKind`]) so a verifier never feeds bytes to the wrong backend.
//!
//! ## Verification
//!
//! Verification is a pure function of `(proof, statement)`:
//!
//! 1. Check the statement's shape (non-empty range, well-formed path)
//! 2. Check the membership claim in the clear
//! 3. Decode the proof canonically
//! 4. Run the backend's cryptographic check
//!
//! It never reads the clock and never fails for adversarial bytes: every
//! rejection is an [`InvalidReason`].
//!
//! ## Proving
//!
//! The prover first checks that its [`Witness`] satisfies the statement and
//! reports a [`WitnessFault`](crate::error::WitnessFault) otherwise.

use core::{fmt, str::FromStr};
use std::{path::Path, sync::Arc};

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    error::ProofError, params::Params, sigma::SigmaBackend, statement::Statement, witness::Witness,
};

/// Opaque proof bytes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Proof(Vec<u8>);

impl Proof {
    /// The raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the proof carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Proof {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<Proof> for Vec<u8> {
    fn from(proof: Proof) -> Self {
        proof.0
    }
}

/// Why a proof was rejected on cryptographic or structural grounds.
///
/// Distinct from [`StaleReason`](crate::envelope::StaleReason): an invalid
/// proof is evidence of tampering or a bug, a stale one only needs to be
/// re-proven.
#[derive(Clone, Copy, Debug, Error, Eq, Hash, PartialEq)]
pub enum InvalidReason {
    /// The envelope or proof bytes do not decode canonically.
    #[error("malformed proof encoding")]
    Malformed,

    /// The envelope version is not understood.
    #[error("unsupported envelope version")]
    UnsupportedVersion,

    /// The envelope names a different backend than the verifier runs.
    #[error("proof produced by a different backend")]
    BackendMismatch,

    /// The statement itself is ill-formed.
    #[error("malformed statement")]
    StatementMalformed,

    /// The membership path does not lead to the claimed anchor.
    #[error("commitment is not a member under the anchor")]
    MembershipMismatch,

    /// The proof does not verify against the statement.
    #[error("proof rejected")]
    Rejected,
}

/// Selects the concrete proof system.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Pedersen commitments with Fiat-Shamir sigma proofs
    /// ([`SigmaBackend`]). Transparent setup.
    #[default]
    PedersenSigma,
}

impl BackendKind {
    /// One-byte wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::PedersenSigma => 1,
        }
    }

    /// Inverse of [`code`](Self::code).
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::PedersenSigma),
            _ => None,
        }
    }

    /// Configuration name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PedersenSigma => "pedersen_sigma",
        }
    }

    /// Initialize this backend.
    ///
    /// With a `setup_params_path` the generators are loaded from that file
    /// and a missing or corrupt file is [`ProofError::BackendUnavailable`].
    /// Without one they are derived by hash-to-curve.
    pub fn load(self, setup_params_path: Option<&Path>) -> Result<Arc<dyn ProofBackend>, ProofError> {
        let params = match setup_params_path {
            Some(path) => Params::load(path)?,
            None => Params::derive(),
        };
        info!(backend = self.name(), "proof backend ready");
        match self {
            Self::PedersenSigma => Ok(Arc::new(SigmaBackend::new(params))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "pedersen_sigma" => Ok(Self::PedersenSigma),
            other => Err(format!("unknown backend kind {other:?}")),
        }
    }
}

/// A proof system over shielded statements.
///
/// Implementations hold only immutable public parameters, so one instance
/// is shared behind an `Arc` by every prover and verifier thread.
pub trait ProofBackend: Send + Sync + fmt::Debug {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// The commitment generators this backend proves over.
    fn params(&self) -> &Params;

    /// Prove `statement` with `witness`.
    fn prove(
        &self,
        statement: &Statement,
        witness: &Witness,
        rng: &mut dyn CryptoRngCore,
    ) -> Result<Proof, ProofError>;

    /// Verify `proof` against `statement`. Total: never panics on
    /// adversarial input.
    fn verify(&self, proof: &Proof, statement: &Statement) -> Result<(), InvalidReason>;

    /// Boolean form of [`verify`](Self::verify).
    fn is_valid(&self, proof: &Proof, statement: &Statement) -> bool {
        self.verify(proof, statement).is_ok()
    }
}
