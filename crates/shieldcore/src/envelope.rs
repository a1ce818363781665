//! Proof envelopes and the freshness policy.
//!
//! An [`Envelope`] stamps a [`Proof`] with the backend that produced it and
//! the time it was produced. Verification of an envelope runs in three
//! stages and stops at the first failure:
//!
//! 1. **Freshness**: the timestamp must lie within the verifier's window and
//!    not in the future ([`StaleReason`])
//! 2. **Backend**: the envelope must name the backend doing the verifying
//! 3. **Proof**: the backend's cryptographic check ([`InvalidReason`])
//!
//! The outcome is a [`Verdict`]. Stale and invalid are kept apart: a stale
//! proof only needs re-proving, an invalid one is evidence of tampering.
//!
//! ## Wire format
//!
//! ```text
//! version u8 ‖ backend u8 ‖ timestamp u64 (ms since epoch) ‖ len u32 ‖ proof
//! ```
//!
//! The freshness window is verifier policy and is not carried on the wire.
//! A proof whose length does not fit the `u32` prefix cannot be encoded.

use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{
    constants::{DEFAULT_FRESHNESS_WINDOW_MS, ENVELOPE_DIGEST_PERSONALIZATION},
    error::ProofError,
    primitives::codec::{Reader, Writer},
    proof::{BackendKind, InvalidReason, Proof, ProofBackend},
    statement::Statement,
};

/// Current envelope encoding version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// A timestamp `millis` after the epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// The wall clock. Saturates instead of failing for clocks before the
    /// epoch or after year 584 million.
    #[must_use]
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Why an envelope fell outside the freshness window.
#[derive(Clone, Copy, Debug, Error, Eq, Hash, PartialEq)]
pub enum StaleReason {
    /// Older than the window allows.
    #[error("proof expired {age_ms} ms after creation")]
    Expired {
        /// `now - timestamp`.
        age_ms: u64,
    },

    /// Timestamped after `now`.
    #[error("proof is dated {ahead_ms} ms in the future")]
    FutureDated {
        /// `timestamp - now`.
        ahead_ms: u64,
    },
}

/// How old an envelope may be.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct FreshnessPolicy {
    window_ms: u64,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW_MS)
    }
}

impl FreshnessPolicy {
    /// Accept envelopes at most `window_ms` old.
    #[must_use]
    pub const fn new(window_ms: u64) -> Self {
        Self { window_ms }
    }

    /// The window in milliseconds.
    #[must_use]
    pub const fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Fresh iff `timestamp <= now` and `now - timestamp <= window`.
    pub const fn check(&self, timestamp: Timestamp, now: Timestamp) -> Result<(), StaleReason> {
        match now.0.checked_sub(timestamp.0) {
            None => Err(StaleReason::FutureDated {
                ahead_ms: timestamp.0 - now.0,
            }),
            Some(age_ms) if age_ms > self.window_ms => Err(StaleReason::Expired { age_ms }),
            Some(_) => Ok(()),
        }
    }
}

/// Terminal outcome of verifying an envelope.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Verdict {
    /// Fresh, and the proof verifies.
    Valid,
    /// Fresh, but the proof does not verify.
    Invalid(InvalidReason),
    /// Outside the freshness window; the proof was not checked.
    Stale(StaleReason),
}

impl Verdict {
    /// Whether this is [`Verdict::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A proof stamped with its backend and creation time.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Envelope {
    backend: BackendKind,
    timestamp: Timestamp,
    proof: Proof,
}

/// Summary of an envelope for logs and APIs. Carries no proof bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct EnvelopeMetadata {
    /// BLAKE2b-256 over the envelope fields, the proof length widened to
    /// `u64`.
    pub digest: [u8; 32],
    /// [`Statement::digest`] of the statement the envelope is checked
    /// against.
    pub statement_digest: [u8; 32],
    /// Creation time.
    pub created: Timestamp,
    /// Milliseconds since creation, zero for future-dated envelopes.
    pub age_ms: u64,
    /// Producing backend.
    pub backend: BackendKind,
    /// Proof length in bytes.
    pub proof_len: usize,
}

impl Envelope {
    /// Stamp `proof` from `backend` with `now`.
    #[must_use]
    pub const fn wrap(proof: Proof, backend: BackendKind, now: Timestamp) -> Self {
        Self {
            backend,
            timestamp: now,
            proof,
        }
    }

    /// The producing backend.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Creation time.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The wrapped proof.
    #[must_use]
    pub const fn proof(&self) -> &Proof {
        &self.proof
    }

    /// Freshness of this envelope at `now` under `policy`.
    pub const fn check_freshness(
        &self,
        now: Timestamp,
        policy: &FreshnessPolicy,
    ) -> Result<(), StaleReason> {
        policy.check(self.timestamp, now)
    }

    /// Boolean form of [`check_freshness`](Self::check_freshness).
    #[must_use]
    pub const fn is_fresh(&self, now: Timestamp, policy: &FreshnessPolicy) -> bool {
        self.check_freshness(now, policy).is_ok()
    }

    /// Verify against `statement` with `backend`, consuming the envelope.
    #[must_use]
    pub fn verify(
        self,
        backend: &dyn ProofBackend,
        statement: &Statement,
        policy: &FreshnessPolicy,
        now: Timestamp,
    ) -> Verdict {
        if let Err(reason) = self.check_freshness(now, policy) {
            warn!(%reason, timestamp = self.timestamp.0, "stale proof envelope");
            return Verdict::Stale(reason);
        }
        if self.backend != backend.kind() {
            warn!(
                envelope = %self.backend,
                verifier = %backend.kind(),
                "proof envelope backend mismatch"
            );
            return Verdict::Invalid(InvalidReason::BackendMismatch);
        }
        match backend.verify(&self.proof, statement) {
            Ok(()) => Verdict::Valid,
            Err(reason) => {
                warn!(%reason, kind = ?statement.kind, "proof rejected");
                Verdict::Invalid(reason)
            }
        }
    }

    /// Canonical wire encoding.
    ///
    /// Fails with [`ProofError::ProofTooLarge`] for proofs longer than
    /// `u32::MAX` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofError> {
        let proof = self.proof.as_bytes();
        let len = frame_len(proof.len())?;
        let mut out = Writer::with_capacity(1 + 1 + 8 + 4 + proof.len());
        out.u8(ENVELOPE_VERSION)
            .u8(self.backend.code())
            .u64(self.timestamp.0)
            .u32(len)
            .bytes(proof);
        Ok(out.finish())
    }

    /// Strict decoding of [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidReason> {
        let mut rd = Reader::new(bytes);
        let version = rd.u8().ok_or(InvalidReason::Malformed)?;
        if version != ENVELOPE_VERSION {
            return Err(InvalidReason::UnsupportedVersion);
        }
        let code = rd.u8().ok_or(InvalidReason::Malformed)?;
        let backend = BackendKind::from_code(code).ok_or(InvalidReason::BackendMismatch)?;
        let timestamp = rd.u64().ok_or(InvalidReason::Malformed)?;
        let len = rd.u32().ok_or(InvalidReason::Malformed)?;
        let proof = usize::try_from(len)
            .ok()
            .and_then(|len_usize| rd.take(len_usize))
            .ok_or(InvalidReason::Malformed)?;
        rd.finish().ok_or(InvalidReason::Malformed)?;
        Ok(Self {
            backend,
            timestamp: Timestamp(timestamp),
            proof: Proof::from(proof.to_vec()),
        })
    }

    /// Summary at `now` of this envelope as a proof of `statement`.
    #[must_use]
    pub fn metadata(&self, statement: &Statement, now: Timestamp) -> EnvelopeMetadata {
        let proof = self.proof.as_bytes();
        let mut header = Writer::with_capacity(1 + 1 + 8 + 8);
        header
            .u8(ENVELOPE_VERSION)
            .u8(self.backend.code())
            .u64(self.timestamp.0)
            .u64(u64::try_from(proof.len()).unwrap_or(u64::MAX));
        let hash = blake2b_simd::Params::new()
            .hash_length(32)
            .personal(ENVELOPE_DIGEST_PERSONALIZATION)
            .to_state()
            .update(&header.finish())
            .update(proof)
            .finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(hash.as_bytes());
        EnvelopeMetadata {
            digest,
            statement_digest: statement.digest(),
            created: self.timestamp,
            age_ms: now.0.saturating_sub(self.timestamp.0),
            backend: self.backend,
            proof_len: self.proof.len(),
        }
    }
}

/// The `u32` length prefix for a proof of `len` bytes.
fn frame_len(len: usize) -> Result<u32, ProofError> {
    u32::try_from(len).map_err(|_err| ProofError::ProofTooLarge { len })
}
