//! The proof service.
//!
//! [`ProofService`] ties a loaded [`ProofBackend`] to a [`FreshnessPolicy`]
//! and a [`BatchVerifier`]. It is built once from a [`Config`] and shared by
//! reference or `Arc`; it holds no mutable state.
//!
//! Beyond plain `prove`/`verify` it builds the statement for each transfer
//! kind from a witness, and [`accept_spend`](ProofService::accept_spend)
//! records the nullifier of a verified spend so the same commitment cannot
//! be spent twice against one [`NullifierSet`]. A spend only counts when it
//! proves membership under an anchor the caller recognizes.

use core::num::NonZeroUsize;
use std::sync::Arc;

use rand_core::CryptoRngCore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    accumulator::CommitmentAccumulator,
    batch::{BatchReport, BatchVerifier},
    commitment::Commitment,
    config::Config,
    envelope::{Envelope, FreshnessPolicy, Timestamp, Verdict},
    error::{ProofError, WitnessFault},
    keys::OwnerSecret,
    nullifier::{Nullifier, NullifierSet},
    primitives::Anchor,
    proof::ProofBackend,
    statement::{Destination, Membership, Statement},
    value::Blinding,
    witness::Witness,
};

/// A statement together with the envelope proving it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proven {
    /// The public inputs.
    pub statement: Statement,
    /// The stamped proof.
    pub envelope: Envelope,
}

/// Result of [`ProofService::accept_spend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpendOutcome {
    /// The proof verified and the nullifier is now recorded as spent.
    Accepted(Nullifier),
    /// The envelope did not verify; nothing was recorded.
    Rejected(Verdict),
    /// The statement carries no nullifier, so it spends nothing.
    MissingNullifier,
    /// The statement does not claim membership in the pool.
    MissingMembership,
    /// The membership claim is under an anchor the caller does not accept.
    UnknownAnchor(Anchor),
    /// The nullifier was already recorded.
    AlreadySpent(Nullifier),
}

impl SpendOutcome {
    /// Whether the spend was accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Proving and verification over one backend.
#[derive(Clone, Debug)]
pub struct ProofService {
    backend: Arc<dyn ProofBackend>,
    policy: FreshnessPolicy,
    batch: BatchVerifier,
}

impl ProofService {
    /// Validate `config`, load its backend, and size the batch pool.
    pub fn from_config(config: &Config) -> Result<Self, ProofError> {
        config.validate()?;
        let backend = config
            .backend_kind
            .load(config.setup_params_path.as_deref())?;
        let service = Self::with_backend(
            backend,
            config.freshness_policy(),
            config.batch_concurrency(),
        );
        info!(
            backend = %config.backend_kind,
            window_ms = config.freshness_window_millis,
            concurrency = config.batch_concurrency().get(),
            "proof service ready"
        );
        Ok(service)
    }

    /// A service over an already loaded backend.
    #[must_use]
    pub fn with_backend(
        backend: Arc<dyn ProofBackend>,
        policy: FreshnessPolicy,
        max_concurrency: NonZeroUsize,
    ) -> Self {
        let batch = BatchVerifier::new(Arc::clone(&backend), policy, max_concurrency);
        Self {
            backend,
            policy,
            batch,
        }
    }

    /// The loaded backend.
    #[must_use]
    pub fn backend(&self) -> &dyn ProofBackend {
        self.backend.as_ref()
    }

    /// The freshness policy applied by [`verify`](Self::verify).
    #[must_use]
    pub const fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    /// Commit under this backend's generators.
    pub fn commit(
        &self,
        value: u64,
        owner: &OwnerSecret,
        blinding: &Blinding,
    ) -> Result<Commitment, ProofError> {
        Commitment::commit(self.backend.params(), value, owner, blinding)
    }

    /// Prove `statement` and stamp the proof with `now`.
    pub fn prove(
        &self,
        statement: &Statement,
        witness: &Witness,
        rng: &mut dyn CryptoRngCore,
        now: Timestamp,
    ) -> Result<Envelope, ProofError> {
        let proof = self.backend.prove(statement, witness, rng)?;
        Ok(Envelope::wrap(proof, self.backend.kind(), now))
    }

    /// Verify `envelope` against `statement` at `now`.
    #[must_use]
    pub fn verify(&self, envelope: Envelope, statement: &Statement, now: Timestamp) -> Verdict {
        envelope.verify(self.backend.as_ref(), statement, &self.policy, now)
    }

    /// Decode and verify an encoded envelope. Undecodable bytes are
    /// [`Verdict::Invalid`].
    #[must_use]
    pub fn verify_bytes(&self, bytes: &[u8], statement: &Statement, now: Timestamp) -> Verdict {
        match Envelope::from_bytes(bytes) {
            Ok(envelope) => self.verify(envelope, statement, now),
            Err(reason) => {
                warn!(%reason, len = bytes.len(), "undecodable proof envelope");
                Verdict::Invalid(reason)
            }
        }
    }

    /// Verify `envelopes[i]` against `statements[i]` concurrently.
    pub async fn batch_verify(
        &self,
        envelopes: Vec<Envelope>,
        statements: Vec<Statement>,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, ProofError> {
        self.batch.verify(envelopes, statements, now, cancel).await
    }

    /// Prove a new shielded output with a public amount, addressed to
    /// `destination`.
    pub fn shield(
        &self,
        witness: &Witness,
        destination: Destination,
        rng: &mut dyn CryptoRngCore,
        now: Timestamp,
    ) -> Result<Proven, ProofError> {
        let cm = witness.commitment(self.backend.params())?;
        let statement = Statement::shield(cm, witness.value(), destination);
        self.prove_statement(statement, witness, rng, now)
    }

    /// Prove a spend of a pool commitment for its public amount.
    ///
    /// The commitment must be in `accumulator`. The amount is paid to
    /// `destination`.
    pub fn unshield(
        &self,
        witness: &Witness,
        accumulator: &dyn CommitmentAccumulator,
        destination: Destination,
        rng: &mut dyn CryptoRngCore,
        now: Timestamp,
    ) -> Result<Proven, ProofError> {
        let cm = witness.commitment(self.backend.params())?;
        let membership = membership(accumulator, &cm)?;
        let statement = Statement::unshield(
            cm,
            witness.nullifier(&cm),
            witness.value(),
            membership,
            destination,
        );
        self.prove_statement(statement, witness, rng, now)
    }

    /// Prove a spend of a pool commitment into `destination` without
    /// revealing its value.
    pub fn private_transfer(
        &self,
        witness: &Witness,
        accumulator: &dyn CommitmentAccumulator,
        destination: Destination,
        rng: &mut dyn CryptoRngCore,
        now: Timestamp,
    ) -> Result<Proven, ProofError> {
        let cm = witness.commitment(self.backend.params())?;
        let membership = membership(accumulator, &cm)?;
        let statement =
            Statement::private_transfer(cm, witness.nullifier(&cm), membership, destination);
        self.prove_statement(statement, witness, rng, now)
    }

    /// Verify a spend and record its nullifier in `spent`.
    ///
    /// The statement must prove membership under one of `anchors`, the pool
    /// roots the caller accepts. Nothing is recorded unless that holds and
    /// the verdict is [`Verdict::Valid`].
    #[must_use]
    pub fn accept_spend(
        &self,
        envelope: Envelope,
        statement: &Statement,
        anchors: &[Anchor],
        spent: &mut dyn NullifierSet,
        now: Timestamp,
    ) -> SpendOutcome {
        let Some(nf) = statement.nullifier else {
            return SpendOutcome::MissingNullifier;
        };
        let Some(membership) = &statement.membership else {
            warn!(kind = ?statement.kind, "spend without pool membership");
            return SpendOutcome::MissingMembership;
        };
        if !anchors.contains(&membership.anchor) {
            warn!(
                kind = ?statement.kind,
                anchor = ?membership.anchor,
                "spend under unknown anchor"
            );
            return SpendOutcome::UnknownAnchor(membership.anchor);
        }
        if spent.contains(&nf) {
            warn!(kind = ?statement.kind, "double spend rejected");
            return SpendOutcome::AlreadySpent(nf);
        }
        let verdict = self.verify(envelope, statement, now);
        if !verdict.is_valid() {
            return SpendOutcome::Rejected(verdict);
        }
        if spent.insert(nf) {
            SpendOutcome::Accepted(nf)
        } else {
            warn!(kind = ?statement.kind, "double spend rejected");
            SpendOutcome::AlreadySpent(nf)
        }
    }

    fn prove_statement(
        &self,
        statement: Statement,
        witness: &Witness,
        rng: &mut dyn CryptoRngCore,
        now: Timestamp,
    ) -> Result<Proven, ProofError> {
        let envelope = self.prove(&statement, witness, rng, now)?;
        Ok(Proven {
            statement,
            envelope,
        })
    }
}

fn membership(
    accumulator: &dyn CommitmentAccumulator,
    cm: &Commitment,
) -> Result<Membership, WitnessFault> {
    let path = accumulator
        .membership_proof(cm)
        .ok_or(WitnessFault::MembershipMismatch)?;
    Ok(Membership {
        anchor: accumulator.root(),
        path,
    })
}
