//! Concurrent verification of many envelopes.
//!
//! Every `(envelope, statement)` pair is an independent task. Tasks wait for
//! a permit from a semaphore sized to the configured concurrency, then run
//! the CPU-bound check on tokio's blocking pool. Results land in their input
//! slot whatever order the tasks finish in.
//!
//! Cancellation is cooperative. Cancelling the batch token, or one item's
//! token, resolves the affected slots to `None` without waiting for work
//! already on the blocking pool. That work keeps its permit until it
//! returns, so the pool never runs more checks than the configured
//! concurrency. The [`BatchReport`] says whether every slot was filled.

use core::num::NonZeroUsize;
use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    envelope::{Envelope, FreshnessPolicy, Timestamp, Verdict},
    error::ProofError,
    proof::ProofBackend,
    statement::Statement,
};

/// One unit of batch work.
#[derive(Debug)]
pub struct BatchItem {
    /// The envelope to verify.
    pub envelope: Envelope,
    /// The statement it should prove.
    pub statement: Statement,
    /// Cancels just this item.
    pub cancel: CancellationToken,
}

impl BatchItem {
    /// An item with its own, never-cancelled token.
    #[must_use]
    pub fn new(envelope: Envelope, statement: Statement) -> Self {
        Self {
            envelope,
            statement,
            cancel: CancellationToken::new(),
        }
    }
}

/// Per-item verdicts in input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    verdicts: Vec<Option<Verdict>>,
}

impl BatchReport {
    /// One slot per input; `None` for items that were cancelled or whose
    /// task failed.
    #[must_use]
    pub fn verdicts(&self) -> &[Option<Verdict>] {
        &self.verdicts
    }

    /// Whether every item produced a verdict.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.verdicts.iter().all(Option::is_some)
    }

    /// Whether every item produced [`Verdict::Valid`].
    #[must_use]
    pub fn all_valid(&self) -> bool {
        self.verdicts
            .iter()
            .all(|verdict| verdict.is_some_and(|outcome| outcome.is_valid()))
    }

    /// Take the verdicts.
    #[must_use]
    pub fn into_verdicts(self) -> Vec<Option<Verdict>> {
        self.verdicts
    }
}

/// Fans envelope verification out over a bounded pool.
#[derive(Clone, Debug)]
pub struct BatchVerifier {
    backend: Arc<dyn ProofBackend>,
    policy: FreshnessPolicy,
    permits: Arc<Semaphore>,
}

impl BatchVerifier {
    /// A verifier running at most `max_concurrency` checks at once.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ProofBackend>,
        policy: FreshnessPolicy,
        max_concurrency: NonZeroUsize,
    ) -> Self {
        Self {
            backend,
            policy,
            permits: Arc::new(Semaphore::new(max_concurrency.get())),
        }
    }

    /// Verify `envelopes[i]` against `statements[i]` for every `i`.
    ///
    /// Fails only when the two inputs differ in length.
    pub async fn verify(
        &self,
        envelopes: Vec<Envelope>,
        statements: Vec<Statement>,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, ProofError> {
        if envelopes.len() != statements.len() {
            return Err(ProofError::BatchLengthMismatch {
                envelopes: envelopes.len(),
                statements: statements.len(),
            });
        }
        let items = envelopes
            .into_iter()
            .zip(statements)
            .map(|(envelope, statement)| BatchItem::new(envelope, statement))
            .collect();
        Ok(self.verify_items(items, now, cancel).await)
    }

    /// Verify prepared items, each individually cancellable.
    pub async fn verify_items(
        &self,
        items: Vec<BatchItem>,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let total = items.len();
        let mut tasks = JoinSet::new();
        for (index, item) in items.into_iter().enumerate() {
            let backend = Arc::clone(&self.backend);
            let permits = Arc::clone(&self.permits);
            let policy = self.policy;
            let batch_cancel = cancel.clone();
            tasks.spawn(async move {
                let BatchItem {
                    envelope,
                    statement,
                    cancel: item_cancel,
                } = item;
                let verdict = tokio::select! {
                    biased;
                    () = batch_cancel.cancelled() => None,
                    () = item_cancel.cancelled() => None,
                    verdict = verify_one(backend, permits, policy, envelope, statement, now) => verdict,
                };
                (index, verdict)
            });
        }

        let mut verdicts = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, verdict)) => {
                    if let Some(slot) = verdicts.get_mut(index) {
                        *slot = verdict;
                    }
                }
                Err(err) => error!(%err, "batch verification task failed"),
            }
        }

        let report = BatchReport { verdicts };
        let finished = report.verdicts.iter().filter(|slot| slot.is_some()).count();
        if report.is_complete() {
            debug!(total, "batch verification complete");
        } else {
            warn!(total, finished, "batch verification incomplete");
        }
        report
    }
}

async fn verify_one(
    backend: Arc<dyn ProofBackend>,
    permits: Arc<Semaphore>,
    policy: FreshnessPolicy,
    envelope: Envelope,
    statement: Statement,
    now: Timestamp,
) -> Option<Verdict> {
    let permit = permits.acquire_owned().await.ok()?;
    let outcome = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        envelope.verify(backend.as_ref(), &statement, &policy, now)
    })
    .await;
    match outcome {
        Ok(verdict) => Some(verdict),
        Err(err) => {
            error!(%err, "verification panicked");
            None
        }
    }
}
