//! # shieldcore
//!
//! Shielded-value commitments and the proofs that spend them.
//!
//! - **Commitments**: $\mathsf{cm} = [v]\,\mathcal{V} + [\mathsf{ask}]\,\mathcal{K} + [r]\,\mathcal{R}$
//!   on Pallas hide the value and owner and bind both
//! - **Nullifiers**: $\mathsf{nf} = [\mathsf{ask}]\,\mathcal{H}_{nf}(\mathsf{cm})$
//!   is deterministic per commitment and unlinkable to it without the owner
//!   key
//! - **Proofs**: a [`ProofBackend`] proves a [`Statement`] (an opening, a
//!   value range, and optionally a nullifier and pool membership)
//! - **Envelopes**: an [`Envelope`] stamps a proof with its backend and
//!   creation time; verification checks freshness before cryptography
//! - **Batches**: a [`BatchVerifier`] checks many envelopes concurrently and
//!   reports verdicts in input order
//!
//! ## Proof lifecycle
//!
//! ```text
//! Witness ──prove──▶ Proof ──wrap──▶ Envelope ──verify──▶ Verdict
//!                                                  ├─ Valid
//!                                                  ├─ Invalid(reason)
//!                                                  └─ Stale(reason)
//! ```
//!
//! [`ProofService`] is the entry point: built once from a [`Config`], it
//! proves each transfer kind and verifies single envelopes, batches, and
//! spends against a [`NullifierSet`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![expect(clippy::pub_use, reason = "exporting items for consumers")]

pub mod accumulator;
pub mod batch;
pub mod commitment;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod nullifier;
pub mod params;
pub mod proof;
pub mod service;
pub mod sigma;
pub mod statement;
pub mod value;
pub mod witness;

mod primitives;

pub use accumulator::{CommitmentAccumulator, MerkleAccumulator, MerklePath};
pub use batch::{BatchItem, BatchReport, BatchVerifier};
pub use commitment::Commitment;
pub use config::Config;
pub use envelope::{Envelope, FreshnessPolicy, StaleReason, Timestamp, Verdict};
pub use error::{ConfigError, ProofError, WitnessFault};
pub use keys::OwnerSecret;
pub use nullifier::{Nullifier, NullifierSet};
pub use params::Params;
pub use primitives::Anchor;
pub use proof::{BackendKind, InvalidReason, Proof, ProofBackend};
pub use service::{ProofService, Proven, SpendOutcome};
pub use statement::{Destination, Membership, Statement, StatementKind};
pub use value::{Blinding, ValueRange};
pub use witness::Witness;
