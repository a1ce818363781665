//! Generation-side errors.
//!
//! Verification never produces these: it is total and reports an
//! [`InvalidReason`](crate::proof::InvalidReason) or
//! [`StaleReason`](crate::envelope::StaleReason) instead.

use std::path::PathBuf;

use thiserror::Error;

/// Why a witness does not satisfy a statement.
///
/// Always a caller bug; retrying with the same inputs cannot succeed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum WitnessFault {
    /// The witness does not open the statement's commitment.
    #[error("witness does not open the statement commitment")]
    CommitmentMismatch,

    /// The committed value lies outside the statement's range.
    #[error("committed value lies outside the statement range")]
    ValueOutOfRange,

    /// The statement's range is empty (`min > max`).
    #[error("statement range is empty")]
    EmptyRange,

    /// The statement's nullifier was not derived from this witness.
    #[error("statement nullifier does not match the witness")]
    NullifierMismatch,

    /// The statement's membership path does not lead to its anchor.
    #[error("membership path does not lead to the statement anchor")]
    MembershipMismatch,
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`Config`](crate::config::Config).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    Env {
        /// Environment variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
    },

    /// A field failed validation.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Errors surfaced by proof generation and service construction.
#[derive(Debug, Error)]
pub enum ProofError {
    /// The witness does not satisfy the statement.
    #[error("witness invalid: {0}")]
    WitnessInvalid(#[from] WitnessFault),

    /// The backend could not be initialized (missing or corrupt setup
    /// parameters, unsupported backend kind).
    #[error("proof backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A value exceeds [`MAX_VALUE`](crate::constants::MAX_VALUE).
    #[error("value {value} exceeds the maximum of {max}")]
    ValueOutOfRange {
        /// Offending value.
        value: u64,
        /// Declared maximum.
        max: u64,
    },

    /// A proof too long for the envelope's `u32` length prefix.
    #[error("proof of {len} bytes cannot be framed")]
    ProofTooLarge {
        /// Proof length in bytes.
        len: usize,
    },

    /// Batch inputs were not paired one-to-one.
    #[error("batch has {envelopes} envelopes but {statements} statements")]
    BatchLengthMismatch {
        /// Number of envelopes supplied.
        envelopes: usize,
        /// Number of statements supplied.
        statements: usize,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
