use alloy::primitives::{Address, B256};

use crate::crypto::SignatureError;

/// The category a [`RampError`] belongs to. Callers branch on this rather than on individual
/// variants when they only care about who is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller is not allowed to perform the operation.
    Authorization,
    /// The operation is well-formed but forbidden by the configured policy.
    PolicyViolation,
    /// A report or its signatures did not verify.
    VerificationFailure,
    /// The operation would break an invariant of the persistent state.
    InvariantViolation,
    /// The durable store failed.
    Storage,
}

/// An error returned by a bridge entry point. Any error aborts the whole call and leaves the
/// bridge state untouched.
#[derive(thiserror::Error, Debug)]
pub enum RampError {
    #[error("caller {0} is not the owner")]
    NotOwner(Address),
    #[error("sender {0} is not allowed to send requests")]
    SenderNotAllowed(Address),
    #[error("chain pair {source_chain_id} -> {target_chain_id} is not whitelisted")]
    ChainPairNotWhitelisted {
        source_chain_id: u64,
        target_chain_id: u64,
    },
    #[error("DESTINATION_ADDRESS_IS_NOT_A_CONTRACT")]
    NotAContract(Address),
    #[error("code at {0} is not a logic module")]
    NotALogicModule(Address),
    #[error("length mismatch: {left} source chain ids but {right} target chain ids")]
    LengthMismatch { left: usize, right: usize },
    #[error("Insufficient or invalid signatures")]
    InsufficientSignatures { valid: usize, threshold: usize },
    #[error("invalid signature at index {index}: {source}")]
    InvalidSignature {
        index: usize,
        #[source]
        source: SignatureError,
    },
    #[error("malformed report: {0}")]
    MalformedReport(String),
    #[error("message {0} has already been forwarded")]
    MessageAlreadyForwarded(B256),
    #[error("oracle committee must not be empty")]
    EmptyCommittee,
    #[error("oracle node {0} appears more than once")]
    DuplicateOracleNode(Address),
    #[error("the zero address is not allowed here")]
    ZeroAddress,
    #[error("sequence counter for chain {0} is exhausted")]
    SequenceOverflow(u64),
    #[error("{call} returned an unexpected output: {output}")]
    UnexpectedOutput { call: &'static str, output: String },
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl RampError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RampError::NotOwner(_) | RampError::SenderNotAllowed(_) => ErrorKind::Authorization,
            RampError::ChainPairNotWhitelisted { .. }
            | RampError::NotAContract(_)
            | RampError::NotALogicModule(_)
            | RampError::LengthMismatch { .. } => ErrorKind::PolicyViolation,
            RampError::InsufficientSignatures { .. }
            | RampError::InvalidSignature { .. }
            | RampError::MalformedReport(_)
            | RampError::MessageAlreadyForwarded(_) => ErrorKind::VerificationFailure,
            RampError::EmptyCommittee
            | RampError::DuplicateOracleNode(_)
            | RampError::ZeroAddress
            | RampError::SequenceOverflow(_)
            | RampError::UnexpectedOutput { .. } => ErrorKind::InvariantViolation,
            RampError::Storage(_) => ErrorKind::Storage,
        }
    }
}
