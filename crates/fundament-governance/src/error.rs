use thiserror::Error;

/// Errors that can occur in governance operations.
///
/// Every error is synchronous and local; a rejected call leaves all
/// engine state exactly as it was before the call. The engine never
/// retries on behalf of the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    /// Malformed argument: zero amount, zero recipient, self-delegation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller lacks a required role or stake threshold.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Operation attempted outside the state that permits it.
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Amount exceeds the category treasury limit or the current balance.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Funds movement rejected at execution time.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),
}
