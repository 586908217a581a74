//! Multisig error taxonomy
//!
//! Every variant is a precondition failure detected before any state is
//! touched, except `EffectFailed`, which is reported after the execute has
//! been rolled back.

use thiserror::Error;

/// Errors related to multisig operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Wallet already initialized")]
    AlreadyInitialized,
    #[error("Caller is not an owner: {0}")]
    Unauthorized(String),
    #[error("Transaction not found: {0}")]
    NotFound(u64),
    #[error("Transaction already executed: {0}")]
    AlreadyExecuted(u64),
    #[error("Transaction {id} already approved by {owner}")]
    AlreadyApproved { id: u64, owner: String },
    #[error("Transaction {id} not approved by {owner}")]
    NotApproved { id: u64, owner: String },
    #[error("Not enough approvals: have {have}, need {need}")]
    InsufficientApprovals { have: usize, need: usize },
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("Balance overflow on deposit of {0}")]
    BalanceOverflow(u64),
    #[error("Execution effect failed: {0}")]
    EffectFailed(String),
}

impl MultisigError {
    /// Short machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            MultisigError::InvalidConfig(_) => "InvalidConfig",
            MultisigError::AlreadyInitialized => "AlreadyInitialized",
            MultisigError::Unauthorized(_) => "Unauthorized",
            MultisigError::NotFound(_) => "NotFound",
            MultisigError::AlreadyExecuted(_) => "AlreadyExecuted",
            MultisigError::AlreadyApproved { .. } => "AlreadyApproved",
            MultisigError::NotApproved { .. } => "NotApproved",
            MultisigError::InsufficientApprovals { .. } => "InsufficientApprovals",
            MultisigError::InsufficientFunds { .. } => "InsufficientFunds",
            MultisigError::BalanceOverflow(_) => "BalanceOverflow",
            MultisigError::EffectFailed(_) => "EffectFailed",
        }
    }
}
