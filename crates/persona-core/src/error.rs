use crate::validation_state::ValidationStatus;

/// Protocol errors. Every variant aborts the enclosing transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("authorization error: {0}")]
    Authorization(String),

    #[error("policy error: {0}")]
    Policy(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("queue empty: {0}")]
    QueueEmpty(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid validation transition from {from} to {to}")]
    InvalidStateTransition {
        from: ValidationStatus,
        to: ValidationStatus,
    },

    #[error("reentrant transaction rejected")]
    Reentrancy,

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl ProtocolError {
    /// The human-readable precondition that was violated.
    pub fn reason(&self) -> String {
        match self {
            Self::Authorization(r)
            | Self::Policy(r)
            | Self::Duplicate(r)
            | Self::EmptyInput(r)
            | Self::NotFound(r)
            | Self::UnsupportedType(r)
            | Self::QueueEmpty(r)
            | Self::InvalidInput(r) => r.clone(),
            other => other.to_string(),
        }
    }
}
