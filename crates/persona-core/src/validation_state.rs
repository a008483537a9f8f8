use std::fmt;

use crate::error::ProtocolError;

/// Status of a (document type, validator) validation request on a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum ValidationStatus {
    /// No request was ever sent to this validator for this document.
    #[default]
    Unrequested,
    /// Request queued on the validator, awaiting a decision.
    Pending,
    /// Validator attested the document.
    Accepted,
    /// Validator refused the document.
    Rejected,
}

impl ValidationStatus {
    /// Whether a decision is still outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the validator has decided.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Numeric status code exposed to clients.
    pub fn code(&self) -> u8 {
        match self {
            Self::Unrequested => 0,
            Self::Pending => 1,
            Self::Accepted => 2,
            Self::Rejected => 3,
        }
    }

    /// Parse a numeric status code.
    pub fn from_code(code: u8) -> Result<Self, ProtocolError> {
        match code {
            0 => Ok(Self::Unrequested),
            1 => Ok(Self::Pending),
            2 => Ok(Self::Accepted),
            3 => Ok(Self::Rejected),
            _ => Err(ProtocolError::InvalidInput(format!(
                "invalid validation status code: {}",
                code
            ))),
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrequested => write!(f, "Unrequested"),
            Self::Pending => write!(f, "Pending"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Decision a validator takes on a queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ValidationOutcome {
    Accepted,
    Rejected,
}

impl ValidationOutcome {
    /// Build an outcome from a boolean verdict.
    pub fn from_verdict(accepted: bool) -> Self {
        if accepted {
            Self::Accepted
        } else {
            Self::Rejected
        }
    }
}

/// Events that drive a validation request through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationEvent {
    /// The persona owner asks a validator to validate a document.
    Request,
    /// The validator resolves the request.
    Resolve(ValidationOutcome),
}

/// Validation request transitions.
///
/// Valid transitions:
/// - Unrequested → Pending (Request)
/// - Pending → Accepted (Resolve(Accepted))
/// - Pending → Rejected (Resolve(Rejected))
/// - Accepted → Pending (Request), a renewed validation
/// - Rejected → Pending (Request), a renewed validation
pub struct ValidationStateMachine;

impl ValidationStateMachine {
    /// Apply an event to the current status.
    pub fn transition(
        current: ValidationStatus,
        event: ValidationEvent,
    ) -> Result<ValidationStatus, ProtocolError> {
        let next = match (current, event) {
            (
                ValidationStatus::Unrequested
                | ValidationStatus::Accepted
                | ValidationStatus::Rejected,
                ValidationEvent::Request,
            ) => ValidationStatus::Pending,
            (ValidationStatus::Pending, ValidationEvent::Resolve(ValidationOutcome::Accepted)) => {
                ValidationStatus::Accepted
            }
            (ValidationStatus::Pending, ValidationEvent::Resolve(ValidationOutcome::Rejected)) => {
                ValidationStatus::Rejected
            }
            _ => {
                let target = match event {
                    ValidationEvent::Request => ValidationStatus::Pending,
                    ValidationEvent::Resolve(ValidationOutcome::Accepted) => {
                        ValidationStatus::Accepted
                    }
                    ValidationEvent::Resolve(ValidationOutcome::Rejected) => {
                        ValidationStatus::Rejected
                    }
                };
                return Err(ProtocolError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %next,
            event = ?event,
            "validation state transition"
        );

        Ok(next)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: ValidationStatus, event: ValidationEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
