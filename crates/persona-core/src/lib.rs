//! Persona Core — Fundamental types, errors, and configuration for the
//! Persona identity and document-validation protocol.

pub mod config;
pub mod error;
pub mod types;
pub mod validation_state;

pub use config::RegistryConfig;
pub use error::ProtocolError;
pub use types::{Address, Bytes32, DocumentType, Role};
pub use validation_state::{
    ValidationEvent, ValidationOutcome, ValidationStateMachine, ValidationStatus,
};
