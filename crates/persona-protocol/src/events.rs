//! Events emitted by committed ledger transactions.
//!
//! Events are buffered inside a transaction and appended to the ledger's log
//! only on commit, so an aborted transaction leaves no trace.

use serde::{Deserialize, Serialize};

use persona_core::{Address, Bytes32, DocumentType, Role, ValidationStatus};

use crate::certificates::CertificateDecision;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// The registry and its factories were deployed.
    RegistryDeployed {
        registry: Address,
        admin: Address,
        name: Bytes32,
    },
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },
    RequireRolePersonaChanged {
        required: bool,
    },
    RequireRoleValidatorChanged {
        required: bool,
    },
    PersonaRegistered {
        owner: Address,
        persona: Address,
        name: Bytes32,
    },
    ValidatorRegistered {
        owner: Address,
        validator: Address,
        name: Bytes32,
    },
    FieldAdded {
        persona: Address,
        document_type: DocumentType,
        value_hash: Bytes32,
    },
    DocumentTypeAdded {
        validator: Address,
        document_type: DocumentType,
    },
    ValidationRequested {
        persona: Address,
        validator: Address,
        document_type: DocumentType,
        queue_index: u64,
    },
    ValidationProcessed {
        persona: Address,
        validator: Address,
        document_type: DocumentType,
        queue_index: u64,
        status: ValidationStatus,
    },
    CertificateGiven {
        persona: Address,
        issuer: Address,
        certificate_type: Bytes32,
        inbox_index: u64,
    },
    CertificateProcessed {
        persona: Address,
        issuer: Address,
        inbox_index: u64,
        decision: CertificateDecision,
    },
}

/// A committed event and the sequence number of its transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub event: LedgerEvent,
}
