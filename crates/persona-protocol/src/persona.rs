use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use persona_core::{
    Address, Bytes32, DocumentType, ProtocolError, ValidationEvent, ValidationOutcome,
    ValidationStateMachine, ValidationStatus,
};

use crate::certificates::{Certificate, CertificateDecision, CertificatePipeline};
use crate::fields::{Field, FieldStore};

pub(crate) const NOT_OWNER: &str = "Ownable: caller is not the owner";

/// A validation request from this persona to one validator for one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub status: ValidationStatus,
    /// Links shared with the validator for this request.
    pub links: Vec<String>,
    /// Free-form note attached by the persona owner.
    pub note: String,
    /// Evidence returned by the validator with its decision.
    pub evidence: Option<String>,
    /// Index of the request in the validator's queue.
    pub queue_index: u64,
}

/// Per-owner identity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    address: Address,
    owner: Address,
    name: Bytes32,
    fields: FieldStore,
    validation: BTreeMap<DocumentType, BTreeMap<Address, ValidationRequest>>,
    validators_by_type: BTreeMap<DocumentType, Vec<Address>>,
    certificates: CertificatePipeline,
}

impl Persona {
    pub fn new(address: Address, owner: Address, name: Bytes32) -> Self {
        Self {
            address,
            owner,
            name,
            fields: FieldStore::new(),
            validation: BTreeMap::new(),
            validators_by_type: BTreeMap::new(),
            certificates: CertificatePipeline::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn name(&self) -> Bytes32 {
        self.name
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<(), ProtocolError> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(ProtocolError::Authorization(NOT_OWNER.into()))
        }
    }

    // ------------------------------------------------------------------
    // Field store
    // ------------------------------------------------------------------

    pub fn add_field(
        &mut self,
        caller: &Address,
        document_type: DocumentType,
        field: Field,
    ) -> Result<(), ProtocolError> {
        self.ensure_owner(caller)?;
        self.fields.insert(document_type, field)
    }

    pub fn has_field(&self, document_type: &DocumentType) -> bool {
        self.fields.contains(document_type)
    }

    pub fn ensure_field(&self, document_type: &DocumentType) -> Result<(), ProtocolError> {
        if self.has_field(document_type) {
            Ok(())
        } else {
            Err(ProtocolError::NotFound("Persona: Document not added".into()))
        }
    }

    /// Current version of a document.
    pub fn field(&self, document_type: &DocumentType) -> Option<&Field> {
        self.fields.latest(document_type)
    }

    pub fn field_versions(&self, document_type: &DocumentType) -> &[Field] {
        self.fields.versions(document_type)
    }

    pub fn document_types(&self) -> Vec<DocumentType> {
        self.fields.document_types()
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Move the (type, validator) request to Pending and remember the
    /// validator for this type. Called before the validator is enqueued.
    pub(crate) fn open_validation(
        &mut self,
        validator: Address,
        document_type: DocumentType,
        links: Vec<String>,
        note: String,
        queue_index: u64,
    ) -> Result<(), ProtocolError> {
        let current = self.validation_status(&document_type, &validator);
        if current.is_pending() {
            return Err(ProtocolError::Duplicate(
                "Persona: Validation already pending".into(),
            ));
        }
        let status = ValidationStateMachine::transition(current, ValidationEvent::Request)?;

        self.validation.entry(document_type).or_default().insert(
            validator,
            ValidationRequest {
                status,
                links,
                note,
                evidence: None,
                queue_index,
            },
        );

        let validators = self.validators_by_type.entry(document_type).or_default();
        if !validators.contains(&validator) {
            validators.push(validator);
        }
        Ok(())
    }

    /// Apply the validator's decision to a pending request.
    pub(crate) fn resolve_validation(
        &mut self,
        validator: &Address,
        document_type: &DocumentType,
        outcome: ValidationOutcome,
        evidence: String,
    ) -> Result<ValidationStatus, ProtocolError> {
        let request = self
            .validation
            .get_mut(document_type)
            .and_then(|by_validator| by_validator.get_mut(validator))
            .ok_or_else(|| ProtocolError::NotFound("Persona: Validation not requested".into()))?;

        request.status =
            ValidationStateMachine::transition(request.status, ValidationEvent::Resolve(outcome))?;
        request.evidence = Some(evidence);
        Ok(request.status)
    }

    pub fn validation_status(
        &self,
        document_type: &DocumentType,
        validator: &Address,
    ) -> ValidationStatus {
        self.validation_request(document_type, validator)
            .map_or(ValidationStatus::Unrequested, |r| r.status)
    }

    pub fn validation_request(
        &self,
        document_type: &DocumentType,
        validator: &Address,
    ) -> Option<&ValidationRequest> {
        self.validation
            .get(document_type)
            .and_then(|by_validator| by_validator.get(validator))
    }

    /// Validators ever asked to validate `document_type`, in request order.
    pub fn validators(&self, document_type: &DocumentType) -> &[Address] {
        self.validators_by_type
            .get(document_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Certificates
    // ------------------------------------------------------------------

    /// Open inbox: any account may give a certificate.
    pub fn give_certificate(&mut self, certificate: Certificate) -> u64 {
        self.certificates.give(certificate)
    }

    /// Oldest pending certificate. Named after the queue end it is taken
    /// from in the external surface, but the queue is FIFO.
    pub fn last_pending_certificate(&self) -> Option<&Certificate> {
        self.certificates.next_pending()
    }

    /// Accept or reject the oldest pending certificate.
    pub fn process_last_pending_certificate(
        &mut self,
        caller: &Address,
        accept: bool,
    ) -> Result<(u64, Certificate, CertificateDecision), ProtocolError> {
        self.ensure_owner(caller)?;
        self.certificates.process_next(accept)
    }

    pub fn pending_certificates_count(&self) -> u64 {
        self.certificates.pending_count()
    }

    pub fn certificates_count(&self) -> usize {
        self.certificates.confirmed_count()
    }

    pub fn certificate(&self, index: usize) -> Option<&Certificate> {
        self.certificates.certificate(index)
    }

    pub fn certificates(&self) -> &CertificatePipeline {
        &self.certificates
    }
}
