use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use persona_core::{Bytes32, DocumentType, ProtocolError};

/// A declared document: opaque encrypted value, its hash, and link hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub encrypted_value: String,
    pub value_hash: Bytes32,
    pub link_hashes: Vec<Bytes32>,
}

/// Add-only document store keyed by document type.
///
/// Several hashes may coexist under one type; each `(type, hash)` pair is
/// stored at most once and the most recent version is the current one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldStore {
    fields: BTreeMap<DocumentType, Vec<Field>>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document_type: DocumentType, field: Field) -> Result<(), ProtocolError> {
        if field.value_hash.is_zero() {
            return Err(ProtocolError::EmptyInput(
                "Persona: Document must not be empty".into(),
            ));
        }
        let versions = self.fields.entry(document_type).or_default();
        if versions.iter().any(|f| f.value_hash == field.value_hash) {
            return Err(ProtocolError::Duplicate(
                "Persona: Document already added!".into(),
            ));
        }
        versions.push(field);
        Ok(())
    }

    /// Latest version stored for `document_type`.
    pub fn latest(&self, document_type: &DocumentType) -> Option<&Field> {
        self.fields.get(document_type).and_then(|v| v.last())
    }

    /// Every version stored for `document_type`, oldest first.
    pub fn versions(&self, document_type: &DocumentType) -> &[Field] {
        self.fields
            .get(document_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, document_type: &DocumentType) -> bool {
        self.fields.contains_key(document_type)
    }

    pub fn document_types(&self) -> Vec<DocumentType> {
        self.fields.keys().copied().collect()
    }

    /// Number of document types declared.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
