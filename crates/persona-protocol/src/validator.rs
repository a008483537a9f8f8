use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use persona_core::{Address, Bytes32, DocumentType, ProtocolError};

use crate::persona::NOT_OWNER;
use crate::queue::{AppendLog, QueueError, QueueSlot};

/// A request waiting in a validator's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedValidation {
    pub persona: Address,
    pub document_type: DocumentType,
}

/// Per-owner attester with its accepted document types and request queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validator {
    address: Address,
    owner: Address,
    name: Bytes32,
    public_key: Bytes32,
    document_types: BTreeSet<DocumentType>,
    queue: AppendLog<QueuedValidation>,
}

impl Validator {
    pub fn new(address: Address, owner: Address, name: Bytes32, public_key: Bytes32) -> Self {
        Self {
            address,
            owner,
            name,
            public_key,
            document_types: BTreeSet::new(),
            queue: AppendLog::new(),
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

    pub fn public_key(&self) -> Bytes32 {
        self.public_key
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<(), ProtocolError> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(ProtocolError::Authorization(NOT_OWNER.into()))
        }
    }

    /// Declare a document type this validator accepts. Returns false if it
    /// was already accepted.
    pub fn add_document_type(
        &mut self,
        caller: &Address,
        document_type: DocumentType,
    ) -> Result<bool, ProtocolError> {
        self.ensure_owner(caller)?;
        Ok(self.document_types.insert(document_type))
    }

    pub fn accepts(&self, document_type: &DocumentType) -> bool {
        self.document_types.contains(document_type)
    }

    pub fn ensure_accepts(&self, document_type: &DocumentType) -> Result<(), ProtocolError> {
        if self.accepts(document_type) {
            Ok(())
        } else {
            Err(ProtocolError::UnsupportedType(
                "Validator: Validator does not validate this kind of document".into(),
            ))
        }
    }

    pub fn document_types(&self) -> Vec<DocumentType> {
        self.document_types.iter().copied().collect()
    }

    /// Index the next enqueued request will get.
    pub(crate) fn next_queue_index(&self) -> u64 {
        self.queue.end()
    }

    pub(crate) fn enqueue(&mut self, persona: Address, document_type: DocumentType) -> u64 {
        self.queue.push(QueuedValidation {
            persona,
            document_type,
        })
    }

    /// Queue head: the next request the operator should decide on.
    pub fn next_validation(&self) -> Option<&QueuedValidation> {
        self.queue.head().map(|(_, entry)| entry)
    }

    /// Mark the request at absolute queue `index` processed.
    pub(crate) fn complete_validation(
        &mut self,
        caller: &Address,
        index: u64,
    ) -> Result<QueuedValidation, ProtocolError> {
        self.ensure_owner(caller)?;
        self.queue
            .complete(index)
            .cloned()
            .map_err(|e| match e {
                QueueError::OutOfRange => {
                    ProtocolError::NotFound("Validator: Validation request not found".into())
                }
                QueueError::AlreadyProcessed => {
                    ProtocolError::Duplicate("Validator: Validation already processed".into())
                }
            })
    }

    pub fn queue_start(&self) -> u64 {
        self.queue.start()
    }

    pub fn queue_end(&self) -> u64 {
        self.queue.end()
    }

    pub fn queue_len(&self) -> u64 {
        self.queue.len()
    }

    /// Requests in the queue window not yet processed.
    pub fn outstanding(&self) -> usize {
        self.queue.outstanding()
    }

    pub fn entry(&self, index: u64) -> Option<&QueueSlot<QueuedValidation>> {
        self.queue.get(index)
    }
}
