use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use persona_core::{Address, Bytes32, ProtocolError};

use crate::queue::AppendLog;

/// An endorsement given to a persona by a third-party issuer.
///
/// `content`, `signature` and `metadata` are opaque to the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub issuer: Address,
    pub certificate_type: Bytes32,
    pub content: String,
    pub signature: String,
    pub metadata: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateDecision {
    Accepted,
    Rejected,
}

/// Two-stage certificate inbox: a FIFO of pending certificates and the
/// append-only list of accepted ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificatePipeline {
    pending: AppendLog<Certificate>,
    decisions: BTreeMap<u64, CertificateDecision>,
    confirmed: Vec<Certificate>,
}

impl CertificatePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a certificate to the pending tail. Returns its inbox index.
    pub fn give(&mut self, certificate: Certificate) -> u64 {
        self.pending.push(certificate)
    }

    /// Oldest pending certificate.
    pub fn next_pending(&self) -> Option<&Certificate> {
        self.pending.head().map(|(_, c)| c)
    }

    /// Decide on the oldest pending certificate.
    pub fn process_next(&mut self, accept: bool) -> Result<(u64, Certificate, CertificateDecision), ProtocolError> {
        let (index, certificate) = self
            .pending
            .pop_head()
            .map(|(i, c)| (i, c.clone()))
            .ok_or_else(|| ProtocolError::QueueEmpty("Persona: No pending certificates".into()))?;

        let decision = if accept {
            self.confirmed.push(certificate.clone());
            CertificateDecision::Accepted
        } else {
            CertificateDecision::Rejected
        };
        self.decisions.insert(index, decision);
        Ok((index, certificate, decision))
    }

    pub fn pending_count(&self) -> u64 {
        self.pending.len()
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }

    pub fn certificate(&self, index: usize) -> Option<&Certificate> {
        self.confirmed.get(index)
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.confirmed
    }

    /// Decision taken on the inbox entry at `index`, if processed.
    pub fn decision(&self, index: u64) -> Option<CertificateDecision> {
        self.decisions.get(&index).copied()
    }

    /// Total certificates ever received, processed or not.
    pub fn received_count(&self) -> u64 {
        self.pending.end()
    }
}
