//! Persona Protocol
//!
//! The protocol state machine of the Persona identity ledger:
//! - Registry: directory, role table and self-registration policy
//! - Persona: field store, validation requests and certificate pipeline
//! - Validator: accepted document types and FIFO validation queue
//! - Ledger: keyed world state with atomic, non-reentrant transactions

pub mod certificates;
pub mod events;
pub mod factory;
pub mod fields;
pub mod ledger;
pub mod persona;
pub mod queue;
pub mod registry;
pub mod roles;
pub mod validator;
pub mod world;

pub use certificates::{Certificate, CertificateDecision, CertificatePipeline};
pub use events::{EventRecord, LedgerEvent};
pub use factory::Factory;
pub use fields::{Field, FieldStore};
pub use ledger::{Ledger, LedgerSnapshot, Tx};
pub use persona::{Persona, ValidationRequest};
pub use queue::{AppendLog, QueueSlot};
pub use registry::Registry;
pub use roles::RoleTable;
pub use validator::{QueuedValidation, Validator};
pub use world::World;
