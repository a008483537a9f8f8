//! The shared ledger: world state, atomic transactions and the event log.
//!
//! Every mutating operation runs inside [`Ledger::transact`]: the operation
//! works on a draft copy of the world state, which replaces the committed
//! state only if the operation returns `Ok`. Events emitted by the operation
//! are appended to the log at the same moment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};
use std::thread::{self, ThreadId};

use persona_core::{
    Address, Bytes32, DocumentType, ProtocolError, RegistryConfig, Role, ValidationOutcome,
    ValidationStatus,
};

use crate::certificates::Certificate;
use crate::events::{EventRecord, LedgerEvent};
use crate::factory::Factory;
use crate::fields::Field;
use crate::persona::Persona;
use crate::registry::Registry;
use crate::validator::Validator;
use crate::world::World;

/// Clears the ledger's writer marker when a transaction ends, including by panic.
struct TransactionGuard<'a> {
    writer: &'a Mutex<Option<ThreadId>>,
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            *writer = None;
        }
    }
}

/// Mutable view handed to an operation running inside a transaction.
pub struct Tx<'a> {
    pub world: &'a mut World,
    events: Vec<LedgerEvent>,
}

impl Tx<'_> {
    /// Buffer an event; it is published only if the transaction commits.
    pub fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }
}

/// Serializable image of the whole ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub sequence: u64,
    pub world: World,
    pub events: Vec<EventRecord>,
}

/// Process-wide ledger holding the registry and all instances.
pub struct Ledger {
    state: RwLock<LedgerSnapshot>,
    /// Thread currently running a transaction on this ledger.
    writer: Mutex<Option<ThreadId>>,
}

impl Ledger {
    /// Deploy the two factories and the registry from `deployer`.
    ///
    /// The deployer receives the admin role.
    pub fn deploy(deployer: Address, config: &RegistryConfig) -> Result<Self, ProtocolError> {
        let mut deployments = Factory::new(deployer);
        let persona_factory = Factory::new(deployments.next_address());
        let validator_factory = Factory::new(deployments.next_address());
        let registry_address = deployments.next_address();

        let registry = Registry::new(
            registry_address,
            deployer,
            config,
            persona_factory.address(),
            validator_factory.address(),
        )?;

        let world = World {
            registry,
            personas: BTreeMap::new(),
            validators: BTreeMap::new(),
            persona_factory,
            validator_factory,
        };

        let ledger = Self {
            state: RwLock::new(LedgerSnapshot {
                sequence: 0,
                world,
                events: Vec::new(),
            }),
            writer: Mutex::new(None),
        };

        ledger.transact(|tx| {
            let registry = &tx.world.registry;
            let event = LedgerEvent::RegistryDeployed {
                registry: registry.address(),
                admin: deployer,
                name: registry.name(),
            };
            tx.emit(event);
            Ok(())
        })?;

        tracing::info!(
            registry = %registry_address,
            admin = %deployer,
            name = %config.name,
            require_role_persona = config.require_role_persona,
            require_role_validator = config.require_role_validator,
            "registry deployed"
        );

        Ok(ledger)
    }

    /// Rebuild a ledger from a snapshot.
    pub fn restore(snapshot: LedgerSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            writer: Mutex::new(None),
        }
    }

    /// Run `op` as one atomic transaction.
    ///
    /// Nested calls from inside `op` fail with [`ProtocolError::Reentrancy`].
    pub fn transact<T>(
        &self,
        op: impl FnOnce(&mut Tx<'_>) -> Result<T, ProtocolError>,
    ) -> Result<T, ProtocolError> {
        self.ensure_outside_transaction()?;
        let mut state = self.state.write().map_err(|_| ProtocolError::LockPoisoned)?;
        *self.writer.lock().map_err(|_| ProtocolError::LockPoisoned)? = Some(thread::current().id());
        let _guard = TransactionGuard {
            writer: &self.writer,
        };

        let mut draft = state.world.clone();
        let result = {
            let mut tx = Tx {
                world: &mut draft,
                events: Vec::new(),
            };
            op(&mut tx).map(|value| (value, tx.events))
        };

        match result {
            Ok((value, events)) => {
                state.sequence += 1;
                let sequence = state.sequence;
                state.world = draft;
                state
                    .events
                    .extend(events.into_iter().map(|event| EventRecord { sequence, event }));
                tracing::debug!(sequence, "transaction committed");
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "transaction aborted");
                Err(e)
            }
        }
    }

    /// Fails with [`ProtocolError::Reentrancy`] when called from inside one of
    /// this ledger's own transactions.
    fn ensure_outside_transaction(&self) -> Result<(), ProtocolError> {
        let writer = self.writer.lock().map_err(|_| ProtocolError::LockPoisoned)?;
        if *writer == Some(thread::current().id()) {
            Err(ProtocolError::Reentrancy)
        } else {
            Ok(())
        }
    }

    /// Run a read-only closure against the committed state.
    pub fn read<T>(&self, f: impl FnOnce(&World) -> T) -> Result<T, ProtocolError> {
        self.ensure_outside_transaction()?;
        let state = self.state.read().map_err(|_| ProtocolError::LockPoisoned)?;
        Ok(f(&state.world))
    }

    /// Clone the full ledger state.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, ProtocolError> {
        self.ensure_outside_transaction()?;
        let state = self.state.read().map_err(|_| ProtocolError::LockPoisoned)?;
        Ok(state.clone())
    }

    /// Number of committed transactions.
    pub fn sequence(&self) -> Result<u64, ProtocolError> {
        self.ensure_outside_transaction()?;
        let state = self.state.read().map_err(|_| ProtocolError::LockPoisoned)?;
        Ok(state.sequence)
    }

    /// Committed events, oldest first.
    pub fn events(&self) -> Result<Vec<EventRecord>, ProtocolError> {
        self.ensure_outside_transaction()?;
        let state = self.state.read().map_err(|_| ProtocolError::LockPoisoned)?;
        Ok(state.events.clone())
    }

    pub fn registry(&self) -> Result<Registry, ProtocolError> {
        self.read(|world| world.registry.clone())
    }

    pub fn persona(&self, address: &Address) -> Result<Persona, ProtocolError> {
        self.read(|world| world.persona(address).cloned())?
            .ok_or_else(|| ProtocolError::NotFound(format!("Persona: no persona at {}", address)))
    }

    pub fn validator(&self, address: &Address) -> Result<Validator, ProtocolError> {
        self.read(|world| world.validator(address).cloned())?
            .ok_or_else(|| {
                ProtocolError::NotFound(format!("Validator: no validator at {}", address))
            })
    }

    // ------------------------------------------------------------------
    // Registry operations
    // ------------------------------------------------------------------

    pub fn persona_self_registry(
        &self,
        caller: Address,
        name: Bytes32,
    ) -> Result<Address, ProtocolError> {
        let persona = self.transact(|tx| {
            tx.world.registry.ensure_persona_registrable(&caller)?;
            let address = tx.world.persona_factory.next_address();
            tx.world
                .personas
                .insert(address, Persona::new(address, caller, name));
            tx.world.registry.record_persona(caller, address);
            tx.emit(LedgerEvent::PersonaRegistered {
                owner: caller,
                persona: address,
                name,
            });
            Ok(address)
        })?;

        tracing::info!(owner = %caller, %persona, name = %name.to_text(), "persona registered");
        Ok(persona)
    }

    pub fn validator_self_registry(
        &self,
        caller: Address,
        name: Bytes32,
        public_key: Bytes32,
    ) -> Result<Address, ProtocolError> {
        let validator = self.transact(|tx| {
            tx.world.registry.ensure_validator_registrable(&caller)?;
            let address = tx.world.validator_factory.next_address();
            tx.world.validators.insert(
                address,
                Validator::new(address, caller, name, public_key),
            );
            tx.world.registry.record_validator(caller, address);
            tx.emit(LedgerEvent::ValidatorRegistered {
                owner: caller,
                validator: address,
                name,
            });
            Ok(address)
        })?;

        tracing::info!(owner = %caller, %validator, name = %name.to_text(), "validator registered");
        Ok(validator)
    }

    pub fn change_require_role_validator(
        &self,
        caller: Address,
        required: bool,
    ) -> Result<(), ProtocolError> {
        self.transact(|tx| {
            tx.world
                .registry
                .change_require_role_validator(&caller, required)?;
            tx.emit(LedgerEvent::RequireRoleValidatorChanged { required });
            Ok(())
        })?;
        tracing::info!(required, "validator role requirement changed");
        Ok(())
    }

    pub fn change_require_role_persona(
        &self,
        caller: Address,
        required: bool,
    ) -> Result<(), ProtocolError> {
        self.transact(|tx| {
            tx.world
                .registry
                .change_require_role_persona(&caller, required)?;
            tx.emit(LedgerEvent::RequireRolePersonaChanged { required });
            Ok(())
        })?;
        tracing::info!(required, "persona role requirement changed");
        Ok(())
    }

    /// Admin grant. Returns false if the account already held the role.
    pub fn grant_role(
        &self,
        caller: Address,
        role: Role,
        account: Address,
    ) -> Result<bool, ProtocolError> {
        self.transact(|tx| {
            let granted = tx.world.registry.grant_role(&caller, role, account)?;
            if granted {
                tx.emit(LedgerEvent::RoleGranted {
                    role,
                    account,
                    sender: caller,
                });
            }
            Ok(granted)
        })
    }

    /// Admin revoke. Returns false if the account did not hold the role.
    pub fn revoke_role(
        &self,
        caller: Address,
        role: Role,
        account: Address,
    ) -> Result<bool, ProtocolError> {
        self.transact(|tx| {
            let revoked = tx.world.registry.revoke_role(&caller, role, account)?;
            if revoked {
                tx.emit(LedgerEvent::RoleRevoked {
                    role,
                    account,
                    sender: caller,
                });
            }
            Ok(revoked)
        })
    }

    pub fn renounce_role(&self, caller: Address, role: Role) -> Result<bool, ProtocolError> {
        self.transact(|tx| {
            let revoked = tx.world.registry.renounce_role(&caller, role)?;
            if revoked {
                tx.emit(LedgerEvent::RoleRevoked {
                    role,
                    account: caller,
                    sender: caller,
                });
            }
            Ok(revoked)
        })
    }

    // ------------------------------------------------------------------
    // Persona operations
    // ------------------------------------------------------------------

    pub fn add_field(
        &self,
        caller: Address,
        persona: Address,
        document_type: DocumentType,
        encrypted_value: impl Into<String>,
        value_hash: Bytes32,
        link_hashes: Vec<Bytes32>,
    ) -> Result<(), ProtocolError> {
        let field = Field {
            encrypted_value: encrypted_value.into(),
            value_hash,
            link_hashes,
        };
        self.transact(|tx| {
            tx.world
                .persona_mut(&persona)?
                .add_field(&caller, document_type, field)?;
            tx.emit(LedgerEvent::FieldAdded {
                persona,
                document_type,
                value_hash,
            });
            Ok(())
        })?;
        tracing::debug!(%persona, document_type = %document_type.to_text(), "field added");
        Ok(())
    }

    /// Ask `validator` to validate a declared document.
    ///
    /// The persona's request is marked Pending before the validator's queue
    /// is touched. Returns the request's queue index.
    pub fn ask_to_validate(
        &self,
        caller: Address,
        persona: Address,
        validator: Address,
        document_type: DocumentType,
        links: Vec<String>,
        note: impl Into<String>,
    ) -> Result<u64, ProtocolError> {
        let note = note.into();
        let queue_index = self.transact(|tx| {
            let world = &mut *tx.world;
            let owner_persona = world.personas.get_mut(&persona).ok_or_else(|| {
                ProtocolError::NotFound(format!("Persona: no persona at {}", persona))
            })?;
            owner_persona.ensure_owner(&caller)?;
            owner_persona.ensure_field(&document_type)?;

            let target = match world.validators.get_mut(&validator) {
                Some(v) if world.registry.is_validator(&validator) => v,
                _ => {
                    return Err(ProtocolError::NotFound(
                        "Persona: Address is not registered as validator".into(),
                    ))
                }
            };
            target.ensure_accepts(&document_type)?;

            let queue_index = target.next_queue_index();
            owner_persona.open_validation(validator, document_type, links, note, queue_index)?;
            let enqueued = target.enqueue(persona, document_type);
            debug_assert_eq!(enqueued, queue_index);

            tx.emit(LedgerEvent::ValidationRequested {
                persona,
                validator,
                document_type,
                queue_index,
            });
            Ok(queue_index)
        })?;

        tracing::info!(
            %persona,
            %validator,
            document_type = %document_type.to_text(),
            queue_index,
            "validation requested"
        );
        Ok(queue_index)
    }

    /// Resolve the request at absolute queue `index` of `validator`.
    ///
    /// The queue entry is marked processed before the persona is updated.
    /// `evidence` is stored on the persona without interpretation.
    pub fn process_validation(
        &self,
        caller: Address,
        validator: Address,
        index: u64,
        outcome: ValidationOutcome,
        evidence: impl Into<String>,
    ) -> Result<ValidationStatus, ProtocolError> {
        let evidence = evidence.into();
        let (persona, status) = self.transact(|tx| {
            let entry = tx
                .world
                .validator_mut(&validator)?
                .complete_validation(&caller, index)?;
            let status = tx.world.persona_mut(&entry.persona)?.resolve_validation(
                &validator,
                &entry.document_type,
                outcome,
                evidence,
            )?;
            tx.emit(LedgerEvent::ValidationProcessed {
                persona: entry.persona,
                validator,
                document_type: entry.document_type,
                queue_index: index,
                status,
            });
            Ok((entry.persona, status))
        })?;

        tracing::info!(%persona, %validator, index, %status, "validation processed");
        Ok(status)
    }

    /// Open inbox: any account may certify any persona.
    pub fn give_certificate(
        &self,
        caller: Address,
        persona: Address,
        certificate_type: Bytes32,
        content: impl Into<String>,
        signature: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Result<u64, ProtocolError> {
        let certificate = Certificate {
            issuer: caller,
            certificate_type,
            content: content.into(),
            signature: signature.into(),
            metadata: metadata.into(),
        };
        let inbox_index = self.transact(|tx| {
            let inbox_index = tx.world.persona_mut(&persona)?.give_certificate(certificate);
            tx.emit(LedgerEvent::CertificateGiven {
                persona,
                issuer: caller,
                certificate_type,
                inbox_index,
            });
            Ok(inbox_index)
        })?;

        tracing::info!(%persona, issuer = %caller, inbox_index, "certificate received");
        Ok(inbox_index)
    }

    /// Accept or reject the oldest pending certificate of `persona`.
    ///
    /// Despite the name, the queue head (oldest entry) is processed.
    pub fn process_last_pending_certificate(
        &self,
        caller: Address,
        persona: Address,
        accept: bool,
    ) -> Result<Certificate, ProtocolError> {
        let (certificate, decision) = self.transact(|tx| {
            let (inbox_index, certificate, decision) = tx
                .world
                .persona_mut(&persona)?
                .process_last_pending_certificate(&caller, accept)?;
            tx.emit(LedgerEvent::CertificateProcessed {
                persona,
                issuer: certificate.issuer,
                inbox_index,
                decision,
            });
            Ok((certificate, decision))
        })?;

        tracing::info!(%persona, issuer = %certificate.issuer, ?decision, "certificate processed");
        Ok(certificate)
    }

    // ------------------------------------------------------------------
    // Validator operations
    // ------------------------------------------------------------------

    pub fn add_document_type(
        &self,
        caller: Address,
        validator: Address,
        document_type: DocumentType,
    ) -> Result<(), ProtocolError> {
        self.transact(|tx| {
            let added = tx
                .world
                .validator_mut(&validator)?
                .add_document_type(&caller, document_type)?;
            if added {
                tx.emit(LedgerEvent::DocumentTypeAdded {
                    validator,
                    document_type,
                });
            }
            Ok(())
        })?;
        tracing::debug!(%validator, document_type = %document_type.to_text(), "document type accepted");
        Ok(())
    }
}
