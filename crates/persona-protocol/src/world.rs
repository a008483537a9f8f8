use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use persona_core::{Address, ProtocolError};

use crate::factory::Factory;
use crate::persona::Persona;
use crate::registry::Registry;
use crate::validator::Validator;

/// Keyed world state: the registry plus every instance it created.
///
/// Personas and validators reference each other by address only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub(crate) registry: Registry,
    pub(crate) personas: BTreeMap<Address, Persona>,
    pub(crate) validators: BTreeMap<Address, Validator>,
    pub(crate) persona_factory: Factory,
    pub(crate) validator_factory: Factory,
}

impl World {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn persona(&self, address: &Address) -> Option<&Persona> {
        self.personas.get(address)
    }

    pub fn validator(&self, address: &Address) -> Option<&Validator> {
        self.validators.get(address)
    }

    pub fn personas(&self) -> impl Iterator<Item = &Persona> {
        self.personas.values()
    }

    pub fn validators(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values()
    }

    pub(crate) fn persona_mut(&mut self, address: &Address) -> Result<&mut Persona, ProtocolError> {
        self.personas
            .get_mut(address)
            .ok_or_else(|| ProtocolError::NotFound(format!("Persona: no persona at {}", address)))
    }

    pub(crate) fn validator_mut(
        &mut self,
        address: &Address,
    ) -> Result<&mut Validator, ProtocolError> {
        self.validators
            .get_mut(address)
            .ok_or_else(|| {
                ProtocolError::NotFound(format!("Validator: no validator at {}", address))
            })
    }
}
