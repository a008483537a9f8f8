use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use persona_core::{Address, Bytes32, ProtocolError, RegistryConfig, Role};

use crate::roles::RoleTable;

const NOT_ADMIN: &str = "AccessControl: sender must be an admin";
const SELF_REGISTRY_DISABLED: &str = "Registry: Self registry disabled";
const DEPLOYER_KEEPS_ADMIN: &str = "Registry: deployer admin role cannot be removed";

/// Directory and access-control root.
///
/// Owner → instance mappings are write-once; there is no removal path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    address: Address,
    name: Bytes32,
    deployer: Address,
    roles: RoleTable,
    owner_to_persona: BTreeMap<Address, Address>,
    owner_to_validator: BTreeMap<Address, Address>,
    require_role_persona: bool,
    require_role_validator: bool,
    persona_factory: Address,
    validator_factory: Address,
}

impl Registry {
    /// Construct the registry and grant `deployer` the admin role.
    pub fn new(
        address: Address,
        deployer: Address,
        config: &RegistryConfig,
        persona_factory: Address,
        validator_factory: Address,
    ) -> Result<Self, ProtocolError> {
        let name = Bytes32::from_text(&config.name)?;
        let mut roles = RoleTable::new();
        roles.grant(Role::ADMIN, deployer);
        Ok(Self {
            address,
            name,
            deployer,
            roles,
            owner_to_persona: BTreeMap::new(),
            owner_to_validator: BTreeMap::new(),
            require_role_persona: config.require_role_persona,
            require_role_validator: config.require_role_validator,
            persona_factory,
            validator_factory,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> Bytes32 {
        self.name
    }

    /// Account that deployed the registry. It holds the admin role for life.
    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn persona_factory(&self) -> Address {
        self.persona_factory
    }

    pub fn validator_factory(&self) -> Address {
        self.validator_factory
    }

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    pub fn has_role(&self, role: &Role, account: &Address) -> bool {
        self.roles.has_role(role, account)
    }

    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    pub fn ensure_admin(&self, caller: &Address) -> Result<(), ProtocolError> {
        self.roles.require(&Role::ADMIN, caller, NOT_ADMIN)
    }

    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, ProtocolError> {
        self.ensure_admin(caller)?;
        Ok(self.roles.grant(role, account))
    }

    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, ProtocolError> {
        self.ensure_admin(caller)?;
        self.ensure_removable(&role, &account)?;
        Ok(self.roles.revoke(&role, &account))
    }

    /// Drop a role held by the caller itself.
    pub fn renounce_role(&mut self, caller: &Address, role: Role) -> Result<bool, ProtocolError> {
        self.ensure_removable(&role, caller)?;
        Ok(self.roles.revoke(&role, caller))
    }

    fn ensure_removable(&self, role: &Role, account: &Address) -> Result<(), ProtocolError> {
        if *role == Role::ADMIN && *account == self.deployer {
            return Err(ProtocolError::Policy(DEPLOYER_KEEPS_ADMIN.into()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Policy flags
    // ------------------------------------------------------------------

    pub fn change_require_role_validator(
        &mut self,
        caller: &Address,
        required: bool,
    ) -> Result<(), ProtocolError> {
        self.ensure_admin(caller)?;
        self.require_role_validator = required;
        Ok(())
    }

    pub fn change_require_role_persona(
        &mut self,
        caller: &Address,
        required: bool,
    ) -> Result<(), ProtocolError> {
        self.ensure_admin(caller)?;
        self.require_role_persona = required;
        Ok(())
    }

    pub fn require_role_validator(&self) -> bool {
        self.require_role_validator
    }

    pub fn require_role_persona(&self) -> bool {
        self.require_role_persona
    }

    /// Whether any account may self-register a persona without a role.
    pub fn persona_self_registry_enabled(&self) -> bool {
        !self.require_role_persona
    }

    // ------------------------------------------------------------------
    // Directory
    // ------------------------------------------------------------------

    pub(crate) fn ensure_persona_registrable(&self, caller: &Address) -> Result<(), ProtocolError> {
        if self.require_role_persona && !self.has_role(&Role::persona_eligible(), caller) {
            return Err(ProtocolError::Policy(SELF_REGISTRY_DISABLED.into()));
        }
        if self.owner_to_persona.contains_key(caller) {
            return Err(ProtocolError::Duplicate(
                "Registry: persona already registered".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn ensure_validator_registrable(
        &self,
        caller: &Address,
    ) -> Result<(), ProtocolError> {
        if self.require_role_validator && !self.has_role(&Role::validator_eligible(), caller) {
            return Err(ProtocolError::Policy(SELF_REGISTRY_DISABLED.into()));
        }
        if self.owner_to_validator.contains_key(caller) {
            return Err(ProtocolError::Duplicate(
                "Registry: validator already registered".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn record_persona(&mut self, owner: Address, persona: Address) {
        self.owner_to_persona.insert(owner, persona);
        self.roles.grant(Role::persona(), persona);
    }

    pub(crate) fn record_validator(&mut self, owner: Address, validator: Address) {
        self.owner_to_validator.insert(owner, validator);
        self.roles.grant(Role::validator(), validator);
    }

    pub fn owner_to_persona(&self, owner: &Address) -> Option<Address> {
        self.owner_to_persona.get(owner).copied()
    }

    pub fn owner_to_validator(&self, owner: &Address) -> Option<Address> {
        self.owner_to_validator.get(owner).copied()
    }

    /// Whether `account` is a registered validator instance.
    pub fn is_validator(&self, account: &Address) -> bool {
        self.has_role(&Role::validator(), account)
    }

    /// Whether `account` is a registered persona instance.
    pub fn is_persona(&self, account: &Address) -> bool {
        self.has_role(&Role::persona(), account)
    }

    pub fn persona_count(&self) -> usize {
        self.owner_to_persona.len()
    }

    pub fn validator_count(&self) -> usize {
        self.owner_to_validator.len()
    }
}
