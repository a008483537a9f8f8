use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use persona_core::{Address, ProtocolError, Role};

/// Sparse (role, account) → granted capability table shared by every entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleTable {
    grants: BTreeMap<Role, BTreeSet<Address>>,
}

impl RoleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `account` holds `role`.
    pub fn has_role(&self, role: &Role, account: &Address) -> bool {
        self.grants
            .get(role)
            .is_some_and(|members| members.contains(account))
    }

    /// Grant `role` to `account`. Returns false if it was already held.
    pub fn grant(&mut self, role: Role, account: Address) -> bool {
        self.grants.entry(role).or_default().insert(account)
    }

    /// Revoke `role` from `account`. Returns false if it was not held.
    pub fn revoke(&mut self, role: &Role, account: &Address) -> bool {
        let Some(members) = self.grants.get_mut(role) else {
            return false;
        };
        let removed = members.remove(account);
        if members.is_empty() {
            self.grants.remove(role);
        }
        removed
    }

    /// Fail with an authorization error unless `account` holds `role`.
    pub fn require(&self, role: &Role, account: &Address, reason: &str) -> Result<(), ProtocolError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(ProtocolError::Authorization(reason.to_string()))
        }
    }

    /// All accounts holding `role`, in address order.
    pub fn members(&self, role: &Role) -> Vec<Address> {
        self.grants
            .get(role)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of accounts holding `role`.
    pub fn member_count(&self, role: &Role) -> usize {
        self.grants.get(role).map_or(0, |m| m.len())
    }
}
