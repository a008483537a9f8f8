use serde::{Deserialize, Serialize};

/// Construction parameters of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry display name, encoded as a 32-byte word (at most 31 bytes).
    pub name: String,
    /// Persona self-registration requires `PERSONA_ELIGIBLE_ROLE`.
    pub require_role_persona: bool,
    /// Validator self-registration requires `VALIDATOR_ELIGIBLE_ROLE`.
    pub require_role_validator: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: "Test Registry".into(),
            require_role_persona: false,
            require_role_validator: false,
        }
    }
}
