//! Shared fixtures for the cross-crate scenario tests.

use persona_core::{Address, Bytes32, RegistryConfig};
use persona_protocol::Ledger;
use persona_store::{LogFormat, LoggingConfig};

/// Accounts used across scenarios.
pub struct Accounts {
    pub registry_owner: Address,
    pub persona_owner: Address,
    pub not_persona: Address,
    pub validator_owner: Address,
    pub certificate_issuer: Address,
}

impl Accounts {
    pub fn new() -> Self {
        Self {
            registry_owner: Address::from_label("registry-owner"),
            persona_owner: Address::from_label("persona-owner"),
            not_persona: Address::from_label("not-persona"),
            validator_owner: Address::from_label("validator-owner"),
            certificate_issuer: Address::from_label("certificate-issuer"),
        }
    }
}

impl Default for Accounts {
    fn default() -> Self {
        Self::new()
    }
}

/// Word encoding of a short literal. Panics on strings over 31 bytes.
pub fn word(text: &str) -> Bytes32 {
    Bytes32::from_text(text).expect("fixture text fits in a word")
}

pub fn passport() -> Bytes32 {
    word("Passport")
}

/// Value hash of the fixture document.
pub fn document_value_hash() -> Bytes32 {
    Bytes32::hash(b"test")
}

/// Link hashes of the fixture document.
pub fn document_link_hashes() -> Vec<Bytes32> {
    vec![Bytes32::hash(b"test1")]
}

/// Registry where personas register freely and validators need a role.
pub fn deploy_registry(accounts: &Accounts) -> Ledger {
    init_tracing();
    let config = RegistryConfig {
        name: "TestRegistry".into(),
        require_role_persona: false,
        require_role_validator: true,
    };
    Ledger::deploy(accounts.registry_owner, &config).expect("deploy registry")
}

/// Registry plus one persona holding a Passport and one validator accepting it.
///
/// Returns `(ledger, persona, validator)`.
pub fn deploy_with_participants(accounts: &Accounts) -> (Ledger, Address, Address) {
    let ledger = deploy_registry(accounts);
    let persona = ledger
        .persona_self_registry(accounts.persona_owner, word("TestPersona"))
        .expect("persona registration");
    ledger
        .add_field(
            accounts.persona_owner,
            persona,
            passport(),
            "testEncrypted",
            document_value_hash(),
            document_link_hashes(),
        )
        .expect("add passport");

    ledger
        .change_require_role_validator(accounts.registry_owner, false)
        .expect("open validator registration");
    let validator = ledger
        .validator_self_registry(accounts.validator_owner, word("TestValidator"), word("pubkey"))
        .expect("validator registration");
    ledger
        .add_document_type(accounts.validator_owner, validator, passport())
        .expect("accept passport");

    (ledger, persona, validator)
}

/// Install a test subscriber once. Later calls are no-ops.
pub fn init_tracing() {
    let config = LoggingConfig {
        level: "debug".into(),
        format: LogFormat::Text,
    };
    let _ = persona_store::logging::init_for_tests(&config);
}
