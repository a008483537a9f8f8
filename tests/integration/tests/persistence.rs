//! Integration test: ledger state survives a RocksDB round trip.

use std::path::PathBuf;

use persona_core::{ValidationOutcome, ValidationStatus};
use persona_integration_tests::{deploy_with_participants, passport, Accounts};
use persona_store::{LedgerConfig, LedgerStore};

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("persona-it-{}", rand::random::<u64>()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_validation_state_persists() {
    let dir = temp_dir();
    let accounts = Accounts::new();
    let (ledger, persona, validator) = deploy_with_participants(&accounts);
    ledger
        .ask_to_validate(accounts.persona_owner, persona, validator, passport(), vec![], "")
        .unwrap();

    {
        let store = LedgerStore::open(&dir).unwrap();
        store.save_ledger(&ledger).unwrap();
    }

    let store = LedgerStore::open(&dir).unwrap();
    let restored = store.load_ledger().unwrap().expect("saved ledger");
    assert_eq!(restored.sequence().unwrap(), ledger.sequence().unwrap());
    assert_eq!(
        restored
            .persona(&persona)
            .unwrap()
            .validation_status(&passport(), &validator),
        ValidationStatus::Pending
    );

    // the restored ledger keeps operating
    restored
        .process_validation(accounts.validator_owner, validator, 0, ValidationOutcome::Accepted, "ok")
        .unwrap();
    store.save_ledger(&restored).unwrap();
    let again = store.load_ledger().unwrap().unwrap();
    assert_eq!(again.validator(&validator).unwrap().queue_start(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_open_or_deploy_fresh_store() {
    let dir = temp_dir();
    let mut config = LedgerConfig::default();
    config.storage.data_dir = dir.clone();
    let accounts = Accounts::new();

    let (store, ledger) = LedgerStore::open_or_deploy(&config, accounts.registry_owner).unwrap();
    assert_eq!(ledger.registry().unwrap().name().to_text(), "Test Registry");
    assert_eq!(store.stored_sequence().unwrap(), Some(1));

    std::fs::remove_dir_all(&dir).ok();
}
