//! Integration test: field store and the persona ↔ validator validation protocol.

use persona_core::{Address, Bytes32, ProtocolError, ValidationOutcome, ValidationStatus};
use persona_integration_tests::{
    deploy_registry, deploy_with_participants, document_link_hashes, document_value_hash,
    passport, word, Accounts,
};

// =========================================================================
// Field store
// =========================================================================

#[test]
fn test_blank_value_hash_rejected() {
    let accounts = Accounts::new();
    let ledger = deploy_registry(&accounts);
    let persona = ledger
        .persona_self_registry(accounts.persona_owner, word("TestPersona"))
        .unwrap();

    let err = ledger
        .add_field(
            accounts.persona_owner,
            persona,
            passport(),
            "testEncrypted",
            word(""),
            document_link_hashes(),
        )
        .unwrap_err();
    assert_eq!(
        err,
        ProtocolError::EmptyInput("Persona: Document must not be empty".into())
    );
    assert!(!ledger.persona(&persona).unwrap().has_field(&passport()));
}

#[test]
fn test_field_added_then_repeated() {
    let accounts = Accounts::new();
    let (ledger, persona, _) = deploy_with_participants(&accounts);

    let record = ledger.persona(&persona).unwrap();
    let field = record.field(&passport()).unwrap();
    assert_eq!(field.encrypted_value, "testEncrypted");
    assert_eq!(field.value_hash, document_value_hash());
    assert_eq!(field.link_hashes, document_link_hashes());

    let err = ledger
        .add_field(
            accounts.persona_owner,
            persona,
            passport(),
            "testEncrypted",
            document_value_hash(),
            document_link_hashes(),
        )
        .unwrap_err();
    assert_eq!(err.reason(), "Persona: Document already added!");
}

#[test]
fn test_field_requires_owner() {
    let accounts = Accounts::new();
    let (ledger, persona, _) = deploy_with_participants(&accounts);
    let err = ledger
        .add_field(
            accounts.not_persona,
            persona,
            word("Other"),
            "testEncrypted",
            document_value_hash(),
            document_link_hashes(),
        )
        .unwrap_err();
    assert_eq!(
        err,
        ProtocolError::Authorization("Ownable: caller is not the owner".into())
    );
}

// =========================================================================
// Asking for validation
// =========================================================================

#[test]
fn test_ask_for_undeclared_document() {
    let accounts = Accounts::new();
    let (ledger, persona, validator) = deploy_with_participants(&accounts);
    let err = ledger
        .ask_to_validate(
            accounts.persona_owner,
            persona,
            validator,
            word("documento errado"),
            vec!["testLink".into()],
            "testHash",
        )
        .unwrap_err();
    assert_eq!(err, ProtocolError::NotFound("Persona: Document not added".into()));
}

#[test]
fn test_ask_non_validator_address() {
    let accounts = Accounts::new();
    let (ledger, persona, _) = deploy_with_participants(&accounts);
    let err = ledger
        .ask_to_validate(
            accounts.persona_owner,
            persona,
            accounts.not_persona,
            passport(),
            vec!["testLink".into()],
            "testHash",
        )
        .unwrap_err();
    assert_eq!(
        err.reason(),
        "Persona: Address is not registered as validator"
    );
}

#[test]
fn test_ask_persona_is_not_a_validator() {
    let accounts = Accounts::new();
    let (ledger, persona, _) = deploy_with_participants(&accounts);
    // a registered persona instance does not hold the validator role
    let err = ledger
        .ask_to_validate(
            accounts.persona_owner,
            persona,
            persona,
            passport(),
            vec![],
            "",
        )
        .unwrap_err();
    assert!(matches!(err, ProtocolError::NotFound(_)));
}

#[test]
fn test_ask_validator_without_document_type() {
    let accounts = Accounts::new();
    let (ledger, persona, validator) = deploy_with_participants(&accounts);
    ledger
        .add_field(
            accounts.persona_owner,
            persona,
            word("outro documento"),
            "testEncrypted",
            document_value_hash(),
            document_link_hashes(),
        )
        .unwrap();

    let err = ledger
        .ask_to_validate(
            accounts.persona_owner,
            persona,
            validator,
            word("outro documento"),
            vec!["testLink".into()],
            "testHash",
        )
        .unwrap_err();
    assert_eq!(
        err,
        ProtocolError::UnsupportedType(
            "Validator: Validator does not validate this kind of document".into()
        )
    );
    assert_eq!(ledger.validator(&validator).unwrap().queue_end(), 0);
}

#[test]
fn test_ask_requires_persona_owner() {
    let accounts = Accounts::new();
    let (ledger, persona, validator) = deploy_with_participants(&accounts);
    let err = ledger
        .ask_to_validate(accounts.not_persona, persona, validator, passport(), vec![], "")
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Authorization(_)));
}

// =========================================================================
// End-to-end validation
// =========================================================================

#[test]
fn test_send_and_process_validation() {
    let accounts = Accounts::new();
    let (ledger, persona, validator) = deploy_with_participants(&accounts);

    let index = ledger
        .ask_to_validate(
            accounts.persona_owner,
            persona,
            validator,
            passport(),
            vec!["testLink".into()],
            "testHash",
        )
        .unwrap();
    assert_eq!(index, 0);

    let record = ledger.persona(&persona).unwrap();
    let status = record.validation_status(&passport(), &validator);
    assert_eq!(status, ValidationStatus::Pending);
    assert_eq!(status.code(), 1);
    assert_eq!(record.validators(&passport()), &[validator]);

    let v = ledger.validator(&validator).unwrap();
    assert_eq!(v.queue_start(), 0);
    assert_eq!(v.queue_end(), 1);
    assert_eq!(v.queue_len(), 1);
    let next = v.next_validation().unwrap();
    assert_eq!(next.persona, persona);
    assert_eq!(next.document_type, passport());

    let status = ledger
        .process_validation(
            accounts.validator_owner,
            validator,
            0,
            ValidationOutcome::Accepted,
            "test",
        )
        .unwrap();
    assert_eq!(status, ValidationStatus::Accepted);

    let record = ledger.persona(&persona).unwrap();
    let status = record.validation_status(&passport(), &validator);
    assert!(!status.is_pending());
    let request = record.validation_request(&passport(), &validator).unwrap();
    assert_eq!(request.evidence.as_deref(), Some("test"));
    assert_eq!(request.links, vec!["testLink".to_string()]);

    let v = ledger.validator(&validator).unwrap();
    assert_eq!(v.queue_start(), 1);
    assert!(v.next_validation().is_none());
}

#[test]
fn test_process_validation_requires_validator_owner() {
    let accounts = Accounts::new();
    let (ledger, persona, validator) = deploy_with_participants(&accounts);
    ledger
        .ask_to_validate(accounts.persona_owner, persona, validator, passport(), vec![], "")
        .unwrap();

    let err = ledger
        .process_validation(
            accounts.persona_owner,
            validator,
            1,
            ValidationOutcome::Accepted,
            "test",
        )
        .unwrap_err();
    assert_eq!(
        err,
        ProtocolError::Authorization("Ownable: caller is not the owner".into())
    );
    let record = ledger.persona(&persona).unwrap();
    assert!(record.validation_status(&passport(), &validator).is_pending());
}

#[test]
fn test_duplicate_pending_request_rejected() {
    let accounts = Accounts::new();
    let (ledger, persona, validator) = deploy_with_participants(&accounts);
    ledger
        .ask_to_validate(accounts.persona_owner, persona, validator, passport(), vec![], "")
        .unwrap();
    let err = ledger
        .ask_to_validate(accounts.persona_owner, persona, validator, passport(), vec![], "")
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Duplicate(_)));
    assert_eq!(ledger.validator(&validator).unwrap().queue_end(), 1);
}

#[test]
fn test_revalidation_after_rejection() {
    let accounts = Accounts::new();
    let (ledger, persona, validator) = deploy_with_participants(&accounts);
    ledger
        .ask_to_validate(accounts.persona_owner, persona, validator, passport(), vec![], "")
        .unwrap();
    let status = ledger
        .process_validation(
            accounts.validator_owner,
            validator,
            0,
            ValidationOutcome::Rejected,
            "blurry scan",
        )
        .unwrap();
    assert_eq!(status, ValidationStatus::Rejected);

    let index = ledger
        .ask_to_validate(accounts.persona_owner, persona, validator, passport(), vec![], "rescan")
        .unwrap();
    assert_eq!(index, 1);
    let record = ledger.persona(&persona).unwrap();
    assert_eq!(record.validators(&passport()).len(), 1);
    assert!(record.validation_status(&passport(), &validator).is_pending());
}

#[test]
fn test_queue_drains_across_personas() {
    let accounts = Accounts::new();
    let (ledger, first, validator) = deploy_with_participants(&accounts);

    let second_owner = Address::from_label("second-owner");
    let second = ledger
        .persona_self_registry(second_owner, word("Second"))
        .unwrap();
    ledger
        .add_field(second_owner, second, passport(), "enc", Bytes32::hash(b"other"), vec![])
        .unwrap();

    ledger
        .ask_to_validate(accounts.persona_owner, first, validator, passport(), vec![], "")
        .unwrap();
    ledger
        .ask_to_validate(second_owner, second, validator, passport(), vec![], "")
        .unwrap();

    let v = ledger.validator(&validator).unwrap();
    assert_eq!(v.queue_len(), 2);
    assert_eq!(v.next_validation().unwrap().persona, first);

    ledger
        .process_validation(accounts.validator_owner, validator, 0, ValidationOutcome::Accepted, "ok")
        .unwrap();
    assert_eq!(
        ledger.validator(&validator).unwrap().next_validation().unwrap().persona,
        second
    );
    ledger
        .process_validation(accounts.validator_owner, validator, 1, ValidationOutcome::Accepted, "ok")
        .unwrap();

    let v = ledger.validator(&validator).unwrap();
    assert_eq!(v.queue_start(), 2);
    assert_eq!(v.queue_end(), 2);
    assert_eq!(
        ledger
            .persona(&second)
            .unwrap()
            .validation_status(&passport(), &validator),
        ValidationStatus::Accepted
    );

    // processed entries cannot be processed again
    let err = ledger
        .process_validation(accounts.validator_owner, validator, 1, ValidationOutcome::Accepted, "ok")
        .unwrap_err();
    assert!(matches!(err, ProtocolError::NotFound(_)));
}

#[test]
fn test_out_of_order_processing() {
    let accounts = Accounts::new();
    let (ledger, first, validator) = deploy_with_participants(&accounts);
    let second_owner = Address::from_label("second-owner");
    let second = ledger
        .persona_self_registry(second_owner, word("Second"))
        .unwrap();
    ledger
        .add_field(second_owner, second, passport(), "enc", Bytes32::hash(b"other"), vec![])
        .unwrap();
    ledger
        .ask_to_validate(accounts.persona_owner, first, validator, passport(), vec![], "")
        .unwrap();
    ledger
        .ask_to_validate(second_owner, second, validator, passport(), vec![], "")
        .unwrap();

    ledger
        .process_validation(accounts.validator_owner, validator, 1, ValidationOutcome::Accepted, "")
        .unwrap();
    let v = ledger.validator(&validator).unwrap();
    assert_eq!(v.queue_start(), 0);
    assert_eq!(v.outstanding(), 1);

    let err = ledger
        .process_validation(accounts.validator_owner, validator, 1, ValidationOutcome::Accepted, "")
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Duplicate(_)));

    ledger
        .process_validation(accounts.validator_owner, validator, 0, ValidationOutcome::Accepted, "")
        .unwrap();
    assert_eq!(ledger.validator(&validator).unwrap().queue_start(), 2);
}

#[test]
fn test_add_document_type_requires_owner() {
    let accounts = Accounts::new();
    let (ledger, _, validator) = deploy_with_participants(&accounts);
    let err = ledger
        .add_document_type(accounts.persona_owner, validator, word("DriverLicense"))
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Authorization(_)));
    let v = ledger.validator(&validator).unwrap();
    assert!(v.accepts(&passport()));
    assert!(!v.accepts(&word("DriverLicense")));
}
