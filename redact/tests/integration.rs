use rig_guard_redact::{
    PiiCatalog, PiiCategory, PiiRule, RedactError, RedactionConfig, RedactionSession, generators,
};
use std::sync::Arc;

const CUSTOMER_NOTE: &str = "Customer Jane wrote from jane.doe@corp.example.io. \
Call her at (415) 555-0132 or +44 20 7946 0958. \
SSN 123-45-6789, card 4111 1111 1111 1111, passport X12345678, \
license D123-4567-8901, IBAN DE89370400440532013000. \
Ship to 1600 Pennsylvania Avenue, Washington, DC 20500.";

#[test]
fn test_every_category_round_trips() {
    let mut session = RedactionSession::with_config(RedactionConfig::default().with_seed(3));
    let masked = session.redact(CUSTOMER_NOTE).unwrap();

    for original in [
        "jane.doe@corp.example.io",
        "(415) 555-0132",
        "+44 20 7946 0958",
        "123-45-6789",
        "4111 1111 1111 1111",
        "X12345678",
        "D123-4567-8901",
        "DE89370400440532013000",
        "1600 Pennsylvania Avenue, Washington, DC 20500",
    ] {
        assert!(!masked.contains(original), "{original} leaked: {masked}");
    }

    let mut categories: Vec<PiiCategory> = session.redactions().map(|r| r.category).collect();
    categories.sort();
    categories.dedup();
    assert_eq!(categories.len(), 9);

    assert_eq!(session.refill(&masked), CUSTOMER_NOTE);
}

#[test]
fn test_refill_model_reply_with_mocks_rearranged() {
    let mut session = RedactionSession::with_config(RedactionConfig::default().with_seed(5));
    let masked = session
        .redact("My email is brandon@happydata.org and my phone is 315-444-3211")
        .unwrap();

    let mocks: Vec<(String, String)> = session
        .redactions()
        .map(|r| (r.mock.clone(), r.original.clone()))
        .collect();
    assert_eq!(mocks.len(), 2);
    assert!(masked.contains(&mocks[0].0));

    // The model echoes the mocks back in a different order.
    let reply = format!("Noted: phone {} and email {}.", mocks[1].0, mocks[0].0);
    let restored = session.refill(&reply);
    assert_eq!(
        restored,
        format!("Noted: phone {} and email {}.", mocks[1].1, mocks[0].1)
    );
}

#[test]
fn test_sessions_are_independent() {
    let mut first = RedactionSession::with_config(RedactionConfig::default().with_seed(1));
    let second = RedactionSession::with_config(RedactionConfig::default().with_seed(1));

    let masked = first.redact("ssn 123-45-6789").unwrap();
    assert_eq!(second.count(), 0);
    assert_eq!(second.refill(&masked), masked);
}

#[test]
fn test_custom_catalog() {
    let rule = PiiRule::new(
        PiiCategory::Passport,
        r"\bEMP-\d{5}\b",
        |rng| format!("EMP-{}", generators::zipcode(rng)),
    )
    .unwrap();
    let mut session = RedactionSession::with_catalog(
        Arc::new(PiiCatalog::new(vec![rule])),
        RedactionConfig::default().with_seed(9),
    );

    let masked = session.redact("badge EMP-00042, ssn 123-45-6789").unwrap();
    assert!(!masked.contains("EMP-00042"));
    assert!(masked.contains("123-45-6789"));
    assert_eq!(session.count(), 1);
    assert_eq!(session.refill(&masked), "badge EMP-00042, ssn 123-45-6789");
}

#[test]
fn test_collision_reports_category_and_attempts() {
    let rule = PiiRule::new(PiiCategory::Email, r"\S+@\S+", |_| "x@y.z".to_string()).unwrap();
    let mut session = RedactionSession::with_catalog(
        Arc::new(PiiCatalog::new(vec![rule])),
        RedactionConfig::default().with_max_attempts(3).with_seed(0),
    );

    let err = session.redact("a@b.c d@e.f").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not generate a unique email mock value after 3 attempts"
    );
    assert!(matches!(err, RedactError::GenerationCollision { attempts: 3, .. }));
}
