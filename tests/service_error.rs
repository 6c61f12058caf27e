//! Scenario tests for error construction, factories and serialization.

use serde_json::json;
use service_errors::{
    ConfigError, DEFAULT_ERROR, Definition, ErrorLike, Factory, ForeignError, GenericError,
    NO_BACKTRACE_MARKER, Registry, ServiceError, ServiceErrorVariant, StructuredError,
    StructuredInner, args, define_errors, service_error, service_error_variant,
};
use std::sync::Arc;

define_errors! {
    fn registry() => {
        E_FAIL = ("FailError", "Fail %s: %d"),
        E_SPECIFIC_FAIL = ("SpecificFailError", "Fail %s: %d: %j"),
        E_RANDOM_FAIL = ("RandomFailError", "%s"),
        E_NOT_FOUND = ("NotFoundError", "%s not found", 404),
    }
}

service_error_variant! {
    /// Errors raised by the storage layer.
    pub struct StorageError, name = "StorageError";
}

fn factory() -> Factory {
    Factory::new(Some(Arc::new(registry()))).unwrap()
}

// ============================================================================
// Construction scenarios
// ============================================================================

#[test]
fn binds_leading_arguments_and_keeps_the_rest() {
    let err = service_error!(factory(), "E_FAIL", "x", 1, "extra");

    assert_eq!(err.code(), "E_FAIL");
    assert_eq!(err.name(), "FailError");
    assert_eq!(err.message(), "Fail x: 1");
    assert_eq!(err.raw_message(), "Fail %s: %d");
    assert_eq!(err.data(), &[json!("x"), json!(1), json!("extra")]);
    assert!(err.inner_error().is_none());
}

#[test]
fn unknown_code_becomes_internal_error() {
    let err = service_error!(factory(), "E_DOES_NOT_EXIST");

    assert_eq!(err.code(), "E_INTERNAL");
    assert_eq!(err.name(), "InternalError");
    assert_eq!(err.message(), "Internal error");
    assert!(err.is(&DEFAULT_ERROR));
}

#[test]
fn error_like_first_argument_becomes_inner_error() {
    let err = service_error!(factory(), "E_FAIL", GenericError::new("boom"));

    let inner = err.inner_error().expect("inner error");
    assert_eq!(inner.error_message(), "boom");
    assert!(err.data().is_empty());
    assert_eq!(err.message(), "Fail %s: %d");
}

#[test]
fn missing_registry_is_rejected_at_construction() {
    let err = Factory::new(None).unwrap_err();
    assert!(matches!(err, ConfigError::MissingRegistry));

    let err = StorageError::factory(None).unwrap_err();
    assert!(matches!(err, ConfigError::MissingRegistry));
}

#[test]
fn variant_factory_produces_both_capabilities() {
    let factory = StorageError::factory(Some(Arc::new(registry()))).unwrap();
    let err: StorageError = factory.create("E_NOT_FOUND", args!["bucket"]);

    let base: &ServiceError = err.as_ref();
    assert_eq!(base.code(), "E_NOT_FOUND");
    assert_eq!(base.message(), "bucket not found");
    assert_eq!(err.name(), "StorageError");
    assert_eq!(err.status_code(), 404);

    let dynamic: &dyn ErrorLike = &err;
    assert!(dynamic.as_service_error().is_some());
    assert_eq!(dynamic.error_name(), "StorageError");
}

#[test]
fn variant_falls_back_like_the_base_factory() {
    let factory = StorageError::factory(Some(Arc::new(registry()))).unwrap();
    let err = factory.create("E_NOPE", args![]);
    assert!(err.is_internal());
    assert_eq!(err.name(), "StorageError");
}

#[test]
fn specific_fail_renders_every_placeholder_kind() {
    let err = service_error!(factory(), "E_SPECIFIC_FAIL", "string", 0, json!({ "a": 1 }));
    assert_eq!(err.message(), "Fail string: 0: {\"a\":1}");
}

#[test]
fn fewer_arguments_leave_tokens() {
    let err = service_error!(factory(), "E_SPECIFIC_FAIL", "only");
    assert_eq!(err.message(), "Fail only: %d: %j");
}

#[test]
fn status_hint_flows_from_definition() {
    let err = service_error!(factory(), "E_NOT_FOUND", "user");
    assert_eq!(err.status_code(), 404);
    assert_eq!(service_error!(factory(), "E_FAIL").status_code(), 500);
}

#[test]
fn foreign_std_error_can_be_a_cause() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = service_error!(factory(), "E_RANDOM_FAIL", ForeignError::new(io), "write failed");

    let structured = err.to_structured();
    let inner = structured.inner_error.expect("inner error");
    assert_eq!(inner.name(), "Error");
    assert_eq!(inner.message(), "denied");
}

#[test]
fn foreign_cause_stack_follows_capture() {
    let adapted = ForeignError::new(std::io::Error::other("denied"));
    let captured = adapted.stack().is_some();
    let err = service_error!(factory(), "E_RANDOM_FAIL", adapted, "outer");

    let display = err.to_display_string();
    let header = "innerError: Error: denied\n      ";
    let after = display
        .split_once(header)
        .map(|(_, rest)| rest)
        .expect("inner error header");
    assert_eq!(after.starts_with(NO_BACKTRACE_MARKER), !captured, "{display}");
}

// ============================================================================
// Structured form
// ============================================================================

#[test]
fn structured_form_uses_camel_case_keys() {
    let inner = GenericError::new("fail").with_code("inner_code");
    let err = service_error!(factory(), "E_RANDOM_FAIL", inner, "failure message", json!({ "data": 1 }));

    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(
        value,
        json!({
            "code": "E_RANDOM_FAIL",
            "name": "RandomFailError",
            "message": "failure message",
            "rawMessage": "%s",
            "data": ["failure message", { "data": 1 }],
            "innerError": { "name": "Error", "message": "fail", "code": "inner_code" }
        })
    );
}

#[test]
fn three_level_chain_serializes_nested_mappings() {
    let factory = factory();
    let root = GenericError::new("disk full");
    let low = service_error!(factory, "E_RANDOM_FAIL", root, "low");
    let mid = service_error!(factory, "E_NOT_FOUND", low, "mid");
    let top = service_error!(factory, "E_FAIL", mid, "top", 3);

    let structured = top.to_structured();
    assert_eq!(structured.depth(), 4);

    let value = serde_json::to_value(&top).unwrap();
    assert_eq!(value["innerError"]["code"], "E_NOT_FOUND");
    assert_eq!(value["innerError"]["innerError"]["code"], "E_RANDOM_FAIL");
    assert_eq!(value["innerError"]["innerError"]["innerError"]["message"], "disk full");
}

#[test]
fn structured_form_round_trips() {
    let err = service_error!(
        factory(),
        "E_NOT_FOUND",
        service_error!(factory(), "E_RANDOM_FAIL", GenericError::new("x").with_field("port", 1), "inner"),
        "outer"
    );

    let json = serde_json::to_string(&err).unwrap();
    let parsed: StructuredError = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, err.to_structured());

    match parsed.inner_error.as_deref() {
        Some(StructuredInner::Typed(typed)) => {
            assert_eq!(typed.code, "E_RANDOM_FAIL");
            match typed.inner_error.as_deref() {
                Some(StructuredInner::Foreign(record)) => assert_eq!(record.fields["port"], 1),
                other => panic!("expected foreign record, got {other:?}"),
            }
        }
        other => panic!("expected typed inner error, got {other:?}"),
    }
}

// ============================================================================
// Display form
// ============================================================================

#[test]
fn display_form_includes_every_level() {
    let inner = GenericError::new("fail").with_code("inner_code");
    let err = service_error!(factory(), "E_RANDOM_FAIL", inner, "failure message", json!({ "data": 1 }));
    let display = err.to_display_string();

    assert!(display.starts_with("RandomFailError: failure message"));
    assert!(display.contains("code: 'E_RANDOM_FAIL'"));
    assert!(display.contains("innerError: Error: fail"));
    assert!(display.contains("code: 'inner_code'"));
    assert!(display.contains("data: [ 'failure message', { data: 1 } ]"));
}

#[test]
fn plain_display_is_one_line() {
    let err = service_error!(factory(), "E_NOT_FOUND", "user");
    assert_eq!(err.to_string(), "NotFoundError: user not found");
    assert_eq!(format!("{err:#}"), err.to_display_string());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn factory_from_json_configuration() {
    let factory = Factory::from_value(&json!({
        "E_TIMEOUT": { "code": "E_TIMEOUT", "name": "TimeoutError", "message": "Timed out after %d ms", "status": 504 }
    }))
    .unwrap();

    let err = factory.create("E_TIMEOUT", args![250.7]);
    assert_eq!(err.message(), "Timed out after 250 ms");
    assert_eq!(err.status_code(), 504);
}

#[test]
fn invalid_configuration_is_reported() {
    assert!(matches!(
        Factory::from_value(&json!("E_FAIL")),
        Err(ConfigError::InvalidRegistry { found: "a string" })
    ));
    assert!(matches!(
        Registry::from_json_str(r#"{ "E_X": { "code": "E_X" } }"#),
        Err(ConfigError::MalformedDefinition { .. })
    ));
}

#[test]
fn direct_construction_with_definition() {
    let def = Definition::new("E_DIRECT", "DirectError", "Direct %s");
    let err = ServiceError::new(&def, args!["call"]);
    assert_eq!(err.message(), "Direct call");

    let err = factory().create(&def, args!["call"]);
    assert!(err.is_internal(), "unregistered definitions fall back");
    assert_eq!(err.data()[0]["code"], "E_DIRECT");
}

#[test]
fn errors_cross_threads() {
    let factory = factory();
    let handle = std::thread::spawn(move || service_error!(factory, "E_FAIL", "thread", 7));
    let err = handle.join().unwrap();
    assert_eq!(err.message(), "Fail thread: 7");
}
