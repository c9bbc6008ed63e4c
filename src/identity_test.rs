use super::*;
use serde_json::json;

#[test]
fn id_reads_top_level_string() {
    let record = IdentityRecord::new(json!({ "id": "u1", "name": "Alice" }));
    assert_eq!(record.id(), Some("u1"));
}

#[test]
fn id_missing_or_non_string_is_none() {
    assert_eq!(IdentityRecord::new(json!({ "name": "Alice" })).id(), None);
    assert_eq!(IdentityRecord::new(json!({ "id": 42 })).id(), None);
    assert_eq!(IdentityRecord::new(json!("u1")).id(), None);
}

#[test]
fn records_compare_by_value() {
    let a = IdentityRecord::new(json!({ "id": "u1", "color": "#123456" }));
    let b = IdentityRecord::from(json!({ "color": "#123456", "id": "u1" }));
    let c = IdentityRecord::new(json!({ "id": "u2" }));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn deserialize_null_as_absent_identity() {
    let parsed: Option<IdentityRecord> = serde_json::from_str("null").unwrap();
    assert!(parsed.is_none());

    let parsed: Option<IdentityRecord> = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
    assert_eq!(parsed.and_then(|r| r.id().map(str::to_owned)), Some("u1".to_owned()));
}

#[test]
fn serializes_transparently() {
    let record = IdentityRecord::new(json!({ "id": "u1" }));
    assert_eq!(serde_json::to_value(&record).unwrap(), json!({ "id": "u1" }));
    assert_eq!(record.into_inner(), json!({ "id": "u1" }));
}

#[test]
fn error_kind_maps_each_variant() {
    assert_eq!(IdentityCheckError::Unauthorized { status: 401 }.kind(), FailureKind::Unauthorized);
    assert_eq!(IdentityCheckError::Transport("refused".into()).kind(), FailureKind::Transport);
    assert_eq!(
        IdentityCheckError::Status { status: 502, body: String::new() }.kind(),
        FailureKind::Status(502)
    );
    assert_eq!(IdentityCheckError::Decode("eof".into()).kind(), FailureKind::Decode);
}

#[test]
fn error_display_includes_status() {
    let err = IdentityCheckError::Unauthorized { status: 403 };
    assert_eq!(err.to_string(), "not authenticated: status 403");
    let err = IdentityCheckError::Status { status: 500, body: "boom".into() };
    assert_eq!(err.to_string(), "identity response error: status 500");
}
