use super::*;
use crate::identity::FailureKind;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use serde_json::json;

// =============================================================================
// parse_me_response
// =============================================================================

#[test]
fn ok_with_object_is_identity() {
    let record = parse_me_response(200, r#"{"id":"u1","name":"Alice"}"#)
        .unwrap()
        .unwrap();
    assert_eq!(record.id(), Some("u1"));
}

#[test]
fn ok_with_null_is_absent_identity() {
    assert!(parse_me_response(200, "null").unwrap().is_none());
}

#[test]
fn no_content_is_absent_identity() {
    assert!(parse_me_response(204, "").unwrap().is_none());
}

#[test]
fn unauthorized_and_forbidden_map_to_unauthorized() {
    for status in [401, 403] {
        let err = parse_me_response(status, "").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Unauthorized, "status {status}");
    }
}

#[test]
fn server_error_keeps_status() {
    let err = parse_me_response(500, "boom").unwrap_err();
    assert!(matches!(err, IdentityCheckError::Status { status: 500, ref body } if body == "boom"));
}

#[test]
fn long_error_body_is_truncated() {
    let body = "é".repeat(MAX_ERROR_BODY_CHARS + 100);
    let err = parse_me_response(502, &body).unwrap_err();
    let IdentityCheckError::Status { status, body: kept } = err else {
        panic!("expected status error");
    };
    assert_eq!(status, 502);
    assert_eq!(kept.chars().count(), MAX_ERROR_BODY_CHARS + 3);
    assert!(kept.ends_with("..."));
}

#[test]
fn short_error_body_is_kept_whole() {
    assert_eq!(truncate_body("boom"), "boom");
    let exact = "x".repeat(MAX_ERROR_BODY_CHARS);
    assert_eq!(truncate_body(&exact), exact);
}

#[test]
fn malformed_body_is_decode_error() {
    let err = parse_me_response(200, "{not json").unwrap_err();
    assert_eq!(err.kind(), FailureKind::Decode);
}

#[test]
fn non_object_body_is_decode_error() {
    let err = parse_me_response(200, r#""u1""#).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Decode);
}

// =============================================================================
// HttpIdentityCheck against a local server
// =============================================================================

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config_for(base_url: String, cookie: Option<&str>) -> SessionConfig {
    SessionConfig { base_url, cookie: cookie.map(str::to_owned), ..SessionConfig::default() }
}

async fn me_handler(headers: HeaderMap) -> Result<Json<serde_json::Value>, StatusCode> {
    let cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if cookie.contains("session_token=good") {
        Ok(Json(json!({ "id": "u1", "name": "Alice", "auth_method": "session" })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[tokio::test]
async fn fetches_identity_with_session_cookie() {
    let base = serve(Router::new().route("/api/auth/me", get(me_handler))).await;
    let check = HttpIdentityCheck::new(&config_for(base, Some("session_token=good"))).unwrap();

    let record = check.fetch_current_identity().await.unwrap().unwrap();
    assert_eq!(record.id(), Some("u1"));
    assert_eq!(record.as_json()["name"], "Alice");
}

#[tokio::test]
async fn missing_cookie_is_unauthorized() {
    let base = serve(Router::new().route("/api/auth/me", get(me_handler))).await;
    let check = HttpIdentityCheck::new(&config_for(base, None)).unwrap();

    let err = check.fetch_current_identity().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Unauthorized);
}

#[tokio::test]
async fn unknown_route_is_status_error() {
    let base = serve(Router::new()).await;
    let check = HttpIdentityCheck::new(&config_for(base, None)).unwrap();

    let err = check.fetch_current_identity().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Status(404));
}

#[tokio::test]
async fn closed_port_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let check = HttpIdentityCheck::new(&config_for(format!("http://{addr}"), None)).unwrap();
    let err = check.fetch_current_identity().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[test]
fn url_joins_base_and_path() {
    let check = HttpIdentityCheck::new(&config_for("http://127.0.0.1:9".to_owned(), None)).unwrap();
    assert_eq!(check.url(), "http://127.0.0.1:9/api/auth/me");
}
