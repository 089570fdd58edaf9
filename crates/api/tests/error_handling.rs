//! Tests for error mapping: direct `AppError` conversions and the error
//! bodies produced by real requests.

mod common;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use common::{body_json, build_test_app, get, post_json, send};
use herald_api::error::AppError;
use herald_core::error::CoreError;
use herald_db::StoreError;
use herald_events::ServiceError;
use serde_json::json;

// ---------------------------------------------------------------------------
// AppError -> response mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn core_validation_maps_to_400() {
    let response = AppError::Core(CoreError::Validation("title too long".into())).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "title too long");
}

#[tokio::test]
async fn service_not_found_maps_to_404() {
    let id = uuid::Uuid::new_v4();
    let err = ServiceError::NotFound {
        op: "get notification",
        id,
    };
    let response = AppError::from(err).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["error"].as_str().unwrap().contains(&id.to_string()));
}

#[tokio::test]
async fn invalid_transition_maps_to_409() {
    let err = ServiceError::Store {
        op: "update notification status",
        source: StoreError::InvalidTransition {
            id: uuid::Uuid::new_v4(),
        },
    };
    let response = AppError::from(err).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn store_failure_maps_to_sanitized_500() {
    let err = ServiceError::Store {
        op: "list notifications",
        source: StoreError::Corrupt("bad status 'archived'".into()),
    };
    let response = AppError::from(err).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Errors from real requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_user_header_is_401() {
    let app = build_test_app();

    for uri in [
        "/api/v1/notifications",
        "/api/v1/notifications/unread-count",
        "/api/v1/notifications/ws",
    ] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
    }

    let uri = "/api/v1/notifications/read-all";
    let response = send(&app, Method::POST, uri, Some("  "), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_create_payloads_are_400() {
    let app = build_test_app();

    let blank_recipient = post_json(
        &app,
        "/api/v1/notifications",
        json!({ "recipient_id": "   ", "type": "system", "title": "Hi" }),
    )
    .await;
    assert_eq!(blank_recipient.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(blank_recipient).await["code"], "VALIDATION_ERROR");

    let long_title = post_json(
        &app,
        "/api/v1/notifications",
        json!({ "recipient_id": "u1", "type": "system", "title": "x".repeat(256) }),
    )
    .await;
    assert_eq!(long_title.status(), StatusCode::BAD_REQUEST);

    let unknown_type = post_json(
        &app,
        "/api/v1/notifications",
        json!({ "recipient_id": "u1", "type": "carrier_pigeon", "title": "Hi" }),
    )
    .await;
    assert!(unknown_type.status().is_client_error());
}

#[tokio::test]
async fn bad_paging_is_400() {
    let app = build_test_app();

    for uri in [
        "/api/v1/notifications?limit=0",
        "/api/v1/notifications?offset=-1",
    ] {
        let response = get(&app, uri, Some("u1")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn unknown_id_is_404() {
    let app = build_test_app();
    let uri = format!("/api/v1/notifications/{}/read", uuid::Uuid::new_v4());

    let response = send(&app, Method::POST, &uri, Some("u1"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
