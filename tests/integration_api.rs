//! API Integration Tests
//!
//! Router-level tests over a real database, driving the service the way an
//! HTTP client would.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;
use tower::util::ServiceExt;

use bank_service::api::{self, AppState};

mod common;

fn app(pool: sqlx::PgPool, allow_seed: bool) -> Router {
    api::create_router().with_state(AppState { pool, allow_seed })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn decimal_field(value: &Value, field: &str) -> Decimal {
    Decimal::from_str(value[field].as_str().expect("field missing")).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_account_lifecycle_e2e() {
    let pool = common::setup_test_db().await;
    let app = app(pool, false);

    // Create
    let response = app
        .clone()
        .oneshot(post_json(
            "/accounts",
            json!({"name": "Alice", "iban": "BG80BNBG96611020345678", "initial_amount": "1000.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(decimal_field(&created, "available_amount"), dec!(1000.00));

    // Duplicate name conflicts
    let response = app
        .clone()
        .oneshot(post_json(
            "/accounts",
            json!({"name": "Alice", "iban": "BG80BNBG96611020345999"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error_code"], "name_taken");

    // Freeze / unfreeze
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/accounts/{id}/freeze"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "FROZEN");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/accounts/{id}/unfreeze"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "ACTIVE");

    // Update
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/accounts/{id}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "name": "Alice B.",
                        "iban": "BG80BNBG96611020345678",
                        "available_amount": "900.00"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["name"], "Alice B.");
    assert_eq!(decimal_field(&updated, "available_amount"), dec!(900.00));

    // Delete, then 404
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/accounts/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get(&format!("/accounts/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_batch_create_rejects_intra_batch_duplicates() {
    let pool = common::setup_test_db().await;
    let app = app(pool.clone(), false);

    let response = app
        .clone()
        .oneshot(post_json(
            "/accounts/batch",
            json!([
                {"name": "X", "iban": "BG11TEST00000000000001"},
                {"name": "X", "iban": "BG11TEST00000000000002"}
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // All-or-nothing: nothing was inserted
    let response = app.clone().oneshot(get("/accounts")).await.unwrap();
    let accounts = body_json(response).await;
    assert_eq!(accounts.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_transfer_e2e() {
    let pool = common::setup_test_db().await;
    let a = common::create_account(&pool, "A", "BG11TEST00000000000001", "ACTIVE", dec!(100.00))
        .await;
    let b = common::create_account(&pool, "B", "BG11TEST00000000000002", "ACTIVE", dec!(50.00))
        .await;
    let app = app(pool.clone(), false);

    let response = app
        .clone()
        .oneshot(post_json(
            "/transfers",
            json!({"from_account_id": a, "to_account_id": b, "amount": "25.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let debit = body_json(response).await;
    assert_eq!(debit["type"], "DEBIT");
    assert_eq!(debit["account_id"].as_i64(), Some(a));
    assert_eq!(debit["beneficiary_account_id"].as_i64(), Some(b));
    assert_eq!(decimal_field(&debit, "amount"), dec!(25.00));

    // Balances after
    let response = app.clone().oneshot(get(&format!("/accounts/{a}"))).await.unwrap();
    assert_eq!(
        decimal_field(&body_json(response).await, "available_amount"),
        dec!(75.00)
    );
    let response = app.clone().oneshot(get(&format!("/accounts/{b}"))).await.unwrap();
    assert_eq!(
        decimal_field(&body_json(response).await, "available_amount"),
        dec!(75.00)
    );

    // The account's ledger shows both legs
    let response = app
        .clone()
        .oneshot(get(&format!("/transfers/account/{a}")))
        .await
        .unwrap();
    let rows = body_json(response).await;
    assert_eq!(rows.as_array().unwrap().len(), 2);

    // Single row fetch
    let id = debit["id"].as_i64().unwrap();
    let response = app.clone().oneshot(get(&format!("/transfers/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/transfers/999999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transfer_idempotency_header() {
    let pool = common::setup_test_db().await;
    let a = common::create_account(&pool, "A", "BG11TEST00000000000001", "ACTIVE", dec!(100.00))
        .await;
    let b = common::create_account(&pool, "B", "BG11TEST00000000000002", "ACTIVE", dec!(0.00))
        .await;
    let app = app(pool.clone(), false);

    let request = |key: &str| {
        Request::builder()
            .method("POST")
            .uri("/transfers")
            .header("content-type", "application/json")
            .header("Idempotency-Key", key)
            .body(Body::from(
                json!({"from_account_id": a, "to_account_id": b, "amount": "30.00"}).to_string(),
            ))
            .unwrap()
    };

    let first = body_json(app.clone().oneshot(request("req-1")).await.unwrap()).await;
    let second = body_json(app.clone().oneshot(request("req-1")).await.unwrap()).await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(common::balance_of(&pool, a).await, dec!(70.00));
    assert_eq!(common::balance_of(&pool, b).await, dec!(30.00));

    // A different key is a new transfer
    let third = body_json(app.clone().oneshot(request("req-2")).await.unwrap()).await;
    assert_ne!(first["id"], third["id"]);
    assert_eq!(common::balance_of(&pool, a).await, dec!(40.00));
}

#[tokio::test]
async fn test_transfer_error_statuses() {
    let pool = common::setup_test_db().await;
    let a = common::create_account(&pool, "A", "BG11TEST00000000000001", "ACTIVE", dec!(10.00))
        .await;
    let frozen =
        common::create_account(&pool, "F", "BG11TEST00000000000002", "FROZEN", dec!(10.00)).await;
    let app = app(pool.clone(), false);

    // Self transfer
    let response = app
        .clone()
        .oneshot(post_json(
            "/transfers",
            json!({"from_account_id": a, "to_account_id": a, "amount": "1.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "same_account_transfer");

    // Non-positive amount
    let response = app
        .clone()
        .oneshot(post_json(
            "/transfers",
            json!({"from_account_id": a, "to_account_id": frozen, "amount": "0.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "invalid_amount");

    // Unknown account
    let response = app
        .clone()
        .oneshot(post_json(
            "/transfers",
            json!({"from_account_id": a, "to_account_id": 424242, "amount": "1.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "account_not_found");
    assert_eq!(body["details"], "424242");

    // Frozen destination
    let response = app
        .clone()
        .oneshot(post_json(
            "/transfers",
            json!({"from_account_id": a, "to_account_id": frozen, "amount": "1.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "destination_frozen");

    // Insufficient funds
    let active =
        common::create_account(&pool, "B", "BG11TEST00000000000003", "ACTIVE", dec!(0.00)).await;
    let response = app
        .clone()
        .oneshot(post_json(
            "/transfers",
            json!({"from_account_id": a, "to_account_id": active, "amount": "10.01"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "insufficient_funds");
}

#[tokio::test]
async fn test_delete_account_with_history_is_rejected() {
    let pool = common::setup_test_db().await;
    let a = common::create_account(&pool, "A", "BG11TEST00000000000001", "ACTIVE", dec!(100.00))
        .await;
    let b = common::create_account(&pool, "B", "BG11TEST00000000000002", "ACTIVE", dec!(0.00))
        .await;
    let app = app(pool.clone(), false);

    let response = app
        .clone()
        .oneshot(post_json(
            "/transfers",
            json!({"from_account_id": a, "to_account_id": b, "amount": "5.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/accounts/{b}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "account_in_use");
}

#[tokio::test]
async fn test_seed_endpoint_gating() {
    let pool = common::setup_test_db().await;

    // Disabled: hidden as 404
    let response = app(pool.clone(), false)
        .oneshot(post_json("/accounts/seed", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Enabled: the three demo accounts
    let response = app(pool.clone(), true)
        .oneshot(post_json("/accounts/seed", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let accounts = body_json(response).await;
    assert_eq!(accounts.as_array().unwrap().len(), 3);
    assert_eq!(accounts[0]["name"], "Alice");
    assert_eq!(decimal_field(&accounts[1], "available_amount"), dec!(250.00));
}
