//! End-to-end tests: router + Plaid client + Supabase client against
//! wiremock servers standing in for both upstreams.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cashflow_gateway::api::{create_router, AppState};
use cashflow_gateway::config::{Config, PlaidEnvironment};
use cashflow_gateway::provider::PlaidClient;
use cashflow_gateway::store::SupabaseStore;
use cashflow_gateway::Gateway;

struct Upstreams {
    plaid: MockServer,
    supabase: MockServer,
}

impl Upstreams {
    async fn start() -> Self {
        Self {
            plaid: MockServer::start().await,
            supabase: MockServer::start().await,
        }
    }

    fn config(&self) -> Config {
        Config {
            plaid_client_id: "client-id".to_string(),
            plaid_secret: "secret".to_string(),
            plaid_env: PlaidEnvironment::Sandbox,
            plaid_base_url: Some(self.plaid.uri()),
            plaid_client_name: "CashFlowApp".to_string(),
            supabase_url: self.supabase.uri(),
            supabase_service_role_key: "service-key".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            http_timeout_ms: 2000,
            metrics_enabled: false,
            metrics_port: 9090,
        }
    }

    fn app(&self) -> Router {
        let config = self.config();
        let provider = PlaidClient::new(&config).unwrap();
        let store = SupabaseStore::new(&config).unwrap();
        create_router(AppState::new(Gateway::new(Arc::new(provider), Arc::new(store))))
    }
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn exchange_inserts_account_with_access_token() {
    let upstreams = Upstreams::start().await;

    Mock::given(method("POST"))
        .and(path("/item/public_token/exchange"))
        .and(body_partial_json(json!({ "public_token": "pt-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "item_id": "item-1",
            "request_id": "req-1"
        })))
        .expect(1)
        .mount(&upstreams.plaid)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/accounts"))
        .and(body_json(json!({ "user_id": "u1", "plaid_id": "at-1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": 1, "user_id": "u1", "plaid_id": "at-1", "balance": null }
        ])))
        .expect(1)
        .mount(&upstreams.supabase)
        .await;

    let (status, body) = post_json(
        upstreams.app(),
        "/get_access_token",
        json!({ "public_token": "pt-1", "user_id": "u1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "access_token": "at-1",
            "account": { "id": 1, "user_id": "u1", "plaid_id": "at-1", "balance": null }
        })
    );
}

#[tokio::test]
async fn failed_insert_after_exchange_is_500() {
    let upstreams = Upstreams::start().await;

    Mock::given(method("POST"))
        .and(path("/item/public_token/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "item_id": "item-1",
            "request_id": "req-1"
        })))
        .mount(&upstreams.plaid)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/accounts"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint",
            "details": null,
            "hint": null
        })))
        .mount(&upstreams.supabase)
        .await;

    let (status, body) = post_json(
        upstreams.app(),
        "/get_access_token",
        json!({ "public_token": "pt-1", "user_id": "u1" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("duplicate key"));
}

#[tokio::test]
async fn sync_accounts_patches_each_balance() {
    let upstreams = Upstreams::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "user_id": "u1", "plaid_id": "at-1", "balance": null },
            { "id": 2, "user_id": "u1", "plaid_id": "at-2", "balance": null }
        ])))
        .mount(&upstreams.supabase)
        .await;

    for (token, current) in [("at-1", json!(100)), ("at-2", Value::Null)] {
        Mock::given(method("POST"))
            .and(path("/accounts/get"))
            .and(body_partial_json(json!({ "access_token": token })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accounts": [{
                    "account_id": format!("{token}-acc"),
                    "balances": { "current": current, "available": null }
                }],
                "request_id": "req"
            })))
            .mount(&upstreams.plaid)
            .await;
    }

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("id", "eq.1"))
        .and(body_json(json!({ "balance": "100" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&upstreams.supabase)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("id", "eq.2"))
        .and(body_json(json!({ "balance": "0" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&upstreams.supabase)
        .await;

    let (status, body) =
        post_json(upstreams.app(), "/sync_accounts", json!({ "user_id": "u1" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "updated": 2 }));
}

#[tokio::test]
async fn sync_accounts_for_unknown_user_is_404() {
    let upstreams = Upstreams::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&upstreams.supabase)
        .await;

    let (status, body) =
        post_json(upstreams.app(), "/sync_accounts", json!({ "user_id": "u1" })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "no accounts found" }));
}

#[tokio::test]
async fn sync_transactions_writes_one_batch_per_account() {
    let upstreams = Upstreams::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "user_id": "u1", "plaid_id": "at-1", "balance": null }
        ])))
        .mount(&upstreams.supabase)
        .await;

    Mock::given(method("POST"))
        .and(path("/transactions/get"))
        .and(body_partial_json(json!({
            "access_token": "at-1",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [],
            "transactions": [
                { "transaction_id": "t1", "account_id": "a", "name": "Rent", "amount": 1200, "date": "2024-01-01" },
                { "transaction_id": "t2", "account_id": "a", "name": "Coffee", "amount": 3.5, "date": "2024-01-03" },
                { "transaction_id": "t3", "account_id": "a", "name": "Books", "amount": 22, "date": "2024-01-09" }
            ],
            "total_transactions": 3,
            "request_id": "req"
        })))
        .mount(&upstreams.plaid)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/actual_transactions"))
        .and(body_partial_json(json!([
            { "user_id": "u1", "account_id": 1, "description": "Rent", "date": "2024-01-01", "source": "plaid" },
            { "user_id": "u1", "account_id": 1, "description": "Coffee", "date": "2024-01-03", "source": "plaid" },
            { "user_id": "u1", "account_id": 1, "description": "Books", "date": "2024-01-09", "source": "plaid" }
        ])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&upstreams.supabase)
        .await;

    let (status, body) = post_json(
        upstreams.app(),
        "/sync_transactions",
        json!({ "user_id": "u1", "start_date": "2024-01-01", "end_date": "2024-01-31" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "transactions": 3 }));
}
