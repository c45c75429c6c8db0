use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use leaselens::auth::{
    account_router, AccountService, RepositoryError, TokenSigner, UserId, UserRecord, UserStore,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Default)]
struct InMemoryStore {
    records: Mutex<HashMap<String, UserRecord>>,
}

impl UserStore for InMemoryStore {
    fn insert(&self, record: UserRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.username) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.username.clone(), record);
        Ok(())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(username).cloned())
    }

    fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.values().find(|record| &record.id == id).cloned())
    }
}

fn router() -> Router {
    let service = Arc::new(AccountService::new(
        Arc::new(InMemoryStore::default()),
        TokenSigner::new("test-secret"),
    ));
    account_router(service)
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request builds")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn register(app: &Router, username: &str, password: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/register",
            json!({ "username": username, "password": password }),
        ))
        .await
        .expect("router responds");
    response.status()
}

async fn login_token(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/login",
            json!({ "username": username, "password": password }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Login successful.");
    body["token"].as_str().expect("token present").to_string()
}

#[tokio::test]
async fn register_login_profile_refresh_round_trip() {
    let app = router();

    assert_eq!(register(&app, "renter", "hunter2").await, StatusCode::CREATED);
    let token = login_token(&app, "renter", "hunter2").await;

    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/api/profile", &token))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["username"], "renter");
    assert_eq!(profile["message"], "Profile retrieved successfully");
    assert!(profile["userId"].as_str().expect("userId present").starts_with("user-"));

    let response = app
        .clone()
        .oneshot(bearer_request("POST", "/api/refresh-token", &token))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = body_json(response).await;
    assert_eq!(refreshed["message"], "Token refreshed successfully.");
    let new_token = refreshed["token"].as_str().expect("token present");

    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/api/profile", new_token))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_usernames_are_rejected() {
    let app = router();
    assert_eq!(register(&app, "renter", "hunter2").await, StatusCode::CREATED);
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/register",
            json!({ "username": "renter", "password": "other" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Username already exists.");
}

#[tokio::test]
async fn missing_credentials_are_rejected() {
    let app = router();
    for uri in ["/api/register", "/api/login"] {
        let response = app
            .clone()
            .oneshot(json_request(uri, json!({ "username": "renter" })))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Username and password are required.");
    }
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = router();
    assert_eq!(register(&app, "renter", "hunter2").await, StatusCode::CREATED);
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/login",
            json!({ "username": "renter", "password": "wrong" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid username or password.");
}

#[tokio::test]
async fn protected_endpoints_require_a_valid_token() {
    let app = router();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/profile")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(bearer_request("POST", "/api/refresh-token", "not-a-token"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
