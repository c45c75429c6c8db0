use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::repository::{RepositoryError, UserStore};
use super::service::{AccountError, AccountService};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Router builder exposing the account endpoints.
pub fn account_router<S>(service: Arc<AccountService<S>>) -> Router
where
    S: UserStore + 'static,
{
    Router::new()
        .route("/api/register", post(register_handler::<S>))
        .route("/api/login", post(login_handler::<S>))
        .route("/api/profile", get(profile_handler::<S>))
        .route("/api/refresh-token", post(refresh_handler::<S>))
        .with_state(service)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn missing_credentials() -> Response {
    let payload = json!({ "message": "Username and password are required." });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn unauthorized() -> Response {
    let payload = json!({ "message": "Invalid or missing token." });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

fn server_error(err: &AccountError) -> Response {
    let payload = json!({ "message": err.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

pub(crate) async fn register_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    Json(credentials): Json<CredentialsRequest>,
) -> Response
where
    S: UserStore + 'static,
{
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return missing_credentials();
    }

    match service.register(&credentials.username, &credentials.password) {
        Ok(_) => {
            let payload = json!({ "message": "User registered successfully." });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(AccountError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({ "message": "Username already exists." });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        Err(other) => server_error(&other),
    }
}

pub(crate) async fn login_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    Json(credentials): Json<CredentialsRequest>,
) -> Response
where
    S: UserStore + 'static,
{
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return missing_credentials();
    }

    match service.login(&credentials.username, &credentials.password) {
        Ok(token) => {
            let payload = json!({ "message": "Login successful.", "token": token });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(AccountError::InvalidCredentials) => {
            let payload = json!({ "message": "Invalid username or password." });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
        Err(other) => server_error(&other),
    }
}

pub(crate) async fn profile_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: UserStore + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return unauthorized();
    };

    match service.authenticate(token) {
        Ok(user) => {
            let payload = json!({
                "userId": user.id.0,
                "username": user.username,
                "message": "Profile retrieved successfully",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(AccountError::Token(_)) | Err(AccountError::Repository(RepositoryError::NotFound)) => {
            unauthorized()
        }
        Err(other) => server_error(&other),
    }
}

pub(crate) async fn refresh_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: UserStore + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return unauthorized();
    };

    match service.refresh(token) {
        Ok((user, token)) => {
            let payload = json!({
                "message": "Token refreshed successfully.",
                "token": token,
                "username": user.username,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(AccountError::Token(_)) | Err(AccountError::Repository(RepositoryError::NotFound)) => {
            unauthorized()
        }
        Err(other) => server_error(&other),
    }
}
