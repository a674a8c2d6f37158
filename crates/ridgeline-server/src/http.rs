//! REST surface of the reader service.
//!
//! Pure plumbing: each route forwards to the [`Registry`] and wraps the
//! result in the `{"success": bool, "message": ...}` envelope. Failures map
//! to HTTP 500 with the error text as the message.
//!
//! | Method | Path            | Body     | Success            |
//! |--------|-----------------|----------|--------------------|
//! | GET    | /api/user/{id}  | -        | user record        |
//! | GET    | /api/user       | -        | array of users     |
//! | POST   | /api/user       | metadata | created user       |
//! | PUT    | /api/user/{id}  | metadata | updated user       |
//! | DELETE | /api/user/{id}  | -        | deleted user       |
//!
//! `?fingerprints=1` on the GET routes opts into template inclusion.

use axum::{
    Router,
    extract::{Json as ExtractJson, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ridgeline_session::Registry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
}

/// JSON response envelope shared by all routes.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub message: Value,
}

impl Envelope {
    fn success(message: impl Serialize) -> Response {
        let message = serde_json::to_value(message).unwrap_or(Value::Null);
        (
            StatusCode::OK,
            Json(Envelope {
                success: true,
                message,
            }),
        )
            .into_response()
    }

    fn error(err: &ridgeline_core::Error) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Envelope {
                success: false,
                message: Value::String(err.to_string()),
            }),
        )
            .into_response()
    }
}

/// Query string of the GET routes.
#[derive(Debug, Default, Deserialize)]
pub struct FingerprintQuery {
    fingerprints: Option<String>,
}

impl FingerprintQuery {
    /// Templates are included only on an explicit `fingerprints=1`.
    fn include(&self) -> bool {
        self.fingerprints.as_deref() == Some("1")
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/user", get(list_users).post(add_user))
        .route(
            "/api/user/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/ws", get(crate::ws::upgrade))
        .with_state(state)
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FingerprintQuery>,
) -> Response {
    match state.registry.get_user(&id, query.include()).await {
        Ok(user) => Envelope::success(user),
        Err(err) => Envelope::error(&err),
    }
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<FingerprintQuery>,
) -> Response {
    match state.registry.users(query.include()).await {
        Ok(users) => Envelope::success(users),
        Err(err) => Envelope::error(&err),
    }
}

async fn add_user(State(state): State<AppState>, ExtractJson(data): ExtractJson<Value>) -> Response {
    match state.registry.add_user(data).await {
        Ok(user) => Envelope::success(user),
        Err(err) => Envelope::error(&err),
    }
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ExtractJson(data): ExtractJson<Value>,
) -> Response {
    match state.registry.update_user(&id, data).await {
        Ok(user) => Envelope::success(user),
        Err(err) => Envelope::error(&err),
    }
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.registry.delete_user(&id).await {
        Ok(user) => Envelope::success(user),
        Err(err) => Envelope::error(&err),
    }
}
