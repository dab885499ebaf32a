//!
//! taskdeck HTTP server
//! --------------------
//! This module defines the Axum-based HTTP API for taskdeck.
//!
//! Responsibilities:
//! - Bearer-token authentication on every identity-scoped route.
//! - Login endpoint backed by the user registry and token service.
//! - Task and user endpoints delegating to the registries and mapping their
//!   outcomes to status codes.
//! - Bootstrap of the default admin account on startup.
//!
//! Handlers stay thin: validation, authorization and state transitions all
//! live in the registries; this layer only translates HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::{get, patch, post}, Router, extract::{State, Path, Query}, Json};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::identity::{Principal, TokenService};
use crate::registry::{
    NewTask, NewUser, TaskFilter, TaskRegistry, TaskUpdate, UserRegistry, ensure_default_admin,
};
use crate::storage::SharedStore;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskRegistry,
    pub users: UserRegistry,
    pub tokens: Arc<TokenService>,
}

pub async fn run(cfg: Config) -> anyhow::Result<()> {
    let port = cfg.http_port;
    run_with_port(port, cfg).await
}

/// Start the taskdeck HTTP server bound to the given port.
///
/// Sets up the store, seeds the default admin account, and mounts all routes.
pub async fn run_with_port(http_port: u16, cfg: Config) -> anyhow::Result<()> {
    let store = SharedStore::new();
    ensure_default_admin(&store, &cfg.admin_password)?;

    let app = router(store, &cfg);

    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router over an existing store. Split out from
/// `run_with_port` so tests can mount the API without binding a socket.
pub fn router(store: SharedStore, cfg: &Config) -> Router {
    let tokens = Arc::new(TokenService::new(cfg));
    let state = AppState {
        tasks: TaskRegistry::new(store.clone()),
        users: UserRegistry::new(store, tokens.clone()),
        tokens,
    };
    Router::new()
        .route("/", get(|| async { "taskdeck ok" }))
        .route("/api/login", post(login))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", get(get_task).put(update_task).delete(delete_task))
        .route("/api/tasks/{id}/complete", patch(complete_task))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", get(get_user))
        .with_state(state)
}

fn bearer_token<'a>(headers: &'a HeaderMap) -> Option<&'a str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))
}

/// Extract and validate the caller identity; 401 without a valid token.
fn require_caller(state: &AppState, headers: &HeaderMap) -> AppResult<Principal> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::unauthenticated("missing_token", "missing bearer token"))?;
    Ok(state.tokens.validate(token)?)
}

/// Like `require_caller`, but an absent header means anonymous. A header
/// that is present but invalid is still a 401.
fn optional_caller(state: &AppState, headers: &HeaderMap) -> AppResult<Option<Principal>> {
    match bearer_token(headers) {
        None => Ok(None),
        Some(token) => Ok(Some(state.tokens.validate(token)?)),
    }
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

/// POST /api/login: verify credentials, return the raw signed token string.
async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> AppResult<String> {
    state.users.authenticate(&payload.username, &payload.password)
}

#[derive(Debug, Deserialize)]
struct TaskListQuery {
    description: Option<String>,
    pending_only: Option<bool>,
    /// Admin-only scope override; everyone else is pinned to their own tasks.
    owner: Option<String>,
}

async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<TaskListQuery>,
) -> AppResult<Response> {
    let caller = require_caller(&state, &headers)?;
    let filter = TaskFilter {
        description_contains: q.description,
        pending_only: q.pending_only.unwrap_or(false),
    };
    let scope = if caller.role.is_admin() { q.owner } else { Some(caller.user_id.clone()) };
    let tasks = state.tasks.list(&filter, scope.as_deref());
    if tasks.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(tasks).into_response())
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let caller = require_caller(&state, &headers)?;
    let task = state.tasks.get(id, &caller)?;
    Ok(Json(task).into_response())
}

async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewTask>,
) -> AppResult<Response> {
    let caller = require_caller(&state, &headers)?;
    let task = state.tasks.create(payload, &caller)?;
    let location = format!("/api/tasks/{}", task.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(task)).into_response())
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<TaskUpdate>,
) -> AppResult<Response> {
    let caller = require_caller(&state, &headers)?;
    let task = state.tasks.update(id, payload, &caller)?;
    Ok(Json(task).into_response())
}

async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let caller = require_caller(&state, &headers)?;
    let task = state.tasks.complete(id, &caller)?;
    Ok(Json(task).into_response())
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let caller = require_caller(&state, &headers)?;
    state.tasks.delete(id, &caller)?;
    Ok(StatusCode::OK.into_response())
}

async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let caller = require_caller(&state, &headers)?;
    let users = state.users.list_all(&caller)?;
    Ok(Json(users).into_response())
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let caller = require_caller(&state, &headers)?;
    let user = state.users.get(&id, &caller)?;
    Ok(Json(user).into_response())
}

/// POST /api/users: open to anonymous callers for default-role registration;
/// role assignment requires an authenticated admin.
async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewUser>,
) -> AppResult<Response> {
    let caller = optional_caller(&state, &headers)?;
    let user = state.users.create(payload, caller.as_ref())?;
    let location = format!("/api/users/{}", user.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(user)).into_response())
}
