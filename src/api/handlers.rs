use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::{AlertRule, NewAlert};
use crate::data::{Message, QueueStats};
use crate::storage::{QueueStore, StoreError};

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<QueueStore>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Queues
// ============================================================================

#[derive(Serialize, Deserialize)]
pub struct QueuesResponse {
    pub queues: Vec<QueueStats>,
}

pub async fn list_queues(State(state): State<Arc<AppState>>) -> Json<QueuesResponse> {
    Json(QueuesResponse {
        queues: state.store.all_queue_stats(),
    })
}

pub async fn queue_info(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<QueueStats>, ApiError> {
    Ok(Json(state.store.queue_stats(&name)?))
}

pub async fn delete_queue(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.store.delete_queue(&name)?;
    Ok(Json(StatusResponse::new("Deleted")))
}

#[derive(Serialize, Deserialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

pub async fn clear_queue(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ClearResponse>, ApiError> {
    let cleared = state.store.clear(&name)?;
    Ok(Json(ClearResponse { cleared }))
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Serialize, Deserialize)]
pub struct NewMessage {
    pub body: String,
}

#[derive(Serialize, Deserialize)]
pub struct PostMessagesRequest {
    pub messages: Vec<NewMessage>,
}

#[derive(Serialize, Deserialize)]
pub struct PostMessagesResponse {
    pub ids: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
pub struct BatchParams {
    #[serde(default = "default_batch")]
    pub n: usize,
}

fn default_batch() -> usize {
    1
}

pub async fn post_messages(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<PostMessagesRequest>,
) -> Result<Json<PostMessagesResponse>, ApiError> {
    let bodies = request.messages.into_iter().map(|m| m.body).collect();
    let ids = state.store.post(&name, bodies)?;
    Ok(Json(PostMessagesResponse { ids }))
}

/// Reserve messages without removing them
pub async fn reserve_messages(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<BatchParams>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let messages = state.store.reserve(&name, params.n)?;
    Ok(Json(MessagesResponse { messages }))
}

/// Remove and return messages in one step
pub async fn take_messages(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<BatchParams>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let messages = state.store.get(&name, params.n)?;
    Ok(Json(MessagesResponse { messages }))
}

pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.store.delete_message(&name, &id)?;
    Ok(Json(StatusResponse::new("Deleted")))
}

pub async fn release_message(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.store.release(&name, &id)?;
    Ok(Json(StatusResponse::new("Released")))
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertRule>,
}

pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AlertsResponse>, ApiError> {
    let alerts = state.store.list_alerts(&name)?;
    Ok(Json(AlertsResponse { alerts }))
}

pub async fn add_alert(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    request: Result<Json<NewAlert>, JsonRejection>,
) -> Result<(StatusCode, Json<AlertRule>), ApiError> {
    let Json(request) = request?;
    let rule = state.store.add_alert(&name, &request)?;
    Ok((StatusCode::CREATED, Json(rule)))
}

// ============================================================================
// Responses and Errors
// ============================================================================

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub msg: String,
}

impl StatusResponse {
    fn new(msg: &str) -> Self {
        Self {
            msg: msg.to_string(),
        }
    }
}

/// Body of every error response
#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else {
            ApiError::BadRequest(err.to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
