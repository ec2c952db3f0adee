use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app::App;
use crate::domain::{Record, RecordId};
use crate::error::LensError;
use crate::providers::MetadataProvider;
use crate::store::RecordStore;

pub const INTERNAL_ERROR: &str = "Internal Server Error";
pub const SAVED_MESSAGE: &str = "Metadata saved successfully";
pub const DELETED_MESSAGE: &str = "Records deleted successfully";

#[derive(Debug, Serialize, Deserialize)]
pub struct FetchRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub ids: Option<Vec<RecordId>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FetchResponse {
    pub message: String,
    pub data: Record,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// What callers get to see: a status and a message, nothing finer.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string()),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

pub fn router<S, P>(app: Arc<App<S, P>>) -> Router
where
    S: RecordStore + 'static,
    P: MetadataProvider + 'static,
{
    Router::new()
        .route("/fetch-metadata", post(fetch_metadata::<S, P>))
        .route("/metadata-list", get(metadata_list::<S, P>))
        .route("/delete", delete(delete_records::<S, P>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app)
}

pub async fn serve<S, P>(app: Arc<App<S, P>>, addr: SocketAddr) -> Result<(), LensError>
where
    S: RecordStore + 'static,
    P: MetadataProvider + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| LensError::Server(format!("bind {addr}: {err}")))?;
    let local = listener
        .local_addr()
        .map_err(|err| LensError::Server(err.to_string()))?;
    tracing::info!(addr = %local, "server listening");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| LensError::Server(err.to_string()))?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn fetch_metadata<S, P>(
    State(app): State<Arc<App<S, P>>>,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FetchResponse>), ApiError>
where
    S: RecordStore + 'static,
    P: MetadataProvider + 'static,
{
    let Json(request) = payload.map_err(bad_json)?;
    let url = request
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| {
            tracing::warn!("fetch-metadata without url");
            ApiError::BadRequest("URL is required".to_string())
        })?;

    let record = run_blocking(move || app.fetch_and_store(&url)).await?;
    Ok((
        StatusCode::CREATED,
        Json(FetchResponse {
            message: SAVED_MESSAGE.to_string(),
            data: record,
        }),
    ))
}

async fn metadata_list<S, P>(
    State(app): State<Arc<App<S, P>>>,
) -> Result<Json<Vec<Record>>, ApiError>
where
    S: RecordStore + 'static,
    P: MetadataProvider + 'static,
{
    let records = run_blocking(move || app.list()).await?;
    Ok(Json(records))
}

async fn delete_records<S, P>(
    State(app): State<Arc<App<S, P>>>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: RecordStore + 'static,
    P: MetadataProvider + 'static,
{
    let Json(request) = payload.map_err(bad_json)?;
    let ids = request.ids.ok_or_else(|| {
        tracing::warn!("delete without ids");
        ApiError::BadRequest("ids are required".to_string())
    })?;

    let result = run_blocking(move || app.delete(&ids)).await?;
    tracing::debug!(requested = result.requested, removed = result.removed, "delete handled");
    Ok(Json(MessageResponse {
        message: DELETED_MESSAGE.to_string(),
    }))
}

fn bad_json(rejection: JsonRejection) -> ApiError {
    tracing::warn!(error = %rejection, "rejected request body");
    ApiError::BadRequest(rejection.body_text())
}

/// Store and provider clients block, so they run off the async workers.
/// Their errors were already logged by `App`; here they collapse to 500.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, LensError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(ApiError::Internal),
        Err(err) => {
            tracing::error!(error = %err, "blocking task failed");
            Err(ApiError::Internal)
        }
    }
}
