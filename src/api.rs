use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::db::{CalendarHeader, CalendarWithDetails, DbError};
use crate::services::{CalendarService, UploadError, UploadRequest};

#[derive(Clone)]
pub struct AppState {
    pub calendar_service: CalendarService,
    pub default_uploader: String,
    pub max_upload_bytes: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_overwrite: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub header_id: i64,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            requires_overwrite: None,
        }),
    )
}

fn upload_error(err: UploadError) -> ApiError {
    match &err {
        UploadError::MissingInput | UploadError::Normalize(_) => {
            api_error(StatusCode::BAD_REQUEST, err.to_string())
        }
        UploadError::Conflict { .. } => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: err.to_string(),
                requires_overwrite: Some(true),
            }),
        ),
        UploadError::Database(_) | UploadError::Task(_) => {
            error!("Upload failed: {}", err);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/calendars", get(list_calendars))
        .route("/calendars/{id}", get(get_calendar))
        .route("/upload", post(upload_calendar))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[instrument(skip(state))]
async fn list_calendars(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarHeader>>, ApiError> {
    debug!("Fetching calendar headers");
    let headers = state.calendar_service.list_calendars().await.map_err(|e| {
        error!("Failed to list calendars: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    info!("Retrieved {} calendar headers", headers.len());
    Ok(Json(headers))
}

#[instrument(skip(state), fields(header_id = %id))]
async fn get_calendar(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CalendarWithDetails>, ApiError> {
    debug!("Fetching calendar {}", id);
    let calendar = state
        .calendar_service
        .get_calendar(id)
        .await
        .map_err(|e| match e {
            DbError::HeaderNotFound(_) => {
                warn!("Calendar {} not found", id);
                api_error(StatusCode::NOT_FOUND, "Calendar not found")
            }
            other => {
                error!("Failed to fetch calendar {}: {}", id, other);
                api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        })?;

    info!(
        "Retrieved calendar {} with {} days",
        id,
        calendar.details.len()
    );
    Ok(Json(calendar))
}

/// Multipart fields: `file`, `clientName`, optional `uploadedBy` and `overwrite`
#[instrument(skip(state, multipart))]
async fn upload_calendar(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut client_name = String::new();
    let mut uploaded_by: Option<String> = None;
    let mut overwrite = false;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart upload: {}", e);
        api_error(StatusCode::BAD_REQUEST, e.body_text())
    })? {
        let name = field.name().unwrap_or_default().to_string();
        let read_error = |e: axum::extract::multipart::MultipartError| {
            warn!("Failed to read multipart field {}: {}", name, e);
            api_error(StatusCode::BAD_REQUEST, e.body_text())
        };

        match name.as_str() {
            "file" => {
                let bytes = field.bytes().await.map_err(read_error)?;
                debug!("Received upload file ({} bytes)", bytes.len());
                file_bytes = Some(bytes.to_vec());
            }
            "clientName" => client_name = field.text().await.map_err(read_error)?,
            "uploadedBy" => uploaded_by = Some(field.text().await.map_err(read_error)?),
            "overwrite" => overwrite = field.text().await.map_err(read_error)?.trim() == "true",
            other => debug!("Ignoring multipart field {}", other),
        }
    }

    let uploaded_by = uploaded_by
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| state.default_uploader.clone());

    let outcome = state
        .calendar_service
        .upload(UploadRequest {
            client_name,
            uploaded_by,
            overwrite,
            file_bytes: file_bytes.unwrap_or_default(),
        })
        .await
        .map_err(upload_error)?;

    info!(
        "Upload stored as calendar {} ({} days)",
        outcome.header.header_id, outcome.records_stored
    );

    Ok(Json(UploadResponse {
        success: true,
        header_id: outcome.header.header_id,
        message: "Processed successfully".to_string(),
    }))
}
