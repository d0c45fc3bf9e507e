//! Axum request handlers for the HTTP API.
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::routes::AppState;
use crate::auth::PIN_HEADER;
use crate::backend::GenerationRequest;
use crate::error::{AppError, AppResult};
use crate::prompt::Style;
use crate::upload::{self, TempUpload};

pub async fn root() -> &'static str {
    "Family Stylizer"
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub pin: Option<String>,
}

/// A body that is not `{"pin": "<string>"}` counts as a missing PIN.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let pin = match &payload {
        Ok(Json(body)) => body.pin.as_deref(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable auth body");
            None
        }
    };
    state.gate.verify(pin)?;
    Ok(Json(json!({"success": true})))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let backend = state.backend.name();
    let url = state.backend.base_url().to_string();
    match state.backend.health().await {
        Ok(info) => {
            let mut body = match info {
                Value::Object(map) => map,
                _ => serde_json::Map::new(),
            };
            body.insert("status".into(), json!("ok"));
            body.insert("backend".into(), json!(backend));
            body.insert("url".into(), json!(url));
            (StatusCode::OK, Json(Value::Object(body))).into_response()
        }
        Err(e) => {
            tracing::error!(backend, error = %e, "health check failed");
            let body = json!({
                "status": "error",
                "backend": backend,
                "url": url,
                "error": "Backend unavailable",
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

struct GenerateForm {
    image: Vec<u8>,
    file_name: Option<String>,
    content_type: String,
    style: Style,
}

fn unreadable_upload(e: axum::extract::multipart::MultipartError) -> AppError {
    tracing::warn!(error = %e, "failed to read multipart body");
    AppError::BadRequest("Upload could not be read (images must be 10MB or smaller)".to_string())
}

async fn read_generate_form(mut multipart: Multipart) -> AppResult<GenerateForm> {
    let mut image = None;
    let mut style = Style::default();

    while let Some(field) = multipart.next_field().await.map_err(unreadable_upload)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let content_type = upload::validate_content_type(field.content_type())?.to_string();
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(unreadable_upload)?;
                upload::validate_size(bytes.len())?;
                image = Some((bytes.to_vec(), file_name, content_type));
            }
            "style" => {
                let raw = field.text().await.map_err(unreadable_upload)?;
                style = Style::from_field(&raw);
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    let (image, file_name, content_type) =
        image.ok_or_else(|| AppError::BadRequest("No image uploaded".to_string()))?;
    Ok(GenerateForm { image, file_name, content_type, style })
}

fn image_response(bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        bytes,
    )
        .into_response()
}

/// The PIN is checked before the body is looked at, so a wrong PIN is always a 401.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let pin = headers.get(PIN_HEADER).and_then(|v| v.to_str().ok());
    state.gate.verify(pin)?;

    let multipart = multipart.map_err(|rejection| {
        tracing::warn!(error = %rejection, "generate body is not multipart");
        AppError::BadRequest("Upload could not be read (expected multipart/form-data)".to_string())
    })?;
    let GenerateForm { image, file_name, content_type, style } = read_generate_form(multipart).await?;
    let upload = TempUpload::persist(&state.config.upload_dir, &image, file_name.as_deref()).await?;
    tracing::info!(%style, size = image.len(), backend = state.backend.name(), "generating");
    drop(image);

    let request = GenerationRequest {
        image_path: upload.path().to_path_buf(),
        file_name: upload.file_name(),
        content_type,
        style,
    };
    let result = state.backend.generate(&request).await;
    upload.cleanup().await;

    let bytes = result?;
    tracing::info!(size = bytes.len(), "generation finished");
    Ok(image_response(bytes))
}
