use axum::{extract::State, http::StatusCode, Extension, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use crate::storage::{image_path, StorageError};

use super::super::{ApiError, ApiResponse, AppState};

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UploadRequest {
    /// Raw base64 or a `data:<type>;base64,` URL.
    pub base64: String,
    pub filename: String,
    #[serde(alias = "contentType")]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct UploadResponse {
    pub url: String,
    pub path: String,
}

/// Splits an optional data-URL header off the payload, returning the
/// declared media type if there was one.
fn strip_data_url(payload: &str) -> (Option<&str>, &str) {
    if let Some(rest) = payload.strip_prefix("data:") {
        if let Some((header, data)) = rest.split_once(',') {
            let media_type = header.strip_suffix(";base64").filter(|t| !t.is_empty());
            return (media_type, data);
        }
    }
    (None, payload)
}

/// POST /api/v1/admin/uploads
pub(in crate::api) async fn upload_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<UploadRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UploadResponse>>), ApiError> {
    let rid = &req_id.0;
    let Some(storage) = state.storage.as_ref() else {
        return Err(ApiError::new(
            rid,
            "storage_unavailable",
            "image storage is not configured",
        ));
    };

    if body.filename.trim().is_empty() || body.base64.trim().is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "base64 and filename are required",
        ));
    }

    let (declared, data) = strip_data_url(body.base64.trim());
    let content_type = body
        .content_type
        .as_deref()
        .or(declared)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_owned();
    if !content_type.starts_with("image/") {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("content type must be an image, got '{content_type}'"),
        ));
    }

    let bytes = STANDARD
        .decode(data)
        .map_err(|e| ApiError::new(rid, "validation_error", format!("invalid base64: {e}")))?;
    if bytes.is_empty() {
        return Err(ApiError::new(rid, "validation_error", "image is empty"));
    }

    let path = image_path(&body.filename, &bytes);
    let url = storage
        .upload(&path, bytes, &content_type)
        .await
        .map_err(|e| match e {
            StorageError::Rejected { status: 409, .. } => {
                ApiError::new(rid, "conflict", "an identical image already exists")
            }
            other => {
                tracing::error!(error = %other, "image upload failed");
                ApiError::new(rid, "storage_error", "image upload failed")
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UploadResponse { url, path }, req_id.0)),
    ))
}
