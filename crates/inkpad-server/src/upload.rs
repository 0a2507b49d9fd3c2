//! `POST /api/upload-image`: validate an image and forward it to the asset host.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use inkpad_api::{ApiError, ApiResult};
use inkpad_core::{Timestamp, now_utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::assets::{DynAssetHost, ImageUpload};
use crate::config::UploadConfig;

/// Name of the multipart field carrying the file.
pub const IMAGE_FIELD: &str = "image";

const NO_IMAGE: &str = "No image file provided";
const NOT_AN_IMAGE: &str = "File must be an image";
const UPLOAD_FAILED: &str = "Image upload failed";

/// What the upload route needs from the application state.
#[derive(Clone)]
pub struct UploadState {
    pub assets: DynAssetHost,
    pub limits: Arc<UploadConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub public_id: String,
    pub format: String,
    /// Stored size in bytes.
    pub size: u64,
    pub timestamp: Timestamp,
}

fn too_large(limits: &UploadConfig) -> ApiError {
    ApiError::bad_request(format!(
        "File too large. Maximum size is {}MB",
        limits.max_megabytes()
    ))
}

fn multipart_failure(err: MultipartError, limits: &UploadConfig) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(limits);
    }
    debug!(error = %err.body_text(), "unreadable multipart body");
    ApiError::bad_request(NO_IMAGE)
}

/// Reads the field, stopping as soon as it exceeds `limits.max_bytes`.
async fn read_capped(mut field: Field<'_>, limits: &UploadConfig) -> ApiResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_failure(e, limits))?
    {
        if buf.len() + chunk.len() > limits.max_bytes {
            return Err(too_large(limits));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Pulls the `image` field out of the form and checks type and size.
async fn extract_image(mut multipart: Multipart, limits: &UploadConfig) -> ApiResult<ImageUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(e, limits))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            debug!(content_type = %content_type, "rejected non-image upload");
            return Err(ApiError::bad_request(NOT_AN_IMAGE));
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = read_capped(field, limits).await?;

        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.into(),
        });
    }
    Err(ApiError::bad_request(NO_IMAGE))
}

/// `POST /api/upload-image`
pub async fn upload_image(
    State(state): State<UploadState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let multipart = multipart.map_err(|e| {
        debug!(error = %e.body_text(), "upload without a multipart body");
        ApiError::bad_request(NO_IMAGE)
    })?;
    let image = extract_image(multipart, &state.limits).await?;

    let host = state.assets.name();
    if let Err(e) = state.assets.ping().await {
        error!(host, error = %e, "asset host ping failed");
        return Err(ApiError::internal(UPLOAD_FAILED));
    }

    let size = image.len();
    let asset = state.assets.upload(image).await.map_err(|e| {
        if e.is_upstream() {
            warn!(host, error = %e, "asset host rejected upload");
        } else {
            error!(host, error = %e, "image upload failed");
        }
        ApiError::internal(UPLOAD_FAILED)
    })?;

    info!(host, public_id = %asset.public_id, bytes = size, "image uploaded");
    Ok(Json(UploadResponse {
        image_url: asset.url.clone(),
        url: asset.url,
        public_id: asset.public_id,
        format: asset.format,
        size: asset.bytes,
        timestamp: now_utc(),
    }))
}
