use async_trait::async_trait;
use inkpad_core::{now_utc, sanitize_file_stem};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{debug, info};

use super::{AssetError, AssetHost, ImageUpload, UploadedAsset};
use crate::config::CloudinaryConfig;

/// Signed uploads to the Cloudinary REST API.
pub struct CloudinaryHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    format: String,
    #[serde(default)]
    bytes: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig, folder: String) -> Result<Self, AssetError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            folder,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            path
        )
    }

    async fn error_from(response: reqwest::Response) -> AssetError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        AssetError::upstream(status, message)
    }
}

/// Signs upload parameters: `key=value` pairs sorted by key, joined with
/// `&`, followed by the API secret, hashed with SHA-1.
pub(crate) fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// `{unix_millis}_{sanitized file name}`.
pub(crate) fn public_id_for(file_name: &str, unix_millis: i128) -> String {
    format!("{unix_millis}_{}", sanitize_file_stem(file_name))
}

#[async_trait]
impl AssetHost for CloudinaryHost {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedAsset, AssetError> {
        let now = now_utc();
        let public_id = public_id_for(&image.file_name, now.unix_millis());
        let params = vec![
            ("folder", self.folder.clone()),
            ("invalidate", "true".to_string()),
            ("overwrite", "true".to_string()),
            ("public_id", public_id.clone()),
            ("timestamp", now.unix_timestamp().to_string()),
        ];
        let signature = sign(&params, &self.config.api_secret);

        let file_name = if image.file_name.is_empty() {
            public_id.clone()
        } else {
            image.file_name.clone()
        };
        let length = image.len() as u64;
        let file_part = Part::stream_with_length(reqwest::Body::from(image.bytes), length)
            .file_name(file_name)
            .mime_str(&image.content_type)?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!(public_id = %public_id, folder = %self.folder, "uploading image to Cloudinary");
        let response = self
            .client
            .post(self.endpoint("image/upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let result: UploadResult = response
            .json()
            .await
            .map_err(|e| AssetError::InvalidResponse(e.to_string()))?;

        info!(public_id = %result.public_id, bytes = result.bytes, "image uploaded");
        Ok(UploadedAsset {
            url: result.secure_url,
            public_id: result.public_id,
            format: result.format,
            bytes: result.bytes,
        })
    }

    async fn ping(&self) -> Result<(), AssetError> {
        let response = self
            .client
            .get(self.endpoint("ping"))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}
