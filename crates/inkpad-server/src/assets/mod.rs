//! Asset hosts: where uploaded images end up.
//!
//! The upload route validates the image and hands it to an [`AssetHost`].
//! [`CloudinaryHost`] proxies to Cloudinary; [`LocalDiskHost`] writes into a
//! directory the server itself serves under `/uploads`.

mod cloudinary;
mod local;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::{ServerConfig, UploadConfig, UploadProvider};

pub use cloudinary::CloudinaryHost;
pub use local::LocalDiskHost;

/// A validated image on its way to the asset host.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied file name, possibly empty.
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where an image was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
    pub format: String,
    pub bytes: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset host request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("asset host returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("unexpected asset host response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssetError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Transport(_))
    }
}

/// A service that stores images and hands back a public URL.
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Stores the image and returns where it can be fetched.
    async fn upload(&self, image: ImageUpload) -> Result<UploadedAsset, AssetError>;

    /// Checks that the host is reachable and the credentials work.
    async fn ping(&self) -> Result<(), AssetError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

pub type DynAssetHost = Arc<dyn AssetHost>;

/// Builds the host selected by `upload.provider`.
pub fn create_asset_host(
    upload: &UploadConfig,
    server: &ServerConfig,
) -> Result<DynAssetHost, AssetError> {
    match upload.provider {
        UploadProvider::Cloudinary => Ok(Arc::new(CloudinaryHost::new(
            upload.cloudinary.clone(),
            upload.folder.clone(),
        )?)),
        UploadProvider::Local => Ok(Arc::new(LocalDiskHost::new(
            upload.local.dir.clone(),
            server.public_base_url(),
        ))),
    }
}

/// Lowercased extension of `file_name`, keeping only ASCII alphanumerics.
pub(crate) fn file_extension(file_name: &str) -> Option<String> {
    let ext = std::path::Path::new(file_name).extension()?.to_str()?;
    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (!ext.is_empty()).then_some(ext)
}

/// Image format from the file extension, or the MIME subtype.
pub(crate) fn image_format(file_name: &str, content_type: &str) -> String {
    file_extension(file_name).unwrap_or_else(|| {
        content_type
            .split_once('/')
            .map(|(_, subtype)| subtype.split(';').next().unwrap_or(subtype).trim())
            .unwrap_or("")
            .to_ascii_lowercase()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_and_sanitized() {
        assert_eq!(file_extension("Cat.PNG").as_deref(), Some("png"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("weird.j$p g").as_deref(), Some("jpg"));
    }

    #[test]
    fn format_falls_back_to_mime_subtype() {
        assert_eq!(image_format("cat.jpeg", "image/png"), "jpeg");
        assert_eq!(image_format("blob", "image/webp"), "webp");
        assert_eq!(image_format("", "image/svg+xml; charset=utf-8"), "svg+xml");
    }
}
