use std::path::PathBuf;

use async_trait::async_trait;
use inkpad_core::now_utc;
use rand::Rng;
use tracing::info;

use super::{AssetError, AssetHost, ImageUpload, UploadedAsset, file_extension, image_format};

/// Stores images in a directory that the server exposes at `/uploads`.
pub struct LocalDiskHost {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalDiskHost {
    pub fn new(dir: PathBuf, public_base_url: String) -> Self {
        Self {
            dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

/// `{unix_millis}-{random}{.ext}`
fn stored_file_name(file_name: &str, unix_millis: i128) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let ext = file_extension(file_name)
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{unix_millis}-{suffix}{ext}")
}

#[async_trait]
impl AssetHost for LocalDiskHost {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedAsset, AssetError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = stored_file_name(&image.file_name, now_utc().unix_millis());
        let path = self.dir.join(&name);
        tokio::fs::write(&path, &image.bytes).await?;

        info!(path = %path.display(), bytes = image.len(), "image stored on disk");
        Ok(UploadedAsset {
            url: format!("{}/uploads/{name}", self.public_base_url),
            format: image_format(&image.file_name, &image.content_type),
            bytes: image.len() as u64,
            public_id: name,
        })
    }

    async fn ping(&self) -> Result<(), AssetError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
