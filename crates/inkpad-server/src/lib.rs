pub mod assets;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod notes;
pub mod observability;
pub mod server;
pub mod upload;

pub use assets::{AssetError, AssetHost, DynAssetHost, ImageUpload, UploadedAsset};
pub use config::{AppConfig, ServerConfig, StorageBackend, UploadConfig, UploadProvider};
pub use observability::init_tracing;
pub use server::{AppState, InkpadServer, ServerBuilder, build_app, build_router};
