use inkpad_auth::config::AuthConfig;
use inkpad_db_postgres::PostgresConfig;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Token signing and lifetime
    #[serde(default)]
    pub auth: AuthConfig,
    /// Image upload and asset host
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn addr(&self) -> SocketAddr {
        let ip: std::net::IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(std::net::IpAddr::from([0, 0, 0, 0]));
        SocketAddr::from((ip, self.server.port))
    }

    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        if let Some(base) = &self.server.base_url
            && url::Url::parse(base).is_err()
        {
            return Err(format!("server.base_url is not a valid URL: {base}"));
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Storage validation
        if self.storage.backend == StorageBackend::Postgres {
            self.storage.postgres.validate()?;
        }
        self.auth.validate()?;
        self.upload.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this server, used for locally stored upload links.
    /// If not set, defaults to http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ServerConfig {
    pub fn public_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = if self.host == "0.0.0.0" {
                    "localhost"
                } else {
                    self.host.as_str()
                };
                format!("http://{host}:{}", self.port)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadProvider {
    #[default]
    Cloudinary,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub provider: UploadProvider,
    /// Largest accepted image, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
    /// Remote folder images are placed in.
    #[serde(default = "default_upload_folder")]
    pub folder: String,
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
    #[serde(default)]
    pub local: LocalUploadConfig,
}

/// Smallest accepted `upload.max_bytes`; limits are reported in whole megabytes.
pub const MIN_UPLOAD_BYTES: usize = 1024 * 1024;

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_upload_folder() -> String {
    "notes_images".into()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            provider: UploadProvider::default(),
            max_bytes: default_max_upload_bytes(),
            folder: default_upload_folder(),
            cloudinary: CloudinaryConfig::default(),
            local: LocalUploadConfig::default(),
        }
    }
}

impl UploadConfig {
    /// Whole megabytes, as shown in the "File too large" message.
    pub fn max_megabytes(&self) -> usize {
        self.max_bytes / (1024 * 1024)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_bytes < MIN_UPLOAD_BYTES {
            return Err(format!(
                "upload.max_bytes must be at least {MIN_UPLOAD_BYTES} (1 MiB)"
            ));
        }
        match self.provider {
            UploadProvider::Cloudinary => self.cloudinary.validate(),
            UploadProvider::Local => {
                if self.local.dir.as_os_str().is_empty() {
                    return Err("upload.local.dir must not be empty".into());
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// Overridable for tests.
    #[serde(default = "default_cloudinary_api_base")]
    pub api_base: String,
    #[serde(default = "default_cloudinary_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_cloudinary_api_base() -> String {
    "https://api.cloudinary.com".into()
}
fn default_cloudinary_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base: default_cloudinary_api_base(),
            timeout: default_cloudinary_timeout(),
        }
    }
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CloudinaryConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("cloud_name", &self.cloud_name),
            ("api_key", &self.api_key),
            ("api_secret", &self.api_secret),
        ] {
            if value.trim().is_empty() {
                return Err(format!(
                    "upload.cloudinary.{name} is required when upload.provider = \"cloudinary\""
                ));
            }
        }
        if url::Url::parse(&self.api_base).is_err() {
            return Err(format!(
                "upload.cloudinary.api_base is not a valid URL: {}",
                self.api_base
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalUploadConfig {
    #[serde(default = "default_local_dir")]
    pub dir: PathBuf,
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl Default for LocalUploadConfig {
    fn default() -> Self {
        Self {
            dir: default_local_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default file looked up when no path is given.
    pub const DEFAULT_CONFIG_FILE: &str = "inkpad.toml";

    /// Loads the optional TOML file, applies `INKPAD__SECTION__KEY`
    /// environment overrides and validates the result.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., INKPAD__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("INKPAD")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
