use std::{env, fs, time::Duration};

use inkpad_server::config::loader::load_config;
use inkpad_server::{StorageBackend, UploadProvider};

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("inkpad.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
base_url = "https://notes.example.com"

[storage]
backend = "memory"

[auth]
jwt_secret = "a-very-long-test-secret"
token_ttl = "12h"

[upload]
provider = "local"
max_bytes = 2097152

[upload.local]
dir = "/tmp/inkpad-uploads"

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.public_base_url(), "https://notes.example.com");
    assert_eq!(cfg.storage.backend, StorageBackend::Memory);
    assert_eq!(cfg.auth.token_ttl, Duration::from_secs(12 * 3600));
    assert_eq!(cfg.upload.provider, UploadProvider::Local);
    assert_eq!(cfg.upload.max_megabytes(), 2);
    assert_eq!(cfg.upload.folder, "notes_images");
    assert_eq!(cfg.logging.level, "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("INKPAD__SERVER__PORT", "9090");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9090);
    unsafe {
        env::remove_var("INKPAD__SERVER__PORT");
    }

    // 3) Invalid values are rejected
    let bad_path = dir.path().join("bad.toml");
    fs::write(
        &bad_path,
        toml_content.replace("a-very-long-test-secret", "short"),
    )
    .expect("write bad toml");
    let err = load_config(bad_path.to_str()).expect_err("short secret must fail");
    assert!(err.contains("jwt_secret"), "unexpected error: {err}");

    let no_creds = dir.path().join("cloudinary.toml");
    fs::write(
        &no_creds,
        toml_content.replace("provider = \"local\"", "provider = \"cloudinary\""),
    )
    .expect("write cloudinary toml");
    let err = load_config(no_creds.to_str()).expect_err("missing credentials must fail");
    assert!(err.contains("upload.cloudinary"), "unexpected error: {err}");
}
