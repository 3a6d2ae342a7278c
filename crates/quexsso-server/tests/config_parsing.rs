use std::{env, fs};

use quexsso_auth::token::SigningAlgorithm;
use quexsso_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("quexsso.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
body_limit_bytes = 2048

[logging]
level = "debug"

[auth]
issuer = "https://sso.example.com"

[auth.signing]
algorithm = "HS256"
secret = "config-test-secret-config-test-secret"

[auth.primary_token]
single_use = false
leeway = "1m"
cleanup_interval = "10m"

[bootstrap]
admin_user_id = "1"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.body_limit_bytes, 2048);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.auth.signing.algorithm, SigningAlgorithm::HS256);
    assert!(!cfg.auth.primary_token.single_use);
    assert_eq!(cfg.auth.primary_token.leeway.as_secs(), 60);
    assert_eq!(cfg.auth.primary_token.cleanup_interval.as_secs(), 600);
    assert_eq!(cfg.bootstrap.admin_user_id.as_deref(), Some("1"));

    // 2) Env override should win over file
    unsafe {
        env::set_var("QUEXSSO__SERVER__PORT", "9091");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9091);
    unsafe {
        env::remove_var("QUEXSSO__SERVER__PORT");
    }

    // 3) Invalid values are rejected
    let bad = dir.path().join("bad.toml");
    fs::write(
        &bad,
        r#"
[auth.signing]
algorithm = "HS256"
secret = "too-short"
"#,
    )
    .expect("write toml");
    let err = load_config(bad.to_str()).unwrap_err();
    assert!(err.contains("auth.signing.secret"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let cfg = load_config(Some("/nonexistent/quexsso.toml")).expect("defaults");
    assert_eq!(cfg.logging.level, "info");
    assert_eq!(cfg.auth.issuer, "http://localhost:8080");
    assert_eq!(cfg.auth.signing.algorithm, SigningAlgorithm::RS256);
}
