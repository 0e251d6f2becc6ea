//! Configuration loading tests for the daemon: file, environment
//! overrides, and validation interplay as main() applies them.

use std::collections::HashMap;
use std::path::Path;

use logwell_core::config::LogwellConfig;

#[test]
fn missing_file_yields_defaults() {
    let config = LogwellConfig::load(Path::new("/does/not/exist/logwell.toml")).unwrap();
    assert_eq!(config.syslog.udp_port, 514);
    assert_eq!(config.syslog.tls_port, 6514);
    assert_eq!(config.syslog.log_dir, "logs");
    config.validate().unwrap();
}

#[test]
fn file_then_env_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwell.toml");
    std::fs::write(
        &path,
        r#"
[general]
log_level = "debug"
log_format = "json"

[syslog]
udp_port = 5514
log_dir = "/var/log/logwell"
enable_tls = false
"#,
    )
    .unwrap();

    let mut config = LogwellConfig::load(&path).unwrap();
    assert_eq!(config.syslog.udp_port, 5514);
    assert_eq!(config.general.log_format, "json");
    assert!(!config.syslog.enable_tls);

    // Environment wins over the file
    let mut env = HashMap::new();
    env.insert("SYSLOG_UDP_PORT", "6600");
    env.insert("SYSLOG_ENABLE_TLS", "true");
    config
        .apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()))
        .unwrap();

    assert_eq!(config.syslog.udp_port, 6600);
    assert!(config.syslog.enable_tls);
    // Untouched file values survive
    assert_eq!(config.syslog.log_dir, "/var/log/logwell");

    config.validate().unwrap();
}

#[test]
fn invalid_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwell.toml");
    std::fs::write(&path, "this is not toml [").unwrap();
    assert!(LogwellConfig::load(&path).is_err());
}

#[test]
fn invalid_env_number_is_an_error() {
    let mut config = LogwellConfig::default();
    let result =
        config.apply_overrides(|key| (key == "SYSLOG_TLS_PORT").then(|| "many".to_owned()));
    assert!(result.is_err());
}

#[test]
fn validation_rejects_broken_combinations() {
    let mut config = LogwellConfig::default();
    config.syslog.max_buffer_bytes = 16;
    assert!(config.validate().is_err());

    let mut config = LogwellConfig::default();
    config.general.log_format = "yaml".to_owned();
    assert!(config.validate().is_err());
}
