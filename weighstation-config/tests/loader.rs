use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use tempfile::tempdir;
use weighstation_config::{
    ConfigLoadError, ConfigLoader, ConfigLoaderOptions, InjectionPolicy,
    models::sources::EnvConfig,
};

fn env_from(pairs: &[(&str, &str)]) -> EnvConfig {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvConfig::gather_from(|key| map.get(key).cloned())
}

fn loader_for(path: Option<std::path::PathBuf>) -> ConfigLoader {
    ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: path,
        env_file: None,
    })
}

#[test]
fn defaults_match_kiosk_cadence() {
    let load = loader_for(None)
        .with_env(env_from(&[]))
        .load()
        .expect("load defaults");

    assert_eq!(load.config.scale.poll_interval, Duration::from_secs(1));
    assert_eq!(load.config.scale.failure_threshold, 3);
    assert_eq!(load.config.card_reader.poll_interval, Duration::from_secs(2));
    assert_eq!(
        load.config.card_reader.injection_policy,
        InjectionPolicy::PolledOnly
    );
    assert_eq!(load.config.tickets.refresh_delay, Duration::from_secs(1));
    assert!(load.config.server.request_timeout.is_none());
    assert!(load.warnings.is_empty());
}

#[test]
fn file_values_are_applied_and_env_wins() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("weighstation.toml");
    fs::write(
        &path,
        r#"
[server]
base_url = "scale-host:8080/"

[scale]
poll_interval = "500ms"
failure_threshold = 5

[card_reader]
poll_interval = "3s"
injection_policy = "sync-polled"
autostart = false

[tickets]
refresh_delay = "250ms"
snapshot_path = "open-tickets.json"
"#,
    )
    .expect("write config");

    let load = loader_for(Some(path.clone()))
        .with_env(env_from(&[
            ("WEIGHSTATION_SCALE_POLL_INTERVAL", "2s"),
            ("WEIGHSTATION_CARD_AUTOSTART", "yes"),
        ]))
        .load()
        .expect("load file");
    let config = load.config;

    assert_eq!(config.server.base_url, "http://scale-host:8080");
    assert_eq!(config.scale.poll_interval, Duration::from_secs(2));
    assert_eq!(config.scale.failure_threshold, 5);
    assert_eq!(config.card_reader.poll_interval, Duration::from_secs(3));
    assert_eq!(
        config.card_reader.injection_policy,
        InjectionPolicy::SyncPolled
    );
    assert!(config.card_reader.autostart);
    assert_eq!(config.tickets.refresh_delay, Duration::from_millis(250));
    assert_eq!(
        config.tickets.snapshot_path.as_deref(),
        Some(std::path::Path::new("open-tickets.json"))
    );
    assert_eq!(config.metadata.config_path, Some(path));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let err = loader_for(Some(dir.path().join("nope.toml")))
        .with_env(env_from(&[]))
        .load()
        .expect_err("missing file");
    assert!(matches!(err, ConfigLoadError::MissingFile { .. }));
}

#[test]
fn malformed_env_values_name_the_variable() {
    let err = loader_for(None)
        .with_env(env_from(&[("WEIGHSTATION_REFRESH_DELAY", "soonish")]))
        .load()
        .expect_err("bad duration");
    assert!(err.to_string().contains("WEIGHSTATION_REFRESH_DELAY"));

    let err = loader_for(None)
        .with_env(env_from(&[("WEIGHSTATION_INJECTION_POLICY", "queue")]))
        .load()
        .expect_err("bad policy");
    assert!(matches!(
        err,
        ConfigLoadError::InvalidValue {
            key: "WEIGHSTATION_INJECTION_POLICY",
            ..
        }
    ));
}

#[test]
fn malformed_autostart_is_reported() {
    let err = loader_for(None)
        .with_env(env_from(&[("WEIGHSTATION_CARD_AUTOSTART", "flase")]))
        .load()
        .expect_err("bad autostart");
    assert!(matches!(
        err,
        ConfigLoadError::InvalidValue {
            key: "WEIGHSTATION_CARD_AUTOSTART",
            ..
        }
    ));

    let load = loader_for(None)
        .with_env(env_from(&[("WEIGHSTATION_CARD_AUTOSTART", "off")]))
        .load()
        .expect("load");
    assert!(!load.config.card_reader.autostart);
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("weighstation.toml");
    fs::write(&path, "[printer]\nname = \"PiPrinter\"\n").expect("write");

    let err = loader_for(Some(path))
        .with_env(env_from(&[]))
        .load()
        .expect_err("unknown section");
    assert!(matches!(err, ConfigLoadError::Parse { .. }));
}

#[test]
fn fast_polling_warns() {
    let load = loader_for(None)
        .with_env(env_from(&[
            ("WEIGHSTATION_SCALE_POLL_INTERVAL", "100ms"),
            ("WEIGHSTATION_SCALE_FAILURE_THRESHOLD", "0"),
        ]))
        .load()
        .expect("load");
    assert_eq!(load.warnings.len(), 2);
    assert_eq!(load.config.scale.failure_threshold, 1);
}
