//! Tests for configuration validation

use std::path::PathBuf;
use std::time::Duration;

use odds_sampler::config::{SamplerConfig, SinkBackendConfig};
use odds_sampler::core::{ConfigError, Priority};

#[test]
fn test_default_config_is_valid() {
    let cfg = SamplerConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.series.window_minutes, 480);
    assert_eq!(cfg.series.step_minutes, 5);
    assert_eq!(cfg.storage.sink, SinkBackendConfig::Csv);
    assert!(cfg.dispatch.max_concurrent_jobs > 0);
    assert_eq!(cfg.poll_series().unwrap().len(), 97);
}

#[test]
fn test_zero_step_rejected() {
    let mut cfg = SamplerConfig::default();
    cfg.series.step_minutes = 0;
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSeries(_))));
}

#[test]
fn test_zero_timeout_rejected() {
    let mut cfg = SamplerConfig::default();
    cfg.dispatch.attempt_timeout_secs = 0;
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::InvalidSetting { key: "dispatch.attempt_timeout_secs", .. })
    ));
}

#[test]
fn test_zero_concurrency_rejected() {
    let mut cfg = SamplerConfig::default();
    cfg.dispatch.max_concurrent_jobs = 0;
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::InvalidSetting { key: "dispatch.max_concurrent_jobs", .. })
    ));
}

#[test]
fn test_from_json_partial_sections_take_defaults() {
    let cfg = SamplerConfig::from_json_str(
        r#"{
            "series": { "window_minutes": 60 },
            "dispatch": { "max_retries": 2, "retry_backoff_ms": 500, "missed_grace_secs": 300, "priority": 3 },
            "storage": { "data_dir": "/srv/odds", "sink": "in_memory" }
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.series.window_minutes, 60);
    assert_eq!(cfg.series.step_minutes, 5);
    assert_eq!(cfg.storage.data_dir, PathBuf::from("/srv/odds"));
    assert_eq!(cfg.storage.sink, SinkBackendConfig::InMemory);
    assert_eq!(cfg.priority(), Priority(3));

    let limits = cfg.dispatch_limits();
    assert_eq!(limits.retry.max_retries, 2);
    assert_eq!(limits.retry.backoff, Duration::from_millis(500));
    assert_eq!(limits.retry.attempt_timeout, Duration::from_secs(60));
    assert_eq!(limits.missed_grace, Some(Duration::from_secs(300)));
}

#[test]
fn test_from_json_rejects_invalid_values() {
    let err = SamplerConfig::from_json_str(r#"{"series": {"step_minutes": 0}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSeries(_)));

    let err = SamplerConfig::from_json_str("not json").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSetting { key: "config", .. }));
}

#[test]
fn test_overrides_replace_paths() {
    let cfg = SamplerConfig::default().with_overrides(
        Some(PathBuf::from("/tmp/odds")),
        Some("http://odds.local/api".to_string()),
    );
    assert_eq!(cfg.storage.data_dir, PathBuf::from("/tmp/odds"));
    assert_eq!(cfg.source.base_url, "http://odds.local/api");

    let untouched = SamplerConfig::default().with_overrides(None, None);
    assert_eq!(untouched.source.base_url, SamplerConfig::default().source.base_url);
}

#[test]
fn test_load_missing_file_fails() {
    let err = SamplerConfig::load(Some(std::path::Path::new("/definitely/not/here.json"))).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSetting { key: "config", .. }));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sampler.json");
    std::fs::write(&path, r#"{"dispatch": {"max_concurrent_jobs": 3}}"#).unwrap();

    let cfg = SamplerConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(cfg.dispatch.max_concurrent_jobs, 3);
}
