//! Tests for configuration validation

use std::collections::HashMap;

use prometheus_limiter::config::LimiterConfig;
use prometheus_limiter::core::{LimiterError, LimiterOptions};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

#[test]
fn test_default_config() {
    let cfg = LimiterConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.effective_limit(), None);
    assert!(cfg.bail_on_error);
}

#[test]
fn test_zero_limit_invalid() {
    let cfg = LimiterConfig {
        limit: Some(0),
        ..LimiterConfig::default()
    };
    assert!(cfg.validate().is_err());
    assert!(LimiterOptions::try_from(&cfg).is_err());
}

#[test]
fn test_concurrency_alias_overrides_limit() {
    let cfg = LimiterConfig {
        limit: None,
        concurrency: Some(2),
        bail_on_error: true,
    };
    let opts = LimiterOptions::try_from(&cfg).unwrap();
    assert_eq!(opts.limit, Some(2));

    let cfg = LimiterConfig {
        limit: Some(5),
        concurrency: Some(2),
        bail_on_error: false,
    };
    let opts = LimiterOptions::try_from(&cfg).unwrap();
    assert_eq!(opts.limit, Some(2));
    assert!(!opts.bail_on_error);

    let cfg = LimiterConfig {
        limit: Some(5),
        concurrency: None,
        bail_on_error: true,
    };
    assert_eq!(cfg.effective_limit(), Some(5));
}

#[test]
fn test_config_from_json() {
    let cfg = LimiterConfig::from_json_str(r#"{ "limit": 4, "bail_on_error": false }"#).unwrap();
    assert_eq!(cfg.limit, Some(4));
    assert!(!cfg.bail_on_error);

    let cfg = LimiterConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, LimiterConfig::default());

    assert!(LimiterConfig::from_json_str(r#"{ "limit": 0 }"#).is_err());
    assert!(LimiterConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_lookup() {
    let cfg = LimiterConfig::from_lookup(lookup(&[
        ("LIMITER_LIMIT", " 8 "),
        ("LIMITER_BAIL_ON_ERROR", "false"),
    ]))
    .unwrap();
    assert_eq!(cfg.limit, Some(8));
    assert!(!cfg.bail_on_error);

    let cfg = LimiterConfig::from_lookup(lookup(&[("LIMITER_CONCURRENCY", "3")])).unwrap();
    assert_eq!(cfg.effective_limit(), Some(3));
    assert!(cfg.bail_on_error);

    let cfg = LimiterConfig::from_lookup(lookup(&[
        ("LIMITER_LIMIT", "8"),
        ("LIMITER_CONCURRENCY", "3"),
    ]))
    .unwrap();
    assert_eq!(LimiterOptions::try_from(&cfg).unwrap().limit, Some(3));
}

#[test]
fn test_config_from_lookup_rejects_garbage() {
    let err = LimiterConfig::from_lookup(lookup(&[("LIMITER_LIMIT", "many")])).unwrap_err();
    assert!(matches!(err, LimiterError::Config(ref msg) if msg.starts_with("LIMITER_LIMIT")));

    let err =
        LimiterConfig::from_lookup(lookup(&[("LIMITER_BAIL_ON_ERROR", "maybe")])).unwrap_err();
    assert!(matches!(err, LimiterError::Config(_)));

    assert!(LimiterConfig::from_lookup(lookup(&[("LIMITER_LIMIT", "0")])).is_err());
}
