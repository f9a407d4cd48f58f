//! End-to-end tests for declared configuration
//!
//! Models a small service: a feature gate, gated options, a secret, a
//! renamed variable, and a computed default, all checked the way a startup
//! routine would.

use tidewater::env::{self, JoinedStore, ProcessStore, ValidationReport};
use tidewater::prelude::*;
use tidewater::testing::fixture_env;
use tidewater::{assert_env_error, assert_valid, assert_warns};

struct ServiceConfig {
    registry: Registry,
    cache: BoolValue,
    cache_size: IntValue,
    cache_dir: StringValue,
    api_key: StringValue,
    endpoint: StringValue,
    workers: IntValue,
}

impl ServiceConfig {
    fn declare() -> Self {
        let registry = Registry::with_prefix("SVC_");
        let cache = registry.declare_bool("CACHE", "enable the response cache", VarOptions::new());
        let cache_size = registry.declare_int(
            "CACHE_SIZE",
            "maximum cached responses",
            VarOptions::new().with_needs(&cache).with_default("128"),
        );
        let cache_dir = registry.declare_string(
            "CACHE_DIR",
            "where cached responses live",
            VarOptions::new().with_needs(&cache).with_default_fn({
                let size = cache_size.downgrade();
                move |env: &Env| {
                    let size = size.get_in(env).ok_or("cache size was dropped")?;
                    Ok(format!("/var/cache/svc-{}", size))
                }
            }),
        );
        let api_key = registry.declare_string(
            "API_KEY",
            "upstream API key",
            VarOptions::new().with_secret(),
        );
        let endpoint = registry.declare_string(
            "ENDPOINT",
            "upstream endpoint",
            VarOptions::new()
                .with_alternative("LEGACY_UPSTREAM_URL")
                .with_default("https://api.example.com"),
        );
        let workers = registry.declare_int("WORKERS", "worker threads", VarOptions::new());

        Self {
            registry,
            cache,
            cache_size,
            cache_dir,
            api_key,
            endpoint,
            workers,
        }
    }

    fn summary(&self, env: &Env) -> Vec<String> {
        let mut lines = vec![
            format!("{}={}", self.cache.name(), self.cache.display_in(env)),
            format!("{}={}", self.cache_size.name(), self.cache_size.display_in(env)),
            format!("{}={}", self.cache_dir.name(), self.cache_dir.display_in(env)),
            format!("{}={}", self.api_key.name(), self.api_key.display_in(env)),
            format!("{}={}", self.endpoint.name(), self.endpoint.display_in(env)),
            format!("{}={}", self.workers.name(), self.workers.display_in(env)),
        ];
        lines.sort();
        lines
    }
}

#[test]
fn test_defaults_with_empty_environment() {
    let config = ServiceConfig::declare();
    let env = fixture_env(Vec::<(String, String)>::new());

    assert!(!config.cache.value_in(&env));
    assert_eq!(config.cache_size.value_in(&env), 128);
    assert_eq!(config.cache_dir.value_in(&env), "/var/cache/svc-128");
    assert_eq!(config.api_key.value_in(&env), "");
    assert_eq!(config.endpoint.value_in(&env), "https://api.example.com");
    assert_eq!(config.workers.value_in(&env), 0);

    assert!(config.registry.validate_all(&env).is_clean());
}

#[test]
fn test_summary_redacts_and_explains() {
    let config = ServiceConfig::declare();
    let env = fixture_env([
        ("SVC_CACHE_SIZE", "512"),
        ("SVC_API_KEY", "sk-live-123"),
        ("LEGACY_UPSTREAM_URL", "https://old.example.com"),
    ]);

    assert_eq!(
        config.summary(&env),
        vec![
            "SVC_API_KEY=[secret]",
            "SVC_CACHE=unset",
            "SVC_CACHE_DIR=needs SVC_CACHE (default /var/cache/svc-128)",
            "SVC_CACHE_SIZE=needs SVC_CACHE (512)",
            "SVC_ENDPOINT=https://old.example.com",
            "SVC_WORKERS=unset",
        ]
    );
    assert_eq!(config.api_key.value_in(&env), "sk-live-123");
}

#[test]
fn test_enabling_the_gate_applies_gated_values() {
    let config = ServiceConfig::declare();
    let env = fixture_env([("SVC_CACHE", "TRUE"), ("SVC_CACHE_SIZE", "512")]);

    assert!(config.cache.value_in(&env));
    assert_eq!(config.cache_size.value_in(&env), 512);
    assert_eq!(config.cache_dir.value_in(&env), "/var/cache/svc-512");
    assert_valid!(config.cache_size.validate_in(&env));
}

#[test]
fn test_startup_validation_report() {
    let config = ServiceConfig::declare();
    let env = fixture_env([
        ("SVC_CACHE", "on"),
        ("SVC_CACHE_SIZE", "512"),
        ("SVC_WORKERS", "many"),
    ]);

    assert_warns!(config.cache.validate_in(&env));
    assert_warns!(config.cache_size.validate_in(&env));
    assert_env_error!(config.workers.validate_in(&env));

    let report: ValidationReport = config.registry.validate_all(&env);
    assert_eq!(report.warnings().len(), 2);
    assert_eq!(report.errors().len(), 1);

    let err = report.into_result().unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err[0].var(), "SVC_WORKERS");
    assert_eq!(
        err[0].to_string(),
        "SVC_WORKERS: \"many\" is not a valid integer"
    );
}

#[test]
fn test_variables_listing() {
    let config = ServiceConfig::declare();
    let names: Vec<String> = config
        .registry
        .variables()
        .into_iter()
        .map(|info| info.name)
        .collect();

    assert_eq!(
        names,
        vec![
            "SVC_API_KEY",
            "SVC_CACHE",
            "SVC_CACHE_DIR",
            "SVC_CACHE_SIZE",
            "SVC_ENDPOINT",
            "SVC_WORKERS",
        ]
    );
}

#[test]
fn test_layered_stores() {
    let config = ServiceConfig::declare();
    let overrides = MapStore::new().with("SVC_WORKERS", "4");
    let base = MapStore::new()
        .with("SVC_WORKERS", "16")
        .with("SVC_ENDPOINT", "https://base.example.com");

    let env = Env::new(JoinedStore::new().with(overrides).with(base).with(ProcessStore));

    assert_eq!(config.workers.value_in(&env), 4);
    assert_eq!(config.endpoint.value_in(&env), "https://base.example.com");
}

#[test]
fn test_global_environment() {
    let flag = env::declare_bool("IT_GLOBAL_FLAG", "integration flag", VarOptions::new());
    let count = env::declare_int("IT_GLOBAL_COUNT", "integration count", VarOptions::new());

    env::set_global_store(
        MapStore::new()
            .with("TIDEWATER_IT_GLOBAL_FLAG", "1")
            .with("TIDEWATER_IT_GLOBAL_COUNT", "x"),
    );
    assert!(flag.value());
    assert_eq!(count.value(), 0);
    assert_eq!(flag.to_string(), "true");

    let report = env::validate_all();
    assert!(report
        .errors()
        .iter()
        .any(|e| e.var() == "TIDEWATER_IT_GLOBAL_COUNT"));

    env::reset_global_store();
}

#[cfg(feature = "serde")]
#[test]
fn test_variables_serialize() {
    let config = ServiceConfig::declare();
    let infos = config.registry.variables();
    let json = serde_json::to_value(&infos).unwrap();

    assert_eq!(json[0]["name"], "SVC_API_KEY");
    assert_eq!(json[0]["secret"], true);
    assert_eq!(json[2]["needs"][0], "SVC_CACHE");
    assert_eq!(json[4]["alternative"], "LEGACY_UPSTREAM_URL");
    assert_eq!(json[5]["kind"], "int");
}
