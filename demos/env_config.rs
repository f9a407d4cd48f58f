//! Environment Configuration Example
//!
//! Declares a service's configuration once, then:
//! - Reads typed values
//! - Prints a redacted summary
//! - Validates everything at startup
//!
//! Run with different settings, for example:
//! `DEMO_CACHE=1 DEMO_CACHE_SIZE=ten cargo run --example env_config`

use tidewater::env::{Env, JoinedStore, MapStore, ProcessStore, Registry, VarOptions};

fn main() {
    let registry = Registry::with_prefix("DEMO_");

    let cache = registry.declare_bool("CACHE", "enable the response cache", VarOptions::new());
    let cache_size = registry.declare_int(
        "CACHE_SIZE",
        "maximum cached responses",
        VarOptions::new().with_needs(&cache).with_default("128"),
    );
    let token = registry.declare_string(
        "TOKEN",
        "upstream API token",
        VarOptions::new().with_secret().with_default("dev-token"),
    );
    let endpoint = registry.declare_string(
        "ENDPOINT",
        "upstream endpoint",
        VarOptions::new()
            .with_alternative("UPSTREAM_URL")
            .with_default("https://api.example.com"),
    );
    let user_agent = registry.declare_string(
        "USER_AGENT",
        "user agent sent upstream",
        VarOptions::new().with_default_fn({
            let endpoint = endpoint.downgrade();
            move |env: &Env| Ok(format!("demo/1.0 (+{})", endpoint.get_in(env).unwrap_or_default()))
        }),
    );

    // Process variables win over the built-in fallbacks.
    let env = Env::new(
        JoinedStore::new()
            .with(ProcessStore)
            .with(MapStore::new().with("DEMO_ENDPOINT", "https://staging.example.com")),
    );

    println!("=== Declared Variables ===");
    for info in registry.variables() {
        println!("  {:<18} {:<6} {}", info.name, info.kind, info.description);
    }

    println!("\n=== Effective Configuration ===");
    println!("  cache:      {}", cache.value_in(&env));
    println!("  cache size: {}", cache_size.value_in(&env));
    println!("  endpoint:   {}", endpoint.value_in(&env));
    println!("  user agent: {}", user_agent.value_in(&env));
    println!("  token set:  {}", token.is_set_in(&env));

    println!("\n=== Summary ===");
    println!("  {}={}", cache.name(), cache.display_in(&env));
    println!("  {}={}", cache_size.name(), cache_size.display_in(&env));
    println!("  {}={}", token.name(), token.display_in(&env));
    println!("  {}={}", endpoint.name(), endpoint.display_in(&env));
    println!("  {}={}", user_agent.name(), user_agent.display_in(&env));

    println!("\n=== Startup Validation ===");
    let report = registry.validate_all(&env);
    for warning in report.warnings() {
        println!("  warning: {}", warning);
    }
    for error in report.errors() {
        println!("  error: {}", error);
    }
    if report.is_clean() {
        println!("  configuration is clean");
    } else if report.has_errors() {
        std::process::exit(1);
    }
}
