//! Demonstrates tracing output from the retry loop and computed defaults
//!
//! Run with: cargo run --example tracing_demo --features tracing

use std::time::Duration;

use tidewater::env::{Env, MapStore, Registry, VarOptions};
use tidewater::retry::{self, Acceptor};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    // Set up tracing subscriber
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    tracing::info!("Starting tracing demo");

    // Each rejected attempt logs its delay; the deadline logs when it fires.
    let outcome = retry::until_timeout(
        &CancellationToken::new(),
        Acceptor::new(|attempt: u32, _: Duration| async move {
            Ok::<_, String>((attempt == 3).then_some(attempt))
        })
        .with_delay(Duration::from_millis(10)),
        Duration::from_secs(1),
    )
    .await;
    tracing::info!(?outcome, "retry finished");

    let outcome = retry::until_timeout(
        &CancellationToken::new(),
        Acceptor::new(|_: u32, _: Duration| async { Ok::<Option<()>, String>(None) })
            .with_delay(Duration::from_millis(20)),
        Duration::from_millis(100),
    )
    .await;
    tracing::info!(?outcome, "retry gave up");

    // A failing computed default is logged once per environment.
    let registry = Registry::new();
    let home = registry.declare_string(
        "HOME_DIR",
        "home directory",
        VarOptions::new().with_default_fn(|_: &Env| Err("no home directory".into())),
    );
    let env = Env::new(MapStore::new());
    tracing::info!(value = %home.value_in(&env), display = %home.display_in(&env), "resolved");
    if let Err(e) = home.validate_in(&env) {
        tracing::error!("Validation failed: {}", e);
    }
}
