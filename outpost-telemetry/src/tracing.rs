use std::sync::Once;

use outpost_config::Environment;
use thiserror::Error;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_subscriber::{EnvFilter, fmt};

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global default subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),

    #[error("an io error occurred: {0}")]
    Io(#[from] std::io::Error),
}

/// Initializes the global tracing subscriber for a binary embedding the SDK.
///
/// Production environments get JSON output suitable for log aggregation;
/// development environments get human-readable output. The filter honors
/// `RUST_LOG`, defaulting to `info`.
pub fn init_tracing(service_name: &str) -> Result<(), TracingError> {
    let env = Environment::load()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if env.is_prod() {
        let subscriber = fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .finish();
        set_global_default(subscriber)?;
    } else {
        let subscriber = fmt().pretty().with_env_filter(filter).finish();
        set_global_default(subscriber)?;
    }

    tracing::info!("tracing initialized for service '{}'", service_name);

    Ok(())
}

static INIT_TEST_TRACING: Once = Once::new();

/// Initializes tracing for test environments.
///
/// Call once at the beginning of tests. Set `ENABLE_TRACING=1` to view tracing output:
/// ```bash
/// ENABLE_TRACING=1 cargo test test_name
/// ```
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var("ENABLE_TRACING").is_ok() {
            // Tests always log to the terminal, so force the dev output format.
            Environment::Dev.set();
            init_tracing("test").expect("Failed to initialize tracing for tests");
        }
    });
}
