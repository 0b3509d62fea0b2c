use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;

static INIT: OnceLock<()> = OnceLock::new();

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to set tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Initialize structured logging (RUST_LOG driven). JSON output is used for
/// production; pretty output for dev. Calling this more than once is a no-op.
pub fn init_telemetry(app: &AppConfig) -> Result<(), TelemetryError> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| TelemetryError::SubscriberInit(err.to_string()))?;

    let json_format = !app.env.eq_ignore_ascii_case("dev");
    let result = if json_format {
        let fmt_layer = fmt::layer().json().with_current_span(true);
        tracing_subscriber::registry()
            .with(fmt_layer)
            .with(env_filter)
            .try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .pretty()
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(fmt_layer)
            .with(env_filter)
            .try_init()
    };

    result.map_err(|err| TelemetryError::SubscriberInit(err.to_string()))?;
    let _ = INIT.set(());
    Ok(())
}
