//! Global subscriber installation.
//!
//! Filtering follows `RUST_LOG`; when it is unset or invalid the default
//! directive is `info`.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{Result, TelemetryError};
use crate::memory::{InMemoryEventLayer, SharedEventStorage};

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a plain-text `fmt` subscriber as the global default.
///
/// # Errors
///
/// Returns [`TelemetryError::Init`] if a global subscriber is already set.
pub fn init_telemetry(service_name: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;
    tracing::info!(service.name = %service_name, "telemetry initialized");
    Ok(())
}

/// Install a JSON `fmt` subscriber as the global default, one object per
/// line.
///
/// # Errors
///
/// Returns [`TelemetryError::Init`] if a global subscriber is already set.
pub fn init_json_telemetry(service_name: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;
    tracing::info!(service.name = %service_name, format = "json", "telemetry initialized");
    Ok(())
}

/// Install a plain-text subscriber that also copies every event into
/// `storage`.
///
/// # Errors
///
/// Returns [`TelemetryError::Init`] if a global subscriber is already set.
pub fn init_with_storage(service_name: &str, storage: Arc<SharedEventStorage>) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(InMemoryEventLayer::new(storage))
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;
    tracing::info!(service.name = %service_name, "telemetry initialized with event capture");
    Ok(())
}
