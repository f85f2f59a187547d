//! Error types for telemetry setup.

use thiserror::Error;

/// Errors raised while installing a subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed, or the filter is invalid.
    #[error("Failed to initialize telemetry: {0}")]
    Init(String),
}

/// A convenience result type for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;
