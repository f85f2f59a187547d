//! Telemetry for the agent factory intake engine.
//!
//! This crate provides:
//! - Global `tracing-subscriber` setup with `RUST_LOG` filtering, plain or JSON
//! - An in-memory event layer for asserting on emitted events in tests

pub mod error;
pub mod init;
pub mod memory;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_FILTER, init_json_telemetry, init_telemetry, init_with_storage};
pub use memory::{EventRecord, InMemoryEventLayer, SharedEventStorage, capture_events};
