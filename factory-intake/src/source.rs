//! Capability source trait for loading the registered capability corpus.

use async_trait::async_trait;

use crate::document::CapabilityRecord;
use crate::error::Result;

/// A feed of registered capabilities, such as a registry service or a
/// database table.
///
/// The [`CapabilityRegistry`](crate::CapabilityRegistry) pulls the full
/// listing on [`reload_from`](crate::CapabilityRegistry::reload_from) and
/// rebuilds its index from it in one step.
///
/// # Example
///
/// ```rust,ignore
/// use factory_intake::{CapabilityRegistry, StaticCapabilitySource};
///
/// let source = StaticCapabilitySource::new(records);
/// let registry = CapabilityRegistry::new();
/// registry.reload_from(&source).await?;
/// ```
#[async_trait]
pub trait CapabilitySource: Send + Sync {
    /// Return every active capability.
    async fn list_capabilities(&self) -> Result<Vec<CapabilityRecord>>;
}

/// A source that serves a fixed list of records.
///
/// Useful for tests and for seeding a registry from a snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilitySource {
    records: Vec<CapabilityRecord>,
}

impl StaticCapabilitySource {
    /// Create a source over `records`.
    pub fn new(records: Vec<CapabilityRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of capability records.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidArgument`](crate::IntakeError::InvalidArgument)
    /// if the payload is not an array of records.
    pub fn from_json(json: &str) -> Result<Self> {
        let records = serde_json::from_str(json).map_err(|e| {
            crate::IntakeError::InvalidArgument(format!("invalid capability listing: {e}"))
        })?;
        Ok(Self { records })
    }
}

#[async_trait]
impl CapabilitySource for StaticCapabilitySource {
    async fn list_capabilities(&self) -> Result<Vec<CapabilityRecord>> {
        Ok(self.records.clone())
    }
}
