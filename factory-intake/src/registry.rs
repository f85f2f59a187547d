//! Capability registry: the owned, shared corpus index.
//!
//! [`CapabilityRegistry`] holds the current [`CorpusSnapshot`] behind an
//! `RwLock<Arc<_>>`. Readers clone the `Arc` and search an immutable
//! snapshot without holding the lock. Writers mutate through
//! [`Arc::make_mut`], so a reader that still holds the previous snapshot
//! keeps seeing it unchanged while the new state is published atomically.
//!
//! # Example
//!
//! ```rust,ignore
//! use factory_intake::{CapabilityRecord, CapabilityRegistry};
//!
//! let registry = CapabilityRegistry::new();
//! registry.register_record(
//!     CapabilityRecord::new("invoice-ocr", "Automated invoice data extraction").with_tags(["ocr"]),
//! )?;
//! let matches = registry.snapshot().search("read invoices automatically", 5)?;
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::document::{CapabilityRecord, SimilarityMatch};
use crate::error::{IntakeError, Result};
use crate::index::CorpusIndex;
use crate::search;
use crate::source::CapabilitySource;

/// A tag shared by several registered capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReusableComponent {
    /// The shared tag.
    pub tag: String,
    /// Number of capabilities carrying the tag.
    pub usage_count: usize,
    /// Capabilities carrying the tag, in ascending id order.
    pub capability_ids: Vec<String>,
}

/// An immutable view of the registry at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusSnapshot {
    index: CorpusIndex,
    records: BTreeMap<String, CapabilityRecord>,
}

impl CorpusSnapshot {
    fn from_records(records: impl IntoIterator<Item = CapabilityRecord>) -> Result<Self> {
        let mut snapshot = Self::default();
        for record in records {
            snapshot.insert(record)?;
        }
        Ok(snapshot)
    }

    fn insert(&mut self, record: CapabilityRecord) -> Result<()> {
        self.index.insert(record.id.clone(), record.text())?;
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    fn update(&mut self, id: &str, description: String) -> Result<()> {
        let mut record =
            self.records.get(id).cloned().ok_or_else(|| IntakeError::NotFound(id.to_string()))?;
        record.description = description;
        self.index.update(id, record.text())?;
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<()> {
        self.index.remove(id)?;
        self.records.remove(id);
        Ok(())
    }

    /// Returns the TF-IDF index.
    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    /// Returns the number of live capabilities.
    pub fn len(&self) -> usize {
        self.index.corpus_size()
    }

    /// Returns `true` if no capabilities are registered.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the record a capability was registered with.
    pub fn record(&self, id: &str) -> Option<&CapabilityRecord> {
        self.records.get(id)
    }

    /// Returns the tags registered with a capability.
    pub fn tags(&self, id: &str) -> &[String] {
        self.records.get(id).map(|record| record.tags.as_slice()).unwrap_or_default()
    }

    /// Returns the business category of a capability, if it has one.
    pub fn category(&self, id: &str) -> Option<&str> {
        self.records.get(id).and_then(|record| record.category.as_deref())
    }

    /// Rank registered capabilities against `query_text`.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidArgument`] if `top_k` is zero.
    pub fn search(&self, query_text: &str, top_k: usize) -> Result<Vec<SimilarityMatch>> {
        search::search(&self.index, query_text, top_k)
    }

    /// Rank only the capabilities in `category` against `query_text`.
    ///
    /// Scores use corpus-wide IDF, so a capability scores the same here as in
    /// [`search`](Self::search). An unknown category gives no matches.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidArgument`] if `top_k` is zero.
    pub fn search_in_category(
        &self,
        query_text: &str,
        category: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarityMatch>> {
        search::search_where(&self.index, query_text, top_k, |id| self.category(id) == Some(category))
    }

    /// Rank registered capabilities against the capability `id`, excluding it.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidArgument`] if `limit` is zero or
    /// [`IntakeError::NotFound`] if `id` is not registered.
    pub fn similar_to(&self, id: &str, limit: usize) -> Result<Vec<SimilarityMatch>> {
        search::similar_to(&self.index, id, limit)
    }

    /// Tags used by at least two capabilities, most used first, then by tag.
    pub fn reusable_components(&self) -> Vec<ReusableComponent> {
        let mut usage: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (id, record) in &self.records {
            for tag in &record.tags {
                let ids = usage.entry(tag.as_str()).or_default();
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
            }
        }

        let mut components: Vec<ReusableComponent> = usage
            .into_iter()
            .filter(|(_, ids)| ids.len() >= 2)
            .map(|(tag, capability_ids)| ReusableComponent {
                tag: tag.to_string(),
                usage_count: capability_ids.len(),
                capability_ids,
            })
            .collect();
        components.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then_with(|| a.tag.cmp(&b.tag)));
        components
    }
}

/// The owned registry of capability documents.
///
/// Lifecycle: create with [`new`](Self::new) or
/// [`with_records`](Self::with_records), mutate with the `register`,
/// `update`, `deactivate` and `rebuild` operations, and
/// [`close`](Self::close) when done. Every mutation validates before it
/// changes anything, so a failed call leaves the published snapshot as it
/// was.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    state: RwLock<Arc<CorpusSnapshot>>,
    closed: AtomicBool,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with `records`.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::DuplicateId`] if two records share an id.
    pub fn with_records(records: impl IntoIterator<Item = CapabilityRecord>) -> Result<Self> {
        let snapshot = CorpusSnapshot::from_records(records)?;
        Ok(Self { state: RwLock::new(Arc::new(snapshot)), closed: AtomicBool::new(false) })
    }

    /// Returns the current snapshot.
    ///
    /// The snapshot never changes; later mutations publish a new one.
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Register a capability from its description text.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::DuplicateId`] if `id` is already registered.
    pub fn register_capability(&self, id: impl Into<String>, text: impl Into<String>) -> Result<()> {
        self.register_record(CapabilityRecord::new(id, text))
    }

    /// Register a capability record, indexing its description and tags.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::DuplicateId`] if the id is already registered.
    pub fn register_record(&self, record: CapabilityRecord) -> Result<()> {
        let id = record.id.clone();
        let corpus_size = self.mutate(|state| {
            state.insert(record)?;
            Ok(state.len())
        })?;
        info!(capability.id = %id, corpus_size, "registered capability");
        Ok(())
    }

    /// Replace the description of a registered capability. Its tags and
    /// category are kept, and the tags stay part of the indexed text.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotFound`] if `id` is not registered.
    pub fn update_capability(&self, id: &str, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.mutate(|state| state.update(id, text))?;
        info!(capability.id = %id, "updated capability");
        Ok(())
    }

    /// Remove a capability from the corpus.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotFound`] if `id` is not registered.
    pub fn deactivate_capability(&self, id: &str) -> Result<()> {
        let corpus_size = self.mutate(|state| {
            state.remove(id)?;
            Ok(state.len())
        })?;
        info!(capability.id = %id, corpus_size, "deactivated capability");
        Ok(())
    }

    /// Replace the whole corpus with `records`, either full
    /// [`CapabilityRecord`]s or plain `(id, text)` pairs.
    ///
    /// The new snapshot is built before the lock is taken and swapped in
    /// whole, so readers see either the old corpus or the new one.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::DuplicateId`] if two records share an id; the
    /// current corpus stays published.
    pub fn rebuild_index(
        &self,
        records: impl IntoIterator<Item = impl Into<CapabilityRecord>>,
    ) -> Result<()> {
        self.ensure_open()?;
        let snapshot = CorpusSnapshot::from_records(records.into_iter().map(Into::into)).map_err(|e| {
            error!(error = %e, "index rebuild failed, keeping current corpus");
            e
        })?;
        let corpus_size = snapshot.len();

        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            return Err(closed_error());
        }
        *guard = Arc::new(snapshot);
        drop(guard);

        info!(corpus_size, "rebuilt capability index");
        Ok(())
    }

    /// Pull the full listing from `source` and rebuild the corpus from it.
    ///
    /// Returns the number of capabilities loaded.
    ///
    /// # Errors
    ///
    /// Propagates the source's error, or the [`rebuild_index`](Self::rebuild_index)
    /// error. Either way the current corpus stays published.
    pub async fn reload_from(&self, source: &dyn CapabilitySource) -> Result<usize> {
        self.ensure_open()?;
        let records = source.list_capabilities().await.map_err(|e| {
            error!(error = %e, "capability source listing failed");
            e
        })?;
        let count = records.len();
        self.rebuild_index(records)?;
        Ok(count)
    }

    /// Close the registry.
    ///
    /// Further mutations fail with [`IntakeError::PipelineError`] and the
    /// published snapshot becomes empty. Snapshots already handed out stay
    /// valid.
    pub fn close(&self) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if self.closed.swap(true, Ordering::AcqRel) {
            warn!("capability registry closed twice");
            return;
        }
        let corpus_size = guard.len();
        *guard = Arc::new(CorpusSnapshot::default());
        drop(guard);
        info!(corpus_size, "closed capability registry");
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut CorpusSnapshot) -> Result<T>) -> Result<T> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            return Err(closed_error());
        }
        op(Arc::make_mut(&mut guard))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() { Err(closed_error()) } else { Ok(()) }
    }
}

fn closed_error() -> IntakeError {
    IntakeError::PipelineError("capability registry is closed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticCapabilitySource;

    fn record(id: &str, text: &str, tags: &[&str]) -> CapabilityRecord {
        CapabilityRecord::new(id, text).with_tags(tags.iter().copied())
    }

    #[test]
    fn register_and_search() {
        let registry = CapabilityRegistry::new();
        registry.register_capability("invoice-ocr", "automated invoice data extraction").unwrap();
        registry.register_capability("hr-bot", "answers employee benefit questions").unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        let matches = snapshot.search("invoice extraction", 5).unwrap();
        assert_eq!(matches[0].document_id, "invoice-ocr");
    }

    #[test]
    fn duplicate_registration_leaves_snapshot_unchanged() {
        let registry = CapabilityRegistry::new();
        registry.register_capability("a", "invoice parser").unwrap();
        let before = registry.snapshot();

        let err = registry.register_capability("a", "something else").unwrap_err();

        assert_eq!(err, IntakeError::DuplicateId("a".into()));
        assert_eq!(*registry.snapshot(), *before);
    }

    #[test]
    fn held_snapshot_is_not_affected_by_later_writes() {
        let registry = CapabilityRegistry::new();
        registry.register_capability("a", "invoice parser").unwrap();
        let held = registry.snapshot();

        registry.register_capability("b", "payroll runs").unwrap();
        registry.deactivate_capability("a").unwrap();

        assert_eq!(held.len(), 1);
        assert!(held.index().contains("a"));
        assert!(!registry.snapshot().index().contains("a"));
    }

    #[test]
    fn update_and_deactivate_unknown_ids_fail() {
        let registry = CapabilityRegistry::new();
        assert_eq!(registry.update_capability("x", "text").unwrap_err(), IntakeError::NotFound("x".into()));
        assert_eq!(registry.deactivate_capability("x").unwrap_err(), IntakeError::NotFound("x".into()));
    }

    #[test]
    fn update_keeps_tags_indexed() {
        let registry =
            CapabilityRegistry::with_records([record("ocr", "reads invoices", &["pdf", "scanner"])])
                .unwrap();

        registry.update_capability("ocr", "reads receipts").unwrap();

        let snapshot = registry.snapshot();
        let document = snapshot.index().document("ocr").unwrap();
        assert_eq!(document.raw_text(), "reads receipts pdf scanner");
        assert_eq!(snapshot.index().document_frequency("scanner"), 1);
        assert_eq!(snapshot.index().document_frequency("invoice"), 0);
        assert_eq!(snapshot.tags("ocr"), ["pdf".to_string(), "scanner".to_string()]);
        assert_eq!(snapshot.record("ocr").unwrap().description, "reads receipts");
    }

    #[test]
    fn category_search_ranks_only_that_category() {
        let registry = CapabilityRegistry::with_records([
            record("invoice-ocr", "invoice data extraction", &[]).with_category("financial"),
            record("invoice-archive", "invoice storage and retrieval", &[]).with_category("legal"),
            record("expense-audit", "expense claim checks", &[]).with_category("financial"),
        ])
        .unwrap();
        let snapshot = registry.snapshot();

        let scoped = snapshot.search_in_category("invoice extraction", "financial", 5).unwrap();
        let ids: Vec<&str> = scoped.iter().map(|m| m.document_id.as_str()).collect();
        assert_eq!(ids, vec!["invoice-ocr", "expense-audit"]);

        let unscoped = snapshot.search("invoice extraction", 5).unwrap();
        let same = unscoped.iter().find(|m| m.document_id == "invoice-ocr").unwrap();
        assert_eq!(scoped[0].score, same.score);

        assert!(snapshot.search_in_category("invoice", "hr", 5).unwrap().is_empty());
    }

    #[test]
    fn update_keeps_category() {
        let registry = CapabilityRegistry::with_records([
            record("ocr", "reads invoices", &[]).with_category("financial"),
        ])
        .unwrap();
        registry.update_capability("ocr", "reads receipts").unwrap();
        assert_eq!(registry.snapshot().category("ocr"), Some("financial"));
    }

    #[test]
    fn deactivate_drops_tags() {
        let registry = CapabilityRegistry::with_records([
            record("a", "invoice reader", &["ocr"]),
            record("b", "receipt reader", &["ocr"]),
        ])
        .unwrap();
        assert_eq!(registry.snapshot().reusable_components().len(), 1);

        registry.deactivate_capability("b").unwrap();

        assert!(registry.snapshot().reusable_components().is_empty());
        assert!(registry.snapshot().tags("b").is_empty());
    }

    #[test]
    fn failed_rebuild_keeps_current_corpus() {
        let registry = CapabilityRegistry::new();
        registry.register_capability("keep", "invoice parser").unwrap();

        let result = registry.rebuild_index([record("x", "one", &[]), record("x", "two", &[])]);

        assert!(matches!(result, Err(IntakeError::DuplicateId(_))));
        assert!(registry.snapshot().index().contains("keep"));
    }

    #[test]
    fn rebuild_replaces_corpus() {
        let registry = CapabilityRegistry::new();
        registry.register_capability("old", "invoice parser").unwrap();
        registry.rebuild_index([("new", "payroll runs")]).unwrap();

        let snapshot = registry.snapshot();
        assert!(!snapshot.index().contains("old"));
        assert!(snapshot.index().contains("new"));
    }

    #[test]
    fn reusable_components_sorted_by_usage_then_tag() {
        let registry = CapabilityRegistry::with_records([
            record("a", "one", &["pdf", "ocr"]),
            record("b", "two", &["ocr", "email"]),
            record("c", "three", &["ocr", "pdf", "email"]),
            record("d", "four", &["slack"]),
        ])
        .unwrap();

        let report = registry.snapshot().reusable_components();
        let tags: Vec<&str> = report.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["ocr", "email", "pdf"]);
        assert_eq!(report[0].usage_count, 3);
        assert_eq!(report[0].capability_ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn closed_registry_rejects_mutations() {
        let registry = CapabilityRegistry::new();
        registry.register_capability("a", "invoice parser").unwrap();
        let held = registry.snapshot();

        registry.close();

        assert!(registry.is_closed());
        assert!(registry.snapshot().is_empty());
        assert_eq!(held.len(), 1);
        assert!(matches!(registry.register_capability("b", "x"), Err(IntakeError::PipelineError(_))));
        assert!(matches!(registry.rebuild_index(Vec::<CapabilityRecord>::new()), Err(IntakeError::PipelineError(_))));
    }

    #[tokio::test]
    async fn reload_from_source() {
        let registry = CapabilityRegistry::new();
        registry.register_capability("stale", "old text").unwrap();
        let source = StaticCapabilitySource::new(vec![
            record("invoice-ocr", "automated invoice data extraction", &["ocr"]),
            record("ticket-router", "routes IT tickets", &[]),
        ]);

        let loaded = registry.reload_from(&source).await.unwrap();

        assert_eq!(loaded, 2);
        let snapshot = registry.snapshot();
        assert!(!snapshot.index().contains("stale"));
        assert_eq!(snapshot.tags("invoice-ocr"), ["ocr".to_string()]);
    }
}
