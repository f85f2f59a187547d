use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, layer::Context};

/// One captured log event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub level: String,
    pub target: String,
    /// The event's message, or empty if it had none
    pub message: String,
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl EventRecord {
    /// Returns a field rendered as a string, whatever its recorded type
    pub fn field_str(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Returns a numeric field
    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(serde_json::Value::as_f64)
    }
}

/// Shared storage for captured events
#[derive(Debug, Clone, Default)]
pub struct SharedEventStorage {
    events: Arc<RwLock<Vec<EventRecord>>>,
}

impl SharedEventStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: EventRecord) {
        self.events.write().unwrap_or_else(PoisonError::into_inner).push(event);
    }

    /// All events captured so far, oldest first
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Events whose message equals `message`
    pub fn events_with_message(&self, message: &str) -> Vec<EventRecord> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.message == message)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// A tracing layer that captures events in memory
pub struct InMemoryEventLayer {
    storage: Arc<SharedEventStorage>,
}

impl InMemoryEventLayer {
    pub fn new(storage: Arc<SharedEventStorage>) -> Self {
        Self { storage }
    }
}

impl<S> Layer<S> for InMemoryEventLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.0;

        let message = match fields.remove("message") {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let metadata = event.metadata();
        self.storage.push(EventRecord {
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message,
            fields,
        });
    }
}

/// Run `f` with a thread-local subscriber that captures every event, and
/// return its result with the captured events.
///
/// The global subscriber is left untouched, so tests using this can run in
/// parallel.
pub fn capture_events<F, R>(f: F) -> (R, Vec<EventRecord>)
where
    F: FnOnce() -> R,
{
    let storage = Arc::new(SharedEventStorage::new());
    let subscriber =
        tracing_subscriber::registry().with(InMemoryEventLayer::new(Arc::clone(&storage)));
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, storage.events())
}

#[derive(Default)]
struct JsonVisitor(BTreeMap<String, serde_json::Value>);

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_message_and_typed_fields() {
        let ((), events) = capture_events(|| {
            tracing::info!(capability.id = %"invoice-ocr", corpus_size = 3usize, best_score = 0.5, "registered capability");
        });

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.level, "INFO");
        assert_eq!(event.message, "registered capability");
        assert_eq!(event.field_str("capability.id").as_deref(), Some("invoice-ocr"));
        assert_eq!(event.fields["corpus_size"], serde_json::json!(3));
        assert_eq!(event.field_f64("best_score"), Some(0.5));
    }

    #[test]
    fn storage_filters_by_message() {
        let storage = SharedEventStorage::new();
        for message in ["a", "b", "a"] {
            storage.push(EventRecord {
                level: "INFO".into(),
                target: "test".into(),
                message: message.into(),
                fields: BTreeMap::new(),
            });
        }
        assert_eq!(storage.events_with_message("a").len(), 2);
        storage.clear();
        assert!(storage.is_empty());
    }
}
