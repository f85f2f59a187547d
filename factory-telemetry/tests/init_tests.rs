use std::sync::Arc;

use factory_telemetry::{SharedEventStorage, init_telemetry, init_with_storage};

// Each integration test file is its own process, so the global subscriber
// starts unset here.
#[tokio::test]
async fn global_capture_sees_events_and_second_init_fails() {
    let storage = Arc::new(SharedEventStorage::new());
    init_with_storage("intake-test", storage.clone()).unwrap();

    tracing::info!(capability.id = "invoice-ocr", "registered capability");
    tracing::debug!("filtered out at the default level");

    let events = storage.events_with_message("registered capability");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].field_str("capability.id").as_deref(), Some("invoice-ocr"));
    assert!(storage.events_with_message("telemetry initialized with event capture").len() == 1);

    assert!(init_telemetry("intake-test").is_err());
}
