use std::sync::Arc;

use axum::Router;
use githook_core::{PushEvent, ReferencePattern};
use githook_tracker::mock::MockTracker;
use serde_json::{json, Value};

use crate::processor::{EventProcessor, ProcessorSettings, TransportPolicy};

pub const AUTHOR_EMAIL: &str = "jane@example.com";

pub fn test_settings() -> ProcessorSettings {
    ProcessorSettings {
        source_host: "https://stash.example.com".into(),
        pattern: ReferencePattern::default(),
        default_user: "githook-bot".into(),
        transport_policy: TransportPolicy::Abort,
    }
}

/// Push payload on `main` with one commit per message, ids `c0`, `c1`, ...
pub fn push_payload(messages: &[&str]) -> Value {
    let values: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            json!({
                "toCommit": {
                    "id": format!("c{i}"),
                    "message": message,
                    "author": { "name": "Jane Doe", "emailAddress": AUTHOR_EMAIL },
                    "authorTimestamp": 1420113600000i64
                }
            })
        })
        .collect();

    json!({
        "repository": {
            "name": "Backend",
            "slug": "backend",
            "project": { "key": "OPS" }
        },
        "refChanges": [{ "refId": "refs/heads/main" }],
        "changesets": { "values": values }
    })
}

pub fn push_event(messages: &[&str]) -> PushEvent {
    serde_json::from_value(push_payload(messages)).unwrap()
}

/// Build a router backed by `tracker` with the test settings.
pub fn test_router(tracker: Arc<MockTracker>) -> Router {
    crate::app(EventProcessor::new(tracker, Arc::new(test_settings())))
}
