use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::topics::TopicStatus;
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "reportCount": state.store.report_count(),
            "sessionCount": state.store.session_count(),
            "configPath": state.config.path.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let catalog = &state.config.catalog;
    let mut fields = serde_json::Map::new();
    for (name, variants) in catalog.entries() {
        fields.insert(name.to_string(), json!(variants.as_slice()));
    }
    let vocab = &state.config.vocab;
    ok(
        &req.id,
        json!({
            "fields": fields,
            "topicFields": catalog.topic_fields(),
            "statusVocabulary": {
                "completed": vocab.words(TopicStatus::Completed),
                "inProgress": vocab.words(TopicStatus::InProgress),
            },
            "inProgressSubstrings": vocab.in_progress_substrings(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "config.get" => Some(handle_config_get(state, req)),
        _ => None,
    }
}
