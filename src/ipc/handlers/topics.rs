use crate::fields;
use crate::ipc::error::ok;
use crate::ipc::helpers::{field_groups_param, required_str, source_record};
use crate::ipc::types::{AppState, Request};
use crate::report;
use crate::topics::{classify_topic_status, TopicStatus};
use serde_json::json;

fn handle_topics_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let topic = match required_str(req, "topic") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let record = match source_record(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let status = fields::get_value(record, state.config.catalog.completion(), None)
        .and_then(|v| v.as_object())
        .map(|c| classify_topic_status(c, &topic, &state.config.vocab))
        .unwrap_or(TopicStatus::None);
    ok(&req.id, json!({ "topic": topic, "status": status }))
}

fn handle_topics_aggregate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let groups = match field_groups_param(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let record = match source_record(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let agg = report::aggregate(record, &state.config.catalog, &groups, &state.config.vocab);
    ok(&req.id, json!(agg))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "topics.status" => Some(handle_topics_status(state, req)),
        "topics.aggregate" => Some(handle_topics_aggregate(state, req)),
        _ => None,
    }
}
