use crate::fields;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{
    optional_bool, optional_str, required_str, source_record, variants_param,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_fields_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let variants = match variants_param(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let record = match source_record(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let resolution = if optional_bool(req, "partial") {
        fields::resolve_loose(record, &variants)
    } else {
        fields::resolve(record, &variants)
    };
    ok(
        &req.id,
        json!({
            "key": resolution.key,
            "match": resolution.kind,
            "exists": record.contains_key(&resolution.key),
        }),
    )
}

fn handle_fields_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let variants = match variants_param(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let record = match source_record(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let sub_key = optional_str(req, "subKey");
    let value = fields::get_value(record, &variants, sub_key.as_deref())
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    ok(
        &req.id,
        json!({
            "key": fields::resolve_key(record, &variants),
            "value": value,
        }),
    )
}

fn handle_fields_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match required_str(req, "sessionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let variants = match variants_param(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(value) = req.params.get("value").cloned() else {
        return err(&req.id, "bad_params", "missing value", None);
    };
    let sub_key = optional_str(req, "subKey");

    let session = match state.store.session_mut(&session_id) {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, e),
    };
    let record = &mut session.record;
    let key = match sub_key.as_deref() {
        Some(sub_key) => fields::set_value(record, &variants, sub_key, value),
        None => fields::set_top_level(record, &variants, value),
    };
    let stored = fields::get_value(record, &variants, sub_key.as_deref())
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    ok(
        &req.id,
        json!({
            "key": key,
            "value": stored,
            "keyPresent": record.contains_key(&key),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "fields.resolve" => Some(handle_fields_resolve(state, req)),
        "fields.get" => Some(handle_fields_get(state, req)),
        "fields.set" => Some(handle_fields_set(state, req)),
        _ => None,
    }
}
