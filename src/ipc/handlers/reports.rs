use crate::fields::Record;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{optional_str, required_str, source_record};
use crate::ipc::types::{AppState, Request};
use crate::report;
use anyhow::Context;
use serde_json::json;
use std::path::Path;

fn read_report_file(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.to_string_lossy()))
}

fn into_record(req: &Request, value: serde_json::Value) -> Result<Record, serde_json::Value> {
    match value {
        serde_json::Value::Object(m) => Ok(m),
        other => Err(err(
            &req.id,
            "bad_json",
            "report must be a JSON object",
            Some(json!({ "type": json_type(&other) })),
        )),
    }
}

pub fn json_type(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn handle_reports_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("report").cloned() else {
        return err(&req.id, "bad_params", "missing report", None);
    };
    let record = match into_record(req, raw) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let meta = state.store.load(optional_str(req, "reportId"), record);
    ok(&req.id, json!(meta))
}

fn handle_reports_load_file(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let raw = match read_report_file(Path::new(&path)) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(path = %path, error = %format!("{e:#}"), "report file rejected");
            let code = if e.downcast_ref::<serde_json::Error>().is_some() {
                "bad_json"
            } else {
                "io_failed"
            };
            return err(&req.id, code, format!("{e:#}"), Some(json!({ "path": path })));
        }
    };
    let record = match into_record(req, raw) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let meta = state.store.load(optional_str(req, "reportId"), record);
    ok(&req.id, json!(meta))
}

fn handle_reports_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "reports": state.store.list() }))
}

fn handle_reports_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let report_id = match required_str(req, "reportId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.get(&report_id) {
        Ok((stored, meta)) => {
            let mut result = json!(meta);
            result["report"] = serde_json::Value::Object(stored.record.clone());
            ok(&req.id, result)
        }
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_reports_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let report_id = match required_str(req, "reportId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let removed = state.store.remove(&report_id);
    ok(&req.id, json!({ "removed": removed }))
}

fn handle_reports_topic_rows(state: &mut AppState, req: &Request) -> serde_json::Value {
    let record = match source_record(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let model = report::topic_rows(record, &state.config.catalog, &state.config.vocab);
    ok(&req.id, json!(model))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.load" => Some(handle_reports_load(state, req)),
        "reports.loadFile" => Some(handle_reports_load_file(state, req)),
        "reports.list" => Some(handle_reports_list(state, req)),
        "reports.get" => Some(handle_reports_get(state, req)),
        "reports.remove" => Some(handle_reports_remove(state, req)),
        "reports.topicRows" => Some(handle_reports_topic_rows(state, req)),
        _ => None,
    }
}
