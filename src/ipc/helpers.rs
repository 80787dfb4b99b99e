use crate::fields::{FieldVariants, Record};
use crate::ipc::error::{err, store_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

pub fn optional_bool(req: &Request, key: &str) -> bool {
    req.params
        .get(key)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn parse_variant_list(
    req: &Request,
    raw: &serde_json::Value,
) -> Result<FieldVariants, serde_json::Value> {
    let Some(items) = raw.as_array() else {
        return Err(err(&req.id, "bad_params", "variants must be an array", None));
    };
    let mut out = Vec::with_capacity(items.len());
    for (i, v) in items.iter().enumerate() {
        match v.as_str() {
            Some(s) => out.push(s.to_string()),
            None => {
                return Err(err(
                    &req.id,
                    "bad_params",
                    "variants must contain only strings",
                    Some(json!({ "index": i })),
                ))
            }
        }
    }
    FieldVariants::new(out)
        .ok_or_else(|| err(&req.id, "bad_params", "variants must not be empty", None))
}

/// Explicit `variants` win over a catalog `field` name.
pub fn variants_param(
    state: &AppState,
    req: &Request,
) -> Result<FieldVariants, serde_json::Value> {
    if let Some(raw) = req.params.get("variants") {
        return parse_variant_list(req, raw);
    }
    let field = required_str(req, "field")
        .map_err(|_| err(&req.id, "bad_params", "missing field or variants", None))?;
    state.config.catalog.get(&field).cloned().ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            format!("unknown field: {}", field),
            Some(json!({ "field": field })),
        )
    })
}

/// Optional list of catalog field names, or explicit variant lists.
pub fn field_groups_param(
    state: &AppState,
    req: &Request,
) -> Result<Vec<FieldVariants>, serde_json::Value> {
    let Some(raw) = req.params.get("fields") else {
        return Ok(state.config.catalog.topic_groups());
    };
    let Some(items) = raw.as_array() else {
        return Err(err(&req.id, "bad_params", "fields must be an array", None));
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if let Some(name) = item.as_str() {
            let v = state.config.catalog.get(name).cloned().ok_or_else(|| {
                err(
                    &req.id,
                    "bad_params",
                    format!("unknown field: {}", name),
                    Some(json!({ "field": name })),
                )
            })?;
            out.push(v);
        } else {
            out.push(parse_variant_list(req, item)?);
        }
    }
    Ok(out)
}

/// A session's working copy when `sessionId` is given, otherwise the
/// stored snapshot named by `reportId`.
pub fn source_record<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Record, serde_json::Value> {
    if let Some(session_id) = optional_str(req, "sessionId") {
        return state
            .store
            .session(&session_id)
            .map(|s| &s.record)
            .map_err(|e| store_err(&req.id, e));
    }
    let Some(report_id) = optional_str(req, "reportId") else {
        return Err(err(
            &req.id,
            "bad_params",
            "missing sessionId or reportId",
            None,
        ));
    };
    state
        .store
        .get(&report_id)
        .map(|(r, _)| &r.record)
        .map_err(|e| store_err(&req.id, e))
}
