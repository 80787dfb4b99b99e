use crate::ipc::error::{err, ok, store_err};
use crate::ipc::handlers::reports::json_type;
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_sessions_begin(state: &mut AppState, req: &Request) -> serde_json::Value {
    let report_id = match required_str(req, "reportId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.begin(&report_id) {
        Ok((session_id, base_revision)) => ok(
            &req.id,
            json!({
                "sessionId": session_id,
                "reportId": report_id,
                "baseRevision": base_revision,
            }),
        ),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_sessions_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match required_str(req, "sessionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.session(&session_id) {
        Ok(s) => ok(
            &req.id,
            json!({
                "reportId": s.report_id,
                "baseRevision": s.base_revision,
                "dirty": s.dirty(),
                "record": s.record,
            }),
        ),
        Err(e) => store_err(&req.id, e),
    }
}

/// Manual edit of the whole record. On any parse failure the session keeps
/// its previous record.
fn handle_sessions_replace_json(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match required_str(req, "sessionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let text = match required_str(req, "text") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let session = match state.store.session_mut(&session_id) {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, e),
    };
    let parsed: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%session_id, error = %e, "manual edit rejected");
            return err(
                &req.id,
                "bad_json",
                e.to_string(),
                Some(json!({ "line": e.line(), "column": e.column() })),
            );
        }
    };
    match parsed {
        serde_json::Value::Object(m) => {
            session.record = m;
            ok(&req.id, json!({ "replaced": true, "dirty": session.dirty() }))
        }
        other => err(
            &req.id,
            "bad_json",
            "report must be a JSON object",
            Some(json!({ "type": json_type(&other) })),
        ),
    }
}

fn handle_sessions_commit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match required_str(req, "sessionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.commit(&session_id) {
        Ok(meta) => ok(&req.id, json!(meta)),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_sessions_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match required_str(req, "sessionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if state.store.cancel(&session_id) {
        ok(&req.id, json!({ "cancelled": true }))
    } else {
        err(
            &req.id,
            "not_found",
            format!("session not found: {}", session_id),
            None,
        )
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "sessions.begin" => Some(handle_sessions_begin(state, req)),
        "sessions.get" => Some(handle_sessions_get(state, req)),
        "sessions.replaceJson" => Some(handle_sessions_replace_json(state, req)),
        "sessions.commit" => Some(handle_sessions_commit(state, req)),
        "sessions.cancel" => Some(handle_sessions_cancel(state, req)),
        _ => None,
    }
}
