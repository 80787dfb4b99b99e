use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn fixture_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(rel)
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_reportd");
    let mut child = Command::new(exe)
        .env_remove("REPORTD_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn reportd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["result"]["reportCount"], json!(0));
    let _ = request(&mut stdin, &mut reader, "2", "config.get", json!({}));

    let loaded = request(
        &mut stdin,
        &mut reader,
        "3",
        "reports.loadFile",
        json!({
            "path": fixture_path("fixtures/reports/candidate_mixed.json").to_string_lossy(),
            "reportId": "smoke"
        }),
    );
    assert_eq!(loaded["result"]["reportId"], json!("smoke"));

    let _ = request(&mut stdin, &mut reader, "4", "reports.list", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "reports.get",
        json!({ "reportId": "smoke" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "reports.topicRows",
        json!({ "reportId": "smoke" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "fields.resolve",
        json!({ "reportId": "smoke", "field": "dailyQuizCounts" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "fields.get",
        json!({ "reportId": "smoke", "field": "dailyQuizCounts", "subKey": "React" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "topics.status",
        json!({ "reportId": "smoke", "topic": "React" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "10",
        "topics.aggregate",
        json!({ "reportId": "smoke" }),
    );
    let begun = request(
        &mut stdin,
        &mut reader,
        "11",
        "sessions.begin",
        json!({ "reportId": "smoke" }),
    );
    let session_id = begun["result"]["sessionId"]
        .as_str()
        .expect("sessionId")
        .to_string();
    let _ = request(
        &mut stdin,
        &mut reader,
        "12",
        "fields.set",
        json!({
            "sessionId": session_id,
            "field": "dailyQuizCounts",
            "subKey": "React",
            "value": 6
        }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "sessions.get",
        json!({ "sessionId": session_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "14",
        "sessions.replaceJson",
        json!({ "sessionId": session_id, "text": "{}" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "15",
        "sessions.commit",
        json!({ "sessionId": session_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "16",
        "sessions.cancel",
        json!({ "sessionId": session_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "17",
        "reports.load",
        json!({ "report": { "a": 1 } }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "18",
        "reports.remove",
        json!({ "reportId": "smoke" }),
    );

    let unknown = request_raw(&mut stdin, &mut reader, "19", "reports.explode");
    assert_eq!(unknown["error"]["code"], json!("not_implemented"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_line_gets_bad_json_and_loop_continues() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{ not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response");
    assert_eq!(value["ok"], json!(false));
    assert_eq!(value["error"]["code"], json!("bad_json"));

    let health = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(health["ok"], json!(true));

    drop(stdin);
    let _ = child.wait();
}

fn request_raw(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
) -> serde_json::Value {
    writeln!(stdin, "{}", json!({ "id": id, "method": method })).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    serde_json::from_str(line.trim()).expect("parse response json")
}
