use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use serde_json::{
    Value,
    json,
};
use tempfile::TempDir;

const FALLBACK: &str = "Sorry, I encountered an error connecting to the server. Please try again later.";

/// Runs the binary against an isolated data directory
fn campus_chat(data_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_campus-chat"));
    cmd.env("CAMPUS_CHAT_DATA_DIR", data_dir.path())
        .env_remove("CAMPUS_CHAT_ENDPOINT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn ask_prints_visible_answer() {
    let data_dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/chat")
        .match_body(Matcher::Json(json!({
            "question": "When does the library open?",
            "chat_history": [],
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"answer":"<think>check hours</think>At 8am.","sources":[{"content":"Library hours page","metadata":{}}]}"#)
        .create();

    campus_chat(&data_dir)
        .args(["ask", "--endpoint", &server.url(), "When", "does", "the", "library", "open?"])
        .assert()
        .success()
        .stdout("At 8am.\n");

    mock.assert();
}

#[test]
fn ask_can_show_reasoning_and_sources() {
    let data_dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/chat")
        .with_status(200)
        .with_body(r#"{"answer":"<think>check hours</think>At 8am.","sources":[{"content":"Library hours page","metadata":{}}]}"#)
        .create();

    campus_chat(&data_dir)
        .args(["ask", "--show-reasoning", "--show-sources", "--endpoint", &server.url(), "hours?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assistant's Reasoning:\ncheck hours"))
        .stdout(predicate::str::contains("At 8am."))
        .stdout(predicate::str::contains("Source 1: Library hours page"));
}

#[test]
fn ask_json_output() {
    let data_dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/chat")
        .with_status(200)
        .with_body(r#"{"answer":"no reasoning here","sources":null}"#)
        .create();

    let output = campus_chat(&data_dir)
        .args(["ask", "--format", "json", "--endpoint", &server.url(), "hi"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        value,
        json!({
            "question": "hi",
            "answer": "no reasoning here",
            "reasoning": null,
            "visible": "no reasoning here",
            "sources": [],
        })
    );
}

#[test]
fn ask_reports_server_detail() {
    let data_dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/chat")
        .with_status(503)
        .with_body(r#"{"detail":"The assistant is offline for maintenance"}"#)
        .create();

    campus_chat(&data_dir)
        .args(["ask", "--endpoint", &server.url(), "hi"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("The assistant is offline for maintenance"));
}

#[test]
fn ask_falls_back_when_server_is_unreachable() {
    let data_dir = TempDir::new().unwrap();
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    campus_chat(&data_dir)
        .args(["ask", "--endpoint", &format!("http://127.0.0.1:{port}"), "hi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(FALLBACK));
}

#[test]
fn ask_rejects_blank_question() {
    let data_dir = TempDir::new().unwrap();

    campus_chat(&data_dir)
        .args(["ask", "--endpoint", "http://127.0.0.1:9", "   "])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("the question is empty"));
}

#[test]
fn ask_rejects_invalid_endpoint() {
    let data_dir = TempDir::new().unwrap();

    campus_chat(&data_dir)
        .args(["ask", "--endpoint", "not a url", "hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid chatbot endpoint"));
}

#[test]
fn endpoint_from_env_and_settings() {
    let data_dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/chat")
        .with_status(200)
        .with_body(r#"{"answer":"ok"}"#)
        .expect(2)
        .create();

    campus_chat(&data_dir)
        .env("CAMPUS_CHAT_ENDPOINT", server.url())
        .args(["ask", "hi"])
        .assert()
        .success()
        .stdout("ok\n");

    campus_chat(&data_dir)
        .args(["settings", "api.endpoint", &server.url()])
        .assert()
        .success();
    campus_chat(&data_dir)
        .args(["ask", "hi"])
        .assert()
        .success()
        .stdout("ok\n");

    mock.assert();
}

#[test]
fn settings_round_trip() {
    let data_dir = TempDir::new().unwrap();

    campus_chat(&data_dir)
        .args(["settings", "chat.theme", "light"])
        .assert()
        .success();
    campus_chat(&data_dir)
        .args(["settings", "api.timeout", "15"])
        .assert()
        .success();

    campus_chat(&data_dir)
        .args(["settings", "chat.theme"])
        .assert()
        .success()
        .stdout("light\n");
    campus_chat(&data_dir)
        .args(["settings", "api.timeout", "--format", "json"])
        .assert()
        .success()
        .stdout("15\n");

    let output = campus_chat(&data_dir)
        .args(["settings", "all", "--format", "json"])
        .output()
        .unwrap();
    let all: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(all, json!({ "chat.theme": "light", "api.timeout": 15 }));

    let on_disk: Value =
        serde_json::from_str(&std::fs::read_to_string(data_dir.path().join("settings.json")).unwrap()).unwrap();
    assert_eq!(on_disk, all);

    campus_chat(&data_dir)
        .args(["settings", "chat.theme", "--delete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removing \"chat.theme\""));
    campus_chat(&data_dir)
        .args(["settings", "chat.theme"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No value associated with chat.theme"));
    campus_chat(&data_dir)
        .args(["settings", "chat.theme", "--format", "json"])
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn settings_rejects_unknown_keys_and_bad_values() {
    let data_dir = TempDir::new().unwrap();

    campus_chat(&data_dir)
        .args(["settings", "chat.colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chat.colour is not a valid setting"));

    campus_chat(&data_dir)
        .args(["settings", "chat.theme", "sepia"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value for chat.theme"));

    assert!(!data_dir.path().join("settings.json").exists());
}
