//! Command-line behavior of the `rossum` binary.

use std::path::Path;

use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;

const READY_BODY: &str = r#"{
    "status": "ready",
    "language": "eng",
    "currency": "eur",
    "fields": [
        {"name": "invoice_id", "title": "Invoice number", "value": "INV-1", "score": 0.5},
        {"name": "invoice_id", "title": "Invoice number", "value": "INV-2", "score": 0.9},
        {"name": "amount_total", "title": "Amount total", "value": "121.00", "score": 0.75}
    ]
}"#;

/// `rossum` with an isolated config directory and no credentials in the environment.
fn rossum(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rossum").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("ROSSUM_API_KEY")
        .env_remove("ROSSUM_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_document(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4\n% placeholder\n").unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    rossum(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_extract_help_shows_options() {
    let home = tempfile::tempdir().unwrap();
    rossum(home.path())
        .args(["extract", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DOCUMENT_PATH"))
        .stdout(predicate::str::contains("--no-tables"))
        .stdout(predicate::str::contains("--filter"));
}

#[test]
fn test_missing_api_key() {
    let home = tempfile::tempdir().unwrap();
    let document = write_document(home.path(), "invoice.pdf");

    rossum(home.path())
        .arg("extract")
        .arg(&document)
        .assert()
        .code(78)
        .stderr(predicate::str::contains("ROSSUM_API_KEY"));
}

#[test]
fn test_invalid_filter_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    rossum(home.path())
        .args(["extract", "-f", "some", "invoice.pdf"])
        .assert()
        .code(2);
}

#[test]
fn test_unsupported_document_type() {
    let home = tempfile::tempdir().unwrap();
    let document = write_document(home.path(), "invoice.docx");

    rossum(home.path())
        .env("ROSSUM_API_KEY", "test-key")
        .env("ROSSUM_API_URL", "http://127.0.0.1:9")
        .arg("extract")
        .arg(&document)
        .assert()
        .code(64)
        .stderr(predicate::str::contains("ValidationError"));
}

#[test]
fn test_extract_writes_json_and_summary() {
    let home = tempfile::tempdir().unwrap();
    let document = write_document(home.path(), "invoice.pdf");

    let mut server = mockito::Server::new();
    let submit = server
        .mock("POST", "/document")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("locale".into(), "cs_CZ".into()),
            Matcher::UrlEncoded("tables".into(), "false".into()),
        ]))
        .match_header("authorization", "secret_key test-key")
        .with_status(200)
        .with_body(r#"{"id": "doc-9"}"#)
        .create();
    let status = server
        .mock("GET", "/document/doc-9")
        .match_query(Matcher::UrlEncoded("filter".into(), "all".into()))
        .with_status(200)
        .with_body(READY_BODY)
        .create();

    let assert = rossum(home.path())
        .env("ROSSUM_API_KEY", "test-key")
        .env("ROSSUM_API_URL", server.url())
        .args(["extract", "-l", "cs_CZ", "--no-tables", "-f", "all"])
        .arg(&document)
        .assert()
        .success()
        .stdout(predicate::str::contains("Language: eng"))
        .stdout(predicate::str::contains("Invoice number: \"INV-2\" (90.00 %)"))
        .stdout(predicate::str::contains("INV-1").not())
        .stdout(predicate::str::contains("Web preview: https://rossum.ai/document/doc-9"))
        .stdout(predicate::str::contains("invoice.pdf.json"));

    submit.assert();
    status.assert();

    // The preview link is shown while extracting, before the summary.
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let preview = stdout.find("Web preview:").unwrap();
    let summary = stdout.find("Language:").unwrap();
    assert!(preview < summary);

    let saved = std::fs::read_to_string(home.path().join("invoice.pdf.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    let expected: serde_json::Value = serde_json::from_str(READY_BODY).unwrap();
    assert_eq!(saved, expected);
}

#[test]
fn test_extract_custom_output_path() {
    let home = tempfile::tempdir().unwrap();
    let document = write_document(home.path(), "scan.pdf");
    let output = home.path().join("out").join("result.json");

    let mut server = mockito::Server::new();
    let _submit = server
        .mock("POST", "/document")
        .match_query(Matcher::Any)
        .with_body(r#"{"id": "doc-3"}"#)
        .create();
    let _status = server
        .mock("GET", "/document/doc-3")
        .match_query(Matcher::Any)
        .with_body(READY_BODY)
        .create();

    rossum(home.path())
        .env("ROSSUM_API_URL", server.url())
        .args(["extract", "--api-key", "test-key", "--no-summary", "-o"])
        .arg(&output)
        .arg(&document)
        .assert()
        .success()
        .stdout(predicate::str::contains("Language:").not());

    assert!(output.exists());
}

#[test]
fn test_rejected_api_key() {
    let home = tempfile::tempdir().unwrap();
    let document = write_document(home.path(), "invoice.pdf");

    let mut server = mockito::Server::new();
    let _submit = server
        .mock("POST", "/document")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"error": "Invalid API key"}"#)
        .create();

    rossum(home.path())
        .env("ROSSUM_API_KEY", "wrong-key")
        .env("ROSSUM_API_URL", server.url())
        .arg("extract")
        .arg(&document)
        .assert()
        .code(77)
        .stderr(predicate::str::contains("AuthError"))
        .stderr(predicate::str::contains("Invalid API key"));

    assert!(!home.path().join("invoice.pdf.json").exists());
}

#[test]
fn test_remote_failure() {
    let home = tempfile::tempdir().unwrap();
    let document = write_document(home.path(), "invoice.pdf");

    let mut server = mockito::Server::new();
    let _submit = server
        .mock("POST", "/document")
        .match_query(Matcher::Any)
        .with_body(r#"{"id": "doc-5"}"#)
        .create();
    let _status = server
        .mock("GET", "/document/doc-5")
        .match_query(Matcher::Any)
        .with_body(r#"{"status": "error", "message": "Document is not an invoice"}"#)
        .create();

    rossum(home.path())
        .env("ROSSUM_API_KEY", "test-key")
        .env("ROSSUM_API_URL", server.url())
        .arg("extract")
        .arg(&document)
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Document is not an invoice"));
}

#[test]
fn test_batch_with_summary() {
    let home = tempfile::tempdir().unwrap();
    let docs = home.path().join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    write_document(&docs, "a.pdf");
    write_document(&docs, "b.png");
    write_document(&docs, "notes.txt");
    let out = home.path().join("out");

    let mut server = mockito::Server::new();
    let submit = server
        .mock("POST", "/document")
        .match_query(Matcher::Any)
        .with_body(r#"{"id": "doc-1"}"#)
        .expect(2)
        .create();
    let _status = server
        .mock("GET", "/document/doc-1")
        .match_query(Matcher::Any)
        .with_body(READY_BODY)
        .create();

    rossum(home.path())
        .env("ROSSUM_API_KEY", "test-key")
        .env("ROSSUM_API_URL", server.url())
        .args(["batch", "--summary", "-o"])
        .arg(&out)
        .arg(format!("{}/*", docs.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 documents"));

    submit.assert();
    assert!(out.join("a.pdf.json").exists());
    assert!(out.join("b.png.json").exists());

    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.contains("a.pdf,success"));
}

#[test]
fn test_batch_refuses_colliding_outputs() {
    let home = tempfile::tempdir().unwrap();
    for dir in ["a", "b"] {
        let docs = home.path().join("docs").join(dir);
        std::fs::create_dir_all(&docs).unwrap();
        write_document(&docs, "invoice.pdf");
    }

    let mut server = mockito::Server::new();
    let submit = server
        .mock("POST", "/document")
        .match_query(Matcher::Any)
        .expect(0)
        .create();

    rossum(home.path())
        .env("ROSSUM_API_KEY", "test-key")
        .env("ROSSUM_API_URL", server.url())
        .args(["batch", "-o"])
        .arg(home.path().join("out"))
        .arg(format!("{}/*/*.pdf", home.path().join("docs").display()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("would both be written to"));

    submit.assert();
}

#[test]
fn test_config_set_and_get() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("rossum.json");

    rossum(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();

    rossum(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "extraction.locale", "cs_CZ"])
        .assert()
        .success();

    rossum(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "extraction.locale"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cs_CZ\""));
}

#[test]
fn test_api_key_from_config_file() {
    let home = tempfile::tempdir().unwrap();
    let document = write_document(home.path(), "invoice.pdf");
    let config = home.path().join("rossum.json");

    let mut server = mockito::Server::new();
    let submit = server
        .mock("POST", "/document")
        .match_query(Matcher::Any)
        .match_header("authorization", "secret_key stored-key")
        .with_body(r#"{"id": "doc-8"}"#)
        .create();
    let _status = server
        .mock("GET", "/document/doc-8")
        .match_query(Matcher::Any)
        .with_body(READY_BODY)
        .create();

    std::fs::write(
        &config,
        format!(r#"{{"api": {{"base_url": "{}", "api_key": "stored-key"}}}}"#, server.url()),
    )
    .unwrap();

    rossum(home.path())
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&document)
        .assert()
        .success();

    submit.assert();
}
