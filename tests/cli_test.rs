mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::*;
use paynotify::infrastructure::provider_sdk::EVENT_TRANSACTION_SUCCESS;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

fn ingest_command(dir: &Path, config: &str, body: &[u8], signature: &str) -> Command {
    let config_path = dir.join("config.json");
    std::fs::write(&config_path, config).unwrap();
    let payload_path = dir.join("payload.json");
    std::fs::write(&payload_path, body).unwrap();

    let mut cmd = Command::new(cargo_bin!("paynotify"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("ingest")
        .arg("--account")
        .arg("A1")
        .arg("--timestamp")
        .arg(TIMESTAMP)
        .arg("--nonce")
        .arg(NONCE)
        .arg("--signature")
        .arg(signature)
        .arg(&payload_path);
    cmd
}

#[test]
fn test_cli_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let body = envelope(EVENT_TRANSACTION_SUCCESS, &paid_resource("O1", "o-1"));
    let signature = headers_for(&body).signature;

    ingest_command(dir.path(), &config_json("A1"), &body, &signature)
        .assert()
        .success()
        .stdout(predicate::str::contains("HTTP 200"))
        .stdout(predicate::str::contains("\"code\":\"SUCCESS\""))
        .stderr(predicate::str::contains("notification verified"));
}

#[test]
fn test_cli_rejects_bad_signature() {
    let dir = tempfile::tempdir().unwrap();
    let body = envelope(EVENT_TRANSACTION_SUCCESS, &paid_resource("O1", "o-1"));

    ingest_command(dir.path(), &config_json("A1"), &body, &"00".repeat(32))
        .assert()
        .failure()
        .stdout(predicate::str::contains("HTTP 400"))
        .stdout(predicate::str::contains("\"code\":\"FAIL\""))
        .stdout(predicate::str::contains("signature mismatch"));
}

#[test]
fn test_cli_malformed_payload() {
    let dir = tempfile::tempdir().unwrap();
    let body = b"{\"id\": \"evt-1\", \"event_type\": ".to_vec();
    let signature = headers_for(&body).signature;

    ingest_command(dir.path(), &config_json("A1"), &body, &signature)
        .assert()
        .failure()
        .stdout(predicate::str::contains("malformed envelope"));
}

#[test]
fn test_cli_refuses_unsupported_cipher_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_json("A1").replace("AEAD_AES_256_GCM", "AEAD_SM4_GCM");

    ingest_command(dir.path(), &config, b"{}", "00")
        .assert()
        .failure()
        .stdout(predicate::str::contains("HTTP").not())
        .stderr(predicate::str::contains("AEAD_SM4_GCM"));
}
