use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn daisycon_cmd() -> Command {
    let mut cmd = Command::cargo_bin("daisycon").unwrap();
    for var in [
        "DAISYCON_CONFIG",
        "DAISYCON_CLIENT_ID",
        "DAISYCON_CLIENT_SECRET",
        "DAISYCON_REDIRECT_URI",
        "DAISYCON_TOKEN_PATH",
        "DAISYCON_SANDBOX",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_subcommands() {
    daisycon_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("call"))
        .stdout(predicate::str::contains("request"))
        .stdout(predicate::str::contains("token"));
}

#[test]
fn unknown_method_fails() {
    daisycon_cmd()
        .args(["call", "fetchPublishers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown method 'fetchPublishers'"));
}

#[test]
fn missing_identifier_fails_with_json_error() {
    daisycon_cmd()
        .args(["call", "getPublishersMedia", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"missing_identifier\""));
}

#[test]
fn token_status_without_token() {
    let dir = tempfile::tempdir().unwrap();
    daisycon_cmd()
        .arg("token")
        .env("DAISYCON_TOKEN_PATH", dir.path().join("token.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No token stored"));
}

#[test]
fn call_without_token_prints_authorize_url() {
    let dir = tempfile::tempdir().unwrap();
    daisycon_cmd()
        .args(["call", "getCategories", "--json"])
        .env("DAISYCON_TOKEN_PATH", dir.path().join("token.json"))
        .env("DAISYCON_CLIENT_ID", "cli-client")
        .env("DAISYCON_REDIRECT_URI", "https://example.com/cb")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"auth_required\""))
        .stdout(predicate::str::contains("client_id=cli-client"));
}

#[tokio::test]
async fn call_against_mock_api() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = common::mock_config(&server, dir.path());
    common::write_token(&config.token_path(), &common::jwt_expiring_in(3600), Some("r"));
    let config_path = common::write_config_file(dir.path(), &config);

    Mock::given(method("GET"))
        .and(path("/publishers/5/media"))
        .and(query_param("x", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Page", "1")
                .set_body_json(json!([{"id": 77}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = tokio::task::spawn_blocking(move || {
        daisycon_cmd()
            .args(["call", "getPublishersMedia", "5", "x=1", "--json"])
            .env("DAISYCON_CONFIG", &config_path)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["status"], 200);
    assert_eq!(parsed["body"][0]["id"], 77);
    assert_eq!(parsed["headers"]["x-page"], "1");
}
