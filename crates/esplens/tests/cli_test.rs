//! CLI integration tests.
//!
//! Spawns the real binary. Parsing, help, and completions tests run
//! offline; end-to-end tests drive it against a wiremock dashboard.

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a command with a clean environment: no real config file, no
/// ambient ESPLENS_* variables.
fn esplens_cmd() -> Command {
    let mut cmd = Command::cargo_bin("esplens").expect("binary builds");
    cmd.env("HOME", "/nonexistent")
        .env("XDG_CONFIG_HOME", "/nonexistent/.config")
        .env_remove("ESPLENS_PROFILE")
        .env_remove("ESPLENS_SERVER")
        .env_remove("ESPLENS_USERNAME")
        .env_remove("ESPLENS_PASSWORD")
        .env_remove("ESPLENS_API_KEY")
        .env_remove("ESPLENS_OUTPUT")
        .env_remove("ESPLENS_INSECURE")
        .env_remove("ESPLENS_TIMEOUT");
    cmd
}

/// Mount the session endpoints: CSRF priming page, login (which rotates
/// the CSRF cookie), and logout.
async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "csrftoken=seed-token; Path=/"),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(header("X-CSRFToken", "seed-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "csrftoken=rotated-token; Path=/")
                .append_header("set-cookie", "sessionid=s3ss10n; Path=/; HttpOnly"),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

// ── Parsing, help, and completions ───────────────────────────────────

#[test]
fn test_no_args_shows_usage() {
    esplens_cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_version() {
    esplens_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("esplens"));
}

#[test]
fn test_help_lists_command_groups() {
    esplens_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("device")
                .and(predicate::str::contains("keys"))
                .and(predicate::str::contains("history"))
                .and(predicate::str::contains("logs"))
                .and(predicate::str::contains("analyze"))
                .and(predicate::str::contains("config")),
        );
}

#[test]
fn test_keys_help_lists_subcommands() {
    esplens_cmd()
        .args(["keys", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("create"))
                .and(predicate::str::contains("delete"))
                .and(predicate::str::contains("config")),
        );
}

#[test]
fn test_invalid_subcommand_fails() {
    esplens_cmd()
        .arg("frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("frobnicate"));
}

#[test]
fn test_invalid_output_format_rejected() {
    esplens_cmd()
        .args(["keys", "list", "--output", "bogus"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("possible values"));
}

#[test]
fn test_completions_bash() {
    esplens_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_esplens"));
}

#[test]
fn test_completions_zsh() {
    esplens_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#compdef esplens"));
}

#[test]
fn test_completions_fish() {
    esplens_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete -c esplens"));
}

// ── Offline behavior ─────────────────────────────────────────────────

#[test]
fn test_session_command_without_config_points_at_init() {
    esplens_cmd()
        .args(["device", "show"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("No server configured")
                .and(predicate::str::contains("config init")),
        );
}

#[test]
fn test_missing_credentials_is_an_auth_error() {
    esplens_cmd()
        .args([
            "--server",
            "http://127.0.0.1:9",
            "--username",
            "admin",
            "keys",
            "list",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No credentials"));
}

#[test]
fn test_unknown_profile_lists_alternatives() {
    esplens_cmd()
        .args(["--profile", "garage", "keys", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("garage"));
}

#[test]
fn test_config_show_works_without_file() {
    esplens_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile"));
}

// ── End-to-end against a mock dashboard ──────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_keys_list_logs_in_and_renders_table() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/api-keys/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "prefix": "abc12345",
                "name": "front-door",
                "created": "2025-08-01T10:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    esplens_cmd()
        .args(["--server", &server.uri(), "--username", "admin"])
        .env("ESPLENS_PASSWORD", "hunter2")
        .args(["keys", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("abc12345").and(predicate::str::contains("front-door")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_device_set_patches_and_shows_result() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("PATCH"))
        .and(path("/api/vision/config/"))
        .and(header("X-CSRFToken", "rotated-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "flash_enabled": false,
            "delay_seconds": 120,
            "default_model": "gpt-4o-mini",
            "prompt_context": "",
            "updated_at": "2025-08-01T10:00:00Z"
        })))
        .mount(&server)
        .await;

    esplens_cmd()
        .args(["--server", &server.uri(), "--username", "admin"])
        .env("ESPLENS_PASSWORD", "hunter2")
        .args(["device", "set", "--flash", "false", "--delay", "120"])
        .assert()
        .success()
        .stdout(predicate::str::contains("off").and(predicate::str::contains("120s")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_keys_delete_without_confirmation_sends_nothing() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    // The prompt cannot be answered in a non-interactive run, so the
    // DELETE must never go out.
    Mock::given(method("DELETE"))
        .and(path("/api/auth/api-keys/abc12345/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    esplens_cmd()
        .args(["--server", &server.uri(), "--username", "admin"])
        .env("ESPLENS_PASSWORD", "hunter2")
        .args(["keys", "delete", "abc12345"])
        .write_stdin("")
        .assert()
        .failure();

    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_keys_delete_with_yes_flag() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/auth/api-keys/abc12345/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    esplens_cmd()
        .args(["--server", &server.uri(), "--username", "admin"])
        .env("ESPLENS_PASSWORD", "hunter2")
        .args(["keys", "delete", "abc12345", "--yes"])
        .assert()
        .success()
        .stderr(predicate::str::contains("revoked"));

    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_password_exits_with_auth_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "csrftoken=seed-token; Path=/"),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "The username or password is incorrect."
        })))
        .mount(&server)
        .await;

    esplens_cmd()
        .args(["--server", &server.uri(), "--username", "admin"])
        .env("ESPLENS_PASSWORD", "wrong")
        .args(["keys", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("incorrect"));
}
