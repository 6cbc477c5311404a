#![allow(clippy::unwrap_used)]
// Integration tests for `Client` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use esplens_api::{
    AnalysisUpload, Client, ConfigScope, DeviceConfigPatch, Error, ImageFile, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Client) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = Client::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

fn secret(value: &str) -> SecretString {
    value.to_string().into()
}

/// Mount the login-page GET that seeds the CSRF cookie.
async fn mount_login_page(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("csrftoken={token}; Path=/").as_str())
                .set_body_string("<html></html>"),
        )
        .mount(server)
        .await;
}

/// Mount both login steps and log the client in.
async fn login(server: &MockServer, client: &Client) {
    mount_login_page(server, "seed-token").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(header("X-CSRFToken", "seed-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=rotated-token; Path=/")
                .set_body_json(json!({"message": "Login was successful."})),
        )
        .mount(server)
        .await;
    client.login("admin", &secret("hunter2")).await.unwrap();
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_login_captures_rotated_csrf_token() {
    let (server, client) = setup().await;

    login(&server, &client).await;

    assert_eq!(client.csrf_token().as_deref(), Some("rotated-token"));
    let cookies = client.cookie_header().unwrap();
    assert!(cookies.contains("csrftoken=rotated-token"));
}

#[tokio::test]
async fn test_login_bad_credentials_surface_server_message() {
    let (server, client) = setup().await;

    mount_login_page(&server, "seed-token").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "The username or password is incorrect."})),
        )
        .mount(&server)
        .await;

    let result = client.login("admin", &secret("wrong")).await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "The username or password is incorrect.");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_register_field_errors_surface_verbatim() {
    let (server, client) = setup().await;

    mount_login_page(&server, "seed-token").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"username": ["already taken"]})),
        )
        .mount(&server)
        .await;

    let result = client
        .register("admin", "a@b.example", &secret("pw"), &secret("pw"))
        .await;

    let err = result.unwrap_err();
    let errors = err.field_errors().expect("expected validation error");
    assert_eq!(errors["username"], vec!["already taken"]);
}

#[tokio::test]
async fn test_register_sends_confirm_password_field() {
    let (server, client) = setup().await;

    mount_login_page(&server, "seed-token").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .and(body_partial_json(json!({
            "username": "newuser",
            "email": "new@user.example",
            "confirmPassword": "pw"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"username": "newuser"})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .register("newuser", "new@user.example", &secret("pw"), &secret("pw"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_logout_clears_csrf_token() {
    let (server, client) = setup().await;
    login(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.logout().await.unwrap();
    assert!(client.csrf_token().is_none());
}

// ── Terminal authorization failures ─────────────────────────────────

#[tokio::test]
async fn test_unauthorized_is_terminal() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.config(&ConfigScope::Device).await;

    match result {
        Err(Error::AuthRequired { status }) => assert_eq!(status, 401),
        other => panic!("expected AuthRequired, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_is_terminal_despite_body() {
    let (server, client) = setup().await;

    // The body carries a message, but 403 means the session is gone; the
    // client must not surface it as a server message.
    Mock::given(method("GET"))
        .and(path("/api/vision/config/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "CSRF token missing"})),
        )
        .mount(&server)
        .await;

    let result = client.config(&ConfigScope::Device).await;

    match result {
        Err(Error::AuthRequired { status }) => assert_eq!(status, 403),
        other => panic!("expected AuthRequired, got: {other:?}"),
    }
}

// ── Configuration ───────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_device_config() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/vision/config/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flash_enabled": true,
            "delay_seconds": 10,
            "default_model": "gpt-4o-mini",
            "prompt_context": "",
            "updated_at": "2025-06-01T12:30:00Z"
        })))
        .mount(&server)
        .await;

    let config = client.config(&ConfigScope::Device).await.unwrap();

    assert!(config.flash_enabled);
    assert_eq!(config.delay_seconds, 10);
    assert_eq!(config.default_model, "gpt-4o-mini");
}

#[tokio::test]
async fn test_patch_sends_only_set_fields() {
    let (server, client) = setup().await;

    // An unchecked checkbox never reaches the form data; the patch must
    // carry the explicit false and nothing else.
    Mock::given(method("PATCH"))
        .and(path("/api/vision/config/"))
        .and(body_json(json!({"flash_enabled": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flash_enabled": false,
            "delay_seconds": 10,
            "default_model": "gpt-4o-mini",
            "prompt_context": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let patch = DeviceConfigPatch {
        flash_enabled: Some(false),
        ..DeviceConfigPatch::default()
    };
    let config = client
        .update_config(&ConfigScope::Device, &patch)
        .await
        .unwrap();

    assert!(!config.flash_enabled);
}

#[tokio::test]
async fn test_key_scope_targets_per_key_route() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/api-keys/ab12cd34/config/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flash_enabled": false,
            "delay_seconds": 30,
            "default_model": "gpt-4o",
            "prompt_context": "garage door"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let scope = ConfigScope::Key("ab12cd34".to_owned());
    let config = client.config(&scope).await.unwrap();

    assert_eq!(config.delay_seconds, 30);
    assert_eq!(config.prompt_context, "garage door");
}

#[tokio::test]
async fn test_csrf_token_reused_for_later_mutations() {
    let (server, client) = setup().await;
    login(&server, &client).await;

    Mock::given(method("PATCH"))
        .and(path("/api/vision/config/"))
        .and(header("X-CSRFToken", "rotated-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flash_enabled": true,
            "delay_seconds": 5,
            "default_model": "gpt-4o-mini",
            "prompt_context": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let patch = DeviceConfigPatch {
        delay_seconds: Some(5),
        ..DeviceConfigPatch::default()
    };
    client
        .update_config(&ConfigScope::Device, &patch)
        .await
        .unwrap();
}

// ── API keys ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_api_keys() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/api-keys/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"prefix": "ab12cd34", "name": "garage-cam", "created": "2025-05-01T08:00:00Z"},
            {"prefix": "ef56gh78", "name": "porch-cam", "created": "2025-05-02T09:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let keys = client.api_keys().await.unwrap();

    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].prefix, "ab12cd34");
    assert_eq!(keys[1].name, "porch-cam");
}

#[tokio::test]
async fn test_create_key_blank_name_uses_default() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/api-keys/"))
        .and(body_json(json!({"name": "new-esp32-device"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "prefix": "ab12cd34",
            "name": "new-esp32-device",
            "key": "ab12cd34.full-secret-value",
            "created": "2025-05-01T08:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_api_key("   ").await.unwrap();

    assert_eq!(created.name, "new-esp32-device");
    assert_eq!(created.key, "ab12cd34.full-secret-value");
}

#[tokio::test]
async fn test_create_key_with_name() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/api-keys/"))
        .and(body_json(json!({"name": "garage-cam"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "prefix": "ef56gh78",
            "name": "garage-cam",
            "key": "ef56gh78.another-secret",
            "created": "2025-05-02T09:00:00Z"
        })))
        .mount(&server)
        .await;

    let created = client.create_api_key("garage-cam").await.unwrap();

    assert_eq!(created.prefix, "ef56gh78");
}

#[tokio::test]
async fn test_delete_key() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/auth/api-keys/ab12cd34/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_api_key("ab12cd34").await.unwrap();
}

#[tokio::test]
async fn test_delete_unknown_key_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/auth/api-keys/nope/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.delete_api_key("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

// ── Vision ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_model_catalog() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/vision/models/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "gpt-4o-mini", "description": "GPT-4o Mini (Recommended)"},
            {"name": "gpt-4o", "description": "GPT-4o"}
        ])))
        .mount(&server)
        .await;

    let models = client.available_models().await.unwrap();

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "gpt-4o-mini");
}

#[tokio::test]
async fn test_history_includes_pending_entries() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/vision/logs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "8a6e0804-2bd0-4672-b79d-d97027f9071a",
                "image1": "/media/images/before.jpg",
                "image2": "/media/images/after.jpg",
                "model_used": "gpt-4o-mini",
                "description": "A delivery van arrived.",
                "created_at": "2025-06-01T12:30:00Z"
            },
            {
                "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                "image1": "/media/images/b2.jpg",
                "image2": "/media/images/a2.jpg",
                "model_used": "gpt-4o-mini",
                "description": null,
                "created_at": "2025-06-01T12:31:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let history = client.analysis_history().await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].description.as_deref(), Some("A delivery van arrived."));
    assert!(history[1].description.is_none());
}

#[tokio::test]
async fn test_fetch_image_resolves_relative_url() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/media/images/before.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegdata".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = client.fetch_image("/media/images/before.jpg").await.unwrap();

    assert_eq!(bytes.as_ref(), b"jpegdata");
}

#[tokio::test]
async fn test_send_device_log_uses_api_key_header() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/vision/log/"))
        .and(header("X-Api-Key", "ab12cd34.full-secret-value"))
        .and(body_json(json!({"message": "Boot complete"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .send_device_log(&secret("ab12cd34.full-secret-value"), "Boot complete")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_submit_analysis_parses_created_entry() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/vision/logs/"))
        .and(header("X-Api-Key", "ab12cd34.full-secret-value"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "8a6e0804-2bd0-4672-b79d-d97027f9071a",
            "image1": "/media/images/before.jpg",
            "image2": "/media/images/after.jpg",
            "model_used": "gpt-4o-mini",
            "description": "Nothing changed.",
            "created_at": "2025-06-01T12:30:00Z"
        })))
        .mount(&server)
        .await;

    let upload = AnalysisUpload {
        image1: ImageFile::new("before.jpg", b"img1".to_vec()),
        image2: ImageFile::new("after.jpg", b"img2".to_vec()),
        model: Some("gpt-4o-mini".to_owned()),
        prompt_context: None,
    };
    let entry = client
        .submit_analysis(&secret("ab12cd34.full-secret-value"), upload)
        .await
        .unwrap();

    assert_eq!(entry.description.as_deref(), Some("Nothing changed."));
}
