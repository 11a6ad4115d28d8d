//! End-to-end tests for the settings API.

use std::collections::HashMap;

use reqwest::StatusCode;
use serde_json::{json, Value};
use settings_service::settings::EnvStore;

mod common;
use common::{start_service, TOKEN};

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn get_settings(service: &common::TestService) -> HashMap<String, String> {
    let res = client()
        .get(service.url("/api/settings"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

async fn save(service: &common::TestService, body: Value) -> (StatusCode, Value) {
    let res = client()
        .post(service.url("/api/settings"))
        .bearer_auth(TOKEN)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn test_defaults_reported_for_unset_keys() {
    let service = start_service(&[("KIRO_CLIENT_TOKEN", TOKEN)]).await;

    let settings = get_settings(&service).await;
    assert_eq!(settings["STEALTH_MODE"], "true");
    assert_eq!(settings["HEADER_STRATEGY"], "real_simulation");
    assert_eq!(settings["STEALTH_HTTP2_MODE"], "auto");
    assert_eq!(settings["PORT"], "8080");
    assert_eq!(settings["GIN_MODE"], "release");
    assert_eq!(settings["LOG_LEVEL"], "info");
    assert_eq!(settings["LOG_FORMAT"], "json");
    assert_eq!(settings["LOG_CONSOLE"], "true");
    assert_eq!(settings["MAX_TOOL_DESCRIPTION_LENGTH"], "10000");
    assert_eq!(settings["KIRO_AUTH_TOKEN"], "");
    assert_eq!(settings.len(), 11);
}

#[tokio::test]
async fn test_hot_reload_without_restart() {
    let service = start_service(&[("KIRO_CLIENT_TOKEN", TOKEN)]).await;

    let (status, body) = save(&service, json!({ "LOG_LEVEL": "debug" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["restart_required"], false);

    assert_eq!(service.store.get("LOG_LEVEL").as_deref(), Some("debug"));
    assert_eq!(get_settings(&service).await["LOG_LEVEL"], "debug");
    assert_eq!(service.env_line("LOG_LEVEL").as_deref(), Some("LOG_LEVEL=debug"));
}

#[tokio::test]
async fn test_restart_required_keys_are_persisted_not_applied() {
    let service = start_service(&[("KIRO_CLIENT_TOKEN", TOKEN)]).await;

    let (status, body) = save(&service, json!({ "PORT": "9090", "GIN_MODE": "release" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["restart_required"], true);

    assert_eq!(service.store.get("PORT"), None);
    assert_eq!(get_settings(&service).await["PORT"], "8080");
    assert_eq!(service.env_line("PORT").as_deref(), Some("PORT=9090"));
}

#[tokio::test]
async fn test_unchanged_restart_key_needs_no_restart() {
    let service = start_service(&[("KIRO_CLIENT_TOKEN", TOKEN), ("PORT", "8080")]).await;

    let (_, body) = save(&service, json!({ "PORT": "8080", "GIN_MODE": "release" })).await;
    assert_eq!(body["restart_required"], false);
}

#[tokio::test]
async fn test_secret_cannot_be_changed() {
    let service = start_service(&[
        ("KIRO_CLIENT_TOKEN", TOKEN),
        ("KIRO_AUTH_TOKEN", "refresh-token-value"),
    ])
    .await;

    let (status, _) = save(&service, json!({ "KIRO_AUTH_TOKEN": "attacker" })).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(service.store.get("KIRO_AUTH_TOKEN").as_deref(), Some("refresh-token-value"));
    assert_eq!(
        service.env_line("KIRO_AUTH_TOKEN").as_deref(),
        Some("KIRO_AUTH_TOKEN=refresh-token-value")
    );
}

#[tokio::test]
async fn test_masked_round_trip_preserves_tokens() {
    let service = start_service(&[
        ("KIRO_CLIENT_TOKEN", TOKEN),
        ("KIRO_AUTH_TOKEN", "refresh-token-value"),
    ])
    .await;

    let mut settings = get_settings(&service).await;
    assert_ne!(settings["KIRO_CLIENT_TOKEN"], TOKEN);
    settings.insert("STEALTH_MODE".into(), "false".into());

    let (status, body) = save(&service, serde_json::to_value(&settings).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["restart_required"], false);

    assert_eq!(service.store.get("KIRO_CLIENT_TOKEN").as_deref(), Some(TOKEN));
    assert_eq!(
        service.env_line("KIRO_CLIENT_TOKEN"),
        Some(format!("KIRO_CLIENT_TOKEN={}", TOKEN))
    );
    assert_eq!(service.store.get("STEALTH_MODE").as_deref(), Some("false"));
}

#[tokio::test]
async fn test_new_client_token_takes_effect() {
    let service = start_service(&[("KIRO_CLIENT_TOKEN", TOKEN)]).await;

    let (status, _) = save(&service, json!({ "KIRO_CLIENT_TOKEN": "rotated-token-987654" })).await;
    assert_eq!(status, StatusCode::OK);

    let old = client()
        .get(service.url("/api/settings"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = client()
        .get(service.url("/api/settings"))
        .bearer_auth("rotated-token-987654")
        .send()
        .await
        .unwrap();
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_persisted_file_layout() {
    let service = start_service(&[
        ("KIRO_CLIENT_TOKEN", TOKEN),
        ("KIRO_AUTH_TOKEN", "refresh-token-value"),
    ])
    .await;

    let (status, _) = save(&service, json!({ "LOG_LEVEL": "warn", "UNKNOWN_KEY": "x" })).await;
    assert_eq!(status, StatusCode::OK);

    let contents = service.env_contents();
    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines[0].starts_with('#'));
    assert!(lines[1].starts_with("# Updated: "));
    assert!(!contents.contains("UNKNOWN_KEY"));

    let position = |needle: &str| contents.find(needle).unwrap();
    assert!(position("KIRO_AUTH_TOKEN=") < position("STEALTH_MODE="));
    assert!(position("STEALTH_MODE=") < position("PORT="));
    assert!(position("PORT=") < position("LOG_LEVEL=warn"));
    assert!(position("LOG_LEVEL=") < position("MAX_TOOL_DESCRIPTION_LENGTH="));

    // Keys left out of the request are written empty.
    assert_eq!(service.env_line("HEADER_STRATEGY").as_deref(), Some("HEADER_STRATEGY="));
}

#[tokio::test]
async fn test_malformed_request_changes_nothing() {
    let service = start_service(&[("KIRO_CLIENT_TOKEN", TOKEN)]).await;

    let res = client()
        .post(service.url("/api/settings"))
        .bearer_auth(TOKEN)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);

    let (status, _) = save(&service, json!({ "LOG_LEVEL": "debug\nPORT=1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(!service.env_path().exists());
    assert_eq!(service.store.get("LOG_LEVEL"), None);
}

#[tokio::test]
async fn test_concurrent_saves_leave_consistent_state() {
    let service = start_service(&[("KIRO_CLIENT_TOKEN", TOKEN)]).await;

    let levels = ["debug", "warn", "error", "trace"];
    let mut handles = Vec::new();
    for level in levels {
        let url = service.url("/api/settings");
        handles.push(tokio::spawn(async move {
            client()
                .post(url)
                .bearer_auth(TOKEN)
                .json(&json!({ "LOG_LEVEL": level }))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let live = service.store.get("LOG_LEVEL").unwrap();
    assert!(levels.contains(&live.as_str()));
    assert_eq!(service.env_line("LOG_LEVEL"), Some(format!("LOG_LEVEL={}", live)));
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let service = start_service(&[]).await;

    let res = client().get(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");

    let res = client().get(service.url("/api/settings")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_hand_edit_is_picked_up() {
    let service = start_service(&[("KIRO_CLIENT_TOKEN", TOKEN)]).await;
    let (status, _) = save(&service, json!({ "LOG_LEVEL": "info" })).await;
    assert_eq!(status, StatusCode::OK);

    let edited = service.env_contents().replace("LOG_LEVEL=info", "LOG_LEVEL=error");
    std::fs::write(service.env_path(), edited).unwrap();
    let applied = service.writer.reload_from_disk().unwrap();

    assert_eq!(applied, vec!["LOG_LEVEL"]);
    assert_eq!(get_settings(&service).await["LOG_LEVEL"], "error");
}
