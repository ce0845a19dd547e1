//! `/update` conversation over a mocked Bot API.

use std::sync::Arc;

use cw_core::Credentials;
use cw_runtime::{CredentialStore, MemoryCredentialStore, SessionHandle};
use cw_telegram::{CommandBot, CommandBotConfig, TelegramClient};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT: i64 = -100_555;

fn update(id: i64, chat: i64, text: &str) -> Value {
    json!({
        "update_id": id,
        "message": {"message_id": id, "chat": {"id": chat}, "from": {"id": 1}, "text": text}
    })
}

fn ok_message() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "result": {"message_id": 1, "chat": {"id": CHAT}}
    }))
}

fn bot(server: &MockServer, store: Arc<MemoryCredentialStore>) -> CommandBot {
    let client = TelegramClient::new("tok", server.uri()).unwrap();
    CommandBot::new(
        client,
        CHAT.to_string(),
        store,
        SessionHandle::new(),
        CommandBotConfig {
            poll_timeout_secs: 0,
            ..CommandBotConfig::default()
        },
    )
}

#[tokio::test]
async fn conversation_saves_credentials_and_reports_idle_feed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bottok/getUpdates"))
        .and(query_param("offset", "106"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bottok/getUpdates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                update(101, 999, "/update"),
                update(102, CHAT, "/update"),
                update(103, CHAT, "new-token"),
                update(104, CHAT, "user-7"),
                update(105, CHAT, "sid=abc; lang=en"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/bottok/sendMessage"))
        .and(body_string_contains("will+use+new+credentials"))
        .respond_with(ok_message())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bottok/sendMessage"))
        .respond_with(ok_message())
        .expect(4)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let mut bot = bot(&server, store.clone());

    assert_eq!(bot.poll_once().await.unwrap(), 5);
    assert_eq!(bot.offset(), Some(106));
    assert_eq!(
        store.load().await.unwrap(),
        Some(Credentials::new("new-token", "user-7", "sid=abc; lang=en"))
    );

    assert_eq!(bot.poll_once().await.unwrap(), 0);
}

#[tokio::test]
async fn poll_failure_is_surfaced_without_advancing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bottok/getUpdates"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "ok": false, "error_code": 500, "description": "Internal Server Error"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let mut bot = bot(&server, store);

    let err = bot.poll_once().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(bot.offset(), None);
}
