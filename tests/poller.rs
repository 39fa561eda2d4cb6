//! End-to-end poller behavior against a mock Bot API.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitewatch::bot::{CommandProcessor, UpdatePoller};
use sitewatch::domain::Site;
use sitewatch::store::{self, SqliteStore, Store};
use sitewatch::telegram::TelegramClient;

const TOKEN: &str = "123:testtoken";

fn message_update(update_id: i64, chat_id: i64, text: &str) -> serde_json::Value {
    json!({
        "update_id": update_id,
        "message": {
            "chat": { "id": chat_id },
            "from": { "username": "alice" },
            "text": text
        }
    })
}

#[tokio::test]
async fn test_poll_once_advances_durable_cursor() {
    let server = MockServer::start().await;

    // Updates arrive out of order; the cursor must land on the max id.
    Mock::given(method("GET"))
        .and(path(format!("/bot{}/getUpdates", TOKEN)))
        .and(query_param("offset", "101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                message_update(101, 42, "hello"),
                message_update(103, 42, "hello again"),
                message_update(102, 43, "hi"),
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {}
        })))
        .mount(&server)
        .await;

    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
    store::set_update_offset(store.as_ref(), 100).await.unwrap();

    let telegram = Arc::new(TelegramClient::with_base(&server.uri(), TOKEN));
    let processor = CommandProcessor::new(store.clone(), telegram.clone(), Vec::new());
    let poller = UpdatePoller::new(store.clone(), telegram, processor);

    let processed = poller.poll_once().await.unwrap();
    assert_eq!(processed, 3);
    assert_eq!(store::update_offset(store.as_ref()).await.unwrap(), 103);
}

fn site(name: &str, url: &str) -> Site {
    Site {
        url: url.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_last_only_covers_subscribed_sites() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/bot{}/getUpdates", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [message_update(1, 42, "/last")]
        })))
        .mount(&server)
        .await;

    // Nothing from the unsubscribed site may appear in the reply.
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .and(body_string_contains("Item from B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {}
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .and(body_string_contains("Item from A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
    store.upsert_user(42, "alice").await.unwrap();
    store.toggle_site_sub(42, "https://a/news").await.unwrap();
    store
        .insert_seen("https://a/news", "ha", "Item from A", "https://a/p/1")
        .await
        .unwrap();
    store
        .insert_seen("https://b/news", "hb", "Item from B", "https://b/p/1")
        .await
        .unwrap();

    let sites = vec![site("Site A", "https://a/news"), site("Site B", "https://b/news")];
    let telegram = Arc::new(TelegramClient::with_base(&server.uri(), TOKEN));
    let processor = CommandProcessor::new(store.clone(), telegram.clone(), sites);
    let poller = UpdatePoller::new(store, telegram, processor);

    assert_eq!(poller.poll_once().await.unwrap(), 1);
}

#[tokio::test]
async fn test_list_callback_sends_subscription_names() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/bot{}/getUpdates", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [{
                "update_id": 1,
                "callback_query": {
                    "id": "cb1",
                    "data": "list",
                    "message": { "chat": { "id": 42 } }
                }
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{}/answerCallbackQuery", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The reply is a plain listing of the subscribed site's name, not
    // the toggle keyboard.
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .and(body_string_contains("Your subscriptions:"))
        .and(body_string_contains("Site A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
    store.upsert_user(42, "alice").await.unwrap();
    store.toggle_site_sub(42, "https://a/news").await.unwrap();

    let sites = vec![site("Site A", "https://a/news"), site("Site B", "https://b/news")];
    let telegram = Arc::new(TelegramClient::with_base(&server.uri(), TOKEN));
    let processor = CommandProcessor::new(store.clone(), telegram.clone(), sites);
    let poller = UpdatePoller::new(store, telegram, processor);

    assert_eq!(poller.poll_once().await.unwrap(), 1);
}

#[tokio::test]
async fn test_poll_once_empty_batch_keeps_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/bot{}/getUpdates", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": []
        })))
        .mount(&server)
        .await;

    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
    store::set_update_offset(store.as_ref(), 7).await.unwrap();

    let telegram = Arc::new(TelegramClient::with_base(&server.uri(), TOKEN));
    let processor = CommandProcessor::new(store.clone(), telegram.clone(), Vec::new());
    let poller = UpdatePoller::new(store.clone(), telegram, processor);

    assert_eq!(poller.poll_once().await.unwrap(), 0);
    assert_eq!(store::update_offset(store.as_ref()).await.unwrap(), 7);
}
