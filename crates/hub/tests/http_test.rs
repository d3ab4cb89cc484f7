//! End-to-end tests for the hub HTTP surface
//!
//! Each test binds a real listener on an ephemeral port and talks to it
//! with plain HTTP and WebSocket clients.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use loghud_hub::{serve_with_listener, HubConfig, MAX_PUBLISH_BYTES, ORIGIN_HEADER};

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

struct TestHub {
    base: String,
    ws_base: String,
    cancel: CancellationToken,
}

impl Drop for TestHub {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn start_hub(config: HubConfig) -> TestHub {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();

    tokio::spawn(serve_with_listener(listener, config, cancel.clone()));

    TestHub {
        base: format!("http://{addr}"),
        ws_base: format!("ws://{addr}"),
        cancel,
    }
}

async fn subscribe(hub: &TestHub, channel: &str) -> WsStream {
    let (mut stream, _) = connect_async(format!("{}{}", hub.ws_base, channel))
        .await
        .expect("websocket connect failed");

    // The welcome envelope doubles as the registration barrier: once it
    // arrives, the subscriber is in the hub's set.
    let welcome = next_json(&mut stream).await;
    assert_eq!(welcome["system"], Value::Bool(true));
    assert!(welcome["message"]
        .as_str()
        .unwrap()
        .contains("欢迎接入 LogHUD"));
    assert_eq!(welcome["_meta"]["channel"], Value::from(channel));

    stream
}

async fn next_json(stream: &mut WsStream) -> Value {
    let text = next_text(stream).await;
    serde_json::from_str(&text).unwrap()
}

async fn next_text(stream: &mut WsStream) -> String {
    loop {
        let message = timeout(RECV_TIMEOUT, stream.next())
            .await
            .expect("timed out waiting for websocket message")
            .expect("websocket closed")
            .expect("websocket error");
        if let Message::Text(text) = message {
            return text;
        }
    }
}

#[tokio::test]
async fn test_healthz() {
    let hub = start_hub(HubConfig::default()).await;

    let response = reqwest::get(format!("{}/healthz", hub.base)).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_publish_reaches_subscriber_with_stamped_meta() {
    let hub = start_hub(HubConfig::default().with_node_id("node-a")).await;
    let mut stream = subscribe(&hub, "/logs/app").await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/logs/app", hub.base))
        .json(&json!({"message": "hi", "level": "info"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"ok": true}));

    let envelope = next_json(&mut stream).await;
    assert_eq!(envelope["message"], Value::from("hi"));
    assert_eq!(envelope["level"], Value::from("info"));

    let block = envelope["_meta"].as_object().unwrap();
    assert_eq!(block["originNodeId"], Value::from("node-a"));
    assert_eq!(block["channel"], Value::from("/logs/app"));
    assert_eq!(block["keyVersion"], Value::from(1));
    assert!(block["id"].is_string());
    assert!(block["hmac"].is_string());
}

#[tokio::test]
async fn test_prestamped_envelope_is_passed_through_byte_identical() {
    let hub = start_hub(HubConfig::default()).await;
    let mut stream = subscribe(&hub, "/logs/app").await;

    let prestamped =
        r#"{"_meta":{"channel":"/logs/app","hmac":"xyz","id":"0","keyVersion":1},"message":"fwd"}"#;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/logs/app", hub.base))
        .header("Content-Type", "application/json")
        .body(prestamped)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);

    // Stamping was skipped: the broadcast bytes are exactly the input
    assert_eq!(next_text(&mut stream).await, prestamped);
}

#[tokio::test]
async fn test_bad_json_is_rejected() {
    let hub = start_hub(HubConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/logs/app", hub.base))
        .body("not json at all")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Valid JSON but not an object is rejected too
    let response = client
        .post(format!("{}/logs/app", hub.base))
        .body("[1,2,3]")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_publish_body_size_boundary() {
    let hub = start_hub(HubConfig::default()).await;
    let client = reqwest::Client::new();

    // Exactly 1 MiB of valid JSON is accepted
    let overhead = r#"{"pad":""}"#.len();
    let body = format!(r#"{{"pad":"{}"}}"#, "a".repeat(MAX_PUBLISH_BYTES - overhead));
    assert_eq!(body.len(), MAX_PUBLISH_BYTES);

    let response = client
        .post(format!("{}/logs/app", hub.base))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);

    // One byte over is rejected
    let body = format!(r#"{{"pad":"{}"}}"#, "a".repeat(MAX_PUBLISH_BYTES - overhead + 1));
    assert_eq!(body.len(), MAX_PUBLISH_BYTES + 1);

    let response = client
        .post(format!("{}/logs/app", hub.base))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let hub = start_hub(HubConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/logs/app", hub.base))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);

    let response = client
        .delete(format!("{}/logs/app", hub.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn test_root_path_is_not_a_channel() {
    let hub = start_hub(HubConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/", hub.base))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_channels_are_isolated() {
    let hub = start_hub(HubConfig::default()).await;
    let mut stream_a = subscribe(&hub, "/logs/a").await;
    let mut stream_b = subscribe(&hub, "/logs/b").await;

    let client = reqwest::Client::new();
    client
        .post(format!("{}/logs/a", hub.base))
        .json(&json!({"message": "for a"}))
        .send()
        .await
        .unwrap();

    let envelope = next_json(&mut stream_a).await;
    assert_eq!(envelope["message"], Value::from("for a"));

    // Channel b sees nothing
    assert!(timeout(Duration::from_millis(700), stream_b.next())
        .await
        .is_err());
}

#[tokio::test]
async fn test_peer_forwarding_without_amplification() {
    // Two hubs, each listing the other as a peer
    let hub_b_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let hub_b_addr = hub_b_listener.local_addr().unwrap();

    let hub_a = start_hub(
        HubConfig::default()
            .with_node_id("node-a")
            .with_peers(vec![format!("http://{hub_b_addr}")]),
    )
    .await;

    let cancel_b = CancellationToken::new();
    tokio::spawn(serve_with_listener(
        hub_b_listener,
        HubConfig::default()
            .with_node_id("node-b")
            .with_peers(vec![hub_a.base.clone()]),
        cancel_b.clone(),
    ));
    let hub_b = TestHub {
        base: format!("http://{hub_b_addr}"),
        ws_base: format!("ws://{hub_b_addr}"),
        cancel: cancel_b,
    };

    let mut stream_a = subscribe(&hub_a, "/logs/x").await;
    let mut stream_b = subscribe(&hub_b, "/logs/x").await;

    // One publish to A only
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/logs/x", hub_a.base))
        .json(&json!({"message": "replicate me"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);

    // A's subscriber gets the locally stamped envelope
    let on_a = next_json(&mut stream_a).await;
    assert_eq!(on_a["message"], Value::from("replicate me"));
    assert_eq!(on_a["_meta"]["originNodeId"], Value::from("node-a"));

    // B's subscriber gets exactly one forwarded copy, still stamped by A
    let on_b = next_json(&mut stream_b).await;
    assert_eq!(on_b["message"], Value::from("replicate me"));
    assert_eq!(on_b["_meta"]["originNodeId"], Value::from("node-a"));

    // No re-forward bounces back: neither side sees a second copy
    assert!(timeout(Duration::from_millis(700), stream_a.next())
        .await
        .is_err());
    assert!(timeout(Duration::from_millis(700), stream_b.next())
        .await
        .is_err());
}

#[tokio::test]
async fn test_forwarded_requests_are_not_reforwarded() {
    // A hub whose "peer" is an address nobody listens on: if it tried
    // to forward a request carrying the origin header, nothing breaks,
    // and the local subscriber still gets the envelope.
    let hub = start_hub(
        HubConfig::default()
            .with_node_id("node-b")
            .with_peers(vec!["http://127.0.0.1:9".into()]),
    )
    .await;
    let mut stream = subscribe(&hub, "/logs/x").await;

    let prestamped = r#"{"_meta":{"channel":"/logs/x","hmac":"m","id":"1","keyVersion":1,"originNodeId":"node-a"},"message":"fwd"}"#;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/logs/x", hub.base))
        .header(ORIGIN_HEADER, "node-a")
        .header("Content-Type", "application/json")
        .body(prestamped)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);

    assert_eq!(next_text(&mut stream).await, prestamped);
}
