//! HTTP endpoint
//!
//! A single wildcard handler treats any path other than `/` and
//! `/healthz` as a channel path:
//!
//! - `GET` upgrades to a WebSocket and subscribes the connection
//! - `POST` ingests a JSON object, stamps it unless it already carries
//!   `_meta`, broadcasts it and (for non-forwarded requests) replicates
//!   it to peers
//! - anything else is a 405
//!
//! Publishers get `202` once the envelope is accepted; delivery to
//! subscribers is best-effort from there.

use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use loghud_model::meta;

use crate::config::HubConfig;
use crate::error::{HubError, Result};
use crate::hub::Hub;
use crate::peers::{PeerForwarder, ORIGIN_HEADER};
use crate::registry::HubRegistry;
use crate::stamp::Stamper;

/// Largest accepted publish body (1 MiB)
pub const MAX_PUBLISH_BYTES: usize = 1 << 20;

/// Per-write deadline on subscriber sockets
const WRITE_DEADLINE: Duration = Duration::from_secs(2);

/// Shared state for the handlers
pub struct AppState {
    pub registry: HubRegistry,
    pub stamper: Stamper,
    pub peers: PeerForwarder,
}

impl AppState {
    /// Build state from configuration; hubs stop on `cancel`
    pub fn new(config: &HubConfig, cancel: CancellationToken) -> Self {
        Self {
            registry: HubRegistry::new(cancel),
            stamper: Stamper::new(config.node_id.clone(), config.cluster_key.clone()),
            peers: PeerForwarder::new(config.node_id.clone(), config.peers.clone()),
        }
    }
}

/// Build the axum router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .fallback(channel_endpoint)
        .layer(DefaultBodyLimit::max(MAX_PUBLISH_BYTES))
        .with_state(state)
}

/// Bind the configured port and serve until cancellation
pub async fn serve(config: HubConfig, cancel: CancellationToken) -> Result<()> {
    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| HubError::Bind { address, source: e })?;
    serve_with_listener(listener, config, cancel).await
}

/// Serve on an already-bound listener (tests bind port 0 themselves)
pub async fn serve_with_listener(
    listener: TcpListener,
    config: HubConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let state = Arc::new(AppState::new(&config, cancel.clone()));

    info!(
        node_id = %config.node_id,
        peers = config.peers.len(),
        address = %listener.local_addr()?,
        "hub listening"
    );

    let app = build_router(Arc::clone(&state));
    let shutdown = cancel.clone();
    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            // Stop accepting, then close every subscriber socket so the
            // open connections drain instead of pinning the server
            shutdown_state.registry.shutdown();
        })
        .await?;

    info!("hub stopped");
    Ok(())
}

/// `GET /healthz`
async fn healthz() -> Json<Value> {
    Json(json!({"ok": true}))
}

/// Wildcard channel handler; dispatches on method
async fn channel_endpoint(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    ws: Option<WebSocketUpgrade>,
    body: Option<Bytes>,
) -> Response {
    let path = uri.path();
    if path == "/" || path.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }
    let channel = path.to_string();

    if method == Method::GET {
        match ws {
            Some(upgrade) => subscribe(state, channel, upgrade),
            None => error_response(StatusCode::BAD_REQUEST, "websocket upgrade required"),
        }
    } else if method == Method::POST {
        match body {
            Some(body) => publish(state, channel, headers, body).await,
            // The body extractor failed: over the size cap
            None => error_response(StatusCode::BAD_REQUEST, "body too large"),
        }
    } else {
        error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    }
}

/// `GET <channel>`: upgrade and register a subscriber
fn subscribe(state: Arc<AppState>, channel: String, upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(move |socket| subscriber_session(state, channel, socket))
}

/// One subscriber connection, from registration to removal
async fn subscriber_session(state: Arc<AppState>, channel: String, socket: WebSocket) {
    let hub = state.registry.hub_for(&channel);
    let (id, outbound) = hub.subscribe();
    let (sink, stream) = socket.split();

    let mut writer = tokio::spawn(write_pump(Arc::clone(&hub), id, sink, outbound));

    // Greet through the normal stamping path so the subscriber sees a
    // well-formed envelope immediately
    match state.stamper.stamp(&channel, welcome_payload(&channel)) {
        Ok(envelope) => hub.broadcast(envelope),
        Err(e) => warn!(channel = %channel, error = %e, "failed to stamp welcome"),
    }

    // Either side ending the connection ends the session: the reader on
    // client disconnect, the writer on write failure or removal
    tokio::select! {
        _ = read_until_closed(stream) => {}
        _ = &mut writer => {}
    }
    hub.remove(id);
}

/// Drain and discard client frames; returning means disconnect
async fn read_until_closed(mut stream: SplitStream<WebSocket>) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}

/// The single writer for one subscriber socket
///
/// Drains the outbound queue with a per-write deadline. A failed or
/// timed-out write removes the subscriber; a closed queue (removal,
/// shutdown) ends the socket with a normal-closure status.
async fn write_pump(
    hub: Arc<Hub>,
    id: u64,
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Bytes>,
) {
    while let Some(envelope) = outbound.recv().await {
        let text = match String::from_utf8(envelope.to_vec()) {
            Ok(text) => text,
            Err(_) => continue,
        };

        match timeout(WRITE_DEADLINE, sink.send(Message::Text(text))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(id, error = %e, "subscriber write failed");
                hub.remove(id);
                return;
            }
            Err(_) => {
                debug!(id, "subscriber write deadline exceeded");
                hub.remove(id);
                return;
            }
        }
    }

    let _ = timeout(
        WRITE_DEADLINE,
        sink.send(Message::Close(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: "bye".into(),
        }))),
    )
    .await;
}

/// `POST <channel>`: stamp (unless pre-stamped), broadcast, replicate
async fn publish(
    state: Arc<AppState>,
    channel: String,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "invalid json"),
    };
    let Value::Object(payload) = value else {
        return error_response(StatusCode::BAD_REQUEST, "invalid json");
    };

    // Pre-stamped payloads are forwarded copies: broadcast byte-identical
    let envelope = if payload.contains_key(meta::META_KEY) {
        body
    } else {
        match state.stamper.stamp(&channel, payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(channel = %channel, error = %e, "stamping failed");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "envelope error");
            }
        }
    };

    state.registry.hub_for(&channel).broadcast(envelope.clone());

    if !headers.contains_key(ORIGIN_HEADER) && !state.peers.is_empty() {
        let peers = state.peers.clone();
        tokio::spawn(async move { peers.forward(&channel, envelope).await });
    }

    (StatusCode::ACCEPTED, Json(json!({"ok": true}))).into_response()
}

/// The welcome envelope body broadcast on subscribe
fn welcome_payload(channel: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("title".into(), Value::String("System".into()));
    payload.insert("level".into(), Value::String("notice".into()));
    payload.insert(
        "message".into(),
        Value::String(format!("欢迎接入 LogHUD · Channel {channel}")),
    );
    payload.insert("system".into(), Value::Bool(true));
    payload.insert(
        "effects".into(),
        Value::Array(vec![
            Value::String("neon".into()),
            Value::String("scanline".into()),
        ]),
    );
    payload
}

/// Plain-text error response
fn error_response(status: StatusCode, message: &'static str) -> Response {
    (status, message).into_response()
}
