//! End-to-end tests over a real WebSocket connection.
//!
//! Boots the full router on an ephemeral port and talks to `/api/live` with
//! a WebSocket client, the way a browser tab would.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use flux_blog::adapters::websocket::COMMENT_CREATED;
use flux_blog::adapters::LiveApp;
use flux_blog::config::AppConfig;
use flux_blog::domain::foundation::{EventEnvelope, PostId};
use flux_blog::ports::EventPublisher;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Serve the app on an ephemeral port and return the live channel URL.
async fn boot(app: &LiveApp) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("ws://{}/api/live", addr)
}

/// Open a socket and consume the `CONNECTED` greeting.
async fn open(url: &str) -> WsStream {
    let (mut ws, _) = connect_async(url).await.unwrap();
    let greeting = next_json(&mut ws).await;
    assert_eq!(greeting["type"], "CONNECTED");
    assert!(greeting["connectionId"].as_str().is_some());
    ws
}

async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let frame = timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send_json(ws: &mut WsStream, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

async fn join(ws: &mut WsStream, room: &str) {
    send_json(ws, json!({"type": "JOIN_ROOM", "roomId": room})).await;
}

fn assert_count(msg: &Value, room: &str, viewers: u64) {
    assert_eq!(msg["type"], "LIVE_COUNT_UPDATE", "unexpected message {}", msg);
    assert_eq!(msg["roomId"], room);
    assert_eq!(msg["viewerCount"], viewers);
}

/// Poll until the server has forgotten all but `expected` connections.
async fn wait_for_connections(app: &LiveApp, expected: usize) {
    timeout(TIMEOUT, async {
        while app.hub().registry().connection_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connections were not reconciled");
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn closing_socket_broadcasts_reduced_count() {
    let app = LiveApp::new(&AppConfig::default());
    let url = boot(&app).await;

    let mut a = open(&url).await;
    let mut b = open(&url).await;

    join(&mut a, "p1").await;
    assert_count(&next_json(&mut a).await, "p1", 1);

    join(&mut b, "p1").await;
    assert_count(&next_json(&mut a).await, "p1", 2);
    assert_count(&next_json(&mut b).await, "p1", 2);

    a.close(None).await.unwrap();

    assert_count(&next_json(&mut b).await, "p1", 1);
    wait_for_connections(&app, 1).await;
    assert_eq!(app.hub().viewer_count(&PostId::new("p1").unwrap()).await, 1);
}

#[tokio::test]
async fn dropped_socket_is_reconciled_once() {
    let app = LiveApp::new(&AppConfig::default());
    let url = boot(&app).await;

    let mut a = open(&url).await;
    let mut b = open(&url).await;
    join(&mut a, "p1").await;
    join(&mut a, "p2").await;
    assert_count(&next_json(&mut a).await, "p1", 1);
    assert_count(&next_json(&mut a).await, "p2", 1);
    join(&mut b, "p1").await;
    assert_count(&next_json(&mut b).await, "p1", 2);

    // No close frame: the transport just goes away.
    drop(a);

    assert_count(&next_json(&mut b).await, "p1", 1);
    wait_for_connections(&app, 1).await;
    assert_eq!(app.hub().rooms().active_rooms().await.len(), 1);

    // A second reconciliation would surface here ahead of the pong.
    send_json(&mut b, json!({"type": "PING"})).await;
    assert_eq!(next_json(&mut b).await["type"], "PONG");
}

#[tokio::test]
async fn leave_frame_updates_remaining_viewers() {
    let app = LiveApp::new(&AppConfig::default());
    let url = boot(&app).await;

    let mut a = open(&url).await;
    let mut b = open(&url).await;
    join(&mut a, "p1").await;
    assert_count(&next_json(&mut a).await, "p1", 1);
    join(&mut b, "p1").await;
    assert_count(&next_json(&mut a).await, "p1", 2);
    assert_count(&next_json(&mut b).await, "p1", 2);

    send_json(&mut b, json!({"type": "LEAVE_POST_ROOM", "postId": "p1"})).await;

    assert_count(&next_json(&mut a).await, "p1", 1);

    b.close(None).await.unwrap();
    wait_for_connections(&app, 1).await;

    // B had already left, so its close changes nothing for A.
    send_json(&mut a, json!({"type": "PING"})).await;
    assert_eq!(next_json(&mut a).await["type"], "PONG");
}

// =============================================================================
// Frames and comments
// =============================================================================

#[tokio::test]
async fn malformed_frame_gets_error_and_socket_stays_open() {
    let app = LiveApp::new(&AppConfig::default());
    let url = boot(&app).await;
    let mut ws = open(&url).await;

    ws.send(Message::Text("{not json".to_string().into()))
        .await
        .unwrap();
    let error = next_json(&mut ws).await;
    assert_eq!(error["type"], "ERROR");
    assert_eq!(error["code"], "MALFORMED_EVENT");

    ws.send(Message::Binary(vec![1, 2, 3].into())).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "ERROR");

    join(&mut ws, "p1").await;
    assert_count(&next_json(&mut ws).await, "p1", 1);
}

#[tokio::test]
async fn comment_published_on_bus_reaches_sockets_in_room() {
    let app = LiveApp::new(&AppConfig::default());
    let url = boot(&app).await;

    let mut reader = open(&url).await;
    let mut elsewhere = open(&url).await;
    join(&mut reader, "p1").await;
    assert_count(&next_json(&mut reader).await, "p1", 1);
    join(&mut elsewhere, "p2").await;
    assert_count(&next_json(&mut elsewhere).await, "p2", 1);

    let stored = json!({
        "_id": "c1",
        "post": "p1",
        "user": {"_id": "u1", "username": "berry"},
        "content": "Great read",
        "createdAt": "2025-01-10T12:00:00.000Z",
        "__v": 0
    });
    app.publisher()
        .publish(EventEnvelope::new(COMMENT_CREATED, "c1", "Comment", stored.clone()))
        .await
        .unwrap();

    let msg = next_json(&mut reader).await;
    assert_eq!(msg["type"], "COMMENT_CREATED");
    assert_eq!(msg["comment"], stored);

    // The other room only ever sees its own traffic.
    send_json(&mut elsewhere, json!({"type": "PING"})).await;
    assert_eq!(next_json(&mut elsewhere).await["type"], "PONG");
}
