//! End-to-end tests for the room relay over WebSocket.
#![allow(clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use damas_gateway::api;
use damas_gateway::app_state::AppState;
use damas_gateway::config::AppConfig;
use damas_gateway::error::GatewayError;
use damas_gateway::payments::{ChargeReceipt, ChargeRequest, PaymentProvider};
use damas_gateway::persistence::Database;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
struct EchoProvider;

impl PaymentProvider for EchoProvider {
    fn create_charge<'a>(
        &'a self,
        _request: &'a ChargeRequest,
    ) -> BoxFuture<'a, Result<ChargeReceipt, GatewayError>> {
        let raw = json!({ "id": uuid::Uuid::new_v4().to_string() });
        Box::pin(async move { ChargeReceipt::from_raw(raw) })
    }
}

async fn spawn() -> String {
    let config = AppConfig::default();
    let db = assert_ok!(Database::in_memory().await);
    let state = AppState::new(&config, db, Arc::new(EchoProvider));
    let app = api::build_app(state, &config);

    let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
    let addr = assert_ok!(listener.local_addr());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr.to_string()
}

async fn post(addr: &str, path: &str, token: Option<&str>, body: Value) -> Value {
    let mut req = reqwest::Client::new()
        .post(format!("http://{addr}{path}"))
        .json(&body);
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    let resp = assert_ok!(req.send().await);
    assert!(resp.status().is_success(), "{path}: {}", resp.status());
    resp.json::<Value>().await.unwrap_or(Value::Null)
}

/// Registers `name`, funds it with 50.00, and returns `(user_id, token)`.
async fn funded_player(addr: &str, name: &str) -> (String, String) {
    let session = post(addr, "/api/register", None, json!({"username": name})).await;
    let token = session["token"].as_str().unwrap_or_default().to_string();
    let id = session["user"]["id"].as_str().unwrap_or_default().to_string();

    let charge = post(addr, "/api/pix/create_charge", Some(&token), json!({"amount": 50})).await;
    post(
        addr,
        "/api/pixup/webhook",
        None,
        json!({"id": charge["charge_id"], "status": "PAID"}),
    )
    .await;
    (id, token)
}

async fn connect(addr: &str) -> Socket {
    let (socket, _) = assert_ok!(connect_async(format!("ws://{addr}/ws")).await);
    socket
}

async fn send_command(socket: &mut Socket, id: &str, payload: Value) {
    let frame = json!({ "id": id, "type": "command", "payload": payload });
    assert_ok!(socket.send(Message::text(frame.to_string())).await);
}

/// Reads frames until one satisfies `pred`, skipping anything else.
async fn next_matching(socket: &mut Socket, pred: impl Fn(&Value) -> bool) -> Value {
    let read = async {
        while let Some(frame) = socket.next().await {
            let Ok(Message::Text(text)) = frame else {
                continue;
            };
            let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                continue;
            };
            if pred(&value) {
                return value;
            }
        }
        panic!("socket closed before expected frame");
    };
    let Ok(value) = tokio::time::timeout(Duration::from_secs(5), read).await else {
        panic!("timed out waiting for frame");
    };
    value
}

async fn reply_to(socket: &mut Socket, id: &str) -> Value {
    next_matching(socket, |v| v["id"] == id && v["type"] != "event").await
}

async fn event_named(socket: &mut Socket, name: &str) -> Value {
    next_matching(socket, |v| v["type"] == "event" && v["payload"]["event"] == name).await
}

#[tokio::test]
async fn room_lifecycle_is_relayed() {
    let addr = spawn().await;
    let (host_id, host) = funded_player(&addr, "host").await;
    let (_, guest) = funded_player(&addr, "guest").await;
    let room = post(&addr, "/api/rooms", Some(&host), json!({"stake": "10.00"})).await;
    let room_id = room["room"]["id"].as_str().unwrap_or_default().to_string();

    let mut host_ws = connect(&addr).await;
    let mut guest_ws = connect(&addr).await;

    send_command(&mut host_ws, "j1", json!({"command": "join_room", "roomId": room_id})).await;
    let reply = reply_to(&mut host_ws, "j1").await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["status"], "waiting");

    // Moves are refused until the match starts.
    send_command(
        &mut host_ws,
        "m0",
        json!({"command": "move", "room_id": room_id, "move": {"from": 9, "to": 13}}),
    )
    .await;
    let reply = reply_to(&mut host_ws, "m0").await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], 409);

    post(&addr, &format!("/api/rooms/{room_id}/join"), Some(&guest), json!({})).await;
    let started = event_named(&mut host_ws, "room_started").await;
    assert_eq!(started["payload"]["room"]["status"], "playing");

    send_command(&mut guest_ws, "j2", json!({"command": "join_room", "room_id": room_id})).await;
    let reply = reply_to(&mut guest_ws, "j2").await;
    assert_eq!(reply["payload"]["status"], "playing");

    send_command(
        &mut host_ws,
        "m1",
        json!({"command": "move", "room_id": room_id, "move": {"from": 9, "to": 13}}),
    )
    .await;
    let relayed = event_named(&mut guest_ws, "move").await;
    assert_eq!(relayed["payload"]["room_id"].as_str(), Some(room_id.as_str()));
    assert_eq!(relayed["payload"]["move"], json!({"from": 9, "to": 13}));
    let ack = reply_to(&mut host_ws, "m1").await;
    assert_eq!(ack["type"], "response");

    post(
        &addr,
        &format!("/api/rooms/{room_id}/result"),
        Some(&host),
        json!({"winner_id": host_id}),
    )
    .await;
    let finished = event_named(&mut guest_ws, "room_finished").await;
    assert_eq!(finished["payload"]["room"]["winner_id"].as_str(), Some(host_id.as_str()));
}

#[tokio::test]
async fn bad_commands_get_error_frames() {
    let addr = spawn().await;
    let mut ws = connect(&addr).await;

    assert_ok!(ws.send(Message::text("not json")).await);
    let reply = next_matching(&mut ws, |v| v["type"] == "error").await;
    assert_eq!(reply["payload"]["code"], 400);

    send_command(&mut ws, "x1", json!({"command": "castle"})).await;
    let reply = reply_to(&mut ws, "x1").await;
    assert_eq!(reply["payload"]["code"], 404);

    send_command(
        &mut ws,
        "x2",
        json!({"command": "join_room", "room_id": uuid::Uuid::new_v4()}),
    )
    .await;
    let reply = reply_to(&mut ws, "x2").await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], 404);
}

#[tokio::test]
async fn unjoined_connections_see_nothing() {
    let addr = spawn().await;
    let (_, host) = funded_player(&addr, "host").await;
    let (_, guest) = funded_player(&addr, "guest").await;
    let room = post(&addr, "/api/rooms", Some(&host), json!({"stake": 10})).await;
    let room_id = room["room"]["id"].as_str().unwrap_or_default().to_string();

    let mut bystander = connect(&addr).await;
    post(&addr, &format!("/api/rooms/{room_id}/join"), Some(&guest), json!({})).await;

    // The next frame the bystander sees is the reply to its own command.
    send_command(&mut bystander, "p1", json!({"command": "leave_room", "room_id": room_id})).await;
    let Some(Ok(Message::Text(text))) = bystander.next().await else {
        panic!("expected a text frame");
    };
    let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else {
        panic!("frame is not JSON");
    };
    assert_eq!(frame["id"], "p1");
    assert_eq!(frame["payload"]["was_joined"], false);
}
