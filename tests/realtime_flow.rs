//! End-to-end tests against a worker router bound to an ephemeral port.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use catalog_chat_gateway::app_state::AppState;
use catalog_chat_gateway::persistence::Backends;
use catalog_chat_gateway::worker::build_app;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_worker() -> SocketAddr {
    let state = AppState::new(Backends::in_memory(), Key::from(&[7u8; 64][..]));
    let static_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public");
    let app = build_app(state, &static_dir);

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move { axum::serve(listener, app).await });
    addr
}

async fn open(addr: SocketAddr) -> Client {
    let Ok((client, _)) = connect_async(format!("ws://{addr}/ws")).await else {
        panic!("ws connect failed");
    };
    client
}

async fn next_event(client: &mut Client) -> (String, Value) {
    loop {
        let Ok(Some(Ok(frame))) = timeout(Duration::from_secs(5), client.next()).await else {
            panic!("no event within 5s");
        };
        let Message::Text(text) = frame else {
            continue;
        };
        let Ok(mut envelope) = serde_json::from_str::<Value>(text.as_str()) else {
            panic!("event is not json: {text}");
        };
        let Some(name) = envelope.get("event").and_then(Value::as_str).map(str::to_owned) else {
            panic!("event without a name: {envelope}");
        };
        return (name, envelope["data"].take());
    }
}

async fn assert_quiet(client: &mut Client) {
    let next = timeout(Duration::from_millis(300), client.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

async fn emit(client: &mut Client, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    if client.send(Message::text(frame)).await.is_err() {
        panic!("ws send failed");
    }
}

/// Consumes the initial `items` + `msgs` sync.
async fn synced(addr: SocketAddr) -> Client {
    let mut client = open(addr).await;
    let (first, items) = next_event(&mut client).await;
    let (second, msgs) = next_event(&mut client).await;
    assert_eq!((first.as_str(), second.as_str()), ("items", "msgs"));
    assert!(items.is_array());
    assert!(msgs.is_array());
    client
}

#[tokio::test]
async fn new_item_is_broadcast_to_every_client() {
    let addr = spawn_worker().await;
    let mut c1 = synced(addr).await;
    let mut c2 = synced(addr).await;

    // Opening c2 must not have sent anything to c1.
    assert_quiet(&mut c1).await;

    emit(&mut c1, "new-item", json!({ "name": "Book", "price": 10, "thumbnail": "b.png" })).await;

    for client in [&mut c1, &mut c2] {
        let (name, items) = next_event(client).await;
        assert_eq!(name, "items");
        let Some([item]) = items.as_array().map(Vec::as_slice) else {
            panic!("expected exactly one item, got {items}");
        };
        assert_eq!(item["name"], "Book");
        assert_eq!(item["thumbnail"], "b.png");
        assert!(item["id"].is_i64());
        assert_quiet(client).await;
    }
}

#[tokio::test]
async fn new_msg_is_broadcast_as_msgs() {
    let addr = spawn_worker().await;
    let mut c1 = synced(addr).await;
    let mut c2 = synced(addr).await;

    emit(&mut c2, "new-msg", json!({ "author": "ana@example.com", "body": "hola" })).await;

    for client in [&mut c1, &mut c2] {
        let (name, msgs) = next_event(client).await;
        assert_eq!(name, "msgs");
        assert_eq!(msgs[0]["body"], "hola");
    }
}

#[tokio::test]
async fn invalid_item_is_reported_to_sender_only() {
    let addr = spawn_worker().await;
    let mut c1 = synced(addr).await;
    let mut c2 = synced(addr).await;

    emit(&mut c1, "new-item", json!({ "name": "", "price": 1 })).await;

    let (name, body) = next_event(&mut c1).await;
    assert_eq!(name, "error");
    assert_eq!(body["code"], 1001);
    assert_quiet(&mut c2).await;
}

#[tokio::test]
async fn rest_write_reaches_websocket_clients() {
    let addr = spawn_worker().await;
    let mut client = synced(addr).await;

    let Ok(resp) = reqwest::Client::new()
        .post(format!("http://{addr}/api/items"))
        .json(&json!({ "name": "Lamp", "price": 25.5 }))
        .send()
        .await
    else {
        panic!("POST /api/items failed");
    };
    assert_eq!(resp.status(), StatusCode::CREATED);

    let (name, items) = next_event(&mut client).await;
    assert_eq!(name, "items");
    assert_eq!(items[0]["name"], "Lamp");

    let Ok(listed) = reqwest::get(format!("http://{addr}/api/items")).await else {
        panic!("GET /api/items failed");
    };
    let Ok(listed) = listed.json::<Value>().await else {
        panic!("GET /api/items returned non-json");
    };
    assert_eq!(listed, items);
}

#[tokio::test]
async fn session_login_me_logout() {
    let addr = spawn_worker().await;
    let http = reqwest::Client::new();

    let Ok(login) = http
        .post(format!("http://{addr}/api/sessions/login"))
        .json(&json!({ "username": "ana" }))
        .send()
        .await
    else {
        panic!("login failed");
    };
    assert_eq!(login.status(), StatusCode::CREATED);
    let Some(cookie) = login
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
    else {
        panic!("login did not set a cookie");
    };
    assert!(cookie.starts_with("sid="));

    let me = |cookie: Option<&str>| {
        let mut req = http.get(format!("http://{addr}/api/sessions/me"));
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        req.send()
    };

    let Ok(current) = me(Some(&cookie)).await else {
        panic!("me failed");
    };
    assert_eq!(current.status(), StatusCode::OK);
    let Ok(current) = current.json::<Value>().await else {
        panic!("me returned non-json");
    };
    assert_eq!(current["username"], "ana");

    let Ok(anonymous) = me(None).await else {
        panic!("me failed");
    };
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let Ok(logout) = http
        .post(format!("http://{addr}/api/sessions/logout"))
        .header(COOKIE, &cookie)
        .send()
        .await
    else {
        panic!("logout failed");
    };
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let Ok(after) = me(Some(&cookie)).await else {
        panic!("me failed");
    };
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn serves_static_client() {
    let addr = spawn_worker().await;

    let Ok(resp) = reqwest::get(format!("http://{addr}/index.html")).await else {
        panic!("GET /index.html failed");
    };
    assert_eq!(resp.status(), StatusCode::OK);
    let Ok(body) = resp.text().await else {
        panic!("unreadable body");
    };
    assert!(body.contains("/ws"));
}
