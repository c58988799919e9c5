//! End-to-end tests: real WebSocket clients against a real gateway on a
//! loopback port.
//!
//! Timing strategy: frames to ONE socket arrive in the order the hub
//! emitted them, so single-socket assertions just read frames in
//! sequence. Cross-socket ordering is not guaranteed by anything, so
//! where a test needs "that join has landed" it polls the hub's own
//! membership view ([`wait_member`]) instead of sleeping and hoping.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use huddle::prelude::*;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

const SECRET: &[u8] = b"huddle-test-secret";

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn mint(sub: &str) -> String {
    let claims = Claims::for_subject(sub);
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))
        .expect("mint token")
}

/// Starts a gateway on a random port; returns its address and the hub
/// handle an application's REST layer would hold.
async fn start_server() -> (String, HubHandle) {
    let server = HuddleServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(JwtAuthenticator::new(SECRET))
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let hub = server.hub();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, hub)
}

/// Connects with a bearer token in the `Authorization` header.
async fn connect(addr: &str, sub: &str) -> ClientWs {
    let mut request = format!("ws://{addr}")
        .into_client_request()
        .expect("client request");
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {}", mint(sub)).parse().expect("header value"),
    );

    let (ws, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("should connect");
    ws
}

/// Connects with no credentials at all.
async fn connect_anonymous(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_frame(ws: &mut ClientWs, frame: &Frame) {
    let text = serde_json::to_string(frame).expect("encode frame");
    ws.send(Message::Text(text.into())).await.expect("send frame");
}

async fn recv_frame(ws: &mut ClientWs) -> Frame {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended")
        .expect("recv failed");
    serde_json::from_slice(&msg.into_data()).expect("decode frame")
}

/// Asserts no frame arrives within 200ms.
async fn assert_no_frame(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}

/// Asserts the server closes the connection without sending a frame.
async fn expect_closed(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_secs(2), ws.next()).await;
    match result {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {}
        Ok(Some(Err(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
}

/// Polls the hub until `user` shows up as a member of `room`.
async fn wait_member(hub: &HubHandle, room: &RoomName, user: &UserId) {
    for _ in 0..50 {
        let members = hub
            .members_of(room.clone())
            .await
            .expect("hub should be running");
        if members.contains(user) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{user} never became a member of {room}");
}

/// Sends the join frame for one entity and waits until the hub agrees.
async fn join(ws: &mut ClientWs, hub: &HubHandle, scope: EntityScope, id: &str, sub: &str) {
    let event = match scope {
        EntityScope::Project => event::JOIN_PROJECT,
        EntityScope::Task => event::JOIN_TASK,
    };
    send_frame(ws, &Frame::new(event, json!({ "id": id }))).await;
    wait_member(hub, &scope.room(id), &UserId::new(sub)).await;
}

fn presence(frame: &Frame) -> PresencePayload {
    serde_json::from_value(frame.data.clone()).expect("presence payload")
}

fn membership(frame: &Frame) -> MembershipPayload {
    serde_json::from_value(frame.data.clone()).expect("membership payload")
}

fn typing(frame: &Frame) -> TypingPayload {
    serde_json::from_value(frame.data.clone()).expect("typing payload")
}

// =========================================================================
// Authentication
// =========================================================================

#[tokio::test]
async fn test_connect_with_valid_token_acks_connected() {
    let (addr, _hub) = start_server().await;
    let mut ws = connect(&addr, "alice").await;

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame.event, event::CONNECTED);

    let ack = presence(&frame);
    assert_eq!(ack.user_id, UserId::new("alice"));
    assert!(ack.timestamp > 0);
}

#[tokio::test]
async fn test_connect_without_token_is_closed() {
    let (addr, _hub) = start_server().await;
    let mut ws = connect_anonymous(&addr).await;

    expect_closed(&mut ws).await;
}

#[tokio::test]
async fn test_connect_with_invalid_token_is_closed() {
    let (addr, _hub) = start_server().await;

    let mut request = format!("ws://{addr}")
        .into_client_request()
        .expect("client request");
    request.headers_mut().insert(
        "Authorization",
        "Bearer not-a-jwt".parse().expect("header value"),
    );
    let (mut ws, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("should connect");

    expect_closed(&mut ws).await;
}

#[tokio::test]
async fn test_token_in_query_string_authenticates() {
    let (addr, _hub) = start_server().await;

    let url = format!("ws://{addr}/?token={}", mint("alice"));
    let (mut ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("should connect");

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame.event, event::CONNECTED);
    assert_eq!(presence(&frame).user_id, UserId::new("alice"));
}

#[tokio::test]
async fn test_token_in_subprotocol_authenticates() {
    let (addr, _hub) = start_server().await;

    // Browser WebSocket clients cannot set Authorization, so the token
    // rides in the subprotocol offer instead.
    let mut request = format!("ws://{addr}")
        .into_client_request()
        .expect("client request");
    request.headers_mut().insert(
        "Sec-WebSocket-Protocol",
        format!("bearer.{}", mint("alice"))
            .parse()
            .expect("header value"),
    );
    let (mut ws, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("should connect");

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame.event, event::CONNECTED);
    assert_eq!(presence(&frame).user_id, UserId::new("alice"));
}

// =========================================================================
// Presence
// =========================================================================

#[tokio::test]
async fn test_user_online_broadcast_to_other_clients() {
    let (addr, _hub) = start_server().await;

    let mut alice = connect(&addr, "alice").await;
    recv_frame(&mut alice).await; // connected ack

    let mut bob = connect(&addr, "bob").await;
    recv_frame(&mut bob).await;

    let frame = recv_frame(&mut alice).await;
    assert_eq!(frame.event, event::USER_ONLINE);
    assert_eq!(presence(&frame).user_id, UserId::new("bob"));
}

#[tokio::test]
async fn test_second_tab_does_not_rebroadcast_online() {
    let (addr, _hub) = start_server().await;

    let mut bob = connect(&addr, "bob").await;
    recv_frame(&mut bob).await;

    let mut tab1 = connect(&addr, "alice").await;
    recv_frame(&mut tab1).await;
    let frame = recv_frame(&mut bob).await;
    assert_eq!(frame.event, event::USER_ONLINE);

    // Same user, second connection. The ack proves the hub registered
    // it; bob must hear nothing new.
    let mut tab2 = connect(&addr, "alice").await;
    recv_frame(&mut tab2).await;
    assert_no_frame(&mut bob).await;
}

// =========================================================================
// Room membership
// =========================================================================

#[tokio::test]
async fn test_join_notifies_existing_members_not_joiner() {
    let (addr, hub) = start_server().await;

    let mut alice = connect(&addr, "alice").await;
    recv_frame(&mut alice).await;
    join(&mut alice, &hub, EntityScope::Project, "42", "alice").await;

    let mut bob = connect(&addr, "bob").await;
    recv_frame(&mut bob).await;
    let frame = recv_frame(&mut alice).await;
    assert_eq!(frame.event, event::USER_ONLINE);

    join(&mut bob, &hub, EntityScope::Project, "42", "bob").await;

    let frame = recv_frame(&mut alice).await;
    assert_eq!(frame.event, EntityScope::Project.joined_event());
    let joined = membership(&frame);
    assert_eq!(joined.user_id, UserId::new("bob"));
    assert_eq!(joined.entity_id, "42");

    // The joiner itself gets no echo.
    assert_no_frame(&mut bob).await;
}

#[tokio::test]
async fn test_disconnect_broadcasts_left_then_offline() {
    let (addr, hub) = start_server().await;

    let mut alice = connect(&addr, "alice").await;
    recv_frame(&mut alice).await;
    join(&mut alice, &hub, EntityScope::Project, "42", "alice").await;

    let mut bob = connect(&addr, "bob").await;
    recv_frame(&mut bob).await;
    recv_frame(&mut alice).await; // bob online
    join(&mut bob, &hub, EntityScope::Project, "42", "bob").await;
    recv_frame(&mut alice).await; // bob joined

    bob.close(None).await.expect("close");

    let frame = recv_frame(&mut alice).await;
    assert_eq!(frame.event, EntityScope::Project.left_event());
    let left = membership(&frame);
    assert_eq!(left.user_id, UserId::new("bob"));
    assert_eq!(left.entity_id, "42");

    let frame = recv_frame(&mut alice).await;
    assert_eq!(frame.event, event::USER_OFFLINE);
    assert_eq!(presence(&frame).user_id, UserId::new("bob"));
}

// =========================================================================
// Client traffic
// =========================================================================

#[tokio::test]
async fn test_typing_relayed_with_stamped_identity() {
    let (addr, hub) = start_server().await;

    let mut alice = connect(&addr, "alice").await;
    recv_frame(&mut alice).await;
    join(&mut alice, &hub, EntityScope::Task, "9", "alice").await;

    let mut bob = connect(&addr, "bob").await;
    recv_frame(&mut bob).await;
    recv_frame(&mut alice).await; // bob online
    join(&mut bob, &hub, EntityScope::Task, "9", "bob").await;
    recv_frame(&mut alice).await; // bob joined

    // The forged userId must be ignored; the gateway stamps the
    // authenticated identity.
    send_frame(
        &mut bob,
        &Frame::new(
            event::TYPING,
            json!({
                "roomName": "task:9",
                "field": "description",
                "isTyping": true,
                "userId": "mallory",
            }),
        ),
    )
    .await;

    let frame = recv_frame(&mut alice).await;
    assert_eq!(frame.event, event::TYPING);
    let relayed = typing(&frame);
    assert_eq!(relayed.user_id, UserId::new("bob"));
    assert_eq!(relayed.room_name, EntityScope::Task.room("9"));
    assert_eq!(relayed.field, "description");
    assert!(relayed.is_typing);
    assert!(relayed.timestamp > 0);

    // The sender's own indicator does not bounce back.
    assert_no_frame(&mut bob).await;
}

#[tokio::test]
async fn test_unknown_event_is_ignored_connection_survives() {
    let (addr, hub) = start_server().await;

    let mut observer = connect(&addr, "bob").await;
    recv_frame(&mut observer).await;
    join(&mut observer, &hub, EntityScope::Project, "7", "bob").await;

    let mut alice = connect(&addr, "alice").await;
    recv_frame(&mut alice).await;
    recv_frame(&mut observer).await; // alice online

    // One event nobody routes, then a real join. Frames from one
    // socket are handled in order, so the join landing proves the
    // unknown event was skipped without killing the connection.
    send_frame(&mut alice, &Frame::new("board:reorder", json!({ "x": 1 }))).await;
    join(&mut alice, &hub, EntityScope::Project, "7", "alice").await;

    let frame = recv_frame(&mut observer).await;
    assert_eq!(frame.event, EntityScope::Project.joined_event());
    assert_eq!(membership(&frame).user_id, UserId::new("alice"));
}

#[tokio::test]
async fn test_malformed_frames_are_dropped_connection_survives() {
    let (addr, hub) = start_server().await;

    let mut observer = connect(&addr, "bob").await;
    recv_frame(&mut observer).await;
    join(&mut observer, &hub, EntityScope::Project, "7", "bob").await;

    let mut alice = connect(&addr, "alice").await;
    recv_frame(&mut alice).await;
    recv_frame(&mut observer).await; // alice online

    // Not JSON at all, then a routed event with the wrong payload
    // shape, then a valid join.
    alice
        .send(Message::Text("not json".into()))
        .await
        .expect("send");
    send_frame(
        &mut alice,
        &Frame::new(event::JOIN_PROJECT, json!({ "name": "no id here" })),
    )
    .await;
    join(&mut alice, &hub, EntityScope::Project, "7", "alice").await;

    // Exactly one join notification: the malformed one never made it.
    let frame = recv_frame(&mut observer).await;
    assert_eq!(frame.event, EntityScope::Project.joined_event());
    assert_no_frame(&mut observer).await;
}

// =========================================================================
// Application push
// =========================================================================

#[tokio::test]
async fn test_entity_update_push_reaches_room_members_only() {
    let (addr, hub) = start_server().await;

    let mut alice = connect(&addr, "alice").await;
    recv_frame(&mut alice).await;
    join(&mut alice, &hub, EntityScope::Task, "9", "alice").await;

    let mut bob = connect(&addr, "bob").await;
    recv_frame(&mut bob).await;
    recv_frame(&mut alice).await; // bob online

    // What a REST handler does after committing a write.
    let payload = EntityUpdatePayload {
        kind: "task".into(),
        entity_id: "9".into(),
        data: json!({ "status": "done" }),
        timestamp: now_millis(),
    };
    let frame = Frame::new(
        EntityScope::Task.updated_event(),
        serde_json::to_value(&payload).expect("encode payload"),
    );
    hub.broadcast_to_room(EntityScope::Task.room("9"), frame, None)
        .await
        .expect("broadcast");

    let frame = recv_frame(&mut alice).await;
    assert_eq!(frame.event, "task:updated");
    let update: EntityUpdatePayload =
        serde_json::from_value(frame.data.clone()).expect("update payload");
    assert_eq!(update.kind, "task");
    assert_eq!(update.entity_id, "9");
    assert_eq!(update.data["status"], "done");

    // Bob never joined the task room.
    assert_no_frame(&mut bob).await;
}

#[tokio::test]
async fn test_notification_reaches_target_user_only() {
    let (addr, hub) = start_server().await;

    let mut alice = connect(&addr, "alice").await;
    recv_frame(&mut alice).await;

    let mut bob = connect(&addr, "bob").await;
    recv_frame(&mut bob).await;
    recv_frame(&mut alice).await; // bob online

    hub.notify_user(
        UserId::new("alice"),
        Frame::new(event::NOTIFICATION, json!({ "message": "deploy finished" })),
    )
    .await
    .expect("notify");

    let frame = recv_frame(&mut alice).await;
    assert_eq!(frame.event, event::NOTIFICATION);
    assert_eq!(frame.data["message"], "deploy finished");

    assert_no_frame(&mut bob).await;
}
