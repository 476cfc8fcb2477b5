//! End-to-end WebSocket tests: a real server on an ephemeral port driven
//! by a tungstenite client, over a migrated temp database.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

use mediline_auth::Authenticator;
use mediline_config::{AuthConfig, MediaConfig};
use mediline_conversations::CallService;
use mediline_database::{
    run_migrations, AccountType, CallType, ConversationRepository, CreateUserRequest,
    UserRepository,
};
use mediline_gateway::{create_router, GatewayState, RoomKey};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE_TIMEOUT: Duration = Duration::from_millis(300);

struct TestServer {
    addr: SocketAddr,
    state: GatewayState,
    pool: SqlitePool,
    patient_id: i64,
    doctor_id: i64,
    patient_token: String,
    doctor_token: String,
    conversation_id: i64,
    _temp_dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let db_path = temp_dir.path().join("gateway-e2e.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = SqlitePool::connect(&db_url).await.expect("connect");
        run_migrations(&pool).await.expect("migrations");

        let users = UserRepository::new(pool.clone());
        let patient = users
            .create(&CreateUserRequest {
                username: "paula".to_string(),
                first_name: "Paula".to_string(),
                last_name: "Stone".to_string(),
                email: "paula@example.com".to_string(),
                account_type: AccountType::Patient,
            })
            .await
            .expect("seed patient");
        users
            .create_patient_profile(patient.id, Some("profile_pics/patient/paula.png"))
            .await
            .expect("seed patient profile");
        let doctor = users
            .create(&CreateUserRequest {
                username: "dana".to_string(),
                first_name: "Dana".to_string(),
                last_name: "Reed".to_string(),
                email: "dana@example.com".to_string(),
                account_type: AccountType::Doctor,
            })
            .await
            .expect("seed doctor");

        let conversation = ConversationRepository::new(pool.clone())
            .create(patient.id, doctor.id)
            .await
            .expect("seed conversation");

        let auth_config = AuthConfig {
            session_ttl_seconds: 3_600,
        };
        let authenticator = Authenticator::new(pool.clone(), auth_config.clone());
        let patient_token = authenticator
            .issue_session(patient.id)
            .await
            .expect("patient session")
            .token;
        let doctor_token = authenticator
            .issue_session(doctor.id)
            .await
            .expect("doctor session")
            .token;

        let media = MediaConfig {
            base_url: "http://localhost:7080/media".to_string(),
            storage_dir: temp_dir.path().join("media").display().to_string(),
        };

        let state = GatewayState::new(pool.clone(), auth_config, media);
        let router = create_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });

        Self {
            addr,
            state,
            pool,
            patient_id: patient.id,
            doctor_id: doctor.id,
            patient_token,
            doctor_token,
            conversation_id: conversation.id,
            _temp_dir: temp_dir,
        }
    }

    async fn connect_conversation(&self, token: &str) -> WsClient {
        let url = format!(
            "ws://{}/conversation/{}/?token={}&version=1",
            self.addr, self.conversation_id, token
        );
        let (client, _) = connect_async(url).await.expect("ws connect");
        client
    }

    async fn connect_call(&self, call_id: i64, token: &str) -> WsClient {
        let url = format!("ws://{}/call/{}/?token={}", self.addr, call_id, token);
        let (client, _) = connect_async(url).await.expect("ws connect");
        client
    }

    /// Wait until the server-side room registry shows the expected member
    /// count, so sends cannot race the joins.
    async fn wait_for_members(&self, key: RoomKey, expected: usize) {
        for _ in 0..100 {
            if self.state.rooms.member_count(key).await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("room {key} never reached {expected} members");
    }
}

async fn recv_json(client: &mut WsClient) -> Value {
    loop {
        let message = timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("transport error");

        match message {
            Message::Text(text) => return serde_json::from_str(&text).expect("invalid json frame"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

async fn assert_silent(client: &mut WsClient) {
    let result = timeout(SILENCE_TIMEOUT, client.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

#[tokio::test]
async fn chat_message_round_trip_reaches_both_participants() {
    let server = TestServer::start().await;
    let room = RoomKey::Conversation(server.conversation_id);

    let connected_at = chrono::Utc::now();

    let mut patient = server.connect_conversation(&server.patient_token).await;
    let mut doctor = server.connect_conversation(&server.doctor_token).await;
    server.wait_for_members(room, 2).await;

    patient
        .send(Message::Text(
            json!({
                "action": "chat_message",
                "text": "hi",
                "sender": server.patient_id,
            })
            .to_string(),
        ))
        .await
        .expect("send");

    // Chat messages intentionally echo: the sender's own broadcast is the
    // persistence confirmation.
    for client in [&mut patient, &mut doctor] {
        let frame = recv_json(client).await;
        assert_eq!(frame["type"], "message");
        assert_eq!(frame["text"], "hi");
        assert_eq!(frame["conversation"], server.conversation_id);
        assert_eq!(frame["sender"]["id"], server.patient_id);
        assert_eq!(frame["sender"]["account_type"], "patient");
        assert_eq!(
            frame["sender"]["profile_pic"],
            "http://localhost:7080/media/profile_pics/patient/paula.png"
        );

        let stamped =
            chrono::DateTime::parse_from_rfc3339(frame["timestamp"].as_str().unwrap()).unwrap();
        assert!(
            stamped >= connected_at - chrono::Duration::seconds(1),
            "timestamp must be server-assigned after connection start"
        );
    }

    // Exactly one persisted message for the one frame.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(&server.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn unknown_actions_are_dropped_without_an_error_frame() {
    let server = TestServer::start().await;
    let room = RoomKey::Conversation(server.conversation_id);

    let mut patient = server.connect_conversation(&server.patient_token).await;
    server.wait_for_members(room, 1).await;

    patient
        .send(Message::Text(
            json!({"action": "shrug", "payload": 1}).to_string(),
        ))
        .await
        .expect("send");

    // The connection stays open and silent, and a well-formed frame still
    // works afterwards.
    assert_silent(&mut patient).await;

    patient
        .send(Message::Text(
            json!({"action": "chat_message", "text": "still alive"}).to_string(),
        ))
        .await
        .expect("send");
    let frame = recv_json(&mut patient).await;
    assert_eq!(frame["type"], "message");
    assert_eq!(frame["text"], "still alive");
}

#[tokio::test]
async fn invalid_token_closes_with_4001_and_joins_nothing() {
    let server = TestServer::start().await;
    let room = RoomKey::Conversation(server.conversation_id);

    let mut client = server.connect_conversation("not-a-real-token").await;

    let message = timeout(RECV_TIMEOUT, client.next())
        .await
        .expect("timed out waiting for close")
        .expect("stream ended")
        .expect("transport error");

    match message {
        Message::Close(Some(frame)) => {
            assert_eq!(u16::from(frame.code), 4001);
        }
        other => panic!("expected close frame, got {other:?}"),
    }

    assert_eq!(server.state.rooms.member_count(room).await, 0);
}

#[tokio::test]
async fn missing_token_closes_with_4001() {
    let server = TestServer::start().await;

    let url = format!(
        "ws://{}/conversation/{}/?version=1",
        server.addr, server.conversation_id
    );
    let (mut client, _) = connect_async(url).await.expect("ws connect");

    let message = timeout(RECV_TIMEOUT, client.next())
        .await
        .expect("timed out waiting for close")
        .expect("stream ended")
        .expect("transport error");

    match message {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 4001),
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn signaling_relay_suppresses_the_sender_echo() {
    let server = TestServer::start().await;

    let call = CallService::new(server.pool.clone())
        .create(server.conversation_id, server.patient_id, CallType::Video)
        .await
        .expect("create call");
    let call_room = RoomKey::Call(call.id);

    let mut patient_call = server.connect_call(call.id, &server.patient_token).await;
    let mut doctor_call = server.connect_call(call.id, &server.doctor_token).await;
    server.wait_for_members(call_room, 2).await;

    patient_call
        .send(Message::Text(
            json!({
                "action": "webrtc_offer",
                "offer": {"sdp": "v=0", "type": "offer"},
                "conversationId": server.conversation_id,
            })
            .to_string(),
        ))
        .await
        .expect("send offer");

    // Only the other member hears the offer; offers never echo.
    let frame = recv_json(&mut doctor_call).await;
    assert_eq!(frame["type"], "webrtc_offer");
    assert_eq!(frame["offer"]["sdp"], "v=0");
    assert_eq!(frame["sender"], server.patient_id);

    assert_silent(&mut patient_call).await;

    // Answers and candidates relay the same way, in issue order.
    doctor_call
        .send(Message::Text(
            json!({
                "action": "webrtc_answer",
                "answer": {"sdp": "v=0", "type": "answer"},
                "conversationId": server.conversation_id,
            })
            .to_string(),
        ))
        .await
        .expect("send answer");
    doctor_call
        .send(Message::Text(
            json!({
                "action": "webrtc_ice_candidate",
                "candidate": {"candidate": "candidate:0"},
                "conversationId": server.conversation_id,
            })
            .to_string(),
        ))
        .await
        .expect("send candidate");

    let first = recv_json(&mut patient_call).await;
    assert_eq!(first["type"], "webrtc_answer");
    assert_eq!(first["sender"], server.doctor_id);
    let second = recv_json(&mut patient_call).await;
    assert_eq!(second["type"], "webrtc_ice_candidate");

    assert_silent(&mut doctor_call).await;
}

#[tokio::test]
async fn first_offer_notifies_the_conversation_room_even_when_caller_is_alone() {
    let server = TestServer::start().await;

    let call = CallService::new(server.pool.clone())
        .create(server.conversation_id, server.patient_id, CallType::Video)
        .await
        .expect("create call");

    // The doctor sits only in the chat room; the patient is alone in the
    // call room.
    let mut doctor_chat = server.connect_conversation(&server.doctor_token).await;
    server
        .wait_for_members(RoomKey::Conversation(server.conversation_id), 1)
        .await;

    let mut patient_call = server.connect_call(call.id, &server.patient_token).await;
    server.wait_for_members(RoomKey::Call(call.id), 1).await;

    let offer = json!({
        "action": "webrtc_offer",
        "offer": {"sdp": "v=0", "type": "offer"},
        "conversationId": server.conversation_id,
    });

    patient_call
        .send(Message::Text(offer.to_string()))
        .await
        .expect("send offer");

    let frame = recv_json(&mut doctor_chat).await;
    assert_eq!(frame["type"], "call_notification");
    assert_eq!(frame["call"], call.id);
    assert_eq!(frame["caller"]["id"], server.patient_id);
    assert_eq!(frame["caller"]["account_type"], "patient");

    // No echo into the empty call room, and no repeat notification for a
    // second offer on the same connection.
    assert_silent(&mut patient_call).await;

    patient_call
        .send(Message::Text(offer.to_string()))
        .await
        .expect("send second offer");
    assert_silent(&mut doctor_chat).await;
}

#[tokio::test]
async fn disconnected_members_stop_receiving_broadcasts() {
    let server = TestServer::start().await;
    let room = RoomKey::Conversation(server.conversation_id);

    let mut patient = server.connect_conversation(&server.patient_token).await;
    let mut doctor = server.connect_conversation(&server.doctor_token).await;
    server.wait_for_members(room, 2).await;

    doctor.close(None).await.expect("close");
    server.wait_for_members(room, 1).await;

    patient
        .send(Message::Text(
            json!({"action": "chat_message", "text": "anyone there?"}).to_string(),
        ))
        .await
        .expect("send");

    // The patient still gets the echo; the room no longer counts the
    // doctor.
    let frame = recv_json(&mut patient).await;
    assert_eq!(frame["type"], "message");
    assert_eq!(server.state.rooms.member_count(room).await, 1);
}
