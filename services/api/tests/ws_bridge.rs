//! End-to-end bridge tests: a real Axum server on loopback, a mock robot
//! WebSocket server, and a scripted gateway for AI mode.

use amadeus_api::{
    config::{BridgeMode, Config},
    router::create_router,
    state::AppState,
    ws::session::STOP_FRAME,
};
use amadeus_core::{GatewayError, LlmGateway, ProviderRegistry};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::mpsc, time::timeout};
use tokio_tungstenite::{accept_async, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn test_config(robot_ws_url: String, mode: BridgeMode) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        robot_ws_url,
        mode,
        llm_provider: "scripted".to_string(),
        providers_path: PathBuf::from("/nonexistent/providers.toml"),
        prompt_path: PathBuf::from("/nonexistent/system_prompt.md"),
        llm_timeout: Duration::from_secs(5),
        log_level: tracing::Level::INFO,
    }
}

/// Gateway that replies with a fixed string, standing in for the LLM.
struct ScriptedGateway(String);

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn generate(&self, _user_text: &str) -> Result<String, GatewayError> {
        Ok(self.0.clone())
    }
}

/// Gateway whose first call fails and whose later calls return a fixed
/// envelope, for exercising per-turn failure containment.
struct FlakyGateway {
    calls: std::sync::atomic::AtomicUsize,
    reply: String,
}

#[async_trait]
impl LlmGateway for FlakyGateway {
    async fn generate(&self, _user_text: &str) -> Result<String, GatewayError> {
        if self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            == 0
        {
            Err(GatewayError::Configuration("provider offline".to_string()))
        } else {
            Ok(self.reply.clone())
        }
    }
}

/// Accepts robot-side WebSocket connections and funnels every received text
/// frame into a channel the test can assert on.
async fn spawn_mock_robot() -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut ws = accept_async(stream).await.unwrap();
                while let Some(Ok(msg)) = ws.next().await {
                    if let Message::Text(text) = msg {
                        let _ = tx.send(text.to_string());
                    }
                }
            });
        }
    });
    (format!("ws://{addr}"), rx)
}

async fn spawn_app(config: Config, gateway: Arc<dyn LlmGateway>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState {
        config: Arc::new(config),
        registry: ProviderRegistry::default(),
        gateway,
    });
    let app = create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn next_robot_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a robot frame")
        .expect("robot channel closed")
}

#[tokio::test]
async fn direct_mode_forwards_verbatim_and_stops_on_disconnect() {
    let (robot_url, mut robot_rx) = spawn_mock_robot().await;
    let addr = spawn_app(
        test_config(robot_url, BridgeMode::Direct),
        Arc::new(ScriptedGateway(String::new())),
    )
    .await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws/control"))
        .await
        .unwrap();
    let payload = r#"{"action":"move","linear_x":0.8}"#;
    client.send(Message::Text(payload.into())).await.unwrap();
    assert_eq!(next_robot_frame(&mut robot_rx).await, payload);

    client.close(None).await.unwrap();
    assert_eq!(next_robot_frame(&mut robot_rx).await, STOP_FRAME);

    // Exactly one stop frame, nothing after it.
    assert!(
        timeout(Duration::from_millis(300), robot_rx.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn direct_mode_preserves_message_order() {
    let (robot_url, mut robot_rx) = spawn_mock_robot().await;
    let addr = spawn_app(
        test_config(robot_url, BridgeMode::Direct),
        Arc::new(ScriptedGateway(String::new())),
    )
    .await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws/control"))
        .await
        .unwrap();
    for i in 0..5 {
        let frame = format!(r#"{{"action":"move","linear_x":0.{i}}}"#);
        client.send(Message::Text(frame.into())).await.unwrap();
    }
    for i in 0..5 {
        assert_eq!(
            next_robot_frame(&mut robot_rx).await,
            format!(r#"{{"action":"move","linear_x":0.{i}}}"#)
        );
    }
}

#[tokio::test]
async fn unreachable_robot_closes_frontend_with_diagnostic() {
    // Bind and immediately drop to get a loopback port with no listener.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);
    let robot_url = format!("ws://{dead_addr}");

    let addr = spawn_app(
        test_config(robot_url.clone(), BridgeMode::Direct),
        Arc::new(ScriptedGateway(String::new())),
    )
    .await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws/control"))
        .await
        .unwrap();
    let msg = timeout(RECV_TIMEOUT, client.next())
        .await
        .expect("timed out waiting for close")
        .expect("connection ended without a close frame")
        .unwrap();
    match msg {
        Message::Close(Some(frame)) => {
            assert_ne!(u16::from(frame.code), 1000);
            assert!(frame.reason.contains(&robot_url), "reason: {}", frame.reason);
        }
        other => panic!("expected a close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn ai_mode_normalizes_unsafe_move_and_echoes_reply() {
    let (robot_url, mut robot_rx) = spawn_mock_robot().await;
    // The model emitted a forward move with zero speed and zero duration.
    let scripted = r#"{"text":"moving forward","command":{"type":"move","direction":"forward","speed":0,"duration":0}}"#;
    let addr = spawn_app(
        test_config(robot_url, BridgeMode::Ai),
        Arc::new(ScriptedGateway(scripted.to_string())),
    )
    .await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws/control"))
        .await
        .unwrap();
    client
        .send(Message::Text("walk forward for two seconds".into()))
        .await
        .unwrap();

    // The frontend hears the model's reply first.
    let reply = timeout(RECV_TIMEOUT, client.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let reply: serde_json::Value = match reply {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text, got {other:?}"),
    };
    assert_eq!(reply["type"], "reply");
    assert_eq!(reply["text"], "moving forward");

    // The robot only ever sees the normalized command.
    let forwarded: serde_json::Value =
        serde_json::from_str(&next_robot_frame(&mut robot_rx).await).unwrap();
    assert_eq!(forwarded["type"], "stop");
    assert_eq!(forwarded["speed"], 0.0);
    assert!(forwarded.get("direction").is_none());
}

#[tokio::test]
async fn ai_mode_contains_gateway_failure_and_keeps_bridging() {
    let (robot_url, mut robot_rx) = spawn_mock_robot().await;
    let scripted = r#"{"text":"on my way","command":{"type":"move","direction":"forward","speed":0.3,"duration":2.0}}"#;
    let addr = spawn_app(
        test_config(robot_url, BridgeMode::Ai),
        Arc::new(FlakyGateway {
            calls: std::sync::atomic::AtomicUsize::new(0),
            reply: scripted.to_string(),
        }),
    )
    .await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws/control"))
        .await
        .unwrap();

    // First turn: the gateway fails. The frontend is told, the robot sees
    // nothing, and the session stays up.
    client.send(Message::Text("go forward".into())).await.unwrap();
    let msg = timeout(RECV_TIMEOUT, client.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let msg: serde_json::Value = match msg {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text, got {other:?}"),
    };
    assert_eq!(msg["type"], "error");
    assert!(
        timeout(Duration::from_millis(300), robot_rx.recv())
            .await
            .is_err(),
        "a failed turn must not reach the robot"
    );

    // Second turn: the gateway has recovered and the turn bridges normally.
    client.send(Message::Text("go forward".into())).await.unwrap();
    let reply = timeout(RECV_TIMEOUT, client.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let reply: serde_json::Value = match reply {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text, got {other:?}"),
    };
    assert_eq!(reply["type"], "reply");
    let forwarded: serde_json::Value =
        serde_json::from_str(&next_robot_frame(&mut robot_rx).await).unwrap();
    assert_eq!(forwarded["type"], "move");
    assert_eq!(forwarded["direction"], "forward");
}

#[tokio::test]
async fn ai_mode_chat_turn_forwards_nothing_until_disconnect() {
    let (robot_url, mut robot_rx) = spawn_mock_robot().await;
    let addr = spawn_app(
        test_config(robot_url, BridgeMode::Ai),
        Arc::new(ScriptedGateway(r#"{"text":"hello!"}"#.to_string())),
    )
    .await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws/control"))
        .await
        .unwrap();
    client.send(Message::Text("hi".into())).await.unwrap();

    // Wait for the reply so the turn has definitely been processed.
    let _ = timeout(RECV_TIMEOUT, client.next()).await.unwrap();
    assert!(
        timeout(Duration::from_millis(300), robot_rx.recv())
            .await
            .is_err(),
        "no command should reach the robot for a chat-only turn"
    );

    client.close(None).await.unwrap();
    assert_eq!(next_robot_frame(&mut robot_rx).await, STOP_FRAME);
}
