//! Manages the WebSocket bridge lifecycle for one frontend connection.
//!
//! Each session dials the robot's WebSocket endpoint, then runs a strictly
//! sequential receive/transform/forward loop. Whenever bridging ends for any
//! reason, exactly one canonical stop frame is attempted before the robot
//! connection is released, so the actuator is never left in an unknown
//! motion state. If the robot was never reachable, the frontend is closed
//! with a diagnostic reason and no stop is attempted.

use super::{pipeline, protocol::ServerMessage};
use crate::{config::BridgeMode, state::AppState};
use anyhow::Result;
use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use futures_util::SinkExt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message as WsMessage,
};
use tracing::{Instrument, debug, error, info, instrument, warn};

/// The canonical safety stop frame, as the robot protocol expects it.
pub const STOP_FRAME: &str = r#"{"action":"stop"}"#;

type RobotSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why the bridge loop ended. The robot connection outlives all of these,
/// so each one is followed by the safety stop.
#[derive(Debug)]
enum CloseReason {
    FrontendClosed,
    FrontendError,
    UpstreamSendFailed,
}

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual bridge session.
#[instrument(name = "bridge_session", skip_all, fields(session_id))]
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let session_id: u32 = rand::random();
    tracing::Span::current().record("session_id", &session_id.to_string());
    info!("Frontend connected. Dialing robot...");

    let robot_url = state.config.robot_ws_url.clone();
    let mut robot_ws = match connect_async(robot_url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(err) => {
            // Never entered bridging: nothing to stop. Tell the frontend
            // which target was unreachable and end the session.
            error!(url = %robot_url, %err, "Could not connect to the robot");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::ERROR,
                    reason: format!("robot unreachable at {robot_url}: {err}").into(),
                })))
                .await;
            return;
        }
    };
    info!(url = %robot_url, "Connected to robot. Bridging.");

    let reason = bridge(&mut socket, &mut robot_ws, &state)
        .instrument(tracing::info_span!("bridge_loop"))
        .await;

    // Safety interlock: one stop attempt on every exit from bridging.
    // Best effort; the robot link may itself be the failure point.
    info!(?reason, "Bridge loop ended. Sending safety stop to robot.");
    let _ = robot_ws.send(WsMessage::Text(STOP_FRAME.into())).await;
    let _ = robot_ws.close(None).await;
    info!("Bridge session terminated.");
}

/// The sequential receive/transform/forward loop.
///
/// Per-message transform failures in AI mode are contained here: the turn is
/// dropped (no command reaches the robot), the frontend is told, and the
/// loop continues. Only connection-level failures end the loop.
async fn bridge(
    socket: &mut WebSocket,
    robot_ws: &mut RobotSocket,
    state: &Arc<AppState>,
) -> CloseReason {
    loop {
        let msg = match socket.recv().await {
            Some(Ok(msg)) => msg,
            Some(Err(err)) => {
                error!(%err, "Error receiving from frontend");
                return CloseReason::FrontendError;
            }
            None => {
                info!("Frontend disconnected");
                return CloseReason::FrontendClosed;
            }
        };

        let outbound = match msg {
            Message::Text(text) => match state.config.mode {
                BridgeMode::Direct => Some(text.to_string()),
                BridgeMode::Ai => match pipeline::run_ai_turn(state.gateway.as_ref(), &text).await
                {
                    Ok(turn) => {
                        let _ = send_msg(socket, ServerMessage::Reply { text: turn.reply }).await;
                        turn.command
                    }
                    Err(err) => {
                        warn!(%err, "AI turn failed; dropping this message");
                        let _ = send_msg(
                            socket,
                            ServerMessage::Error {
                                message: err.to_string(),
                            },
                        )
                        .await;
                        None
                    }
                },
            },
            Message::Close(_) => {
                info!("Frontend sent close frame");
                return CloseReason::FrontendClosed;
            }
            Message::Binary(_) => {
                warn!("Ignoring binary frame from frontend");
                None
            }
            Message::Ping(_) | Message::Pong(_) => None,
        };

        if let Some(payload) = outbound {
            if let Err(err) = robot_ws.send(WsMessage::Text(payload.into())).await {
                error!(%err, "Failed to forward to robot");
                return CloseReason::UpstreamSendFailed;
            }
            debug!("Forwarded message to robot");
        }
    }
}

/// Serializes and sends a `ServerMessage` to the frontend.
async fn send_msg(socket: &mut WebSocket, msg: ServerMessage) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket.send(Message::Text(serialized.into())).await?;
    Ok(())
}
