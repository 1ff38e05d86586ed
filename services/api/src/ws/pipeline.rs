//! One AI turn: call the gateway, decode the model's envelope, normalize any
//! command it produced.

use amadeus_core::{AiResponse, GatewayError, LlmGateway};
use tracing::{info, warn};

/// The outcome of an AI turn: a reply for the frontend and, when the model
/// produced one, a normalized command serialized for the robot.
pub struct AiTurn {
    pub reply: String,
    pub command: Option<String>,
}

/// Runs the frontend's text through the LLM and the safety normalizer.
///
/// A gateway failure propagates to the caller; a malformed envelope does not.
/// An envelope that fails to decode is treated as "no command for this turn"
/// and the raw model text becomes the reply, so one bad generation never
/// tears down the session.
pub async fn run_ai_turn(gateway: &dyn LlmGateway, user_text: &str) -> Result<AiTurn, GatewayError> {
    let raw = gateway.generate(user_text).await?;
    match AiResponse::from_llm_text(&raw) {
        Ok(response) => {
            info!(reply = %response.text, "AI reply");
            let command = response
                .command
                .map(|cmd| {
                    let cmd = cmd.normalized();
                    info!(command = ?cmd, "normalized command");
                    serde_json::to_string(&cmd)
                })
                .transpose()?;
            Ok(AiTurn {
                reply: response.text,
                command,
            })
        }
        Err(err) => {
            warn!(%err, "AI output is not a valid envelope; treating turn as no-command");
            Ok(AiTurn {
                reply: raw,
                command: None,
            })
        }
    }
}
