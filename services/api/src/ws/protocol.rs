//! Frontend-bound messages. Only AI mode produces these; in direct mode the
//! relay never writes to the frontend.

use serde::Serialize;

/// Messages sent from the server to the frontend.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The model's human-readable reply for this turn.
    Reply { text: String },
    /// A per-turn failure; the session keeps running.
    Error { message: String },
}
