//! Robot command schema and the safety normalization applied to every
//! AI-produced command before it may reach the actuator.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// The discrete instruction classes understood by the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    #[default]
    Move,
    Beep,
    Stop,
}

/// Travel direction for a `move` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

/// Buzzer state for a `beep` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuzzerState {
    On,
    Off,
}

/// One instruction to the actuator, in the robot's wire schema.
///
/// Field names on the wire follow the robot protocol: the kind is tagged
/// `type` and the buzzer state `status`. Optional fields are omitted from
/// JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotCommand {
    #[serde(rename = "type", default)]
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Speed in m/s, non-negative.
    #[serde(default)]
    pub speed: f64,
    /// Duration in seconds, non-negative.
    #[serde(default)]
    pub duration: f64,
    /// Distance in meters, when the model chose to express one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub buzzer: Option<BuzzerState>,
}

impl RobotCommand {
    /// Applies the safety rules and returns the canonical form of the command.
    ///
    /// Total and idempotent: every input maps to a valid output, and
    /// normalizing twice is the same as normalizing once.
    ///
    /// Rules, in order:
    /// 1. A `move` with no direction, or with zero speed and zero duration,
    ///    is indistinguishable from "do nothing" and is rewritten to `stop`.
    /// 2. A `beep` with no buzzer state defaults to `on`.
    /// 3. A `stop` has its motion fields forced to zero/absent.
    pub fn normalized(mut self) -> Self {
        match self.kind {
            CommandKind::Move => {
                if self.direction.is_none() || (self.speed == 0.0 && self.duration == 0.0) {
                    warn!("move command with no direction or zero magnitude; rewriting to stop");
                    self.kind = CommandKind::Stop;
                    self.direction = None;
                    self.speed = 0.0;
                    self.duration = 0.0;
                }
            }
            CommandKind::Beep => {
                self.buzzer.get_or_insert(BuzzerState::On);
            }
            CommandKind::Stop => {
                self.direction = None;
                self.speed = 0.0;
                self.duration = 0.0;
            }
        }
        self
    }
}

/// The envelope the model is instructed to emit: a human-readable reply and
/// an optional command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<RobotCommand>,
}

impl AiResponse {
    /// Decodes untrusted model output. A failure here means the turn carries
    /// no command; the caller decides what to do with the raw text.
    pub fn from_llm_text(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw.trim())
    }
}
