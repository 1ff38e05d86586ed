//! System-prompt loading.

use std::path::Path;
use tracing::{debug, warn};

/// Used when no prompt file is available, so an AI-mode session can still run.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Amadeus, a friendly robot control assistant. \
    Turn the user's natural-language request into a JSON object of the form \
    {\"text\": \"<your reply>\", \"command\": {\"type\": \"move\"|\"beep\"|\"stop\", \
    \"direction\": \"forward\"|\"backward\"|\"left\"|\"right\", \"speed\": <m/s>, \
    \"duration\": <seconds>}}. Omit \"command\" when the user is only chatting.";

/// Reads the persona/rules prompt from disk. A missing or unreadable file is
/// not fatal: the built-in default is used instead, with a warning.
pub fn load_system_prompt(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(prompt) => {
            debug!(path = %path.display(), "loaded system prompt");
            prompt
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "prompt file unavailable; using built-in default");
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    }
}
