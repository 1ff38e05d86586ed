//! The LLM gateway: one chat-style HTTP call per frontend turn.
//!
//! The gateway absorbs two wire formats behind a single `generate` call:
//! local providers stream newline-delimited JSON fragments, remote providers
//! answer with a single JSON document in one of a few known shapes.

use crate::error::GatewayError;
use crate::provider::{ProviderKind, ProviderRegistry};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A chat gateway that turns user text into the model's raw reply text.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn generate(&self, user_text: &str) -> Result<String, GatewayError>;
}

/// HTTP implementation of [`LlmGateway`].
///
/// The provider config is re-resolved from the registry on every call, so a
/// rotated API key in the environment takes effect without a restart.
pub struct HttpLlmGateway {
    http: reqwest::Client,
    registry: ProviderRegistry,
    provider: String,
    system_prompt: String,
    extra: Map<String, Value>,
    timeout: Duration,
}

impl HttpLlmGateway {
    pub fn new(
        registry: ProviderRegistry,
        provider: String,
        system_prompt: String,
        timeout: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            registry,
            provider,
            system_prompt,
            extra: Map::new(),
            timeout,
        }
    }

    /// Extra provider-specific parameters merged into every request body.
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// The chat payload for one call: system + user message, plus any extra
    /// provider-specific parameters.
    fn request_body(&self, model: &str, user_text: &str) -> Value {
        let mut payload = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": self.system_prompt},
                {"role": "user", "content": user_text},
            ],
        });
        if let Value::Object(body) = &mut payload {
            for (key, value) in &self.extra {
                body.insert(key.clone(), value.clone());
            }
        }
        payload
    }
}

#[async_trait]
impl LlmGateway for HttpLlmGateway {
    async fn generate(&self, user_text: &str) -> Result<String, GatewayError> {
        let provider = self.registry.resolve(&self.provider)?;
        debug!(provider = %provider.name, model = %provider.model, "dispatching chat request");

        let payload = self.request_body(&provider.model, user_text);
        let mut request = self
            .http
            .post(&provider.base_url)
            .json(&payload)
            .timeout(self.timeout);
        if let Some(key) = &provider.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status));
        }

        let reply = match provider.kind {
            ProviderKind::Ndjson => collect_ndjson_stream(response).await?,
            ProviderKind::Json => extract_reply(&response.json::<Value>().await?),
        };
        info!(provider = %provider.name, chars = reply.len(), "LLM reply received");
        Ok(reply)
    }
}

/// Consumes a streaming NDJSON body, concatenating `message.content`
/// fragments until a `done: true` line or the end of the stream.
async fn collect_ndjson_stream(response: reqwest::Response) -> Result<String, GatewayError> {
    let mut assembler = NdjsonAssembler::default();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        if assembler.push_chunk(&chunk?) {
            break;
        }
    }
    Ok(assembler.finish())
}

/// Incremental NDJSON reassembly. Lines may be split across network chunks;
/// malformed lines are skipped rather than aborting the stream.
#[derive(Default)]
struct NdjsonAssembler {
    buf: String,
    text: String,
    done: bool,
}

impl NdjsonAssembler {
    /// Feeds one network chunk. Returns true once a `done` line was seen.
    fn push_chunk(&mut self, chunk: &[u8]) -> bool {
        self.buf.push_str(&String::from_utf8_lossy(chunk));
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            if self.push_line(line.trim()) {
                return true;
            }
        }
        self.done
    }

    fn push_line(&mut self, line: &str) -> bool {
        if line.is_empty() {
            return self.done;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(item) => {
                if let Some(content) = item.pointer("/message/content").and_then(Value::as_str) {
                    self.text.push_str(content);
                }
                if item.get("done").and_then(Value::as_bool) == Some(true) {
                    self.done = true;
                }
            }
            Err(err) => warn!(%err, line, "skipping malformed stream line"),
        }
        self.done
    }

    /// Flushes any unterminated trailing line and returns the assembled text.
    fn finish(mut self) -> String {
        if !self.done {
            let rest = std::mem::take(&mut self.buf);
            self.push_line(rest.trim());
        }
        self.text
    }
}

/// Extracts the reply text from a single-document provider response.
///
/// Tries the chat-completion shape, then a flat `message.content`, then a
/// flat `output`. Anything else round-trips to its own serialized form so a
/// response is never silently dropped.
pub fn extract_reply(body: &Value) -> String {
    if let Some(content) = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        return content.to_string();
    }
    if let Some(content) = body.pointer("/message/content").and_then(Value::as_str) {
        return content.to_string();
    }
    if let Some(output) = body.get("output").and_then(Value::as_str) {
        return output.to_string();
    }
    body.to_string()
}
