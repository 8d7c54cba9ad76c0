//! Utterance → record patch, through the `extractor` role.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use sg_domain::capability::ModelRole;
use sg_domain::error::{Error, Result};
use sg_domain::message::Message;
use sg_domain::trace::TraceEvent;
use sg_providers::{ChatRequest, LlmRouter};

use crate::patch::RecordPatch;
use crate::prompts;

pub struct Extractor {
    router: Arc<LlmRouter>,
    retries: u32,
    temperature: f32,
}

impl Extractor {
    pub fn new(router: Arc<LlmRouter>, retries: u32, temperature: f32) -> Self {
        Self {
            router,
            retries,
            temperature,
        }
    }

    /// Extract whatever fields `utterance` mentions, resolving relative dates
    /// against `today`.
    ///
    /// Malformed output and transient provider failures are retried; any
    /// other provider error is returned as-is.
    pub async fn extract(&self, utterance: &str, today: NaiveDate) -> Result<RecordPatch> {
        let today_iso = today.format("%Y-%m-%d").to_string();
        let mut messages: Vec<Message> = prompts::extraction_system(&today_iso)
            .into_iter()
            .map(Message::system)
            .collect();
        messages.push(Message::user(utterance));
        let req = ChatRequest::new(messages)
            .with_temperature(self.temperature)
            .with_json_schema(prompts::record_schema());

        let attempts = self.retries + 1;
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            let outcome = match self.router.chat_for_role(ModelRole::Extractor, req.clone()).await {
                Ok(resp) => parse_patch(&resp.content)
                    .ok_or_else(|| format!("unparseable extraction output: {}", snippet(&resp.content))),
                Err(e) if e.is_transient() => Err(e.to_string()),
                Err(e) => return Err(e),
            };

            match outcome {
                Ok(patch) => {
                    TraceEvent::ExtractionAttempt {
                        attempt,
                        ok: true,
                        fields: patch.filled(),
                    }
                    .emit();
                    return Ok(patch);
                }
                Err(msg) => {
                    TraceEvent::ExtractionAttempt {
                        attempt,
                        ok: false,
                        fields: 0,
                    }
                    .emit();
                    tracing::warn!(attempt, error = %msg, "extraction attempt failed");
                    last_error = msg;
                }
            }
        }

        Err(Error::Extraction {
            attempts,
            message: last_error,
        })
    }
}

/// Parse the engine's reply, tolerating code fences and stray prose around
/// the outermost JSON object.
pub fn parse_patch(raw: &str) -> Option<RecordPatch> {
    let value = parse_json_object(raw)?;
    RecordPatch::from_value(&value)
}

/// The outermost `{ ... }` in `raw`, parsed.
pub fn parse_json_object(raw: &str) -> Option<Value> {
    let trimmed = strip_fences(raw.trim());
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return v.is_object().then_some(v);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&trimmed[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn strip_fences(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn snippet(s: &str) -> String {
    s.chars().take(120).collect()
}
