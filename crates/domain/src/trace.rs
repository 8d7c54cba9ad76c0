use serde::Serialize;

/// Structured trace events emitted across all sodai crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    LlmRequest {
        provider: String,
        model: String,
        role: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    LlmRetry {
        provider: String,
        role: String,
        attempt: u32,
        reason: String,
    },
    LlmFallback {
        from_provider: String,
        to_provider: String,
        to_model: String,
        reason: String,
    },
    ExtractionAttempt {
        attempt: u32,
        ok: bool,
        fields: usize,
    },
    ThreadCreated {
        thread_id: String,
    },
    TurnClassified {
        thread_id: String,
        kind: String,
        next_field: Option<String>,
        missing: usize,
    },
    ConfirmationReply {
        thread_id: String,
        reply: String,
    },
    BookingIssued {
        thread_id: String,
        confirmation_id: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sg_event");
    }
}
