use serde::{Deserialize, Serialize};

/// Capabilities every {provider, model} pair advertises.
/// The router uses capabilities to check a role's requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCapabilities {
    pub supports_json_mode: bool,
    /// Accepts a JSON schema to constrain decoding (OpenAI `json_schema`
    /// response format or vLLM `guided_json`).
    pub supports_json_schema: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window_tokens: Option<u32>,
}

impl Default for LlmCapabilities {
    fn default() -> Self {
        Self {
            supports_json_mode: false,
            supports_json_schema: false,
            context_window_tokens: None,
        }
    }
}

/// Model roles. Each maps to a routing entry in `[llm.roles]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// Turns one utterance into a JSON record patch (temperature 0).
    Extractor,
    /// Phrases the dialogue policy's decision for the user.
    Dialogue,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Extractor => "extractor",
            ModelRole::Dialogue => "dialogue",
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
