use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider system
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Per-call timeout wrapped around every engine request.
    #[serde(default = "d_60000u")]
    pub default_timeout_ms: u64,
    /// Extra attempts on transient provider failures (timeouts, 5xx).
    #[serde(default = "d_2")]
    pub max_retries: u32,
    /// Model roles: `extractor` and `dialogue`.
    #[serde(default)]
    pub roles: HashMap<String, RoleConfig>,
    /// Registered LLM providers.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 60_000,
            max_retries: 2,
            roles: HashMap::new(),
            providers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Format: "provider_id/model_name"
    pub model: String,
    #[serde(default)]
    pub require_json: bool,
    #[serde(default)]
    pub fallbacks: Vec<FallbackConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub kind: ProviderKind,
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub default_model: Option<String>,
    /// Azure `api-version` query parameter.
    #[serde(default)]
    pub api_version: Option<String>,
    /// Send JSON schemas as vLLM `guided_json` instead of the OpenAI
    /// `response_format: json_schema` shape.
    #[serde(default)]
    pub guided_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenaiCompat,
    AzureOpenai,
    AwsBedrock,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// Header name (e.g. "Authorization", "api-key").
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix (e.g. "Bearer ").
    #[serde(default)]
    pub prefix: Option<String>,
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env).
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    ApiKey,
    None,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_60000u() -> u64 {
    60_000
}
fn d_2() -> u32 {
    2
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.default_timeout_ms, 60_000);
        assert!(config.providers.is_empty());
    }

    #[test]
    fn azure_provider_deserializes() {
        let json = r#"{
            "providers": [{
                "id": "azure",
                "kind": "azure_openai",
                "base_url": "https://example.openai.azure.com",
                "api_version": "2024-10-21",
                "auth": { "env": "AZURE_OPENAI_API_KEY" },
                "default_model": "gpt-4o-mini"
            }],
            "roles": {
                "extractor": { "model": "azure/gpt-4o-mini", "require_json": true }
            }
        }"#;
        let config: LlmConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.providers[0].kind, ProviderKind::AzureOpenai);
        assert_eq!(config.providers[0].api_version.as_deref(), Some("2024-10-21"));
        assert!(!config.providers[0].guided_json);
        assert!(config.roles["extractor"].require_json);
        assert!(config.roles["extractor"].fallbacks.is_empty());
    }

    #[test]
    fn auth_mode_none_serializes() {
        let json = serde_json::to_string(&AuthMode::None).unwrap();
        assert_eq!(json, r#""none""#);
    }
}
