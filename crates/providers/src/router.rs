//! Role-driven LLM router.
//!
//! The router resolves the provider and model for a [`ModelRole`], wraps each
//! call in a timeout, retries transient failures, and then walks the role's
//! fallback list.

use crate::registry::ProviderRegistry;
use crate::traits::{ChatRequest, ChatResponse, LlmProvider};
use sg_domain::capability::{LlmCapabilities, ModelRole};
use sg_domain::config::{LlmConfig, RoleConfig};
use sg_domain::error::{Error, Result};
use sg_domain::trace::TraceEvent;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const RETRY_BACKOFF_MS: u64 = 250;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Router
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct LlmRouter {
    registry: ProviderRegistry,
    role_configs: HashMap<String, RoleConfig>,
    default_timeout_ms: u64,
    max_retries: u32,
}

impl LlmRouter {
    /// Construct the router from the full LLM config.
    pub fn from_config(llm_config: &LlmConfig) -> Result<Self> {
        let registry = ProviderRegistry::from_config(llm_config)?;
        Ok(Self::new(
            registry,
            llm_config.roles.clone(),
            llm_config.default_timeout_ms,
            llm_config.max_retries,
        ))
    }

    /// Build from an already-constructed registry (useful for testing).
    pub fn new(
        registry: ProviderRegistry,
        role_configs: HashMap<String, RoleConfig>,
        default_timeout_ms: u64,
        max_retries: u32,
    ) -> Self {
        Self {
            registry,
            role_configs,
            default_timeout_ms,
            max_retries,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Whether a routing entry exists for `role`.
    pub fn has_role(&self, role: ModelRole) -> bool {
        self.role_configs.contains_key(role.as_str())
    }

    // ── Public routing API ─────────────────────────────────────────

    /// Send a chat request for a given model role. The router:
    ///
    /// 1. Resolves the primary model from the role config.
    /// 2. Validates that the provider satisfies the required capabilities.
    /// 3. Sends the request, retrying transient failures up to `max_retries`.
    /// 4. On exhaustion, moves on to the next configured fallback model.
    /// 5. Emits `LlmRequest`, `LlmRetry` and `LlmFallback` trace events.
    pub async fn chat_for_role(
        &self,
        role: ModelRole,
        mut req: ChatRequest,
    ) -> Result<ChatResponse> {
        let role_str = role.as_str();
        let role_cfg = self
            .role_configs
            .get(role_str)
            .ok_or_else(|| Error::Config(format!("no role config for '{}'", role_str)))?;

        let mut candidates = vec![role_cfg.model.as_str()];
        candidates.extend(role_cfg.fallbacks.iter().map(|f| f.model.as_str()));

        let (primary_provider, _) = resolve_model(&role_cfg.model);
        let mut last_err: Option<Error> = None;

        for (idx, spec) in candidates.iter().enumerate() {
            let (provider_id, model_name) = resolve_model(spec);
            let provider = match self.registry.get(provider_id) {
                Some(p) => p,
                None => {
                    tracing::warn!(provider = %provider_id, "provider not found in registry, skipping");
                    continue;
                }
            };
            if !Self::check_capabilities(provider.capabilities(), role_cfg) {
                tracing::warn!(
                    provider = %provider_id,
                    model = %model_name,
                    "model does not satisfy required capabilities, skipping"
                );
                continue;
            }

            if idx > 0 {
                TraceEvent::LlmFallback {
                    from_provider: primary_provider.to_string(),
                    to_provider: provider_id.to_string(),
                    to_model: model_name.to_string(),
                    reason: last_err
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "primary model unavailable".into()),
                }
                .emit();
            }

            req.model = if model_name.is_empty() {
                None
            } else {
                Some(model_name.to_string())
            };

            match self
                .try_with_retries(&provider, &req, role_str, model_name)
                .await
            {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        provider = %provider_id,
                        model = %model_name,
                        error = %e,
                        "model failed, trying next candidate"
                    );
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Provider {
            provider: "router".into(),
            message: format!("all models for role '{}' failed or were unavailable", role_str),
        }))
    }

    // ── Internal helpers ───────────────────────────────────────────

    async fn try_with_retries(
        &self,
        provider: &Arc<dyn LlmProvider>,
        req: &ChatRequest,
        role: &str,
        model_name: &str,
    ) -> Result<ChatResponse> {
        let mut attempt = 0;
        loop {
            let start = Instant::now();
            let result = self.try_chat(provider, req).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            TraceEvent::LlmRequest {
                provider: provider.provider_id().to_string(),
                model: model_name.to_string(),
                role: role.to_string(),
                duration_ms,
                prompt_tokens: result
                    .as_ref()
                    .ok()
                    .and_then(|r| r.usage.as_ref())
                    .map(|u| u.prompt_tokens),
                completion_tokens: result
                    .as_ref()
                    .ok()
                    .and_then(|r| r.usage.as_ref())
                    .map(|u| u.completion_tokens),
            }
            .emit();

            match result {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    TraceEvent::LlmRetry {
                        provider: provider.provider_id().to_string(),
                        role: role.to_string(),
                        attempt,
                        reason: e.to_string(),
                    }
                    .emit();
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64))
                        .await;
                }
                other => return other,
            }
        }
    }

    /// Send a chat request with a timeout wrapper.
    async fn try_chat(
        &self,
        provider: &Arc<dyn LlmProvider>,
        req: &ChatRequest,
    ) -> Result<ChatResponse> {
        let timeout = Duration::from_millis(self.default_timeout_ms);
        match tokio::time::timeout(timeout, provider.chat(req)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "provider '{}' timed out after {}ms",
                provider.provider_id(),
                self.default_timeout_ms
            ))),
        }
    }

    /// Check whether a provider's capabilities satisfy a role config's requirements.
    fn check_capabilities(cap: &LlmCapabilities, role_cfg: &RoleConfig) -> bool {
        !(role_cfg.require_json && !cap.supports_json_mode)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Split a `"provider_id/model_name"` string into its two components.
///
/// If there is no `/`, the entire string is treated as the provider id
/// and an empty model name is returned (the provider's default will be used).
pub fn resolve_model(model_str: &str) -> (&str, &str) {
    match model_str.split_once('/') {
        Some((provider, model)) => (provider, model),
        None => (model_str, ""),
    }
}
