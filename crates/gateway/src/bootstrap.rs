//! AppState construction shared by `serve`, `run` and `chat`.

use std::sync::Arc;

use anyhow::Context;

use sg_domain::config::{Config, ConfigSeverity};
use sg_intake::IntakeAgent;
use sg_providers::LlmRouter;
use sg_sessions::SessionStore;

use crate::api::auth::ApiToken;
use crate::runtime::thread_lock::ThreadLockMap;
use crate::state::AppState;

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── LLM routing ──────────────────────────────────────────────────
    let router = Arc::new(LlmRouter::from_config(&config.llm).context("initializing LLM providers")?);
    if router.registry().is_empty() {
        tracing::warn!("no LLM providers initialized, every turn will fail extraction");
    } else {
        tracing::info!(
            providers = ?router.registry().list_providers(),
            "LLM router ready"
        );
    }

    // ── Thread store ─────────────────────────────────────────────────
    let sessions = match &config.sessions.state_path {
        Some(path) => SessionStore::open(path).context("opening thread store")?,
        None => {
            tracing::info!("no sessions.state_path configured, threads are kept in memory");
            SessionStore::in_memory()
        }
    };

    build_with(config, router, sessions)
}

/// Wire an [`AppState`] from parts that are already built.
pub fn build_with(
    config: Arc<Config>,
    router: Arc<LlmRouter>,
    sessions: SessionStore,
) -> anyhow::Result<AppState> {
    let agent = IntakeAgent::new(router, &config.intake).context("initializing intake agent")?;
    tracing::info!(timezone = %agent.timezone(), "intake agent ready");

    Ok(AppState {
        api_token: api_token(&config),
        config,
        agent: Arc::new(agent),
        sessions: Arc::new(sessions),
        thread_locks: Arc::new(ThreadLockMap::new()),
    })
}

/// Read the bearer token once at startup.
fn api_token(config: &Config) -> Option<ApiToken> {
    let env_var = &config.server.api_token_env;
    let token = ApiToken::from_env(env_var);
    if token.is_some() {
        tracing::info!(source = %format!("env:{env_var}"), "API bearer-token auth enabled");
    } else {
        tracing::warn!("API bearer-token auth DISABLED, set the {env_var} env var to enable it");
    }
    token
}

/// Spawn long-running background tasks: periodic thread flush (when a
/// state path is configured) and thread-lock pruning.
pub fn spawn_background_tasks(state: &AppState) {
    if state.config.sessions.state_path.is_some() {
        let sessions = state.sessions.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
            loop {
                interval.tick().await;
                if let Err(e) = sessions.flush() {
                    tracing::warn!(error = %e, "thread store flush failed");
                }
            }
        });
    }

    {
        let thread_locks = state.thread_locks.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                prune_thread_locks(&thread_locks);
            }
        });
    }
}

fn prune_thread_locks(thread_locks: &ThreadLockMap) {
    let pruned = thread_locks.prune_idle();
    if pruned > 0 {
        tracing::debug!(pruned, remaining = thread_locks.thread_count(), "pruned idle thread locks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn housekeeping_drops_idle_thread_locks() {
        let locks = ThreadLockMap::new();
        let held = locks.acquire("t-busy").await.unwrap();
        for id in ["t1", "t2", "t3"] {
            drop(locks.acquire(id).await.unwrap());
        }
        assert_eq!(locks.thread_count(), 4);

        prune_thread_locks(&locks);
        assert_eq!(locks.thread_count(), 1);
        drop(held);
    }
}
