use std::sync::Arc;

use sg_domain::config::Config;
use sg_intake::IntakeAgent;
use sg_sessions::SessionStore;

use crate::api::auth::ApiToken;
use crate::runtime::thread_lock::ThreadLockMap;

/// Shared application state passed to all API handlers and CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// The single intake agent every turn is dispatched to.
    pub agent: Arc<IntakeAgent>,
    pub sessions: Arc<SessionStore>,
    /// One in-flight turn per thread.
    pub thread_locks: Arc<ThreadLockMap>,
    /// Bearer token for the thread routes. `None` leaves them open.
    pub api_token: Option<ApiToken>,
}
