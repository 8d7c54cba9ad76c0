use tracing::Instrument;

use sg_domain::error::{Error, Result};
use sg_intake::{IntakeAgent, TurnOutcome};
use sg_sessions::{new_thread_id, Session};

use crate::state::AppState;

/// Mint a fresh thread.
pub fn create_thread(state: &AppState) -> Session {
    let id = new_thread_id(state.agent.timezone());
    state.sessions.create(&id)
}

/// Pick the agent that handles `thread_id`. There is only the bulky-waste
/// intake agent.
fn dispatch<'a>(state: &'a AppState, thread_id: &str) -> &'a IntakeAgent {
    tracing::trace!(thread_id, agent = "bulky_waste_intake", "dispatch");
    &state.agent
}

/// Run one resident turn on `thread_id`, holding the thread's lock for the
/// whole turn, then persist.
pub async fn run_turn(state: &AppState, thread_id: &str, message: &str) -> Result<TurnOutcome> {
    if !state.sessions.contains(thread_id) {
        return Err(Error::SessionNotFound(thread_id.to_owned()));
    }
    let _permit = state
        .thread_locks
        .acquire(thread_id)
        .await
        .map_err(|e| Error::Other(e.to_string()))?;

    let outcome = dispatch(state, thread_id)
        .run_turn(&state.sessions, thread_id, message)
        .instrument(tracing::info_span!("turn", thread_id = %thread_id))
        .await?;

    if let Err(e) = state.sessions.flush() {
        tracing::warn!(thread_id, error = %e, "thread store flush failed");
    }
    tracing::info!(
        thread_id,
        kind = outcome.response.kind(),
        pending_confirmation = outcome.pending_confirmation,
        booked = outcome.booking.is_some(),
        "turn complete"
    );
    Ok(outcome)
}
