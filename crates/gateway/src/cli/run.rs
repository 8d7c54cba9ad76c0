//! `sodai run`: one turn from the command line.
//!
//! Prints the reply on stdout and the thread id on stderr so the next call
//! can continue with `--thread`.

use std::sync::Arc;

use sg_domain::config::Config;
use sg_intake::ResponseKind;

use crate::bootstrap;
use crate::runtime;

pub async fn run(
    config: Arc<Config>,
    message: String,
    thread: Option<String>,
    json_output: bool,
) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config).await?;

    let thread_id = match thread {
        Some(id) if state.sessions.contains(&id) => id,
        Some(id) => anyhow::bail!("thread not found: {id}"),
        None => runtime::create_thread(&state).thread_id,
    };

    let outcome = runtime::run_turn(&state, &thread_id, &message).await?;

    if json_output {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| anyhow::anyhow!("serializing turn outcome: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", outcome.response.message());
        eprintln!("\x1b[2mthread: {thread_id}\x1b[0m");
    }

    if matches!(outcome.response, ResponseKind::Error { .. }) {
        std::process::exit(1);
    }
    Ok(())
}
