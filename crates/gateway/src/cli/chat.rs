//! `sodai chat`: interactive intake conversation.
//!
//! A readline loop that sends each line as one resident turn. Slash commands
//! manage threads.

use std::sync::Arc;

use sg_domain::config::Config;
use sg_intake::{ResponseKind, TurnOutcome};

use crate::bootstrap;
use crate::runtime;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(config: Arc<Config>, thread: Option<String>) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config).await?;
    bootstrap::spawn_background_tasks(&state);

    let mut thread_id = match thread {
        Some(id) if state.sessions.contains(&id) => id,
        Some(id) => anyhow::bail!("thread not found: {id}"),
        None => runtime::create_thread(&state).thread_id,
    };

    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".sodai")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    eprintln!("粗大ごみ受付チャット");
    eprintln!("Thread: {thread_id}  |  /help for commands, Ctrl+D to exit");
    eprintln!();

    let mut awaiting = state
        .sessions
        .get(&thread_id)
        .is_some_and(|s| s.pending_confirmation());

    loop {
        let prompt = if awaiting { "you [はい/いいえ]> " } else { "you> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    match handle_slash_command(&state, trimmed, &mut thread_id) {
                        SlashOutcome::Exit => break,
                        SlashOutcome::Switched => {
                            awaiting = state
                                .sessions
                                .get(&thread_id)
                                .is_some_and(|s| s.pending_confirmation());
                        }
                        SlashOutcome::Handled => {}
                    }
                    continue;
                }

                match runtime::run_turn(&state, &thread_id, trimmed).await {
                    Ok(outcome) => {
                        print_outcome(&outcome);
                        awaiting = outcome.pending_confirmation;
                    }
                    Err(e) => eprintln!("\x1B[31merror: {e}\x1B[0m"),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    if let Err(e) = state.sessions.flush() {
        tracing::warn!(error = %e, "thread store flush on exit failed");
    }
    eprintln!("Goodbye!");
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    match &outcome.response {
        ResponseKind::Error { message } => eprintln!("\x1B[31m{message}\x1B[0m"),
        other => println!("{}", other.message()),
    }
    println!();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, PartialEq, Eq)]
enum SlashOutcome {
    Handled,
    Switched,
    Exit,
}

fn handle_slash_command(state: &AppState, input: &str, thread_id: &mut String) -> SlashOutcome {
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match cmd {
        "/exit" | "/quit" => return SlashOutcome::Exit,

        "/new" => {
            *thread_id = runtime::create_thread(state).thread_id;
            eprintln!("New thread: {thread_id}");
            return SlashOutcome::Switched;
        }

        "/threads" => {
            for id in state.sessions.list_ids() {
                let marker = if id == *thread_id { "*" } else { " " };
                eprintln!("{marker} {id}");
            }
        }

        "/open" => match arg {
            Some(id) if state.sessions.contains(id) => {
                *thread_id = id.to_string();
                eprintln!("Switched to thread: {thread_id}");
                return SlashOutcome::Switched;
            }
            Some(id) => eprintln!("No such thread: {id}"),
            None => eprintln!("Usage: /open <thread-id>"),
        },

        "/record" => match state.sessions.get(thread_id.as_str()) {
            Some(s) => match serde_json::to_string_pretty(&s.record) {
                Ok(json) => eprintln!("{json}"),
                Err(e) => eprintln!("\x1B[31merror: {e}\x1B[0m"),
            },
            None => eprintln!("No such thread: {thread_id}"),
        },

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /new          Start a new thread");
            eprintln!("  /threads      List threads");
            eprintln!("  /open <id>    Switch to an existing thread");
            eprintln!("  /record       Show the collected application record");
            eprintln!("  /exit, /quit  Exit the chat");
            eprintln!("  /help         Show this help");
        }

        other => eprintln!("Unknown command: {other}  (type /help for a list)"),
    }

    SlashOutcome::Handled
}
