//! Turn orchestration: thread creation, per-thread serialization and
//! dispatch to the intake agent.
//!
//! Entry point: [`run_turn`] takes a thread id plus the resident's message and
//! returns the classified [`TurnOutcome`].

pub mod thread_lock;
mod turn;

pub use turn::{create_thread, run_turn};

pub use sg_intake::TurnOutcome;
