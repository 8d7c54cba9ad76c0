//! Thread state for the intake assistant.
//!
//! One [`Session`] per conversation thread: the message log, the record being
//! filled in, the confirmation sub-dialogue state and a pending date awaiting
//! the resident's confirmation. The store is in-memory with an optional JSON
//! snapshot on disk.

pub mod store;
pub mod transcript;

pub use store::{new_thread_id, ConfirmationState, Session, SessionStore};
pub use transcript::TranscriptLine;
