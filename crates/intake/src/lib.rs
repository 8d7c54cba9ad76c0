//! Bulky-waste pickup intake: field extraction, the deterministic dialogue
//! policy, optional engine phrasing and the confirmation sub-dialogue.

pub mod agent;
pub mod confirmation;
pub mod extraction;
pub mod merge;
pub mod patch;
pub mod phrasing;
pub mod policy;
pub mod prompts;
pub mod response;
pub mod schema;
pub mod tools;

pub use agent::{IntakeAgent, TurnOutcome, EXTRACTION_APOLOGY};
pub use response::ResponseKind;
pub use schema::Field;
