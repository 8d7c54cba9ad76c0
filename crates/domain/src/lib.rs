//! Shared types for the sodai intake assistant: the error type, the TOML
//! configuration tree, engine message types, the intake record and structured
//! trace events.

pub mod capability;
pub mod config;
pub mod error;
pub mod message;
pub mod record;
pub mod trace;
