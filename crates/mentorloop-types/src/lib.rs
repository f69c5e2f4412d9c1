//! Shared domain types for MentorLoop.
//!
//! This crate holds the data shapes exchanged between the orchestrator core
//! and the infrastructure layer: users and mentor assignments, conversations,
//! messages (with their lifecycle status), feedback, streamed deltas, prompts,
//! and the error taxonomy. It has no I/O and no business logic beyond small
//! helpers on the types themselves.

pub mod config;
pub mod conversation;
pub mod error;
pub mod feedback;
pub mod message;
pub mod prompt;
pub mod user;
