//! Turn orchestration core for MentorLoop.
//!
//! Drives one conversation turn from user input to a finalized assistant
//! reply. The crate is split along the I/O boundary:
//!
//! - [`usecase`] — pure validation functions that turn raw intent into
//!   persistence-ready commands or typed failures. No I/O.
//! - [`access`] — the single conversation-access predicate backing every
//!   read/write boundary check.
//! - [`aggregator`] — sequence-ordered folding of streamed deltas.
//! - [`turn`] — the effect queue and turn controller: session state, queued
//!   effects, and the notify callbacks the executor reports back through.
//! - [`ports`] — the traits the infrastructure layer implements
//!   (persistence, feedback, streaming generation, display-name lookup).
//!
//! Implementations of the ports live in mentorloop-infra; this crate never
//! performs I/O itself.

pub mod access;
pub mod aggregator;
pub mod ports;
pub mod turn;
pub mod usecase;
