//! Infrastructure layer for MentorLoop.
//!
//! Implements the port traits from mentorloop-core and hosts the effect
//! executor: the only component that performs actual I/O. The in-memory
//! adapters back tests and local development; a relational store would slot
//! in behind the same traits.

pub mod config;
pub mod executor;
pub mod memory;
pub mod scripted;
