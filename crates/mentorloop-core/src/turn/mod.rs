//! Effect queue and turn controller.
//!
//! The controller holds all session state and never performs I/O: validated
//! commands become queued [`Effect`]s, an external executor performs them
//! one at a time, and outcomes are folded back in through the controller's
//! `notify_*` callbacks.

mod controller;
mod effect;

pub use controller::TurnController;
pub use effect::{Effect, EffectId, EffectKind};
