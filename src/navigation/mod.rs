//! Navigation module - the challenge-handling state machine
//!
//! This module drives one browser session through gated pages:
//! - Challenge detection via title/content markers
//! - The solve-then-wait loop with idle interaction
//! - Retry with adaptive backoff pacing

mod challenge;
mod controller;
mod retry;

pub use challenge::{ChallengeProbe, ChallengeState, IDLE_INTERACTION_SCRIPT, SOLVE_SCRIPT};
pub use controller::{NavigationController, NavigationResult};
pub use retry::{scale_for_attempt, Pacer, RetryPolicy};
