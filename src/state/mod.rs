//! State module for tracking dispatch progress
//!
//! # Components
//!
//! - `DispatchPhase`: where the dispatcher is within the current round
//! - `FailureKind`: how a single fetch attempt failed, for round statistics

mod failure;
mod phase;

// Re-export main types
pub use failure::FailureKind;
pub use phase::DispatchPhase;
