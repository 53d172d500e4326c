//! Human-in-the-loop decision coordination
//!
//! This module provides:
//! - [`DecisionCoordinator`] - creates, times out and resolves decisions
//! - [`DecisionRequest`] - parameters of a new decision
//! - [`PolicySnapshot`] - the autonomous flag and per-owner overrides
//!
//! # Lifecycle
//!
//! ```text
//!                request_decision
//!                      │
//!         ┌────────────┴─────────────┐
//!   no review needed           review needed
//!         │                          │
//!         ▼                          ▼
//!     Bypassed                    Pending ──── timer ────▶ TimedOut
//!                                    │
//!                        approve ────┴──── reject
//!                           │                 │
//!                           ▼                 ▼
//!                       Approved          Rejected
//! ```

mod policy;
mod request;
mod service;

pub use policy::PolicySnapshot;
pub use request::{CompletionCallback, DecisionRequest};
pub use service::{
    CoordinatorStats, DecisionCoordinator, APPROVED_NOTE, BYPASS_NOTE, REJECTED_NOTE,
};
