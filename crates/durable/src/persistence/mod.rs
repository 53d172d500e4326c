//! Persistence layer for coordinator state
//!
//! This module provides:
//! - [`DecisionStore`] trait for decision and history persistence
//! - [`JsonFileDecisionStore`] writing two JSON files per data directory
//! - [`InMemoryDecisionStore`] for testing

mod file;
mod memory;
mod store;

pub use file::JsonFileDecisionStore;
pub use memory::InMemoryDecisionStore;
pub use store::{DecisionSnapshot, DecisionStore, StoreError};
