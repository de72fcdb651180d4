//! Context management for tree execution.
//!
//! This module provides:
//! - Parameter and environment bags attached to each stage
//! - A registry of shared components looked up by stage handlers
//! - The caller-owned experiment context tying a run together

mod bags;
mod components;
#[cfg(test)]
mod context_tests;
mod experiment;

pub use bags::{EnvironmentBag, ParameterBag, RUN_COUNT, SKIP_CONFIGURATION};
pub use components::ComponentRegistry;
pub use experiment::ExperimentContext;
