//! Structured logging for tree traversal.
//!
//! The executor only makes `tracing` calls; installing a subscriber is up to
//! the embedding application. [`init_tracing`] is a convenience for binaries
//! and scripts that just want formatted output filtered by `RUST_LOG`.

use crate::pipeline::TaskNode;
use std::time::Instant;
use tracing::Span;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Installs a global formatted subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `default_directive` (e.g. `"info"` or `"stagetree=debug"`).
///
/// # Errors
///
/// Fails if the directive cannot be parsed or a global subscriber is
/// already installed.
pub fn init_tracing(default_directive: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

/// Span covering one whole traversal of an experiment context.
#[must_use]
pub fn traversal_span(run_id: Uuid, paths: usize) -> Span {
    tracing::info_span!("traverse_all", run_id = %run_id, paths)
}

/// Span covering one stage visit.
#[must_use]
pub fn stage_span(node: &TaskNode) -> Span {
    tracing::info_span!("stage", name = %node.name(), level = node.level())
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}
