//! Observability utilities.

mod logging;

pub use logging::{init_tracing, stage_span, traversal_span, SpanTimer};
