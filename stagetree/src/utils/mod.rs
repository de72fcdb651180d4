//! Utility functions for configuration values and filesystem paths.

mod paths;
mod values;

pub use paths::{expand_path, sentinel_path};
pub use values::{is_truthy, value_to_text};
