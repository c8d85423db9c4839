//! Utility functions for string formatting.

pub mod format;

pub use format::{format_optional, plural, truncate_string};
