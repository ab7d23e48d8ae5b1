//! Command implementations

pub mod completions;
pub mod list;
