//! Route handlers grouped by surface.

pub mod cache;
pub mod completions;
pub mod documents;
pub mod records;
