//! Application services: cached record reads, generative completions and
//! document export.

pub mod completions;
pub mod documents;
pub mod error;
pub mod messages;
pub mod records;
pub mod repos;
