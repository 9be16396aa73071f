//! Infrastructure adapters and runtime bootstrap.

pub mod content_api;
pub mod error;
pub mod generative;
pub mod http;
pub mod telemetry;
