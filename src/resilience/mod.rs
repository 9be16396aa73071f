//! Outbound-call resilience: error classification, retry policy and the
//! timeout-bounded client shared by every upstream.

mod client;
mod error;
mod policy;

pub use client::{RequestDescriptor, ResilientClient, UpstreamResponse};
pub use error::CallError;
pub use policy::RetryPolicy;
