//! Adapter traits describing the upstream APIs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::application::messages::{MessageRequest, MessageResponse};
use crate::domain::entities::Record;
use crate::resilience::CallError;

/// The upstream content API. Implementations are expected to go through a
/// resilient client; a missing resource surfaces as an upstream 404.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn list_records(&self) -> Result<Vec<Record>, CallError>;

    async fn record(&self, id: i64) -> Result<Record, CallError>;

    async fn records_by_owner(&self, owner_id: i64) -> Result<Vec<Record>, CallError>;

    async fn resource(&self, path: &str) -> Result<Value, CallError>;

    async fn resource_by_id(&self, path: &str, id: &str) -> Result<Value, CallError>;

    async fn query_resource(
        &self,
        path: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Value, CallError>;
}

/// The upstream generative-text API.
#[async_trait]
pub trait GenerativeApi: Send + Sync {
    async fn send(&self, request: &MessageRequest) -> Result<MessageResponse, CallError>;
}
