//! reqwest-backed adapter for the upstream content API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    application::repos::ContentApi,
    domain::entities::Record,
    resilience::{CallError, RequestDescriptor, ResilientClient},
};

const RECORDS_PATH: &str = "posts";

#[derive(Debug, Clone)]
pub struct HttpContentApi {
    client: ResilientClient,
}

impl HttpContentApi {
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }

    async fn get<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T, CallError> {
        self.client.execute(&request).await?.json()
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn list_records(&self) -> Result<Vec<Record>, CallError> {
        self.get(RequestDescriptor::get("list_records", RECORDS_PATH))
            .await
    }

    async fn record(&self, id: i64) -> Result<Record, CallError> {
        self.get(RequestDescriptor::get(
            "record",
            format!("{RECORDS_PATH}/{id}"),
        ))
        .await
    }

    async fn records_by_owner(&self, owner_id: i64) -> Result<Vec<Record>, CallError> {
        self.get(
            RequestDescriptor::get("records_by_owner", RECORDS_PATH)
                .with_query("userId", owner_id.to_string()),
        )
        .await
    }

    async fn resource(&self, path: &str) -> Result<Value, CallError> {
        self.get(RequestDescriptor::get("resource", path)).await
    }

    async fn resource_by_id(&self, path: &str, id: &str) -> Result<Value, CallError> {
        self.get(RequestDescriptor::get(
            "resource_by_id",
            format!("{path}/{id}"),
        ))
        .await
    }

    async fn query_resource(
        &self,
        path: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Value, CallError> {
        let request = params.iter().fold(
            RequestDescriptor::get("query_resource", path),
            |request, (name, value)| request.with_query(name.as_str(), value.as_str()),
        );
        self.get(request).await
    }
}
