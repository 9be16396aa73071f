use std::{collections::BTreeMap, sync::Arc};

use serde_json::Value;

use crate::{
    application::{error::AppError, repos::ContentApi},
    cache::{CacheAsideFetcher, CacheKey, Region},
    domain::entities::Record,
    resilience::CallError,
};

/// Content-API reads served cache-aside.
#[derive(Clone)]
pub struct RecordService {
    api: Arc<dyn ContentApi>,
    fetcher: CacheAsideFetcher,
}

impl RecordService {
    pub fn new(api: Arc<dyn ContentApi>, fetcher: CacheAsideFetcher) -> Self {
        Self { api, fetcher }
    }

    pub fn fetcher(&self) -> &CacheAsideFetcher {
        &self.fetcher
    }

    pub async fn all_records(&self) -> Result<Vec<Record>, AppError> {
        let key = CacheKey::new("all_records");
        let records = self
            .fetcher
            .fetch(Region::Records, &key, || self.api.list_records())
            .await?;
        Ok(records)
    }

    /// `Ok(None)` when the upstream has no such record; misses are not cached.
    pub async fn record_by_id(&self, id: i64) -> Result<Option<Record>, AppError> {
        let key = CacheKey::new("record_by_id").param(id);
        match self
            .fetcher
            .fetch(Region::RecordsById, &key, || self.api.record(id))
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn records_by_owner(&self, owner_id: i64) -> Result<Vec<Record>, AppError> {
        let key = CacheKey::new("records_by_owner").param(owner_id);
        let records = self
            .fetcher
            .fetch(Region::RecordsByOwner, &key, || {
                self.api.records_by_owner(owner_id)
            })
            .await?;
        Ok(records)
    }

    pub async fn fetch_resource(&self, path: &str) -> Result<Value, AppError> {
        let path = validate_segment("path", path)?;
        let key = CacheKey::new("fetch_resource").param(path);
        self.generic(&key, || self.api.resource(path)).await
    }

    pub async fn fetch_resource_by_id(&self, path: &str, id: &str) -> Result<Value, AppError> {
        let path = validate_segment("path", path)?;
        let id = validate_segment("id", id)?;
        let key = CacheKey::new("fetch_resource_by_id").param(path).param(id);
        self.generic(&key, || self.api.resource_by_id(path, id))
            .await
    }

    /// Parameters are keyed in name order, so permutations share one entry.
    pub async fn query_resource(
        &self,
        path: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Value, AppError> {
        let path = validate_segment("path", path)?;
        let key = params
            .iter()
            .fold(CacheKey::new("query_resource").param(path), |key, (name, value)| {
                key.param(name).param(value)
            });
        self.generic(&key, || self.api.query_resource(path, params))
            .await
    }

    async fn generic<F, Fut>(&self, key: &CacheKey, loader: F) -> Result<Value, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Value, CallError>>,
    {
        match self.fetcher.fetch(Region::Generic, key, loader).await {
            Ok(value) => Ok(value),
            Err(err) if err.is_not_found() => Err(AppError::not_found("resource")),
            Err(err) => Err(err.into()),
        }
    }
}

fn validate_segment<'a>(name: &'static str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(value)
    } else {
        Err(AppError::validation(format!(
            "{name} must be a non-empty alphanumeric segment"
        )))
    }
}
