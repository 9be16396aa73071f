use std::{future::Future, time::Duration};

use bytes::Bytes;
use metrics::counter;
use reqwest::{
    Client, Method,
    header::{HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use tokio::time::{Instant, sleep, timeout};
use tracing::{info, warn};
use url::Url;

use super::{error::CallError, policy::RetryPolicy};

const METRIC_UPSTREAM_ATTEMPT: &str = "relaydoc_upstream_attempt_total";

/// Everything needed to dispatch (and re-dispatch) one outbound request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub operation: &'static str,
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestDescriptor {
    pub fn get(operation: &'static str, path: impl Into<String>) -> Self {
        Self {
            operation,
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(
        operation: &'static str,
        path: impl Into<String>,
        body: serde_json::Value,
    ) -> Self {
        Self {
            operation,
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// A fully-read, successful upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CallError> {
        serde_json::from_slice(&self.body)
            .map_err(|err| CallError::transport(format!("malformed response body: {err}")))
    }
}

/// Outbound client applying a per-attempt timeout and a [`RetryPolicy`].
///
/// Attempts of one logical call are strictly sequential. Every attempt emits
/// one tracing event and bumps `relaydoc_upstream_attempt_total`.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    http: Client,
    upstream: &'static str,
    base_url: Url,
    timeout: Duration,
    policy: RetryPolicy,
}

impl ResilientClient {
    pub fn new(
        http: Client,
        upstream: &'static str,
        base_url: Url,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Self {
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http,
            upstream,
            base_url,
            timeout,
            policy,
        }
    }

    /// Dispatch `request`, retrying retryable failures per the policy.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<UpstreamResponse, CallError> {
        let url = self.resolve(request)?;
        self.run(request.operation, || self.dispatch(request, url.clone()))
            .await
    }

    /// Drive `attempt` through timeout, classification and backoff.
    ///
    /// Non-retryable errors are returned unchanged. Once a retry has happened
    /// and the policy refuses another, the final error is wrapped in
    /// [`CallError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let mut index = 0u32;
        loop {
            let started_at = Instant::now();
            let outcome = match timeout(self.timeout, attempt()).await {
                Ok(result) => result,
                Err(_) => Err(CallError::Timeout {
                    after: self.timeout,
                }),
            };
            let elapsed_ms = started_at.elapsed().as_millis() as u64;

            let err = match outcome {
                Ok(value) => {
                    counter!(METRIC_UPSTREAM_ATTEMPT, "upstream" => self.upstream, "result" => "ok")
                        .increment(1);
                    info!(
                        target = "relaydoc::resilience",
                        upstream = self.upstream,
                        op = operation,
                        attempt = index + 1,
                        result = "ok",
                        elapsed_ms,
                        "Upstream call succeeded"
                    );
                    return Ok(value);
                }
                Err(err) => err,
            };

            counter!(METRIC_UPSTREAM_ATTEMPT, "upstream" => self.upstream, "result" => err.kind())
                .increment(1);

            if !self.policy.should_retry(&err, index) {
                warn!(
                    target = "relaydoc::resilience",
                    upstream = self.upstream,
                    op = operation,
                    attempt = index + 1,
                    result = err.kind(),
                    retryable = err.is_retryable(),
                    elapsed_ms,
                    error = %err,
                    "Upstream call failed"
                );
                if index == 0 || !err.is_retryable() {
                    return Err(err);
                }
                return Err(CallError::RetriesExhausted {
                    attempts: index + 1,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.backoff_delay(index);
            warn!(
                target = "relaydoc::resilience",
                upstream = self.upstream,
                op = operation,
                attempt = index + 1,
                result = err.kind(),
                elapsed_ms,
                backoff_ms = delay.as_millis() as u64,
                error = %err,
                "Upstream call failed; retrying"
            );
            sleep(delay).await;
            index += 1;
        }
    }

    fn classify(&self, err: reqwest::Error) -> CallError {
        if err.is_timeout() {
            return CallError::Timeout {
                after: self.timeout,
            };
        }
        if let Some(status) = err.status() {
            return CallError::upstream(status.as_u16(), err.to_string());
        }
        CallError::transport(err.to_string())
    }

    fn resolve(&self, request: &RequestDescriptor) -> Result<Url, CallError> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|err| CallError::transport(format!("invalid request path: {err}")))?;
        if !request.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    async fn dispatch(
        &self,
        request: &RequestDescriptor,
        url: Url,
    ) -> Result<UpstreamResponse, CallError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let value = value
                .parse::<HeaderValue>()
                .map_err(|_| CallError::transport(format!("invalid value for header `{name}`")))?;
            headers.insert(*name, value);
        }

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| self.classify(err))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| self.classify(err))?;

        if !status.is_success() {
            return Err(CallError::upstream(
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }

        Ok(UpstreamResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use httpmock::prelude::*;

    use super::*;

    fn client_with(base_url: &str, policy: RetryPolicy, timeout: Duration) -> ResilientClient {
        ResilientClient::new(
            Client::new(),
            "test",
            Url::parse(base_url).expect("valid url"),
            timeout,
            policy,
        )
    }

    fn offline_client(policy: RetryPolicy) -> ResilientClient {
        client_with("http://127.0.0.1:9/", policy, Duration::from_secs(120))
    }

    async fn scripted(
        calls: &AtomicU32,
        failures: &[CallError],
    ) -> Result<&'static str, CallError> {
        let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
        match failures.get(n) {
            Some(err) => Err(err.clone()),
            None => Ok("done"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_retryable_failures() {
        let client = offline_client(RetryPolicy::default());
        let failures = [
            CallError::upstream(500, ""),
            CallError::upstream(429, ""),
            CallError::upstream(503, ""),
        ];

        for n in 0..=failures.len() {
            let calls = AtomicU32::new(0);
            let result = client
                .run("scripted", || scripted(&calls, &failures[..n]))
                .await;
            assert_eq!(result, Ok("done"));
            assert_eq!(calls.load(Ordering::SeqCst) as usize, n + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_is_returned_after_one_call() {
        let client = offline_client(RetryPolicy::default());
        let calls = AtomicU32::new(0);
        let failures = [CallError::upstream(404, "missing")];

        let result = client.run("scripted", || scripted(&calls, &failures)).await;

        assert_eq!(result, Err(CallError::upstream(404, "missing")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_keeps_last_error() {
        let client = offline_client(RetryPolicy::default());
        let calls = AtomicU32::new(0);
        let failures = vec![CallError::upstream(502, "down"); 10];

        let err = client
            .run("scripted", || scripted(&calls, &failures))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            err,
            CallError::RetriesExhausted {
                attempts: 4,
                last: Box::new(CallError::upstream(502, "down")),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_exponential_backoff_between_attempts() {
        let client = offline_client(RetryPolicy::new(3, Duration::from_secs(1)));
        let calls = AtomicU32::new(0);
        let failures = vec![CallError::upstream(500, ""); 3];
        let started = Instant::now();

        let result = client.run("scripted", || scripted(&calls, &failures)).await;

        assert_eq!(result, Ok("done"));
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(1 + 2 + 4));
        assert!(waited < Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempts_time_out_and_are_retried() {
        let client = offline_client(RetryPolicy::new(1, Duration::from_millis(10)));
        let calls = Arc::new(AtomicU32::new(0));

        let result = client
            .run("slow", || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        sleep(Duration::from_secs(500)).await;
                    }
                    Ok::<_, CallError>(7)
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn execute_retries_server_errors_against_real_http() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(500).body("boom");
            })
            .await;
        let client = client_with(
            &server.base_url(),
            RetryPolicy::new(3, Duration::from_millis(1)),
            Duration::from_secs(5),
        );

        let err = client
            .execute(&RequestDescriptor::get("all_records", "/posts"))
            .await
            .unwrap_err();

        assert_eq!(mock.hits_async().await, 4);
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn execute_does_not_retry_client_errors() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/posts/999");
                then.status(404).body("{}");
            })
            .await;
        let client = client_with(
            &server.base_url(),
            RetryPolicy::new(3, Duration::from_millis(1)),
            Duration::from_secs(5),
        );

        let err = client
            .execute(&RequestDescriptor::get("record_by_id", "/posts/999"))
            .await
            .unwrap_err();

        assert_eq!(mock.hits_async().await, 1);
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn execute_sends_query_headers_and_json_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .query_param("beta", "yes")
                    .header("x-api-key", "secret")
                    .json_body(serde_json::json!({"prompt": "hi"}));
                then.status(200).json_body(serde_json::json!({"ok": true}));
            })
            .await;
        let client = client_with(
            &server.base_url(),
            RetryPolicy::none(),
            Duration::from_secs(5),
        );
        let request =
            RequestDescriptor::post_json("send", "/v1/messages", serde_json::json!({"prompt": "hi"}))
                .with_query("beta", "yes")
                .with_header("x-api-key", "secret");

        let response = client.execute(&request).await.expect("success");
        let body: serde_json::Value = response.json().expect("json");

        mock.assert_async().await;
        assert_eq!(body["ok"], true);
    }
}
