use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::{
    application::{
        error::AppError,
        messages::{AnalysisKind, ContentKind, Message, MessageRequest, MessageResponse},
        repos::GenerativeApi,
    },
    cache::{CacheAsideFetcher, CacheKey, Region},
    infra::error::InfraError,
};

pub const GENERATION_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_CREATIVITY: f32 = 0.9;
const HEALTH_PROMPT: &str = "Hello";

/// Model parameters applied when a caller does not choose them.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionDefaults {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl From<&crate::config::GenerativeSettings> for CompletionDefaults {
    fn from(settings: &crate::config::GenerativeSettings) -> Self {
        Self {
            model: settings.default_model.clone(),
            max_tokens: settings.default_max_tokens,
            temperature: settings.default_temperature,
        }
    }
}

/// Generative-text operations. Without an API adapter (no key configured)
/// every call fails with a configuration error.
#[derive(Clone)]
pub struct CompletionService {
    api: Option<Arc<dyn GenerativeApi>>,
    fetcher: CacheAsideFetcher,
    defaults: CompletionDefaults,
}

impl CompletionService {
    pub fn new(
        api: Option<Arc<dyn GenerativeApi>>,
        fetcher: CacheAsideFetcher,
        defaults: CompletionDefaults,
    ) -> Self {
        Self {
            api,
            fetcher,
            defaults,
        }
    }

    pub async fn send(&self, request: &MessageRequest) -> Result<MessageResponse, AppError> {
        let api = self.api.as_ref().ok_or_else(|| {
            AppError::from(InfraError::configuration(
                "generative.api_key is not configured",
            ))
        })?;
        Ok(api.send(request).await?)
    }

    pub async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, AppError> {
        let request = self.request(vec![Message::user(prompt)], system);
        self.first_text(&request).await
    }

    /// Same as [`complete`](Self::complete) without a system prompt, cached by
    /// the SHA-256 digest of the prompt.
    pub async fn complete_cached(&self, prompt: &str) -> Result<String, AppError> {
        let key = CacheKey::new("complete_cached").param(prompt_digest(prompt));
        self.fetcher
            .fetch(Region::Completions, &key, || self.complete(prompt, None))
            .await
    }

    pub async fn conversation(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
    ) -> Result<String, AppError> {
        if messages.is_empty() {
            return Err(AppError::validation("Messages are required"));
        }
        let request = self.request(messages, system);
        self.first_text(&request).await
    }

    pub async fn analyze(&self, text: &str, kind: AnalysisKind) -> Result<String, AppError> {
        self.complete(text, Some(kind.system_prompt())).await
    }

    pub async fn generate(
        &self,
        prompt: &str,
        kind: ContentKind,
        creativity: Option<f32>,
    ) -> Result<String, AppError> {
        let temperature = creativity.unwrap_or(DEFAULT_CREATIVITY);
        if !(0.0..=1.0).contains(&temperature) {
            return Err(AppError::validation("creativity must be between 0.0 and 1.0"));
        }
        let request = MessageRequest {
            model: self.defaults.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: GENERATION_MAX_TOKENS,
            system: Some(kind.system_prompt().to_string()),
            temperature: Some(temperature),
        };
        self.first_text(&request).await
    }

    /// Never fails: any error is reported as unhealthy.
    pub async fn health_check(&self) -> bool {
        let healthy = match self.complete(HEALTH_PROMPT, None).await {
            Ok(text) => !text.trim().is_empty(),
            Err(err) => {
                warn!(
                    target = "relaydoc::application::completions",
                    op = "health_check",
                    result = "error",
                    error = %err,
                    "Generative API health check failed"
                );
                false
            }
        };
        info!(
            target = "relaydoc::application::completions",
            op = "health_check",
            result = if healthy { "healthy" } else { "unhealthy" },
            "Generative API health check"
        );
        healthy
    }

    fn request(&self, messages: Vec<Message>, system: Option<&str>) -> MessageRequest {
        MessageRequest {
            model: self.defaults.model.clone(),
            messages,
            max_tokens: self.defaults.max_tokens,
            system: system.map(str::to_string),
            temperature: Some(self.defaults.temperature),
        }
    }

    async fn first_text(&self, request: &MessageRequest) -> Result<String, AppError> {
        let response = self.send(request).await?;
        Ok(response.first_text().unwrap_or_default().to_string())
    }
}

fn prompt_digest(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::{CacheConfig, CacheTierSelector, RedisConnector};
    use crate::resilience::CallError;

    #[derive(Default)]
    struct RecordingApi {
        requests: Mutex<Vec<MessageRequest>>,
        failure: Option<CallError>,
    }

    impl RecordingApi {
        fn requests(&self) -> Vec<MessageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeApi for RecordingApi {
        async fn send(&self, request: &MessageRequest) -> Result<MessageResponse, CallError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(err) = &self.failure {
                return Err(err.clone());
            }
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(serde_json::from_value(serde_json::json!({
                "id": "msg",
                "content": [{"type": "text", "text": format!("echo: {last}")}]
            }))
            .unwrap())
        }
    }

    fn defaults() -> CompletionDefaults {
        CompletionDefaults {
            model: "test-model".into(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    fn service(api: Option<Arc<RecordingApi>>) -> CompletionService {
        let selector = CacheTierSelector::new(
            CacheConfig::memory(),
            Arc::new(RedisConnector::new("redis://127.0.0.1:1")),
        );
        let fetcher = CacheAsideFetcher::new(Arc::new(selector), None);
        CompletionService::new(
            api.map(|api| api as Arc<dyn GenerativeApi>),
            fetcher,
            defaults(),
        )
    }

    #[tokio::test]
    async fn complete_uses_defaults() {
        let api = Arc::new(RecordingApi::default());
        let service = service(Some(api.clone()));

        let text = service.complete("hi", Some("be brief")).await.unwrap();

        assert_eq!(text, "echo: hi");
        let request = &api.requests()[0];
        assert_eq!(request.model, "test-model");
        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.system.as_deref(), Some("be brief"));
    }

    #[tokio::test]
    async fn complete_cached_calls_upstream_once_per_prompt() {
        let api = Arc::new(RecordingApi::default());
        let service = service(Some(api.clone()));

        assert_eq!(service.complete_cached("same").await.unwrap(), "echo: same");
        assert_eq!(service.complete_cached("same").await.unwrap(), "echo: same");
        assert_eq!(service.complete_cached("other").await.unwrap(), "echo: other");

        assert_eq!(api.requests().len(), 2);
    }

    #[tokio::test]
    async fn generate_uses_creative_settings() {
        let api = Arc::new(RecordingApi::default());
        let service = service(Some(api.clone()));

        service.generate("a tale", ContentKind::Story, None).await.unwrap();
        service.generate("a haiku", ContentKind::Poem, Some(0.2)).await.unwrap();

        let requests = api.requests();
        assert_eq!(requests[0].max_tokens, GENERATION_MAX_TOKENS);
        assert_eq!(requests[0].temperature, Some(DEFAULT_CREATIVITY));
        assert_eq!(
            requests[0].system.as_deref(),
            Some(ContentKind::Story.system_prompt())
        );
        assert_eq!(requests[1].temperature, Some(0.2));
    }

    #[tokio::test]
    async fn analyze_selects_system_prompt() {
        let api = Arc::new(RecordingApi::default());
        let service = service(Some(api.clone()));

        service.analyze("great day", AnalysisKind::Sentiment).await.unwrap();

        assert_eq!(
            api.requests()[0].system.as_deref(),
            Some(AnalysisKind::Sentiment.system_prompt())
        );
    }

    #[tokio::test]
    async fn conversation_requires_messages() {
        let api = Arc::new(RecordingApi::default());
        let service = service(Some(api.clone()));

        assert!(service.conversation(Vec::new(), None).await.is_err());
        let text = service
            .conversation(
                vec![Message::user("hi"), Message::assistant("hello"), Message::user("bye")],
                None,
            )
            .await
            .unwrap();

        assert_eq!(text, "echo: bye");
        assert_eq!(api.requests()[0].messages.len(), 3);
    }

    #[tokio::test]
    async fn health_check_reports_failures_as_unhealthy() {
        let failing = Arc::new(RecordingApi {
            failure: Some(CallError::upstream(500, "")),
            ..RecordingApi::default()
        });

        assert!(service(Some(Arc::new(RecordingApi::default()))).health_check().await);
        assert!(!service(Some(failing)).health_check().await);
        assert!(!service(None).health_check().await);
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let err = service(None).complete("hi", None).await.unwrap_err();

        assert!(matches!(err, AppError::Infra(InfraError::Configuration { .. })));
    }

    #[test]
    fn prompt_digest_is_hex_sha256() {
        assert_eq!(
            prompt_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
