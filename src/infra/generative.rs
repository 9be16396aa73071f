//! reqwest-backed adapter for the generative-text messages API.

use async_trait::async_trait;

use crate::{
    application::{
        messages::{MessageRequest, MessageResponse},
        repos::GenerativeApi,
    },
    resilience::{CallError, RequestDescriptor, ResilientClient},
};

const MESSAGES_PATH: &str = "v1/messages";
const API_KEY_HEADER: &str = "x-api-key";
const API_VERSION_HEADER: &str = "anthropic-version";

#[derive(Clone)]
pub struct HttpGenerativeApi {
    client: ResilientClient,
    api_key: String,
    api_version: String,
}

impl std::fmt::Debug for HttpGenerativeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGenerativeApi")
            .field("client", &self.client)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl HttpGenerativeApi {
    pub fn new(
        client: ResilientClient,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            api_version: api_version.into(),
        }
    }
}

#[async_trait]
impl GenerativeApi for HttpGenerativeApi {
    async fn send(&self, request: &MessageRequest) -> Result<MessageResponse, CallError> {
        let body = serde_json::to_value(request)
            .map_err(|err| CallError::transport(format!("unserializable request: {err}")))?;
        let descriptor = RequestDescriptor::post_json("send_message", MESSAGES_PATH, body)
            .with_header(API_KEY_HEADER, self.api_key.as_str())
            .with_header(API_VERSION_HEADER, self.api_version.as_str());
        self.client.execute(&descriptor).await?.json()
    }
}
