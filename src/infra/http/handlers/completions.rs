use std::collections::BTreeMap;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    application::{
        completions::DEFAULT_CREATIVITY,
        error::AppError,
        messages::{AnalysisKind, ContentKind, Message, MessageRequest, MessageResponse},
    },
    infra::http::{
        AppState,
        envelope::{ApiError, ApiResponse},
    },
};

const SERVICE_NAME: &str = "generative-api";

#[derive(Debug, Deserialize)]
pub struct CompleteBody {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct CompleteReply {
    pub response: String,
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeReply {
    pub analysis: String,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub original_text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub creativity: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct GenerateReply {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub prompt: String,
    pub creativity: f32,
}

#[derive(Debug, Deserialize)]
pub struct ConversationBody {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub system: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReply {
    pub response: String,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthReply {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct KindCatalog {
    pub types: Vec<&'static str>,
    pub description: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct CreativityRange {
    pub range: &'static str,
    pub default: f32,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ContentCatalog {
    #[serde(flatten)]
    pub kinds: KindCatalog,
    pub creativity: CreativityRange,
}

fn required<'a>(value: &'a str, message: &'static str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::validation(message))
    } else {
        Ok(value)
    }
}

pub async fn complete(
    State(state): State<AppState>,
    Json(body): Json<CompleteBody>,
) -> Result<ApiResponse<CompleteReply>, ApiError> {
    let prompt = required(&body.prompt, "Prompt is required")?;
    let response = if body.cached && body.system.is_none() {
        state.completions.complete_cached(prompt).await?
    } else {
        state
            .completions
            .complete(prompt, body.system.as_deref())
            .await?
    };
    Ok(ApiResponse::success(CompleteReply {
        response,
        prompt: body.prompt,
    }))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<ApiResponse<MessageResponse>, ApiError> {
    if request.messages.is_empty() {
        return Err(AppError::validation("Messages are required").into());
    }
    Ok(ApiResponse::success(state.completions.send(&request).await?))
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeBody>,
) -> Result<ApiResponse<AnalyzeReply>, ApiError> {
    let text = required(&body.text, "Text is required")?;
    let kind = AnalysisKind::parse(body.kind.as_deref().unwrap_or_default());
    let analysis = state.completions.analyze(text, kind).await?;
    Ok(ApiResponse::success(AnalyzeReply {
        analysis,
        kind,
        original_text: body.text,
    }))
}

pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<ApiResponse<GenerateReply>, ApiError> {
    let prompt = required(&body.prompt, "Prompt is required")?;
    let kind = ContentKind::parse(body.kind.as_deref().unwrap_or_default());
    let content = state
        .completions
        .generate(prompt, kind, body.creativity)
        .await?;
    Ok(ApiResponse::success(GenerateReply {
        content,
        kind,
        prompt: body.prompt,
        creativity: body.creativity.unwrap_or(DEFAULT_CREATIVITY),
    }))
}

pub async fn conversation(
    State(state): State<AppState>,
    Json(body): Json<ConversationBody>,
) -> Result<ApiResponse<ConversationReply>, ApiError> {
    let message_count = body.messages.len();
    let response = state
        .completions
        .conversation(body.messages, body.system.as_deref())
        .await?;
    Ok(ApiResponse::success(ConversationReply {
        response,
        message_count,
    }))
}

pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthReply> {
    let healthy = state.completions.health_check().await;
    let timestamp = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    ApiResponse::success(HealthReply {
        status: if healthy { "healthy" } else { "unhealthy" },
        service: SERVICE_NAME,
        timestamp,
    })
}

pub async fn analysis_types() -> ApiResponse<KindCatalog> {
    ApiResponse::success(KindCatalog {
        types: AnalysisKind::ALL.iter().map(|kind| kind.as_str()).collect(),
        description: AnalysisKind::ALL
            .iter()
            .map(|kind| (kind.as_str(), kind.description()))
            .collect(),
    })
}

pub async fn content_types() -> ApiResponse<ContentCatalog> {
    ApiResponse::success(ContentCatalog {
        kinds: KindCatalog {
            types: ContentKind::ALL.iter().map(|kind| kind.as_str()).collect(),
            description: ContentKind::ALL
                .iter()
                .map(|kind| (kind.as_str(), kind.description()))
                .collect(),
        },
        creativity: CreativityRange {
            range: "0.0 to 1.0",
            default: DEFAULT_CREATIVITY,
            description: "Higher values = more creative output",
        },
    })
}
