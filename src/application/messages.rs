//! Generative-text API request and response types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u32>,
}

impl MessageResponse {
    fn texts(&self) -> impl Iterator<Item = &str> {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
    }

    pub fn first_text(&self) -> Option<&str> {
        self.texts().next()
    }

    pub fn all_text(&self) -> String {
        self.texts().collect()
    }

    pub fn has_tool_use(&self) -> bool {
        self.content.iter().any(|block| block.kind == "tool_use")
    }
}

/// Preset system prompts for text analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Sentiment,
    Summary,
    Keywords,
    Language,
    General,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        Self::Sentiment,
        Self::Summary,
        Self::Keywords,
        Self::Language,
        Self::General,
    ];

    /// Unknown names select the general analysis.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "sentiment" => Self::Sentiment,
            "summary" => Self::Summary,
            "keywords" => Self::Keywords,
            "language" => Self::Language,
            _ => Self::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sentiment => "sentiment",
            Self::Summary => "summary",
            Self::Keywords => "keywords",
            Self::Language => "language",
            Self::General => "general",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Sentiment => {
                "You are a sentiment analysis expert. Analyze the sentiment of the given text and provide a brief summary."
            }
            Self::Summary => {
                "You are a text summarization expert. Provide a concise summary of the given text."
            }
            Self::Keywords => {
                "You are a keyword extraction expert. Extract the main keywords and topics from the given text."
            }
            Self::Language => {
                "You are a language detection expert. Identify the language of the given text and provide confidence level."
            }
            Self::General => {
                "You are a text analysis expert. Analyze the given text and provide insights."
            }
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Sentiment => "Analyze the emotional tone of text",
            Self::Summary => "Create a concise summary of text",
            Self::Keywords => "Extract main keywords and topics",
            Self::Language => "Detect the language of text",
            Self::General => "General text analysis",
        }
    }
}

/// Preset system prompts for content generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Story,
    Poem,
    Essay,
    Code,
    General,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        Self::Story,
        Self::Poem,
        Self::Essay,
        Self::Code,
        Self::General,
    ];

    /// Unknown names select general content.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "story" => Self::Story,
            "poem" => Self::Poem,
            "essay" => Self::Essay,
            "code" => Self::Code,
            _ => Self::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Poem => "poem",
            Self::Essay => "essay",
            Self::Code => "code",
            Self::General => "general",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Story => "You are a creative storyteller. Write engaging and imaginative stories.",
            Self::Poem => "You are a poet. Create beautiful and meaningful poetry.",
            Self::Essay => "You are an essay writer. Create well-structured and informative essays.",
            Self::Code => {
                "You are a software developer. Write clean, efficient, and well-documented code."
            }
            Self::General => {
                "You are a creative writing assistant. Generate high-quality content."
            }
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Story => "Generate creative stories",
            Self::Poem => "Create poetry",
            Self::Essay => "Write structured essays",
            Self::Code => "Generate code snippets",
            Self::General => "General content generation",
        }
    }
}
