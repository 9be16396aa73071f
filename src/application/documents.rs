use std::time::Instant;

use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use crate::{
    application::{error::AppError, records::RecordService},
    domain::{entities::Record, types::DocumentFormat},
    render::{DocumentRenderer, FormatConverter},
};

pub const DEFAULT_EXPORT_FORMAT: &str = "pdf";
const EXPORT_STEM: &str = "posts";

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default, rename = "userId")]
    pub user_id: Option<i64>,
    #[serde(default, rename = "postId")]
    pub post_id: Option<i64>,
}

fn default_format() -> String {
    DEFAULT_EXPORT_FORMAT.to_string()
}

/// Which records an export covers. A post id takes precedence over an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSelection {
    All,
    Owner(i64),
    Single(i64),
}

impl RecordSelection {
    pub fn from_ids(user_id: Option<i64>, post_id: Option<i64>) -> Self {
        match (post_id, user_id) {
            (Some(post_id), _) => Self::Single(post_id),
            (None, Some(user_id)) => Self::Owner(user_id),
            (None, None) => Self::All,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Owner(_) => "owner",
            Self::Single(_) => "single",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub format: DocumentFormat,
    pub bytes: Bytes,
}

impl ExportedDocument {
    pub fn file_name(&self) -> String {
        self.format.file_name(EXPORT_STEM)
    }

    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

#[derive(Clone)]
pub struct DocumentService {
    records: RecordService,
    renderer: DocumentRenderer,
    converter: FormatConverter,
}

impl DocumentService {
    pub fn new(
        records: RecordService,
        renderer: DocumentRenderer,
        converter: FormatConverter,
    ) -> Self {
        Self {
            records,
            renderer,
            converter,
        }
    }

    pub async fn export(&self, request: &ExportRequest) -> Result<ExportedDocument, AppError> {
        let started_at = Instant::now();
        let format: DocumentFormat = request.format.parse()?;
        let selection = RecordSelection::from_ids(request.user_id, request.post_id);

        let records = self.select(selection).await?;
        if records.is_empty() {
            return Err(AppError::not_found("posts"));
        }

        let markup = self.renderer.render(&records)?;
        let bytes = self.converter.convert(&markup, format).await?;

        info!(
            target = "relaydoc::application::documents",
            op = "export",
            format = format.as_str(),
            selection = selection.as_str(),
            records = records.len(),
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Document exported"
        );
        Ok(ExportedDocument { format, bytes })
    }

    async fn select(&self, selection: RecordSelection) -> Result<Vec<Record>, AppError> {
        match selection {
            RecordSelection::All => self.records.all_records().await,
            RecordSelection::Owner(owner_id) => self.records.records_by_owner(owner_id).await,
            RecordSelection::Single(id) => Ok(self.records.record_by_id(id).await?.into_iter().collect()),
        }
    }
}
