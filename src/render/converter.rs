use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::domain::types::DocumentFormat;

use super::error::RenderError;
use super::rtf::RtfTranspiler;

/// A collaborator turning intermediate markup into a binary document.
#[async_trait]
pub trait MarkupRenderer: Send + Sync {
    async fn render(&self, markup: &str) -> Result<Vec<u8>, RenderError>;
}

/// Dispatches markup to the converter for the requested format.
#[derive(Clone)]
pub struct FormatConverter {
    pdf: Arc<dyn MarkupRenderer>,
    docx: Arc<dyn MarkupRenderer>,
    rtf: RtfTranspiler,
}

impl FormatConverter {
    pub fn new(
        pdf: Arc<dyn MarkupRenderer>,
        docx: Arc<dyn MarkupRenderer>,
        rtf: RtfTranspiler,
    ) -> Self {
        Self { pdf, docx, rtf }
    }

    pub async fn convert(&self, markup: &str, format: DocumentFormat) -> Result<Bytes, RenderError> {
        let started_at = Instant::now();
        let bytes = match format {
            DocumentFormat::Pdf => self.pdf.render(markup).await?,
            DocumentFormat::Docx => self.docx.render(markup).await?,
            DocumentFormat::Rtf => self.rtf.transpile(markup).into_bytes(),
        };
        info!(
            target = "relaydoc::render",
            op = "convert",
            format = format.as_str(),
            result = "ok",
            markup_bytes = markup.len(),
            output_bytes = bytes.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Markup converted"
        );
        Ok(Bytes::from(bytes))
    }
}
