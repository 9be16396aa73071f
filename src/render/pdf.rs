use std::{
    io::{ErrorKind, Write},
    path::PathBuf,
    process::Stdio,
    time::Instant,
};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{info, warn};

use super::converter::MarkupRenderer;
use super::error::RenderError;

/// Renders markup to PDF through an external HTML-to-PDF command invoked as
/// `<command> <input.html> <output.pdf>`.
#[derive(Debug, Clone)]
pub struct PdfCommandRenderer {
    command: PathBuf,
}

impl PdfCommandRenderer {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub async fn render_pdf(&self, markup: &str) -> Result<Vec<u8>, RenderError> {
        let started_at = Instant::now();

        let mut input_file = tempfile::Builder::new()
            .suffix(".html")
            .tempfile()
            .map_err(RenderError::Io)?;
        input_file
            .write_all(markup.as_bytes())
            .map_err(RenderError::Io)?;
        input_file.flush().map_err(RenderError::Io)?;

        let output_file: NamedTempFile = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .map_err(RenderError::Io)?;

        let output = Command::new(&self.command)
            .arg(input_file.path())
            .arg(output_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| {
                warn!(
                    target = "relaydoc::render::pdf",
                    op = "pdf::render",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    error_code = "spawn_cli",
                    command = %self.command.display(),
                    error = %err,
                    "Failed to spawn PDF command"
                );
                if err.kind() == ErrorKind::NotFound {
                    RenderError::PdfUnavailable(err)
                } else {
                    RenderError::Io(err)
                }
            })?;

        if !output.status.success() {
            let exit_code = output.status.code();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!(
                target = "relaydoc::render::pdf",
                op = "pdf::render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                error_code = "pdf_cli",
                stderr = %stderr,
                "PDF command failed"
            );
            return Err(RenderError::Pdf { exit_code, stderr });
        }

        let pdf = tokio::fs::read(output_file.path())
            .await
            .map_err(RenderError::Io)?;
        if pdf.is_empty() {
            return Err(RenderError::Pdf {
                exit_code: output.status.code(),
                stderr: "command produced an empty document".to_string(),
            });
        }

        info!(
            target = "relaydoc::render::pdf",
            op = "pdf::render",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            pdf_bytes = pdf.len(),
            "PDF rendered via command"
        );

        Ok(pdf)
    }
}

#[async_trait]
impl MarkupRenderer for PdfCommandRenderer {

    async fn render(&self, markup: &str) -> Result<Vec<u8>, RenderError> {
        self.render_pdf(markup).await
    }
}
