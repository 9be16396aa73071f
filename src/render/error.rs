use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
    #[error("failed to stage pdf conversion: {0}")]
    Io(#[source] io::Error),
    #[error("pdf command unavailable: {0}")]
    PdfUnavailable(#[source] io::Error),
    #[error("pdf command failed (exit {exit_code:?}): {stderr}")]
    Pdf {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("docx packaging failed: {0}")]
    Docx(#[from] zip::result::ZipError),
}
