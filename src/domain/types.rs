//! Shared domain enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target format for a document export.
///
/// Parsed once at the request boundary; unknown values never reach the
/// conversion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Rtf,
}

impl DocumentFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Rtf => "rtf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Rtf => "application/rtf",
        }
    }

    /// Attachment filename used for exported documents.
    pub fn file_name(self, stem: &str) -> String {
        format!("{stem}.{}", self.as_str())
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported format: {0}")]
pub struct UnsupportedFormat(pub String);

impl FromStr for DocumentFormat {
    type Err = UnsupportedFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "rtf" => Ok(Self::Rtf),
            _ => Err(UnsupportedFormat(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("PDF".parse::<DocumentFormat>(), Ok(DocumentFormat::Pdf));
        assert_eq!(" Docx ".parse::<DocumentFormat>(), Ok(DocumentFormat::Docx));
        assert_eq!("rtf".parse::<DocumentFormat>(), Ok(DocumentFormat::Rtf));
    }

    #[test]
    fn rejects_unknown_formats() {
        let err = "odt".parse::<DocumentFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported format: odt");
    }

    #[test]
    fn file_names_follow_extension() {
        assert_eq!(DocumentFormat::Docx.file_name("posts"), "posts.docx");
        assert_eq!(DocumentFormat::Rtf.media_type(), "application/rtf");
    }
}
