//! Document rendering: records to intermediate markup, markup to PDF, DOCX
//! or RTF.

mod converter;
mod docx;
mod error;
mod pdf;
mod rtf;
mod template;

pub use converter::{FormatConverter, MarkupRenderer};
pub use docx::DocxPackager;
pub use error::RenderError;
pub use pdf::PdfCommandRenderer;
pub use rtf::{DEFAULT_FONT, RtfTranspiler};
pub use template::DocumentRenderer;
