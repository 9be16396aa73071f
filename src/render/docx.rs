//! DOCX packaging.
//!
//! Produces a minimal OOXML package whose body is a single `altChunk`
//! pointing at the HTML markup; word processors import the chunk on open.

use std::io::{Cursor, Write};

use async_trait::async_trait;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use super::converter::MarkupRenderer;
use super::error::RenderError;

const CHUNK_ID: &str = "htmlChunk";
const CHUNK_PART: &str = "word/afchunk.html";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="html" ContentType="text/html"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body><w:altChunk r:id="htmlChunk"/><w:sectPr/></w:body></w:document>"#;

#[derive(Debug, Clone, Default)]
pub struct DocxPackager;

impl DocxPackager {
    pub fn package(&self, markup: &str) -> Result<Vec<u8>, RenderError> {
        let html = ensure_document(markup);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let document_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="{CHUNK_ID}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/aFChunk" Target="afchunk.html"/></Relationships>"#
        );

        let parts: [(&str, &[u8]); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            ("word/document.xml", DOCUMENT.as_bytes()),
            ("word/_rels/document.xml.rels", document_rels.as_bytes()),
            (CHUNK_PART, html.as_bytes()),
        ];
        for (name, contents) in parts {
            zip.start_file(name, options)?;
            zip.write_all(contents)
                .map_err(|err| RenderError::Docx(err.into()))?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

#[async_trait]
impl MarkupRenderer for DocxPackager {

    async fn render(&self, markup: &str) -> Result<Vec<u8>, RenderError> {
        self.package(markup)
    }
}

/// Wrap fragments into a complete UTF-8 HTML document.
fn ensure_document(markup: &str) -> String {
    let head = markup.trim_start().to_ascii_lowercase();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        markup.to_string()
    } else {
        format!(
            "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head><body>{markup}</body></html>"
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    fn read_part(package: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(package)).expect("zip archive");
        let mut file = archive.by_name(name).expect("part present");
        let mut contents = String::new();
        file.read_to_string(&mut contents).expect("utf-8 part");
        contents
    }

    #[test]
    fn package_embeds_markup_as_alt_chunk() {
        let package = DocxPackager.package("<p>hello</p>").unwrap();

        assert!(read_part(&package, "word/document.xml").contains("<w:altChunk r:id=\"htmlChunk\"/>"));
        assert!(read_part(&package, "word/_rels/document.xml.rels").contains("Target=\"afchunk.html\""));
        assert_eq!(
            read_part(&package, CHUNK_PART),
            "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head><body><p>hello</p></body></html>"
        );
        assert!(read_part(&package, "[Content_Types].xml").contains("wordprocessingml.document.main+xml"));
    }

    #[test]
    fn complete_documents_are_embedded_verbatim() {
        let markup = "  <!DOCTYPE html><html><body>x</body></html>";
        let package = DocxPackager.package(markup).unwrap();

        assert_eq!(read_part(&package, CHUNK_PART), markup);
    }

    #[test]
    fn html_prefix_is_case_insensitive() {
        assert_eq!(ensure_document("<HTML><body/></HTML>"), "<HTML><body/></HTML>");
    }
}
