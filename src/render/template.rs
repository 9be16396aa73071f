use askama::Template;

use crate::domain::entities::Record;

use super::error::RenderError;

const DEFAULT_TITLE: &str = "Posts";

#[derive(Template)]
#[template(path = "records.html")]
struct RecordsTemplate<'a> {
    title: &'a str,
    records: &'a [Record],
}

/// Renders records into the intermediate HTML markup, one section per record
/// in input order.
#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    title: String,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl DocumentRenderer {
    pub fn render(&self, records: &[Record]) -> Result<String, RenderError> {
        RecordsTemplate {
            title: &self.title,
            records,
        }
        .render()
        .map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_section_per_record_in_order() {
        let records = vec![
            Record::new(1, 1, "first", "alpha"),
            Record::new(2, 1, "second", "beta"),
        ];

        let html = DocumentRenderer::default().render(&records).unwrap();

        assert_eq!(html.matches("<div class=\"post\">").count(), 2);
        let first = html.find("<h2>first</h2>").unwrap();
        let second = html.find("<h2>second</h2>").unwrap();
        assert!(first < second);
        assert!(html.contains("<p>alpha</p>"));
    }

    #[test]
    fn escapes_record_text() {
        let records = vec![Record::new(1, 1, "<script>", "a & b")];

        let html = DocumentRenderer::default().render(&records).unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }
}
