//! HTML to RTF transpiler.
//!
//! Walks the parsed markup depth-first over element children of `<body>`,
//! emitting a small RTF dialect. Conversion is total: unknown elements fall
//! back to their own text and recurse, so any markup yields a document.

use scraper::{ElementRef, Html, Node};

const PAR: &str = "\\par\n";
const BOLD_ON: &str = "\\b ";
const BOLD_OFF: &str = "\\b0 ";
const ITALIC_ON: &str = "\\i ";
const ITALIC_OFF: &str = "\\i0 ";
const UNDERLINE_ON: &str = "\\ul ";
const UNDERLINE_OFF: &str = "\\ulnone ";
const BULLET: &str = "\\bullet ";

pub const DEFAULT_FONT: &str = "Arial";

#[derive(Debug, Clone)]
pub struct RtfTranspiler {
    font: String,
}

impl Default for RtfTranspiler {
    fn default() -> Self {
        Self::new(DEFAULT_FONT)
    }
}

impl RtfTranspiler {
    pub fn new(font: impl Into<String>) -> Self {
        Self { font: font.into() }
    }

    pub fn transpile(&self, markup: &str) -> String {
        let document = Html::parse_document(markup);
        let mut out = RtfDocument::new(markup.len());
        out.preamble(&self.font);

        let body = document
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name() == "body");
        if let Some(body) = body {
            out.children(body);
        }

        out.finish()
    }
}

/// Output buffer for one conversion.
struct RtfDocument {
    buf: String,
}

impl RtfDocument {
    fn new(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity + 64),
        }
    }

    fn preamble(&mut self, font: &str) {
        self.buf.push_str("{\\rtf1\\ansi\\deff0 {\\fonttbl {\\f0 ");
        self.text(font);
        self.buf.push_str(";}}\n");
    }

    fn finish(mut self) -> String {
        self.buf.push('}');
        self.buf
    }

    fn raw(&mut self, control: &str) {
        self.buf.push_str(control);
    }

    fn text(&mut self, text: &str) {
        for ch in text.chars() {
            match ch {
                '\\' => self.buf.push_str("\\\\"),
                '{' => self.buf.push_str("\\{"),
                '}' => self.buf.push_str("\\}"),
                '\n' => self.buf.push_str(PAR),
                '\r' => {}
                other if other.is_ascii() => self.buf.push(other),
                other => {
                    // `\uN` takes a signed 16-bit value; astral characters become surrogate pairs.
                    let mut units = [0u16; 2];
                    for unit in other.encode_utf16(&mut units) {
                        self.buf.push_str(&format!("\\u{}?", *unit as i16));
                    }
                }
            }
        }
    }

    fn wrapped(&mut self, on: &str, element: ElementRef<'_>, off: &str) {
        self.raw(on);
        self.text(&flattened(element));
        self.raw(off);
    }

    fn children(&mut self, parent: ElementRef<'_>) {
        for child in parent.children().filter_map(ElementRef::wrap) {
            self.element(child);
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        match element.value().name() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.raw(PAR);
                self.wrapped(BOLD_ON, element, BOLD_OFF);
                self.raw(PAR);
            }
            "p" => {
                self.raw(PAR);
                self.text(&flattened(element));
                self.raw(PAR);
            }
            "br" => self.raw(PAR),
            "b" | "strong" => self.wrapped(BOLD_ON, element, BOLD_OFF),
            "i" | "em" => self.wrapped(ITALIC_ON, element, ITALIC_OFF),
            "u" => self.wrapped(UNDERLINE_ON, element, UNDERLINE_OFF),
            "ul" => self.list(element, |_| BULLET.to_string()),
            "ol" => self.list(element, |n| format!("{n}. ")),
            "li" => {}
            _ => {
                let own = own_text(element);
                let own = own.trim();
                if !own.is_empty() {
                    self.text(own);
                    self.raw(" ");
                }
                self.children(element);
            }
        }
    }

    fn list(&mut self, list: ElementRef<'_>, marker: impl Fn(usize) -> String) {
        let items = list
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "li");
        for (index, item) in items.enumerate() {
            self.raw(PAR);
            self.raw(&marker(index + 1));
            self.text(&flattened(item));
        }
        self.raw(PAR);
    }
}

fn flattened(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Text of the element's direct text children only.
fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect()
}
