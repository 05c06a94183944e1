//! Document structure and metadata.

use super::{Color, Font, Package};
use serde::Serialize;
use std::collections::HashMap;

/// A complete document parsed from RTF.
///
/// Built-in destination handlers populate the meta fields and the font
/// and color tables; the HTML handlers accumulate the `html` rendering
/// and decoded Package objects. Collaborator handlers may attach
/// additional string keys under `properties`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    /// RTF version from the `\rtfN` control word
    pub version: Option<i32>,
    /// Character set declaration (`ansi`, `mac`, `pc`, `pca`)
    pub charset: Option<String>,
    /// Code page from `\ansicpg`
    pub codepage: Option<i32>,
    /// Default font index from `\deff`
    pub default_font_index: Option<i32>,
    /// Font table, addressed by RTF font index
    pub fonts: Vec<Font>,
    /// Color table; entry 0 is the implicit default
    pub colors: Vec<Color>,
    /// HTML rendering of the narrative text
    pub html: String,
    /// Embedded OLE Package objects decoded from `\objdata`
    pub packages: Vec<Package>,
    /// Collaborator-defined string properties
    pub properties: HashMap<String, String>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the font declared at the given RTF index, if any.
    pub fn font(&self, index: usize) -> Option<&Font> {
        self.fonts.get(index)
    }

    /// Returns the font slot at the given index, growing the table with
    /// empty records as needed.
    pub fn font_mut(&mut self, index: usize) -> &mut Font {
        if index >= self.fonts.len() {
            self.fonts.resize_with(index + 1, Font::default);
        }
        &mut self.fonts[index]
    }

    /// Returns the color at the given table index, if any.
    pub fn color(&self, index: usize) -> Option<&Color> {
        self.colors.get(index)
    }

    /// Returns the total number of files carried by decoded packages.
    pub fn package_file_count(&self) -> usize {
        self.packages.iter().map(|p| p.items.len()).sum()
    }

    /// Returns the narrative text with HTML markup stripped.
    ///
    /// This is a convenience for when you only need the text content
    /// without formatting.
    pub fn plain_text(&self) -> String {
        strip_html(&self.html)
    }

    /// Returns structured content as JSON with full metadata.
    ///
    /// The output includes the meta fields, font and color tables, the
    /// HTML rendering, and decoded packages, and can be parsed by any
    /// JSON library.
    pub fn raw_content(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Strips HTML tags and unescapes the entities the renderer emits.
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                for c in chars.by_ref() {
                    if c == '>' {
                        break;
                    }
                }
            }
            '&' => {
                let mut entity = String::new();
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                    entity.push(c);
                    if entity.len() > 8 {
                        break;
                    }
                }
                match entity.as_str() {
                    "amp" => result.push('&'),
                    "lt" => result.push('<'),
                    "gt" => result.push('>'),
                    "quot" => result.push('"'),
                    "#39" => result.push('\''),
                    "nbsp" => result.push(' '),
                    "bull" => result.push('\u{2022}'),
                    "ndash" => result.push('\u{2013}'),
                    "mdash" => result.push('\u{2014}'),
                    "lsquo" => result.push('\u{2018}'),
                    "rsquo" => result.push('\u{2019}'),
                    "ldquo" => result.push('\u{201c}'),
                    "rdquo" => result.push('\u{201d}'),
                    _ => {
                        // Unknown entity, keep it verbatim
                        result.push('&');
                        result.push_str(&entity);
                        result.push(';');
                    }
                }
            }
            _ => result.push(ch),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_empty() {
        let doc = Document::new();
        assert!(doc.version.is_none());
        assert!(doc.fonts.is_empty());
        assert!(doc.colors.is_empty());
        assert!(doc.html.is_empty());
        assert_eq!(doc.package_file_count(), 0);
    }

    #[test]
    fn test_font_mut_grows_table() {
        let mut doc = Document::new();
        doc.font_mut(2).name = Some("Arial".into());

        assert_eq!(doc.fonts.len(), 3);
        assert!(doc.font(0).is_some_and(Font::is_empty));
        assert_eq!(doc.font(2).and_then(|f| f.name.as_deref()), Some("Arial"));
    }

    #[test]
    fn test_color_lookup() {
        let mut doc = Document::new();
        doc.colors.push(Color::default());
        doc.colors.push(Color::new(255, 0, 0));

        // Index 0 is the implicit default entry.
        assert_eq!(doc.color(0), Some(&Color::default()));
        assert_eq!(doc.color(1), Some(&Color::new(255, 0, 0)));
        assert!(doc.color(2).is_none());
    }

    #[test]
    fn test_plain_text_strips_markup() {
        let mut doc = Document::new();
        doc.html = "<B>bold</B> &amp; plain<BR>\nnext".into();

        assert_eq!(doc.plain_text(), "bold & plain\nnext");
    }

    #[test]
    fn test_raw_content_is_json() {
        let mut doc = Document::new();
        doc.version = Some(1);
        let json = doc.raw_content();

        assert!(json.contains("\"version\": 1"));
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
    }
}
