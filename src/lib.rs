//! # unrtf
//!
//! A Rust library for reading Rich Text Format (RTF) documents into a
//! structured model and an HTML rendering, extracting embedded OLE
//! "Package" objects as file outputs.
//!
//! ## Architecture
//!
//! Three layers do the work:
//!
//! - A **tokenizer** scans RTF source left-to-right into fixed-shape
//!   tokens ([`rtf::next_token`]).
//! - A **destination-dispatch parser** tracks the brace stack, addresses
//!   each open destination by its stack path, and routes tokens to
//!   registered handlers ([`rtf::Parser`]).
//! - Handlers populate the [`model::Document`]: built-ins fill the meta
//!   fields and the font/color tables, and the HTML handler set renders
//!   narrative text and decodes `\objdata` Package payloads
//!   ([`render::register_html_handlers`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> unrtf::Result<()> {
//!     // Parse a document
//!     let document = unrtf::parse_file("document.rtf")?;
//!
//!     println!("{}", document.html);
//!     Ok(())
//! }
//! ```
//!
//! Embedders can drive the parser directly, registering their own
//! handlers by destination name, exact path, or path pattern.

pub mod detect;
pub mod error;
pub mod model;
pub mod parse_options;
pub mod render;
pub mod rtf;

// Re-exports
pub use detect::{detect_format, detect_format_from_bytes, detect_format_from_path, FormatType};
pub use error::{Error, Result};
pub use model::{Document, ExtractedFile, ExtractedFiles};
pub use parse_options::ParseOptions;
pub use render::HtmlOptions;
pub use rtf::Parser;

use std::io::Read;
use std::path::Path;

/// The HTML dialect version [`rtf_to_html`] produces.
pub const HTML_VERSION: u32 = 2;

/// Parses a document from a file path.
///
/// # Example
///
/// ```no_run
/// let document = unrtf::parse_file("example.rtf")?;
/// println!("fonts: {}", document.fonts.len());
/// # Ok::<(), unrtf::Error>(())
/// ```
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    let data = std::fs::read(path)?;
    parse_bytes(&data)
}

/// Parses a document from bytes.
///
/// The input must carry the RTF signature; anything else fails with
/// [`Error::UnknownFormat`].
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    detect_format_from_bytes(data)?;
    parse_with_options(data, &HtmlOptions::default())
}

/// Parses a document from a string.
pub fn parse_str(rtf: &str) -> Result<Document> {
    parse_bytes(rtf.as_bytes())
}

/// Parses a document from a reader.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<Document> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    parse_bytes(&data)
}

/// Extracts plain text from a document file.
///
/// This is a convenience for when you only need the text content
/// without formatting or structure.
pub fn extract_text(path: impl AsRef<Path>) -> Result<String> {
    let document = parse_file(path)?;
    Ok(document.plain_text())
}

/// Converts a document file to HTML with default options.
pub fn to_html(path: impl AsRef<Path>) -> Result<String> {
    let document = parse_file(path)?;
    Ok(document.html)
}

/// Converts RTF text to HTML.
///
/// This is the primary conversion entry point. `version` must equal
/// [`HTML_VERSION`]. `base_url` is prepended to extracted file names in
/// hyperlinks and image sources. When `files` is given, extracted
/// Package items are appended to its `files` collection.
pub fn rtf_to_html(
    rtf: &str,
    base_url: &str,
    files: Option<&mut ExtractedFiles>,
    version: u32,
) -> Result<String> {
    if version != HTML_VERSION {
        return Err(Error::UnsupportedHtmlVersion(version));
    }

    let options = HtmlOptions::default().with_base_url(base_url);
    let document = parse_with_options(rtf.as_bytes(), &options)?;

    if let Some(sink) = files {
        for package in &document.packages {
            for item in &package.items {
                sink.files.push(ExtractedFile {
                    name: item.name.clone(),
                    path: item.path.clone(),
                    data: item.data.clone(),
                });
            }
        }
    }

    Ok(document.html)
}

fn parse_with_options(data: &[u8], options: &HtmlOptions) -> Result<Document> {
    let mut parser = Parser::new(data)?;
    render::register_html_handlers(&mut parser, options)?;
    parser.into_document()
}

/// Builder for parsing and converting documents.
///
/// Provides a fluent API for configuring document processing.
///
/// # Example
///
/// ```no_run
/// use unrtf::Unrtf;
///
/// let html = Unrtf::new()
///     .with_base_url("files/")
///     .parse("document.rtf")?
///     .to_html();
/// # Ok::<(), unrtf::Error>(())
/// ```
pub struct Unrtf {
    html_options: HtmlOptions,
    parse_options: ParseOptions,
}

impl Default for Unrtf {
    fn default() -> Self {
        Self::new()
    }
}

impl Unrtf {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            html_options: HtmlOptions::default(),
            parse_options: ParseOptions::default(),
        }
    }

    /// Sets the URL prefix for extracted file references.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.html_options = self.html_options.with_base_url(base_url);
        self
    }

    /// Disables object links and images in the rendering.
    pub fn without_object_links(mut self) -> Self {
        self.html_options = self.html_options.without_object_links();
        self
    }

    /// Marks the parse strict (reserved).
    pub fn strict(mut self) -> Self {
        self.parse_options = self.parse_options.strict();
        self
    }

    /// Parses a document from a file path.
    pub fn parse(self, path: impl AsRef<Path>) -> Result<ParsedDocument> {
        let data = std::fs::read(path)?;
        self.parse_bytes(&data)
    }

    /// Parses a document from bytes.
    pub fn parse_bytes(self, data: &[u8]) -> Result<ParsedDocument> {
        detect_format_from_bytes(data)?;
        let mut parser = Parser::with_options(data, self.parse_options)?;
        render::register_html_handlers(&mut parser, &self.html_options)?;
        Ok(ParsedDocument {
            document: parser.into_document()?,
        })
    }
}

/// A parsed document ready for output.
pub struct ParsedDocument {
    document: Document,
}

impl ParsedDocument {
    /// Returns a reference to the underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Returns the HTML rendering.
    pub fn to_html(&self) -> String {
        self.document.html.clone()
    }

    /// Returns the plain text content.
    pub fn to_text(&self) -> String {
        self.document.plain_text()
    }

    /// Writes every extracted file with content into `dir`; returns how
    /// many were written.
    ///
    /// Item names come from untrusted `\objdata` payloads; entries whose
    /// names are not a single plain path component (empty, `.`/`..`,
    /// absolute, or containing a separator) are skipped so a crafted
    /// document cannot write outside `dir`.
    pub fn write_files(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut written = 0;
        for package in &self.document.packages {
            for item in &package.items {
                if let Some(ref data) = item.data {
                    if !is_safe_file_name(&item.name) {
                        continue;
                    }
                    std::fs::write(dir.join(&item.name), data)?;
                    written += 1;
                }
            }
        }
        Ok(written)
    }

    /// Consumes self and returns the underlying document.
    pub fn into_document(self) -> Document {
        self.document
    }
}

/// True when an extracted file name is a single safe path component:
/// non-empty, not `.` or `..`, and free of separators and drive syntax.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_document() {
        let doc = parse_str("{\\rtf1 Hello}").unwrap();
        assert_eq!(doc.version, Some(1));
        assert!(doc.html.contains("Hello"));
    }

    #[test]
    fn test_bold_run() {
        let html = rtf_to_html("{\\rtf1 \\b on\\b0 off}", "", None, 2).unwrap();
        assert!(html.contains("<B>on</B>off"), "html: {html}");
    }

    #[test]
    fn test_font_table() {
        let doc =
            parse_str("{\\rtf1{\\fonttbl{\\f0\\froman Times;}{\\f1\\fswiss Arial;}}}").unwrap();
        assert_eq!(doc.fonts[0].family.as_deref(), Some("roman"));
        assert_eq!(doc.fonts[0].name.as_deref(), Some("Times"));
        assert_eq!(doc.fonts[1].family.as_deref(), Some("swiss"));
        assert_eq!(doc.fonts[1].name.as_deref(), Some("Arial"));
    }

    #[test]
    fn test_color_table() {
        let doc =
            parse_str("{\\rtf1{\\colortbl;\\red255\\green0\\blue0;\\red0\\green255\\blue0;}}")
                .unwrap();
        let rgb: Vec<_> = doc.colors.iter().map(|c| (c.r, c.g, c.b)).collect();
        assert_eq!(rgb, vec![(0, 0, 0), (255, 0, 0), (0, 255, 0)]);
    }

    #[test]
    fn test_hex_character() {
        let html = rtf_to_html("{\\rtf1 A\\'41B}", "", None, 2).unwrap();
        assert!(html.contains("AAB"), "html: {html}");
    }

    #[test]
    fn test_ignorable_unknown_destination() {
        let html = rtf_to_html("{\\rtf1{\\*\\unknown garbage}Kept}", "", None, 2).unwrap();
        assert!(html.contains("Kept"));

        let result = rtf_to_html("{\\rtf1{\\unknown garbage}Kept}", "", None, 2);
        assert!(matches!(result, Err(Error::UnhandledDestination { .. })));
    }

    #[test]
    fn test_unsupported_html_version() {
        assert!(matches!(
            rtf_to_html("{\\rtf1 x}", "", None, 1),
            Err(Error::UnsupportedHtmlVersion(1))
        ));
        assert!(matches!(
            rtf_to_html("{\\rtf1 x}", "", None, 3),
            Err(Error::UnsupportedHtmlVersion(3))
        ));
    }

    #[test]
    fn test_non_rtf_input_rejected() {
        assert!(matches!(
            parse_str("not rtf at all"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse_str("").is_err());
    }

    #[test]
    fn test_builder_chain() {
        let parsed = Unrtf::new()
            .with_base_url("assets/")
            .parse_bytes(b"{\\rtf1 \\b Bold}")
            .unwrap();

        assert!(parsed.to_html().contains("<B>Bold"));
        assert_eq!(parsed.to_text(), "Bold");
        assert_eq!(parsed.document().version, Some(1));
    }

    #[test]
    fn test_plain_text_from_formatting() {
        let doc = parse_str("{\\rtf1 one\\par two}").unwrap();
        assert_eq!(doc.plain_text(), "one\ntwo");
    }

    #[test]
    fn test_safe_file_name_check() {
        assert!(is_safe_file_name("report.doc"));
        assert!(is_safe_file_name("a..b.txt"));

        assert!(!is_safe_file_name(""));
        assert!(!is_safe_file_name("."));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name("../evil"));
        assert!(!is_safe_file_name("/etc/passwd"));
        assert!(!is_safe_file_name("dir/file"));
        assert!(!is_safe_file_name("C:\\evil"));
    }

    #[test]
    fn test_write_files_skips_escaping_names() {
        use crate::model::{Package, PackageItem};

        let mut document = Document::new();
        let mut package = Package::default();
        package.items.push(PackageItem {
            path: "../../evil.txt".into(),
            data: Some(b"bad".to_vec()),
            name: "../../evil.txt".into(),
        });
        package.items.push(PackageItem {
            path: "/etc/evil".into(),
            data: Some(b"bad".to_vec()),
            name: "/etc/evil".into(),
        });
        package.items.push(PackageItem::new(
            "C:\\TMP\\good.txt".into(),
            Some(b"ok".to_vec()),
        ));
        document.packages.push(package);

        let dir = std::env::temp_dir().join("unrtf_write_files_test");
        std::fs::remove_dir_all(&dir).ok();

        let parsed = ParsedDocument { document };
        let written = parsed.write_files(&dir).unwrap();

        assert_eq!(written, 1);
        assert!(dir.join("good.txt").exists());
        assert!(!dir.join("evil.txt").exists());
        assert!(!dir.parent().map(|p| p.join("evil.txt").exists()).unwrap_or(false));

        std::fs::remove_dir_all(&dir).ok();
    }
}
