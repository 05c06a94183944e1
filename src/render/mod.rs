//! HTML rendering for documents.
//!
//! Unlike a post-parse renderer, the HTML output is produced by
//! destination handlers collaborating with the parser: register the set
//! with [`register_html_handlers`] and the document's `html` field fills
//! as the parse runs.

mod html;
mod options;

pub use html::{register_html_handlers, ObjectDataHandler, TextHandler};
pub use options::HtmlOptions;

use crate::error::Result;
use crate::model::Document;
use std::io::Write;
use std::path::Path;

/// Writes a parsed document's HTML rendering to a file.
pub fn render_to_file(document: &Document, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, &document.html)?;
    Ok(())
}

/// Writes a parsed document's HTML rendering to a writer.
pub fn render_to_writer<W: Write>(document: &Document, writer: &mut W) -> Result<()> {
    writer.write_all(document.html.as_bytes())?;
    Ok(())
}
