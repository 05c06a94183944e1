//! Document model.
//!
//! This module defines the document structures populated by the reader:
//! document-wide metadata, the font and color tables, the HTML rendering,
//! and extracted OLE Package objects.

mod color;
mod document;
mod font;
mod package;

pub use color::*;
pub use document::*;
pub use font::*;
pub use package::*;
