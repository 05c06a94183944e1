//! Font table entries.

use serde::Serialize;

/// A font record from the document's font table.
///
/// Fonts are addressed by their RTF font index: `document.fonts[i]` is
/// the font declared as `\fN` with `N == i`. Indices can be sparse;
/// unreferenced slots hold default (empty) records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Font {
    /// Font family (`roman`, `swiss`, `modern`, ... — the `\fXXX` family
    /// word with the leading `f` dropped)
    pub family: Option<String>,
    /// Character set (`\fcharset`)
    pub charset: Option<i32>,
    /// Pitch (`\fprq`: 0 default, 1 fixed, 2 variable)
    pub pitch: Option<i32>,
    /// Font type (`nil` or `truetype` — the `\ftXXX` word with the
    /// leading `ft` dropped)
    pub font_type: Option<String>,
    /// Code page (`\cpg`)
    pub codepage: Option<i32>,
    /// Face name, from the destination's text with the trailing `;`
    /// stripped
    pub name: Option<String>,
}

impl Font {
    /// Creates a new empty font record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no field of the record has been set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
