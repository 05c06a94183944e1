//! Embedded OLE Package objects.

use serde::Serialize;

/// OLE type of a decoded Package: content embedded in the document.
pub const OLE_TYPE_STATIC: u16 = 3;
/// OLE type of a decoded Package: links to external files.
pub const OLE_TYPE_LINKED: u16 = 1;

/// A decoded OLE "Package" object from an `\objdata` destination.
///
/// Packages carry one or more named files, either embedded (OLE type 3)
/// or linked by path (OLE type 1).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Package {
    /// Program identifier string from the object header
    pub progid: String,
    /// Declared payload size in bytes
    pub total_size: u32,
    /// The object's string table (display label, path hints)
    pub strings: Vec<String>,
    /// Display label (`strings[0]`)
    pub label: String,
    /// OLE type: 1 (linked) or 3 (static)
    pub ole_type: u16,
    /// Files carried by the package
    pub items: Vec<PackageItem>,
}

impl Package {
    /// Returns true if the package embeds file content (OLE type 3).
    pub fn is_static(&self) -> bool {
        self.ole_type == OLE_TYPE_STATIC
    }
}

/// A single file inside a Package.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageItem {
    /// Full path as stored in the object
    pub path: String,
    /// File content; present only for static (type 3) packages
    pub data: Option<Vec<u8>>,
    /// Basename of `path`, split on `\`
    pub name: String,
}

impl PackageItem {
    /// Creates an item, deriving `name` from the path basename.
    pub fn new(path: String, data: Option<Vec<u8>>) -> Self {
        let name = basename(&path).to_string();
        Self { path, data, name }
    }
}

/// Output sink for conversion: extracted Package items accumulate under
/// `files`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractedFiles {
    /// One entry per file carried by a decoded package
    pub files: Vec<ExtractedFile>,
}

/// A single extracted file.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedFile {
    /// Basename used for output and references
    pub name: String,
    /// Full path as stored in the object
    pub path: String,
    /// File content; absent for linked packages
    pub data: Option<Vec<u8>>,
}

/// Returns the substring after the last `\` in `path`, or the entire
/// path when it contains none.
pub(crate) fn basename(path: &str) -> &str {
    match path.rfind('\\') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}
