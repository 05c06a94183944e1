//! Rendering options for HTML output.

/// Options for the HTML-emitting handler set.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Prefix prepended to extracted file names in hyperlinks and image
    /// sources.
    pub base_url: String,

    /// Whether decoded Package items produce `<A>`/`<IMG>` markup in the
    /// rendering. Extraction itself is unaffected.
    pub emit_objects: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            emit_objects: true,
        }
    }
}

impl HtmlOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL prefix for extracted file references.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Disables object links and images in the rendering.
    pub fn without_object_links(mut self) -> Self {
        self.emit_objects = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let options = HtmlOptions::new()
            .with_base_url("files/")
            .without_object_links();
        assert_eq!(options.base_url, "files/");
        assert!(!options.emit_objects);
    }
}
