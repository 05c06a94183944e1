//! Parsing options.

/// Options controlling parser construction.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Reserved for future strict-validation behavior. Accepted and
    /// stored, not yet consulted.
    pub strict: bool,

    /// Skip registering the built-in meta/fonttbl/colortbl handlers.
    pub suppress_defaults: bool,
}

impl ParseOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the parse strict (reserved).
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Skips the built-in destination handlers, leaving registration
    /// entirely to the embedder.
    pub fn without_default_handlers(mut self) -> Self {
        self.suppress_defaults = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert!(!options.strict);
        assert!(!options.suppress_defaults);
    }

    #[test]
    fn test_builders() {
        let options = ParseOptions::new().strict().without_default_handlers();
        assert!(options.strict);
        assert!(options.suppress_defaults);
    }
}
