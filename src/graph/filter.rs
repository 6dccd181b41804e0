//! Stylesheet file classification.

use std::path::Path;

/// Stylesheet syntaxes and the extensions they use.
const STYLESHEET_EXTENSIONS: &[(&str, Syntax)] = &[("scss", Syntax::Scss), ("sass", Syntax::Sass)];

/// Source syntax of a stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Brace-and-semicolon syntax (`.scss`).
    Scss,
    /// Indentation syntax (`.sass`).
    Sass,
}

/// File classification helpers.
#[derive(Debug)]
pub struct FileFilter;

impl FileFilter {
    /// All stylesheet extensions, in resolution preference order.
    pub fn extensions() -> impl Iterator<Item = &'static str> {
        STYLESHEET_EXTENSIONS.iter().map(|(ext, _)| *ext)
    }

    /// Check if a path is a stylesheet based on extension.
    #[must_use]
    pub fn is_stylesheet(path: &Path) -> bool {
        Self::detect_syntax(path).is_some()
    }

    /// Get the syntax for a file based on extension.
    #[must_use]
    pub fn detect_syntax(path: &Path) -> Option<Syntax> {
        path.extension().and_then(|e| e.to_str()).and_then(|ext| {
            STYLESHEET_EXTENSIONS
                .iter()
                .find(|(e, _)| *e == ext.to_lowercase())
                .map(|(_, syntax)| *syntax)
        })
    }

    /// Partials start with `_` and are only ever compiled through an importer.
    #[must_use]
    pub fn is_partial(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with('_'))
    }
}
