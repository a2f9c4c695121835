//! Language detection and tree-sitter grammar registry.

use std::path::Path;

/// Supported language with its tree-sitter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    Python,
}

impl Lang {
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Python => "python",
        }
    }

    #[must_use]
    pub fn grammar(self) -> tree_sitter::Language {
        match self {
            Self::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// File suffixes that select this language.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["py"],
        }
    }

    /// AST node kinds reported as function symbols.
    #[must_use]
    pub fn function_node_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["function_definition"],
        }
    }

    /// AST node kinds reported as class symbols.
    #[must_use]
    pub fn class_node_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["class_definition"],
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Detect language from file extension.
#[must_use]
pub fn detect_language(path: &Path) -> Option<Lang> {
    let ext = path.extension()?.to_str()?;
    [Lang::Python]
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_language_py() {
        assert_eq!(detect_language(Path::new("pkg/mod.py")), Some(Lang::Python));
    }

    #[test]
    fn detect_language_unknown_ext_returns_none() {
        assert_eq!(detect_language(Path::new("file.pyc")), None);
        assert_eq!(detect_language(Path::new("file.rs")), None);
        assert_eq!(detect_language(Path::new("py")), None);
    }

    #[test]
    fn python_function_kinds() {
        assert!(Lang::Python.function_node_kinds().contains(&"function_definition"));
        assert_eq!(Lang::Python.to_string(), "python");
    }
}
