//! Indexable units and function-level extraction with per-file dedup.

use std::collections::HashSet;
use std::path::Path;

use crate::store::MetadataRecord;
use crate::symbols::{SymbolExtractor, SymbolKind};

/// What an indexable unit stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitBody {
    Function { code: String, doc: String },
    File,
}

/// One item to embed: a function or a whole-file summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexableUnit {
    pub id: String,
    /// The string sent to the embedding model.
    pub text: String,
    pub source: String,
    pub body: UnitBody,
}

impl IndexableUnit {
    #[must_use]
    pub fn function(source: &str, name: &str, code: String, doc: String) -> Self {
        Self {
            id: format!("{source}:{name}"),
            text: format!("{code}\n\n{doc}"),
            source: source.to_string(),
            body: UnitBody::Function { code, doc },
        }
    }

    #[must_use]
    pub fn file(rel_path: &str, abs_path: &str, text: String) -> Self {
        Self {
            id: rel_path.to_string(),
            text,
            source: abs_path.to_string(),
            body: UnitBody::File,
        }
    }

    /// The persisted form: everything except the embedded text.
    #[must_use]
    pub fn to_record(&self) -> MetadataRecord {
        match &self.body {
            UnitBody::Function { code, doc } => MetadataRecord::Function {
                id: self.id.clone(),
                source: self.source.clone(),
                code: code.clone(),
                doc: doc.clone(),
            },
            UnitBody::File => MetadataRecord::File {
                id: self.id.clone(),
                source: self.source.clone(),
            },
        }
    }
}

/// Chunker configuration.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Units with `len(code) + len(doc)` (in chars) above this are dropped (default: 7500).
    pub max_unit_length: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_unit_length: 7500,
        }
    }
}

/// Function units of one file plus what was left out.
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    pub units: Vec<IndexableUnit>,
    /// Symbols that failed introspection.
    pub failed: usize,
    pub duplicates: usize,
    pub oversized: usize,
}

/// Build function units for one file.
///
/// Each unit's code runs from the definition line to the end of the file.
/// Units repeating an earlier `(code, doc)` pair of the same file are dropped,
/// as are units longer than `max_unit_length`. Analyzer failures are logged and
/// never propagate.
pub fn extract_function_units<E: SymbolExtractor + ?Sized>(
    extractor: &E,
    source: &str,
    path: &str,
    config: &ChunkerConfig,
) -> ExtractOutcome {
    let mut outcome = ExtractOutcome::default();

    let symbols = match extractor.extract(source, Path::new(path)) {
        Ok(symbols) => symbols,
        Err(e) => {
            tracing::warn!(file = %path, "skipping file, symbol extraction failed: {e}");
            return outcome;
        }
    };

    let lines: Vec<&str> = source.lines().collect();
    let mut seen: HashSet<blake3::Hash> = HashSet::new();

    for symbol in symbols {
        let symbol = match symbol {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(file = %path, "skipping symbol: {e}");
                outcome.failed += 1;
                continue;
            }
        };

        if symbol.kind != SymbolKind::Function {
            continue;
        }
        let Some(line) = symbol.line else {
            continue;
        };

        let start = line.saturating_sub(1).min(lines.len());
        let code = lines[start..].join("\n").trim().to_string();
        let doc = symbol.docstring.trim().to_string();

        if code.chars().count() + doc.chars().count() > config.max_unit_length {
            outcome.oversized += 1;
            continue;
        }
        if !seen.insert(dedup_key(&code, &doc)) {
            outcome.duplicates += 1;
            continue;
        }

        outcome
            .units
            .push(IndexableUnit::function(path, &symbol.name, code, doc));
    }

    outcome
}

fn dedup_key(code: &str, doc: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(code.len() as u64).to_le_bytes());
    hasher.update(code.as_bytes());
    hasher.update(doc.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IndexError, Result};
    use crate::symbols::{Symbol, TreeSitterExtractor};

    struct FixedExtractor(Vec<Result<Symbol>>);

    impl SymbolExtractor for FixedExtractor {
        fn extract(&self, _source: &str, _path: &Path) -> Result<Vec<Result<Symbol>>> {
            Ok(self
                .0
                .iter()
                .map(|r| match r {
                    Ok(s) => Ok(s.clone()),
                    Err(e) => Err(IndexError::Parse(e.to_string())),
                })
                .collect())
        }
    }

    struct BrokenExtractor;

    impl SymbolExtractor for BrokenExtractor {
        fn extract(&self, _source: &str, path: &Path) -> Result<Vec<Result<Symbol>>> {
            Err(IndexError::Parse(format!("cannot analyze {}", path.display())))
        }
    }

    fn func(name: &str, line: usize, doc: &str) -> Result<Symbol> {
        Ok(Symbol {
            name: name.into(),
            kind: SymbolKind::Function,
            line: Some(line),
            docstring: doc.into(),
        })
    }

    #[test]
    fn code_runs_to_end_of_file() {
        let source = "def a():\n    pass\n\ndef b():\n    \"\"\"bee\"\"\"\n";
        let out = extract_function_units(
            &TreeSitterExtractor::python(),
            source,
            "pkg/m.py",
            &ChunkerConfig::default(),
        );
        assert_eq!(out.units.len(), 2);
        let UnitBody::Function { code, .. } = &out.units[0].body else {
            panic!("expected function unit");
        };
        assert!(code.starts_with("def a():"));
        assert!(code.contains("def b():"));
        assert_eq!(out.units[1].id, "pkg/m.py:b");
    }

    #[test]
    fn unit_text_joins_code_and_doc() {
        let unit = IndexableUnit::function("a.py", "foo", "def foo(): pass".into(), "doc".into());
        assert_eq!(unit.text, "def foo(): pass\n\ndoc");
        assert_eq!(unit.id, "a.py:foo");
    }

    #[test]
    fn duplicate_code_doc_pairs_dropped() {
        let extractor = FixedExtractor(vec![
            func("f", 1, "same"),
            func("g", 1, "same"),
            func("h", 1, "other"),
        ]);
        let out =
            extract_function_units(&extractor, "def f(): pass\n", "a.py", &ChunkerConfig::default());
        let ids: Vec<_> = out.units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["a.py:f", "a.py:h"]);
        assert_eq!(out.duplicates, 1);
    }

    #[test]
    fn dedup_ignores_surrounding_whitespace() {
        let extractor = FixedExtractor(vec![func("f", 1, "  doc  "), func("f", 1, "doc")]);
        let out = extract_function_units(&extractor, "def f(): pass\n", "a.py", &ChunkerConfig::default());
        assert_eq!(out.units.len(), 1);
    }

    #[test]
    fn repeated_definitions_yield_unique_pairs() {
        let extractor = FixedExtractor(vec![
            func("f", 1, "doc"),
            func("f", 1, "doc"),
            func("f", 3, "doc"),
            func("f", 3, "doc"),
        ]);
        let source = "def f():\n    pass\ndef f():\n    pass\n";
        let out = extract_function_units(&extractor, source, "a.py", &ChunkerConfig::default());
        let pairs: HashSet<_> = out
            .units
            .iter()
            .map(|u| match &u.body {
                UnitBody::Function { code, doc } => (code.clone(), doc.clone()),
                UnitBody::File => unreachable!(),
            })
            .collect();
        assert_eq!(out.units.len(), 2);
        assert_eq!(pairs.len(), out.units.len());
    }

    #[test]
    fn oversized_units_dropped() {
        let config = ChunkerConfig { max_unit_length: 40 };
        let extractor = FixedExtractor(vec![
            func("small", 1, ""),
            func("big", 2, "a much longer docstring than allowed here"),
        ]);
        let out = extract_function_units(&extractor, "def small(): 1\ndef big(): 2\n", "a.py", &config);
        assert_eq!(out.units.len(), 1);
        assert_eq!(out.oversized, 1);
        for unit in &out.units {
            let UnitBody::Function { code, doc } = &unit.body else {
                continue;
            };
            assert!(code.chars().count() + doc.chars().count() <= 40);
        }
    }

    #[test]
    fn per_symbol_failure_skips_only_that_symbol() {
        let extractor = FixedExtractor(vec![
            func("a", 1, ""),
            Err(IndexError::Parse("no type".into())),
            func("b", 2, "x"),
        ]);
        let out = extract_function_units(&extractor, "def a(): 1\ndef b(): 2\n", "a.py", &ChunkerConfig::default());
        assert_eq!(out.units.len(), 2);
        assert_eq!(out.failed, 1);
    }

    #[test]
    fn whole_file_failure_yields_nothing() {
        let out = extract_function_units(&BrokenExtractor, "def a(): 1\n", "a.py", &ChunkerConfig::default());
        assert!(out.units.is_empty());
    }

    #[test]
    fn classes_and_lineless_symbols_ignored() {
        let extractor = FixedExtractor(vec![
            Ok(Symbol {
                name: "C".into(),
                kind: SymbolKind::Class,
                line: Some(1),
                docstring: String::new(),
            }),
            Ok(Symbol {
                name: "builtin".into(),
                kind: SymbolKind::Function,
                line: None,
                docstring: String::new(),
            }),
        ]);
        let out = extract_function_units(&extractor, "class C: pass\n", "a.py", &ChunkerConfig::default());
        assert!(out.units.is_empty());
    }

    #[test]
    fn to_record_drops_text() {
        let unit = IndexableUnit::function("a.py", "foo", "code".into(), "doc".into());
        assert_eq!(
            unit.to_record(),
            MetadataRecord::Function {
                id: "a.py:foo".into(),
                source: "a.py".into(),
                code: "code".into(),
                doc: "doc".into(),
            }
        );
        let file = IndexableUnit::file("a.py", "/abs/a.py", "# File: a.py".into());
        assert_eq!(
            file.to_record(),
            MetadataRecord::File {
                id: "a.py".into(),
                source: "/abs/a.py".into(),
            }
        );
    }
}
