//! Symbol discovery: the analyzer seam consumed by the chunker.

use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::error::{IndexError, Result};
use crate::languages::Lang;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Class,
}

/// One definition reported by a [`SymbolExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based line of the definition, if known.
    pub line: Option<usize>,
    /// Evaluated and dedented docstring, empty when absent.
    pub docstring: String,
}

/// Reports the definitions of one source file.
///
/// The outer `Err` means the whole file could not be analyzed. An inner `Err`
/// means one definition could not be introspected; the remaining ones are
/// still usable.
pub trait SymbolExtractor {
    /// # Errors
    ///
    /// Returns an error if the file cannot be analyzed at all.
    fn extract(&self, source: &str, path: &Path) -> Result<Vec<Result<Symbol>>>;
}

/// Tree-sitter backed extractor reporting functions and classes at every scope,
/// in tree pre-order.
#[derive(Debug, Clone, Copy)]
pub struct TreeSitterExtractor {
    lang: Lang,
}

impl TreeSitterExtractor {
    #[must_use]
    pub fn python() -> Self {
        Self { lang: Lang::Python }
    }
}

impl Default for TreeSitterExtractor {
    fn default() -> Self {
        Self::python()
    }
}

impl SymbolExtractor for TreeSitterExtractor {
    fn extract(&self, source: &str, path: &Path) -> Result<Vec<Result<Symbol>>> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.lang.grammar())
            .map_err(|e| IndexError::Parse(format!("set_language failed: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| IndexError::Parse(format!("parse failed for {}", path.display())))?;

        let mut symbols = Vec::new();
        let mut stack = vec![tree.root_node()];

        while let Some(node) = stack.pop() {
            let kind = if self.lang.function_node_kinds().contains(&node.kind()) {
                Some(SymbolKind::Function)
            } else if self.lang.class_node_kinds().contains(&node.kind()) {
                Some(SymbolKind::Class)
            } else {
                None
            };

            if let Some(kind) = kind {
                symbols.push(describe(&node, kind, source));
            }

            // Reverse push keeps pre-order on pop.
            let child_count = u32::try_from(node.named_child_count()).unwrap_or(u32::MAX);
            for i in (0..child_count).rev() {
                if let Some(child) = node.named_child(i) {
                    stack.push(child);
                }
            }
        }

        Ok(symbols)
    }
}

fn describe(node: &Node, kind: SymbolKind, source: &str) -> Result<Symbol> {
    let line = node.start_position().row + 1;
    let name_node = node
        .child_by_field_name("name")
        .filter(|n| !n.is_missing() && !n.has_error())
        .ok_or_else(|| IndexError::Parse(format!("definition without a name at line {line}")))?;
    let name = name_node
        .utf8_text(source.as_bytes())
        .map_err(|e| IndexError::Parse(format!("bad name at line {line}: {e}")))?
        .to_string();

    Ok(Symbol {
        name,
        kind,
        line: Some(line),
        docstring: docstring(node, source).unwrap_or_default(),
    })
}

/// First body statement, if it is a bare string literal, evaluated and
/// dedented the way Python's `inspect.cleandoc` does.
fn docstring(node: &Node, source: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }
    let raw = literal.utf8_text(source.as_bytes()).ok()?;
    evaluate_string_literal(raw).map(|value| cleandoc(&value))
}

/// Value of a Python string literal. `None` for f-strings, which never
/// become docstrings.
fn evaluate_string_literal(raw: &str) -> Option<String> {
    let quote_at = raw.find(['"', '\''])?;
    let prefix = raw[..quote_at].to_ascii_lowercase();
    if prefix.contains('f') {
        return None;
    }
    let quoted = &raw[quote_at..];
    let inner = ["\"\"\"", "'''", "\"", "'"]
        .into_iter()
        .find_map(|q| quoted.strip_prefix(q).and_then(|s| s.strip_suffix(q)))
        .unwrap_or(quoted);

    if prefix.contains('r') {
        Some(inner.to_string())
    } else {
        Some(unescape(inner))
    }
}

/// Python escape sequences. Unknown escapes are kept verbatim.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            // line continuation
            '\n' => {}
            '\\' | '\'' | '"' => out.push(next),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut digits = String::from(next);
                while digits.len() < 3 {
                    match chars.next_if(|d| ('0'..='7').contains(d)) {
                        Some(d) => digits.push(d),
                        None => break,
                    }
                }
                push_code_point(&mut out, &digits, 8, None);
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut digits = String::new();
                while digits.len() < width {
                    match chars.next_if(char::is_ascii_hexdigit) {
                        Some(d) => digits.push(d),
                        None => break,
                    }
                }
                if digits.len() == width {
                    push_code_point(&mut out, &digits, 16, Some(next));
                } else {
                    out.push('\\');
                    out.push(next);
                    out.push_str(&digits);
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn push_code_point(out: &mut String, digits: &str, radix: u32, escape: Option<char>) {
    match u32::from_str_radix(digits, radix).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => {
            out.push('\\');
            out.extend(escape);
            out.push_str(digits);
        }
    }
}

/// Tabs expanded, first line left-stripped, the common indentation of the
/// remaining lines removed, leading and trailing blank lines dropped.
fn cleandoc(doc: &str) -> String {
    let mut lines: Vec<String> = doc.split('\n').map(expand_tabs).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim_start().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min();

    if let Some(first) = lines.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(margin) = margin {
        for line in lines.iter_mut().skip(1) {
            *line = line.chars().skip(margin).collect();
        }
    }

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.is_empty()).count();
    lines.drain(..leading);
    lines.join("\n")
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = 8 - column % 8;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}
