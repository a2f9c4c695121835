//! Whole-file summary units.

use crate::chunker::IndexableUnit;

/// First `head_lines` non-blank lines of `text`, joined with newlines.
#[must_use]
pub fn summarize(text: &str, head_lines: usize) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .take(head_lines)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The file-level unit: relative path as id, absolute path as source, and the
/// path plus the head of the file as embedded text.
#[must_use]
pub fn file_unit(rel_path: &str, abs_path: &str, text: &str, head_lines: usize) -> IndexableUnit {
    let summary = summarize(text, head_lines);
    IndexableUnit::file(rel_path, abs_path, format!("# File: {rel_path}\n{summary}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::UnitBody;

    #[test]
    fn skips_blank_lines() {
        let text = "\n\nimport os\n   \nx = 1\n\n\ny = 2\n";
        assert_eq!(summarize(text, 20), "import os\nx = 1\ny = 2");
    }

    #[test]
    fn truncates_to_head_lines() {
        let text = (0..50).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let summary = summarize(&text, 20);
        assert_eq!(summary.lines().count(), 20);
        assert!(summary.ends_with("line19"));
    }

    #[test]
    fn empty_file_gives_empty_summary() {
        assert_eq!(summarize("", 20), "");
        assert_eq!(summarize("\n \n", 20), "");
    }

    #[test]
    fn file_unit_fields() {
        let unit = file_unit("pkg/a.py", "/repo/pkg/a.py", "import os\n", 20);
        assert_eq!(unit.id, "pkg/a.py");
        assert_eq!(unit.source, "/repo/pkg/a.py");
        assert_eq!(unit.text, "# File: pkg/a.py\nimport os");
        assert_eq!(unit.body, UnitBody::File);
    }
}
