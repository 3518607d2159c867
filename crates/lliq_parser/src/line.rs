/// A single significant line of source text.
///
/// Indentation is measured in columns before the first non-whitespace
/// character, where a tab counts as 4 columns and a space as 1. Blank-only
/// lines never become a `SourceLine`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// The line's content with surrounding whitespace stripped.
    pub text: String,
    /// Indentation depth in columns.
    pub indent: usize,
    /// 1-based line number in the original source.
    pub line_number: usize,
}

/// Convert raw multi-line text into an ordered sequence of `SourceLine`s.
pub fn tokenize(source: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }
        lines.push(SourceLine {
            text: text.to_string(),
            indent: count_indent(raw),
            line_number: idx + 1,
        });
    }
    lines
}

// Mixed tabs and spaces are accepted as-is; there is no canonical
// indentation unit beyond the tab-equals-4 rule.
fn count_indent(raw: &str) -> usize {
    let mut count = 0;
    for ch in raw.chars() {
        match ch {
            ' ' => count += 1,
            '\t' => count += 4,
            _ => break,
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::{count_indent, tokenize};

    #[test]
    fn blank_lines_are_dropped() {
        let lines = tokenize("say hi\n\n   \n\t\nsay bye\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "say hi");
        assert_eq!(lines[1].text, "say bye");
    }

    #[test]
    fn line_numbers_are_original() {
        let lines = tokenize("first\n\nthird");
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[1].line_number, 3);
    }

    #[test]
    fn indent_counting() {
        assert_eq!(count_indent("say hi"), 0);
        assert_eq!(count_indent("    say hi"), 4);
        assert_eq!(count_indent("\tsay hi"), 4);
        assert_eq!(count_indent("\t  say hi"), 6);
        // Only leading whitespace counts
        assert_eq!(count_indent("say\thi"), 0);
    }

    #[test]
    fn text_is_trimmed() {
        let lines = tokenize("    say hi   \r");
        assert_eq!(lines[0].text, "say hi");
        assert_eq!(lines[0].indent, 4);
    }
}
