use std::fmt;

use crate::line::SourceLine;

/// One statement line of a parsed program. A node whose trimmed text ends
/// with `:` is a block header and owns the more-indented lines that follow
/// it as `children`; every other node has no children.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub text: String,
    pub line_number: usize,
    pub children: Vec<Node>,
}

/// Build a node forest from the flat line sequence. Pure and deterministic;
/// a header with no more-indented lines after it simply gets an empty body.
pub fn parse_blocks(lines: &[SourceLine]) -> Vec<Node> {
    let (nodes, _) = build(lines, 0, None);
    nodes
}

fn build(lines: &[SourceLine], start: usize, parent_indent: Option<usize>) -> (Vec<Node>, usize) {
    let mut nodes = Vec::new();
    let mut i = start;
    while i < lines.len() {
        let line = &lines[i];
        // A line not strictly deeper than its parent closes the block.
        if let Some(parent) = parent_indent {
            if line.indent <= parent {
                break;
            }
        }
        let mut node = Node {
            text: line.text.clone(),
            line_number: line.line_number,
            children: Vec::new(),
        };
        i += 1;
        if node.text.ends_with(':') {
            let (children, next) = build(lines, i, Some(line.indent));
            node.children = children;
            i = next;
        }
        nodes.push(node);
    }
    (nodes, i)
}

impl Node {
    fn render_into(&self, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("    ");
        }
        out.push_str(&self.text);
        out.push('\n');
        for child in &self.children {
            child.render_into(depth + 1, out);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render_into(0, &mut out);
        write!(f, "{}", out)
    }
}

/// Render a node forest back to indentation-structured source text.
pub fn render(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.render_into(0, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{parse_blocks, render, Node};
    use crate::line::tokenize;

    fn parse(source: &str) -> Vec<Node> {
        parse_blocks(&tokenize(source))
    }

    #[test]
    fn flat_statements() {
        let nodes = parse("say one\nsay two");
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].children.is_empty());
        assert!(nodes[1].children.is_empty());
    }

    #[test]
    fn header_owns_deeper_lines() {
        let nodes = parse("maybeif x == 1:\n    say yes\n    say more\nsay after");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].children.len(), 2);
        assert_eq!(nodes[0].children[0].text, "say yes");
        assert_eq!(nodes[1].text, "say after");
    }

    #[test]
    fn nested_headers() {
        let nodes = parse(
            "thingy Person:\n    do_thing greet self:\n        say hi\n    do_thing bye self:\n        say bye",
        );
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].children.len(), 2);
        assert_eq!(nodes[0].children[0].children.len(), 1);
        assert_eq!(nodes[0].children[1].children.len(), 1);
    }

    #[test]
    fn empty_block_header_is_fine() {
        let nodes = parse("loopforever:\nsay after");
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].children.is_empty());
    }

    #[test]
    fn tab_indentation_nests() {
        let nodes = parse("try:\n\tsay inside\ncatch e:\n\tsay caught");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[1].children.len(), 1);
    }

    #[test]
    fn reparse_of_rendering_is_isomorphic() {
        let source = "\
thingy Counter:
    do_thing init self start:
        self.n = start
let c = new Counter 10
maybeif 1 < 2:
    say yes
ormaybe 2 < 1:
    say no
otherwise:
    say never
";
        let first = parse(source);
        let second = parse(&render(&first));
        assert_eq!(first, second);
    }
}
