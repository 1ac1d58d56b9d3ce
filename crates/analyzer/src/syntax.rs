use crate::error::{AnalysisError, Result};
use tree_sitter::{Node, Parser, Tree};

/// Parse Go source into a syntax tree, rejecting trees with error or missing nodes.
///
/// A fresh parser is built per call so analyses never share mutable state.
pub(crate) fn parse_go(source: &str) -> Result<Tree> {
    let ts_language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&ts_language)
        .map_err(|e| AnalysisError::tree_sitter(format!("Failed to set language: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| AnalysisError::parse(1, "parser produced no syntax tree"))?;

    if let Some(bad) = first_error(tree.root_node()) {
        let line = bad.start_position().row + 1;
        let message = if bad.is_missing() {
            format!("missing `{}`", bad.kind())
        } else {
            let snippet = text(bad, source).lines().next().unwrap_or_default();
            format!("unexpected `{snippet}`")
        };
        return Err(AnalysisError::parse(line, message));
    }

    Ok(tree)
}

/// Source text covered by a node
pub(crate) fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

/// Named children, skipping comments
pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
