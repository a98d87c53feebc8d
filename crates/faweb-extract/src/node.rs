//! Pure helpers over single tree nodes: attribute lookup, structural
//! tests, child navigation and text collection.

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Node;

/// Returns the value of the named attribute, if the node is an element
/// carrying it. Repeated attribute keys keep the first occurrence.
pub fn attr<'a>(node: NodeRef<'a, Node>, name: &str) -> Option<&'a str> {
    node.value().as_element().and_then(|el| el.attr(name))
}

/// True if the node is an element with the given tag name.
pub fn is_tag(node: NodeRef<'_, Node>, tag: &str) -> bool {
    node.value()
        .as_element()
        .map(|el| el.name() == tag)
        .unwrap_or(false)
}

/// True if the node is a `tag` element whose `id` attribute equals `id`.
pub fn has_tag_id(node: NodeRef<'_, Node>, tag: &str, id: &str) -> bool {
    is_tag(node, tag) && attr(node, "id") == Some(id)
}

/// True if the node is a `tag` element whose `class` attribute contains
/// `class` as a substring. Substring, not token, matching: the site mixes
/// composite class names.
pub fn has_tag_class(node: NodeRef<'_, Node>, tag: &str, class: &str) -> bool {
    is_tag(node, tag)
        && attr(node, "class")
            .map(|c| c.contains(class))
            .unwrap_or(false)
}

/// Returns the `index`-th direct child (0-based) with the given tag name.
pub fn nth_tagged_child<'a>(
    node: NodeRef<'a, Node>,
    tag: &str,
    index: usize,
) -> Option<NodeRef<'a, Node>> {
    node.children().filter(|c| is_tag(*c, tag)).nth(index)
}

/// Walks a fixed sequence of (tag, occurrence-index) steps down from
/// `node`. Any missing step yields `None` rather than an error, so deep
/// stringly-typed paths degrade to "extracted nothing" when the markup
/// drifts.
pub fn descend_path<'a>(
    node: NodeRef<'a, Node>,
    steps: &[(&str, usize)],
) -> Option<NodeRef<'a, Node>> {
    let mut current = node;
    for (tag, index) in steps {
        current = nth_tagged_child(current, tag, *index)?;
    }
    Some(current)
}

/// Recursively concatenates the trimmed text content beneath a node,
/// newline-separated in document order.
pub fn text_content(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out.trim().to_string()
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
                out.push('\n');
            }
        }
        if child.has_children() {
            collect_text(child, out);
        }
    }
}

static SPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{A0}\u{2007}\u{202F}]+").unwrap());

/// Collapses runs of spaces, tabs and non-breaking space variants into
/// single ordinary spaces, then trims surrounding whitespace (newlines
/// included). Idempotent.
pub fn squash_whitespace(s: &str) -> String {
    SPACE_RUN.replace_all(s, " ").trim().to_string()
}
