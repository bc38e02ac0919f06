//! Markup stripping for description fields.
//!
//! Turns an HTML fragment into normalized plain text: tags removed,
//! script/style/noscript subtrees dropped wholly, entities decoded by the
//! parser, and whitespace collapsed to single spaces.

use ego_tree::NodeRef;
use scraper::{node::Node, Html};

/// Strip markup from an HTML fragment into plain text.
///
/// Never fails on malformed markup; html5ever recovers and we extract
/// whatever text survives. Already-clean text passes through unchanged
/// beyond whitespace normalization.
pub fn sanitize(raw_html: &str) -> String {
    let fragment = Html::parse_fragment(raw_html);
    let mut out = String::new();
    collect_text(fragment.tree.root(), &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Element(element) => {
                // Embedded code and styles are content-free noise.
                if matches!(element.name(), "script" | "style" | "noscript") {
                    continue;
                }
                collect_text(child, out);
            }
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            _ => {}
        }
    }
}
