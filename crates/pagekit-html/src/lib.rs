//! HTML tokenizer and tree builder for PageKit.
//!
//! # Scope
//!
//! This crate implements what the DOM utilities need in place of a
//! browser's `innerHTML` setter:
//! - **HTML Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization))
//!   - Data, RCDATA and RAWTEXT content
//!   - Tags, attributes (quoted and unquoted), comments, DOCTYPE
//!   - Numeric and common named character references
//! - **Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - Fragment parsing into an existing context node
//!   - Small documents with an implied `html`/`head`/`body` skeleton
//!
//! # Not Implemented
//!
//! - Table, form and foreign-content insertion modes
//! - The adoption agency algorithm (misnested formatting tags are closed
//!   by the nearest matching end tag)

/// Tree construction from a token stream.
pub mod builder;
/// Tokens produced by the tokenizer.
pub mod token;
/// HTML tokenizer for converting input into tokens.
pub mod tokenizer;

use std::fmt::Write as _;

use pagekit_dom::{DocumentReadyState, DomTree, NodeId, NodeType};

pub use builder::{BuildMode, TreeBuilder};
pub use token::{Attribute, Token};
pub use tokenizer::{HTMLTokenizer, TokenizerState, decode_character_references};

/// [§ 13.4 Parsing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments)
///
/// Parse `html` and append the resulting nodes to `context`, the way setting
/// `context.innerHTML` on an empty element would. Returns the nodes inserted
/// directly under `context` (elements, text and comments) in document order.
pub fn parse_fragment(tree: &mut DomTree, context: NodeId, html: &str) -> Vec<NodeId> {
    let tokens = HTMLTokenizer::tokenize(html);
    TreeBuilder::new(tree, context, BuildMode::Fragment).run(tokens)
}

/// Parse a whole document into a fresh tree.
///
/// The returned tree has already reached
/// [`Complete`](DocumentReadyState::Complete): there is nothing left to load.
#[must_use]
pub fn parse_document(html: &str) -> DomTree {
    let mut tree = DomTree::new();
    let tokens = HTMLTokenizer::tokenize(html);
    let _ = TreeBuilder::new(&mut tree, NodeId::ROOT, BuildMode::Document).run(tokens);
    tree.set_ready_state(DocumentReadyState::Interactive);
    tree.set_ready_state(DocumentReadyState::Complete);
    tree
}

/// Render the subtree at `id` as an indented outline, one node per line.
#[must_use]
pub fn dump_tree(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    dump_node(tree, id, 0, &mut out);
    out
}

fn dump_node(tree: &DomTree, id: NodeId, depth: usize, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let _ = match &node.node_type {
        NodeType::Document => writeln!(out, "{indent}#document"),
        NodeType::Element(data) => {
            let mut attrs: Vec<_> = data.attrs.iter().collect();
            attrs.sort();
            let rendered: String = attrs
                .iter()
                .map(|(k, v)| format!(" {k}=\"{v}\""))
                .collect();
            writeln!(out, "{indent}<{}{rendered}>", data.tag_name)
        }
        NodeType::Text(text) => writeln!(out, "{indent}\"{}\"", text.escape_debug()),
        NodeType::Comment(text) => writeln!(out, "{indent}<!--{text}-->"),
    };
    for &child in tree.children(id) {
        dump_node(tree, child, depth + 1, out);
    }
}
