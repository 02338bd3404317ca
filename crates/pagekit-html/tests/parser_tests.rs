//! Integration tests for the HTML tokenizer and tree builder.

use pagekit_dom::{DocumentReadyState, DomTree, NodeId, NodeType};
use pagekit_html::{HTMLTokenizer, Token, dump_tree, parse_document, parse_fragment};

/// Helper to parse a fragment under a fresh detached div.
fn fragment(html: &str) -> (DomTree, NodeId, Vec<NodeId>) {
    let mut tree = DomTree::new();
    let context = tree.create_element("div");
    let nodes = parse_fragment(&mut tree, context, html);
    (tree, context, nodes)
}

fn tag(tree: &DomTree, id: NodeId) -> &str {
    tree.as_element(id).map_or("", |e| e.tag_name.as_str())
}

// ========== tokenizer ==========

#[test]
fn test_tokenize_start_end_and_text() {
    let tokens = HTMLTokenizer::tokenize("<p class=\"x\">hi</p>");
    assert_eq!(tokens.len(), 4);
    assert!(matches!(
        &tokens[0],
        Token::StartTag { name, attributes, self_closing: false }
            if name == "p" && attributes[0].name == "class" && attributes[0].value == "x"
    ));
    assert!(matches!(&tokens[1], Token::Text { data } if data == "hi"));
    assert!(matches!(&tokens[2], Token::EndTag { name } if name == "p"));
    assert_eq!(tokens[3], Token::EndOfFile);
}

#[test]
fn test_tokenize_attribute_forms() {
    let tokens = HTMLTokenizer::tokenize("<input disabled value=a&amp;b data-X='1' id=\"q\" id=\"dup\">");
    let Token::StartTag { attributes, .. } = &tokens[0] else {
        panic!("expected start tag, got {:?}", tokens[0]);
    };
    let pairs: Vec<(&str, &str)> = attributes
        .iter()
        .map(|a| (a.name.as_str(), a.value.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("disabled", ""), ("value", "a&b"), ("data-x", "1"), ("id", "q")]
    );
}

#[test]
fn test_tokenize_comment_and_doctype() {
    let tokens = HTMLTokenizer::tokenize("<!DOCTYPE html><!-- note -->");
    assert_eq!(
        tokens[0],
        Token::Doctype {
            name: Some("html".to_string())
        }
    );
    assert_eq!(
        tokens[1],
        Token::Comment {
            data: " note ".to_string()
        }
    );
}

#[test]
fn test_tokenize_rawtext_keeps_markup() {
    let tokens = HTMLTokenizer::tokenize("<script>if (a < b) { x = '<p>'; }</script>");
    assert!(matches!(
        &tokens[1],
        Token::Text { data } if data == "if (a < b) { x = '<p>'; }"
    ));
    assert!(matches!(&tokens[2], Token::EndTag { name } if name == "script"));
}

#[test]
fn test_character_references() {
    let tokens = HTMLTokenizer::tokenize("a &lt;b&gt; &#65;&#x42; &unknown; &amp");
    assert!(matches!(
        &tokens[0],
        Token::Text { data } if data == "a <b> AB &unknown; &amp"
    ));
}

#[test]
fn test_lone_less_than_is_text() {
    let tokens = HTMLTokenizer::tokenize("1 < 2");
    assert!(matches!(&tokens[0], Token::Text { data } if data == "1 < 2"));
}

// ========== fragments ==========

#[test]
fn test_fragment_two_roots_in_order() {
    let (tree, context, nodes) = fragment("<div>a</div><div>b</div>");
    assert_eq!(nodes.len(), 2);
    assert_eq!(tree.children(context), nodes.as_slice());
    assert_eq!(tree.text_content(nodes[0]), "a");
    assert_eq!(tree.text_content(nodes[1]), "b");
}

#[test]
fn test_fragment_nesting_and_void_elements() {
    let (tree, _, nodes) = fragment("<ul><li>one<br>two</li><li><img src=x.png>three</ul>");
    assert_eq!(nodes.len(), 1);
    let ul = nodes[0];
    let items = tree.element_children(ul);
    assert_eq!(items.len(), 2);
    assert_eq!(tag(&tree, tree.children(items[0])[1]), "br");
    assert_eq!(tree.text_content(items[0]), "onetwo");
    assert_eq!(tree.attribute(tree.children(items[1])[0], "src"), Some("x.png"));
}

#[test]
fn test_fragment_implied_li_end_tag() {
    let (tree, _, nodes) = fragment("<ul><li>a<li>b</ul>");
    let items = tree.element_children(nodes[0]);
    assert_eq!(items.len(), 2);
    assert_eq!(tree.text_content(items[1]), "b");
}

#[test]
fn test_fragment_block_closes_paragraph() {
    let (tree, _, nodes) = fragment("<p>text<div>block</div>");
    assert_eq!(nodes.len(), 2);
    assert_eq!(tag(&tree, nodes[0]), "p");
    assert_eq!(tag(&tree, nodes[1]), "div");
}

#[test]
fn test_fragment_stray_end_tag_is_ignored() {
    let (tree, _, nodes) = fragment("<span>x</b></span>");
    assert_eq!(nodes.len(), 1);
    assert_eq!(tree.text_content(nodes[0]), "x");
}

#[test]
fn test_fragment_text_and_comments_are_kept() {
    let (tree, _, nodes) = fragment("lead<!--c--><b>x</b>tail");
    assert_eq!(nodes.len(), 4);
    assert_eq!(tree.as_text(nodes[0]), Some("lead"));
    assert!(matches!(
        tree.get(nodes[1]).map(|n| &n.node_type),
        Some(NodeType::Comment(c)) if c == "c"
    ));
    assert_eq!(tree.as_text(nodes[3]), Some("tail"));
}

#[test]
fn test_fragment_empty_input() {
    let (tree, context, nodes) = fragment("");
    assert!(nodes.is_empty());
    assert!(tree.children(context).is_empty());
}

#[test]
fn test_fragment_tag_names_are_lowercased() {
    let (tree, _, nodes) = fragment("<MIP-Img SRC=a></MIP-IMG>");
    assert_eq!(tag(&tree, nodes[0]), "mip-img");
    assert_eq!(tree.attribute(nodes[0], "src"), Some("a"));
}

#[test]
fn test_fragment_ignores_document_level_tags() {
    let (tree, context, nodes) = fragment(
        "<html lang=en><head><meta charset=utf-8></head><body class=b>text<p>x</p></body></html>",
    );
    let tags: Vec<_> = nodes.iter().map(|&n| tag(&tree, n)).collect();
    assert_eq!(tags, ["meta", "", "p"]);
    assert_eq!(tree.as_text(nodes[1]), Some("text"));
    assert!(
        tree.descendants(context)
            .all(|n| !matches!(tag(&tree, n), "html" | "head" | "body"))
    );
}

// ========== documents ==========

#[test]
fn test_document_structure() {
    let tree = parse_document("<!DOCTYPE html><html><head><title>T</title></head><body><p>Hi</p></body></html>");
    let html = tree.document_element().expect("document element");
    assert_eq!(tag(&tree, html), "html");
    let body = tree.body().expect("body");
    assert_eq!(tree.text_content(body), "Hi");
    assert_eq!(tree.ready_state(), DocumentReadyState::Complete);
}

#[test]
fn test_document_skeleton_is_implied() {
    let tree = parse_document("<title>T</title><div id=main>content</div>");
    let html = tree.document_element().expect("document element");
    let children = tree.element_children(html);
    assert_eq!(children.len(), 2);
    assert_eq!(tag(&tree, children[0]), "head");
    assert_eq!(tag(&tree, children[1]), "body");
    assert_eq!(tree.text_content(children[0]), "T");
    assert_eq!(tree.text_content(children[1]), "content");
}

#[test]
fn test_empty_document_has_body() {
    let tree = parse_document("");
    assert!(tree.body().is_some());
}

#[test]
fn test_dump_tree_outline() {
    let (tree, context, _) = fragment("<p id=a>x</p>");
    let dump = dump_tree(&tree, context);
    assert_eq!(dump, "<div>\n  <p id=\"a\">\n    \"x\"\n");
}
