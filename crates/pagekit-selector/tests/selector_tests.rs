//! Integration tests for selector parsing and matching.

use pagekit_dom::{DomTree, NodeId};
use pagekit_html::{parse_document, parse_fragment};
use pagekit_selector::{
    AttributeOperator, Combinator, PseudoClass, SelectorError, SelectorList, SimpleSelector,
    closest, query_selector, query_selector_all,
};

fn sel(s: &str) -> SelectorList {
    SelectorList::parse(s).unwrap_or_else(|e| panic!("failed to parse {s:?}: {e}"))
}

/// Parse `html` under a detached div and return the tree and the div.
fn setup(html: &str) -> (DomTree, NodeId) {
    let mut tree = DomTree::new();
    let container = tree.create_element("div");
    let _ = parse_fragment(&mut tree, container, html);
    (tree, container)
}

fn by_id(tree: &DomTree, scope: NodeId, id: &str) -> NodeId {
    query_selector(tree, scope, &sel(&format!("#{id}")))
        .unwrap_or_else(|| panic!("no element with id {id}"))
}

// ========== parsing ==========

#[test]
fn test_parse_compound() {
    let list = sel("div.card#main[data-x]");
    assert_eq!(list.selectors.len(), 1);
    let subject = &list.selectors[0].subject.simple_selectors;
    assert_eq!(subject[0], SimpleSelector::Type("div".to_string()));
    assert_eq!(subject[1], SimpleSelector::Class("card".to_string()));
    assert_eq!(subject[2], SimpleSelector::Id("main".to_string()));
    assert!(matches!(&subject[3], SimpleSelector::Attribute(a) if a.name == "data-x" && a.operator.is_none()));
}

#[test]
fn test_parse_combinators_are_stored_right_to_left() {
    let list = sel("section > ul li + a ~ b");
    let complex = &list.selectors[0];
    assert_eq!(complex.subject.simple_selectors[0], SimpleSelector::Type("b".to_string()));
    let kinds: Vec<Combinator> = complex.combinators.iter().map(|(c, _)| *c).collect();
    assert_eq!(
        kinds,
        vec![
            Combinator::SubsequentSibling,
            Combinator::NextSibling,
            Combinator::Descendant,
            Combinator::Child,
        ]
    );
    assert_eq!(
        complex.combinators[3].1.simple_selectors[0],
        SimpleSelector::Type("section".to_string())
    );
}

#[test]
fn test_parse_selector_list_and_display() {
    let list = sel("  mip-img , .lazy>img ");
    assert_eq!(list.selectors.len(), 2);
    assert_eq!(list.to_string(), "mip-img , .lazy>img");
}

#[test]
fn test_parse_attribute_operators() {
    let cases = [
        ("[a=b]", AttributeOperator::Equals),
        ("[a~=b]", AttributeOperator::Includes),
        ("[a|=b]", AttributeOperator::DashMatch),
        ("[a^=b]", AttributeOperator::Prefix),
        ("[a$=b]", AttributeOperator::Suffix),
        ("[a*='b']", AttributeOperator::Substring),
    ];
    for (input, expected) in cases {
        let list = sel(input);
        let SimpleSelector::Attribute(attr) = &list.selectors[0].subject.simple_selectors[0] else {
            panic!("expected attribute selector for {input}");
        };
        assert_eq!(attr.operator, Some((expected, "b".to_string())), "{input}");
    }
}

#[test]
fn test_parse_pseudo_classes() {
    let list = sel("li:first-child:not(.skip)");
    let simple = &list.selectors[0].subject.simple_selectors;
    assert_eq!(simple[1], SimpleSelector::PseudoClass(PseudoClass::FirstChild));
    assert!(matches!(&simple[2], SimpleSelector::Not(inner) if inner.as_str() == ".skip"));
}

#[test]
fn test_parse_unsupported_pseudo_never_matches() {
    let list = sel("p::before, a:hover, li:nth-child(2n+1)");
    for complex in &list.selectors {
        assert!(complex.subject.simple_selectors.contains(&SimpleSelector::NeverMatch));
    }
}

#[test]
fn test_parse_errors() {
    assert_eq!(SelectorList::parse(""), Err(SelectorError::Empty));
    assert_eq!(SelectorList::parse("   "), Err(SelectorError::Empty));
    assert_eq!(SelectorList::parse("a,,b"), Err(SelectorError::Empty));
    assert_eq!(
        SelectorList::parse("div >"),
        Err(SelectorError::DanglingCombinator { pos: 4 })
    );
    assert_eq!(
        SelectorList::parse("div."),
        Err(SelectorError::MissingName { prefix: '.', pos: 3 })
    );
    assert_eq!(
        SelectorList::parse("[a='b]"),
        Err(SelectorError::UnterminatedString)
    );
    assert_eq!(SelectorList::parse("[a"), Err(SelectorError::UnterminatedAttribute));
    assert_eq!(SelectorList::parse(":not(a"), Err(SelectorError::UnbalancedParens));
    assert_eq!(
        SelectorList::parse("a{"),
        Err(SelectorError::UnexpectedChar { ch: '{', pos: 1 })
    );
}

#[test]
fn test_parse_escaped_identifier() {
    let list = sel(".a\\:b");
    assert_eq!(
        list.selectors[0].subject.simple_selectors[0],
        SimpleSelector::Class("a:b".to_string())
    );
}

// ========== matching ==========

#[test]
fn test_matches_type_class_id() {
    let (tree, root) = setup("<MIP-IMG id=hero class='lazy big'></MIP-IMG>");
    let img = by_id(&tree, root, "hero");
    assert!(sel("mip-img").matches(&tree, img));
    assert!(sel("MIP-IMG").matches(&tree, img));
    assert!(sel(".lazy.big").matches(&tree, img));
    assert!(!sel(".small").matches(&tree, img));
    assert!(sel("div, #hero").matches(&tree, img));
}

#[test]
fn test_text_nodes_never_match() {
    let (tree, root) = setup("<p>text</p>");
    let p = tree.children(root)[0];
    let text = tree.children(p)[0];
    assert!(!sel("*").matches(&tree, text));
    assert!(sel("*").matches(&tree, p));
}

#[test]
fn test_matches_attribute_values() {
    let (tree, root) = setup("<a id=x lang='en-US' rel='nofollow noopener' href='HTTPS://example.com/a.pdf'></a>");
    let a = by_id(&tree, root, "x");
    assert!(sel("[lang|=en]").matches(&tree, a));
    assert!(sel("[rel~=noopener]").matches(&tree, a));
    assert!(sel("[href$='.pdf']").matches(&tree, a));
    assert!(!sel("[href^=https]").matches(&tree, a));
    assert!(sel("[href^=https i]").matches(&tree, a));
    assert!(sel("[href*=example]").matches(&tree, a));
    assert!(!sel("[href^='']").matches(&tree, a));
    assert!(!sel("[title]").matches(&tree, a));
}

#[test]
fn test_matches_descendant_with_backtracking() {
    let (tree, root) = setup("<article><div><b><div><span id=t></span></div></b></div></article>");
    let span = by_id(&tree, root, "t");
    // The nearest `div` ancestor is not the one whose parent is the article.
    assert!(sel("article > div span").matches(&tree, span));
    assert!(sel("div > span").matches(&tree, span));
    assert!(!sel("b > span").matches(&tree, span));
    assert!(!sel("article > span").matches(&tree, span));
}

#[test]
fn test_matches_sibling_combinators() {
    let (tree, root) = setup("<h1 id=h></h1>text<p id=a></p><p id=b></p>");
    let a = by_id(&tree, root, "a");
    let b = by_id(&tree, root, "b");
    assert!(sel("h1 + p").matches(&tree, a));
    assert!(!sel("h1 + p").matches(&tree, b));
    assert!(sel("h1 ~ p").matches(&tree, b));
    assert!(!sel("p ~ h1").matches(&tree, by_id(&tree, root, "h")));
}

#[test]
fn test_matches_structural_pseudo_classes() {
    let (tree, root) = setup("<ul><li id=a></li><b id=x></b><li id=b>t</li></ul>");
    let a = by_id(&tree, root, "a");
    let b = by_id(&tree, root, "b");
    let x = by_id(&tree, root, "x");
    assert!(sel("li:first-child").matches(&tree, a));
    assert!(sel("li:last-child").matches(&tree, b));
    assert!(sel("li:last-of-type").matches(&tree, b));
    assert!(sel("b:only-of-type").matches(&tree, x));
    assert!(!sel("li:only-of-type").matches(&tree, a));
    assert!(sel(":empty").matches(&tree, a));
    assert!(!sel(":empty").matches(&tree, b));
    assert!(sel("li:not(:empty)").matches(&tree, b));
}

#[test]
fn test_matches_root() {
    let tree = parse_document("<p>x</p>");
    let html = tree.document_element().expect("html");
    let body = tree.body().expect("body");
    assert!(sel(":root").matches(&tree, html));
    assert!(!sel(":root").matches(&tree, body));
}

#[test]
fn test_matches_form_state_pseudo_classes() {
    let (tree, root) = setup("<input id=c type=checkbox checked disabled><a id=l href=#>l</a>");
    let input = by_id(&tree, root, "c");
    assert!(sel(":checked").matches(&tree, input));
    assert!(sel(":disabled").matches(&tree, input));
    assert!(!sel(":enabled").matches(&tree, input));
    assert!(sel("a:link").matches(&tree, by_id(&tree, root, "l")));
}

// ========== traversal ==========

#[test]
fn test_closest_is_inclusive() {
    let (tree, root) = setup("<div class=card><p><span id=s></span></p></div>");
    let span = by_id(&tree, root, "s");
    assert_eq!(closest(&tree, span, &sel("span")), Some(span));
    let card = tree.children(root)[0];
    assert_eq!(closest(&tree, span, &sel(".card")), Some(card));
    assert_eq!(closest(&tree, span, &sel("section")), None);
}

#[test]
fn test_query_selector_all_in_tree_order() {
    let (tree, root) = setup("<p id=a><i id=b></i></p><i id=c></i>");
    let found = query_selector_all(&tree, root, &sel("p, i"));
    assert_eq!(
        found,
        vec![by_id(&tree, root, "a"), by_id(&tree, root, "b"), by_id(&tree, root, "c")]
    );
    assert!(query_selector_all(&tree, root, &sel("div")).is_empty());
}
