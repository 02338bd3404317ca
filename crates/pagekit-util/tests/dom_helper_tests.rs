//! Integration tests for the DOM helpers, run against both a modern and a
//! legacy host so native and fallback lookups are held to the same answers.

use pagekit_dom::{DomTree, NodeId};
use pagekit_html::parse_document;
use pagekit_selector::{SelectorList, query_selector};
use pagekit_util::{
    Created, HostConfig, LookupStrategy, Window, closest, closest_to, contains, create, insert,
    is_element_node, is_framework_element, matches,
};

const PAGE: &str = "<div class=card id=card><p id=p><span id=s>x</span></p></div>\
                    <mip-img id=m src=a.png></mip-img>";

fn sel(s: &str) -> SelectorList {
    s.parse().unwrap_or_else(|e| panic!("failed to parse {s:?}: {e}"))
}

fn windows() -> [Window; 2] {
    [
        Window::with_document(parse_document(PAGE), &HostConfig::default()),
        Window::with_document(parse_document(PAGE), &HostConfig::legacy()),
    ]
}

fn by_id(window: &Window, id: &str) -> NodeId {
    query_selector(window.document(), NodeId::ROOT, &sel(&format!("#{id}")))
        .unwrap_or_else(|| panic!("no element with id {id}"))
}

fn tag(tree: &DomTree, node: NodeId) -> &str {
    tree.as_element(node).map_or("", |e| e.tag_name.as_str())
}

#[test]
fn test_platform_strategies() {
    let [modern, legacy] = windows();
    assert_eq!(modern.platform().closest, LookupStrategy::Native);
    assert_eq!(legacy.platform().contains, LookupStrategy::Fallback);
}

#[test]
fn test_matches() {
    for window in windows() {
        let span = by_id(&window, "s");
        assert!(matches(&window, span, &sel("div > p span")));
        assert!(matches(&window, span, &sel("em, span")));
        assert!(!matches(&window, span, &sel("p")));

        let text = window.document().children(span)[0];
        assert!(!matches(&window, text, &sel("*")));
        assert!(!matches(&window, NodeId::ROOT, &sel("*")));
        assert!(!matches(&window, NodeId(9999), &sel("*")));
    }
}

#[test]
fn test_matches_detached_element() {
    for mut window in windows() {
        let Some(Created::One(node)) = create(&mut window, "<b class=x><i></i></b>") else {
            panic!("expected one element");
        };
        assert!(matches(&window, node, &sel("b.x")));
        let inner = window.document().children(node)[0];
        assert!(matches(&window, inner, &sel("b > i")));
    }
}

#[test]
fn test_closest() {
    for window in windows() {
        let span = by_id(&window, "s");
        let card = by_id(&window, "card");
        assert_eq!(closest(&window, span, &sel("span")), Some(span));
        assert_eq!(closest(&window, span, &sel(".card")), Some(card));
        assert_eq!(closest(&window, span, &sel("section")), None);
        assert_eq!(closest(&window, NodeId(9999), &sel("*")), None);
    }
}

#[test]
fn test_contains() {
    for window in windows() {
        let span = by_id(&window, "s");
        let p = by_id(&window, "p");
        let card = by_id(&window, "card");
        assert!(contains(&window, NodeId::ROOT, span));
        assert!(contains(&window, card, span));
        assert!(contains(&window, span, span));
        assert!(!contains(&window, p, card));
        assert!(!contains(&window, card, NodeId(9999)));
    }
}

#[test]
fn test_closest_to() {
    for window in windows() {
        let span = by_id(&window, "s");
        let p = by_id(&window, "p");
        let card = by_id(&window, "card");
        assert_eq!(closest_to(&window, span, &sel("p"), card), Some(p));
        assert_eq!(closest_to(&window, span, &sel("div"), p), None);
        assert_eq!(closest_to(&window, span, &sel("section"), card), None);
    }
}

#[test]
fn test_create_single_and_many() {
    let mut window = Window::default();
    let Some(Created::One(div)) = create(&mut window, "<div id=x>a</div>") else {
        panic!("expected one element");
    };
    assert_eq!(tag(window.document(), div), "div");
    assert_eq!(window.document().parent(div), None);

    let Some(Created::Many(nodes)) = create(&mut window, "<p>1</p> text <!-- c --><p>2</p>") else {
        panic!("expected two elements");
    };
    assert_eq!(nodes.len(), 2);
    assert_eq!(window.document().text_content(nodes[0]), "1");
    assert_eq!(window.document().text_content(nodes[1]), "2");
    assert!(nodes.iter().all(|&n| window.document().parent(n).is_none()));
}

#[test]
fn test_create_without_elements() {
    let mut window = Window::default();
    assert_eq!(create(&mut window, ""), None);
    assert_eq!(create(&mut window, "only text"), None);
    // Leftover text from the previous call must not leak into this one.
    let created = create(&mut window, "<i></i>").map(Created::into_vec);
    let nodes = created.expect("one element");
    assert_eq!(nodes.len(), 1);
    assert_eq!(window.document().text_content(nodes[0]), "");
}

#[test]
fn test_create_drops_document_level_tags() {
    let mut window = Window::default();
    let Some(Created::One(p)) = create(&mut window, "<html><body><p>x</p></body></html>") else {
        panic!("expected the paragraph alone");
    };
    assert_eq!(tag(window.document(), p), "p");
    assert_eq!(window.document().text_content(p), "x");

    let Some(Created::One(title)) = create(&mut window, "<head><title>t</title></head>") else {
        panic!("expected the title alone");
    };
    assert_eq!(tag(window.document(), title), "title");
}

#[test]
fn test_create_grows_the_arena() {
    let mut window = Window::default();
    let before = window.document().len();
    let _ = create(&mut window, "lead<b></b>");
    assert_eq!(window.document().len(), before + 2);
}

#[test]
fn test_insert_appends_in_order() {
    for mut window in windows() {
        let body = window.document().body().expect("body");
        let created = create(&mut window, "<a></a><b></b><i></i>").expect("elements");
        let nodes = created.into_vec();
        insert(&mut window, body, nodes.clone());
        let children = window.document().children(body);
        assert_eq!(&children[children.len() - 3..], nodes.as_slice());
    }
}

#[test]
fn test_insert_skips_ancestors_of_parent() {
    for mut window in windows() {
        let p = by_id(&window, "p");
        let card = by_id(&window, "card");
        let Some(Created::One(extra)) = create(&mut window, "<em></em>") else {
            panic!("expected one element");
        };
        insert(&mut window, p, [card, p, extra]);
        assert_eq!(window.document().parent(card), Some(window.document().body().expect("body")));
        assert_eq!(window.document().children(p).last(), Some(&extra));
    }
}

#[test]
fn test_insert_notifies_observers() {
    let mut window = Window::default();
    let container = window.run_task(|tree| {
        let div = tree.create_element("div");
        tree.append_child(NodeId::ROOT, div);
        div
    });
    let mut ready = pagekit_util::wait_for_child(&mut window, container, |tree, node| {
        !tree.children(node).is_empty()
    });
    assert!(futures::FutureExt::now_or_never(&mut ready).is_none());
    let created = create(&mut window, "<span></span>").expect("element");
    insert(&mut window, container, created.into_vec());
    assert_eq!(futures::FutureExt::now_or_never(ready), Some(Ok(())));
}

#[test]
fn test_is_framework_element() {
    let [window, _] = windows();
    assert!(is_framework_element(&window, by_id(&window, "m")));
    assert!(!is_framework_element(&window, by_id(&window, "card")));
    let text = window.document().children(by_id(&window, "s"))[0];
    assert!(!is_framework_element(&window, text));
    assert!(!is_framework_element(&window, NodeId::ROOT));
}

#[test]
fn test_is_element_node() {
    let [window, _] = windows();
    let span = by_id(&window, "s");
    assert!(is_element_node(&window, span));
    assert!(!is_element_node(&window, window.document().children(span)[0]));
    assert!(!is_element_node(&window, NodeId::ROOT));
    assert!(!is_element_node(&window, NodeId(9999)));
}
