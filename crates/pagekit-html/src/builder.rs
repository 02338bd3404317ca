//! Tree construction for fragments and small documents.
//!
//! [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
//!
//! This is not the full insertion-mode machine. It keeps a stack of open
//! elements, knows which elements are void, applies the common implied end
//! tags (`p`, `li`, `dt`/`dd`, `option`), and in document mode synthesizes the
//! `html`/`head`/`body` skeleton.

use pagekit_common::warn_once;
use pagekit_dom::{DomTree, ElementData, NodeId, NodeType};

use crate::token::Token;

/// [§ 13.1.2 Void elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Start tags that close an open `p` element
/// ("If the stack of open elements has a p element in button scope, then
/// close a p element.").
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Tags that only make sense at document level.
const DOCUMENT_LEVEL: &[&str] = &["html", "head", "body"];

/// Elements that belong in `head` when they appear before any body content.
const HEAD_ELEMENTS: &[&str] = &["base", "link", "meta", "noscript", "script", "style", "title"];

/// Whether the builder fills an existing context node or a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// [§ 13.4 Parsing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments):
    /// nodes are inserted under the context element as-is. `html`, `head`
    /// and `body` tags are dropped and their contents kept, as "in body"
    /// does for them.
    Fragment,
    /// Nodes are inserted under the Document with an implied
    /// `html`/`head`/`body` skeleton.
    Document,
}

/// Builds DOM nodes from a token stream into an existing [`DomTree`].
pub struct TreeBuilder<'a> {
    tree: &'a mut DomTree,
    mode: BuildMode,
    /// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    ///
    /// The bottom entry is the context node (or the Document) and is never popped.
    open_elements: Vec<NodeId>,
    head: Option<NodeId>,
    body: Option<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    /// Prepare to insert nodes under `context`.
    #[must_use]
    pub fn new(tree: &'a mut DomTree, context: NodeId, mode: BuildMode) -> Self {
        Self {
            tree,
            mode,
            open_elements: vec![context],
            head: None,
            body: None,
        }
    }

    /// Consume the tokens. Returns the nodes that were inserted directly
    /// under the context node, in document order.
    pub fn run(mut self, tokens: Vec<Token>) -> Vec<NodeId> {
        let context = self.open_elements[0];
        let before = self.tree.children(context).len();

        for token in tokens {
            match token {
                Token::Doctype { .. } => {
                    if self.mode == BuildMode::Fragment {
                        let _ = warn_once("HTML", "DOCTYPE ignored inside a fragment");
                    }
                }
                Token::Comment { data } => {
                    let comment = self.tree.alloc(NodeType::Comment(data));
                    let parent = self.current_node();
                    self.tree.append_child(parent, comment);
                }
                Token::Text { data } => self.insert_text(data),
                Token::StartTag {
                    name,
                    self_closing,
                    attributes,
                } => {
                    let mut element = ElementData::new(&name);
                    for attr in attributes {
                        let _ = element.attrs.insert(attr.name, attr.value);
                    }
                    self.insert_element(element, self_closing);
                }
                Token::EndTag { name } => self.close_element(&name),
                Token::EndOfFile => break,
            }
        }

        if self.mode == BuildMode::Document {
            let _ = self.ensure_body();
        }

        self.tree.children(context)[before..].to_vec()
    }

    fn current_node(&self) -> NodeId {
        self.open_elements
            .last()
            .copied()
            .unwrap_or(self.open_elements[0])
    }

    fn current_tag(&self) -> Option<&str> {
        if self.open_elements.len() < 2 {
            return None;
        }
        self.tree
            .as_element(self.current_node())
            .map(|e| e.tag_name.as_str())
    }

    fn insert_text(&mut self, data: String) {
        let outside_content = self.open_elements.len() < 2 || Some(self.current_node()) == self.head;
        if self.mode == BuildMode::Document && self.body.is_none() && outside_content {
            // Whitespace between skeleton elements is dropped.
            if data.chars().all(|c| c.is_ascii_whitespace()) {
                return;
            }
            let body = self.ensure_body();
            self.open_elements.truncate(1);
            self.open_elements.push(body);
        }
        let parent = self.current_node();
        let text = self.tree.alloc(NodeType::Text(data));
        self.tree.append_child(parent, text);
    }

    fn insert_element(&mut self, element: ElementData, self_closing: bool) {
        let name = element.tag_name.clone();

        let mode = self.mode;
        match mode {
            BuildMode::Document if self.place_document_element(&name, &element) => return,
            BuildMode::Fragment if DOCUMENT_LEVEL.contains(&name.as_str()) => {
                let _ = warn_once("HTML", &format!("<{name}> ignored inside a fragment"));
                return;
            }
            _ => {}
        }

        // [§ 13.2.6.4.7 "in body"](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
        // implied end tags.
        if CLOSES_P.contains(&name.as_str()) && self.current_tag() == Some("p") {
            let _ = self.open_elements.pop();
        }
        match name.as_str() {
            "li" => self.close_if_current(&["li"]),
            "dt" | "dd" => self.close_if_current(&["dt", "dd"]),
            "option" => self.close_if_current(&["option"]),
            _ => {}
        }

        let parent = self.current_node();
        let id = self.tree.alloc(NodeType::Element(element));
        self.tree.append_child(parent, id);

        // "Acknowledge the token's self-closing flag, if it is set." Only
        // void elements honour it; `<div/>` stays open as in browsers.
        let is_void = VOID_ELEMENTS.contains(&name.as_str());
        if self_closing && !is_void {
            let _ = warn_once(
                "HTML",
                &format!("self-closing flag on non-void element <{name}/> ignored"),
            );
        }
        if !is_void {
            self.open_elements.push(id);
        }
    }

    fn close_if_current(&mut self, tags: &[&str]) {
        if self.current_tag().is_some_and(|t| tags.contains(&t)) {
            let _ = self.open_elements.pop();
        }
    }

    /// Document mode: route `html`, `head`, `body` and the content before
    /// the body into the skeleton. Returns `true` if the element was handled.
    fn place_document_element(&mut self, name: &str, element: &ElementData) -> bool {
        match name {
            "html" => {
                let html = self.ensure_html();
                self.merge_attributes(html, element);
                true
            }
            "head" => {
                let _ = self.ensure_head();
                true
            }
            "body" => {
                let body = self.ensure_body();
                self.merge_attributes(body, element);
                self.open_elements.truncate(1);
                self.open_elements.push(body);
                true
            }
            _ if self.body.is_none() => {
                let parent = if HEAD_ELEMENTS.contains(&name) {
                    self.ensure_head()
                } else {
                    self.ensure_body()
                };
                self.open_elements.truncate(1);
                self.open_elements.push(parent);
                false
            }
            _ => false,
        }
    }

    /// "If the attribute is already present on the top element of the stack
    /// of open elements, then ignore the attribute. Otherwise add it."
    fn merge_attributes(&mut self, target: NodeId, element: &ElementData) {
        for (name, value) in &element.attrs {
            if self.tree.attribute(target, name).is_none() {
                self.tree.set_attribute(target, name, value);
            }
        }
    }

    fn ensure_html(&mut self) -> NodeId {
        if let Some(html) = self.tree.document_element() {
            return html;
        }
        let html = self.tree.create_element("html");
        self.tree.append_child(NodeId::ROOT, html);
        html
    }

    fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head {
            return head;
        }
        let html = self.ensure_html();
        let head = self.tree.create_element("head");
        match self.body {
            Some(body) => self.tree.insert_before(html, head, body),
            None => self.tree.append_child(html, head),
        }
        self.head = Some(head);
        head
    }

    fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }
        let _ = self.ensure_head();
        let html = self.ensure_html();
        let body = self.tree.create_element("body");
        self.tree.append_child(html, body);
        self.body = Some(body);
        body
    }

    /// [§ 13.2.6.4.7 "Any other end tag"](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    ///
    /// Pop up to and including the nearest open element with the same name.
    /// End tags with no matching open element are ignored.
    fn close_element(&mut self, name: &str) {
        if DOCUMENT_LEVEL.contains(&name) {
            if self.mode == BuildMode::Document && name == "head" {
                self.open_elements.truncate(1);
            }
            return;
        }

        let position = self.open_elements[1..].iter().rposition(|&id| {
            self.tree
                .as_element(id)
                .is_some_and(|e| e.tag_name == name)
        });
        match position {
            Some(index) => self.open_elements.truncate(index + 1),
            None => {
                let _ = warn_once("HTML", &format!("ignoring stray end tag </{name}>"));
            }
        }
    }
}
