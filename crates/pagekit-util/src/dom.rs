//! Selector, containment and fragment helpers used by page components.
//!
//! Each lookup honours the window's [`Platform`]: the native variant uses
//! the tree's own methods, the fallback walks the tree by hand the way a
//! polyfill on an old host would. Both give the same answers for nodes in
//! the document.
//!
//! [`Platform`]: crate::Platform

use pagekit_dom::{DomTree, NodeId};
use pagekit_html::parse_fragment;
use pagekit_selector::SelectorList;
use tracing::trace;

use crate::platform::{LookupStrategy, Platform};
use crate::window::Window;

/// Tag-name prefix of framework custom elements.
pub const FRAMEWORK_TAG_PREFIX: &str = "mip-";

/// Top-level elements produced by [`create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Created {
    /// The markup had exactly one top-level element.
    One(NodeId),
    /// Two or more top-level elements, in document order.
    Many(Vec<NodeId>),
}

impl Created {
    /// All created elements, in document order.
    #[must_use]
    pub fn into_vec(self) -> Vec<NodeId> {
        match self {
            Self::One(node) => vec![node],
            Self::Many(nodes) => nodes,
        }
    }
}

/// [§ 4.9 matches()](https://dom.spec.whatwg.org/#dom-element-matches)
///
/// Whether `node` is an element matching `selectors`. Text, comments, the
/// document itself and ids not in the tree never match.
#[must_use]
pub fn matches(window: &Window, node: NodeId, selectors: &SelectorList) -> bool {
    matches_with(window.platform(), window.document(), node, selectors)
}

fn matches_with(platform: Platform, tree: &DomTree, node: NodeId, selectors: &SelectorList) -> bool {
    if !tree.is_element(node) {
        return false;
    }
    match platform.matches {
        LookupStrategy::Native => selectors.matches(tree, node),
        // Scan everything under the node's root for it.
        LookupStrategy::Fallback => {
            let root = tree.inclusive_ancestors(node).last().unwrap_or(node);
            std::iter::once(root)
                .chain(tree.descendants(root))
                .filter(|&candidate| selectors.matches(tree, candidate))
                .any(|candidate| candidate == node)
        }
    }
}

/// [§ 4.9 closest()](https://dom.spec.whatwg.org/#dom-element-closest)
///
/// The nearest inclusive ancestor of `node` matching `selectors`.
#[must_use]
pub fn closest(window: &Window, node: NodeId, selectors: &SelectorList) -> Option<NodeId> {
    let platform = window.platform();
    let tree = window.document();
    match platform.closest {
        LookupStrategy::Native => pagekit_selector::closest(tree, node, selectors),
        LookupStrategy::Fallback => {
            let mut current = tree.contains_id(node).then_some(node);
            while let Some(candidate) = current {
                if matches_with(platform, tree, candidate, selectors) {
                    return Some(candidate);
                }
                current = tree.parent(candidate);
            }
            None
        }
    }
}

/// [§ 4.4 contains()](https://dom.spec.whatwg.org/#dom-node-contains)
///
/// Whether `node` is `container` or one of its descendants.
#[must_use]
pub fn contains(window: &Window, container: NodeId, node: NodeId) -> bool {
    contains_with(window.platform(), window.document(), container, node)
}

fn contains_with(platform: Platform, tree: &DomTree, container: NodeId, node: NodeId) -> bool {
    match platform.contains {
        LookupStrategy::Native => tree.contains(container, node),
        LookupStrategy::Fallback => {
            // The walk follows parent elements, so the document stands in
            // for its document element.
            let container = if container == NodeId::ROOT {
                match tree.document_element() {
                    Some(element) => element,
                    None => return false,
                }
            } else {
                container
            };
            let mut current = tree.contains_id(node).then_some(node);
            while let Some(candidate) = current {
                if candidate == container {
                    return true;
                }
                current = tree.parent_element(candidate);
            }
            false
        }
    }
}

/// The nearest inclusive ancestor of `node` matching `selectors`, provided
/// it lies within `boundary`.
#[must_use]
pub fn closest_to(
    window: &Window,
    node: NodeId,
    selectors: &SelectorList,
    boundary: NodeId,
) -> Option<NodeId> {
    closest(window, node, selectors).filter(|&found| contains(window, boundary, found))
}

/// Parse `html` and return its top-level elements, detached from any tree.
///
/// Top-level text and comments are discarded. Returns `None` when the
/// markup has no top-level element. The scratch container used for parsing
/// is emptied afterwards in every case.
///
/// The document's arena never frees nodes, so every call grows
/// [`DomTree::len`] by the nodes it parsed, discarded text and comments
/// included.
pub fn create(window: &mut Window, html: &str) -> Option<Created> {
    let scratch = window.scratch();
    let mut elements = window.run_task(|tree| {
        let _ = parse_fragment(tree, scratch, html);
        let elements = tree.element_children(scratch);
        let _ = tree.remove_all_children(scratch);
        elements
    });
    trace!(count = elements.len(), "created elements from markup");
    match elements.len() {
        0 => None,
        1 => elements.pop().map(Created::One),
        _ => Some(Created::Many(elements)),
    }
}

/// Append `children` to `parent` in order.
///
/// A child that is `parent` itself or one of its ancestors is skipped, as
/// appending it would create a cycle. An unknown `parent` is ignored.
pub fn insert<I>(window: &mut Window, parent: NodeId, children: I)
where
    I: IntoIterator<Item = NodeId>,
{
    if !window.document().contains_id(parent) {
        return;
    }
    let platform = window.platform();
    window.run_task(|tree| {
        for child in children {
            if contains_with(platform, tree, child, parent) {
                trace!(?child, ?parent, "skipping insert of an ancestor");
                continue;
            }
            tree.append_child(parent, child);
        }
    });
}

/// Whether `node` is a framework custom element (`<mip-*>`).
#[must_use]
pub fn is_framework_element(window: &Window, node: NodeId) -> bool {
    window
        .document()
        .as_element(node)
        .is_some_and(|element| element.tag_name.to_ascii_lowercase().starts_with(FRAMEWORK_TAG_PREFIX))
}

/// Whether `node` is an element (`nodeType == ELEMENT_NODE`).
#[must_use]
pub fn is_element_node(window: &Window, node: NodeId) -> bool {
    window.document().is_element(node)
}
