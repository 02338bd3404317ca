//! Matching parsed selectors against nodes of a [`DomTree`].

use pagekit_dom::{DomTree, ElementData, NodeId, NodeType};

use crate::{
    AttributeOperator, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    PseudoClass, SelectorList, SimpleSelector,
};

impl SelectorList {
    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    ///
    /// Whether `node` is an element matched by any selector in the list.
    /// Non-element nodes and ids not in `tree` never match.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|selector| complex_matches(selector, tree, node))
    }
}

/// [§ 6.7 closest()](https://dom.spec.whatwg.org/#dom-element-closest)
///
/// "The closest(selectors) method steps are: ... For each element in this's
/// inclusive ancestors, if match a selector against an element with s and
/// element returns true, return element. Return null."
#[must_use]
pub fn closest(tree: &DomTree, node: NodeId, selectors: &SelectorList) -> Option<NodeId> {
    tree.inclusive_ancestors(node)
        .find(|&candidate| selectors.matches(tree, candidate))
}

/// [§ 4.2.6 querySelector()](https://dom.spec.whatwg.org/#dom-parentnode-queryselector)
///
/// The first descendant of `scope`, in tree order, matching `selectors`.
#[must_use]
pub fn query_selector(tree: &DomTree, scope: NodeId, selectors: &SelectorList) -> Option<NodeId> {
    tree.descendants(scope)
        .find(|&candidate| selectors.matches(tree, candidate))
}

/// [§ 4.2.6 querySelectorAll()](https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall)
///
/// All descendants of `scope` matching `selectors`, in tree order.
#[must_use]
pub fn query_selector_all(tree: &DomTree, scope: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
    tree.descendants(scope)
        .filter(|&candidate| selectors.matches(tree, candidate))
        .collect()
}

fn complex_matches(selector: &ComplexSelector, tree: &DomTree, node: NodeId) -> bool {
    compound_matches(&selector.subject, tree, node)
        && combinators_match(&selector.combinators, tree, node)
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
///
/// `chain` runs right-to-left from the element that already matched. For
/// descendant and subsequent-sibling combinators every candidate is tried,
/// so `div p > span` still matches when the nearest `div` ancestor is not
/// the one that leads to a `p` parent.
fn combinators_match(
    chain: &[(Combinator, CompoundSelector)],
    tree: &DomTree,
    current: NodeId,
) -> bool {
    let Some(((combinator, compound), rest)) = chain.split_first() else {
        return true;
    };

    let try_candidate =
        |candidate: NodeId| compound_matches(compound, tree, candidate) && combinators_match(rest, tree, candidate);

    match combinator {
        // [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
        // "A selector of the form 'A B' represents an element B that is an
        // arbitrary descendant of some ancestor element A."
        Combinator::Descendant => tree.ancestors(current).any(try_candidate),

        // [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators)
        // "A selector of the form 'A > B' represents an element B that is a
        // direct child of element A."
        Combinator::Child => tree.parent(current).is_some_and(try_candidate),

        // [§ 16.3 Next-sibling combinator](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators)
        // "A selector of the form 'A + B' represents an element B that
        // immediately follows element A, where A and B share the same parent."
        Combinator::NextSibling => tree
            .preceding_siblings(current)
            .find(|&sibling| tree.is_element(sibling))
            .is_some_and(try_candidate),

        // [§ 16.4 Subsequent-sibling combinator](https://www.w3.org/TR/selectors-4/#general-sibling-combinators)
        // "A selector of the form 'A ~ B' represents an element B that follows
        // element A (not necessarily immediately), where A and B share the
        // same parent."
        Combinator::SubsequentSibling => tree.preceding_siblings(current).any(try_candidate),
    }
}

fn compound_matches(compound: &CompoundSelector, tree: &DomTree, node: NodeId) -> bool {
    let Some(element) = tree.as_element(node) else {
        return false;
    };
    compound
        .simple_selectors
        .iter()
        .all(|simple| simple_matches(simple, tree, node, element))
}

fn simple_matches(simple: &SimpleSelector, tree: &DomTree, node: NodeId, element: &ElementData) -> bool {
    match simple {
        // [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
        SimpleSelector::Type(name) => element.tag_name.eq_ignore_ascii_case(name),

        // [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
        SimpleSelector::Class(class) => element.classes().contains(class.as_str()),

        // [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
        SimpleSelector::Id(id) => element.id().is_some_and(|own| own == id),

        SimpleSelector::Universal => true,

        SimpleSelector::Attribute(attribute) => attribute_matches(attribute, element),

        SimpleSelector::PseudoClass(pseudo) => pseudo_class_matches(*pseudo, tree, node, element),

        SimpleSelector::Not(list) => !list.matches(tree, node),

        SimpleSelector::NeverMatch => false,
    }
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
fn attribute_matches(selector: &AttributeSelector, element: &ElementData) -> bool {
    let Some(actual) = element.attrs.get(&selector.name) else {
        return false;
    };
    let Some((operator, expected)) = &selector.operator else {
        return true;
    };

    // [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
    let (actual, expected) = if selector.case_insensitive {
        (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
    } else {
        (actual.clone(), expected.clone())
    };

    match operator {
        AttributeOperator::Equals => actual == expected,
        AttributeOperator::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|word| word == expected)
        }
        AttributeOperator::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        // "If 'val' is the empty string then the selector does not represent
        // anything." (same for $= and *=)
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

/// [§ 14 Tree-Structural pseudo-classes](https://www.w3.org/TR/selectors-4/#structural-pseudos)
fn pseudo_class_matches(pseudo: PseudoClass, tree: &DomTree, node: NodeId, element: &ElementData) -> bool {
    let same_type = |sibling: NodeId| {
        tree.as_element(sibling)
            .is_some_and(|other| other.tag_name == element.tag_name)
    };
    let no_element_before = |pred: &dyn Fn(NodeId) -> bool| !tree.preceding_siblings(node).any(pred);
    let no_element_after = |pred: &dyn Fn(NodeId) -> bool| {
        let mut next = tree.next_sibling(node);
        while let Some(sibling) = next {
            if pred(sibling) {
                return false;
            }
            next = tree.next_sibling(sibling);
        }
        true
    };
    let is_element = |sibling: NodeId| tree.is_element(sibling);
    let has_parent = tree.parent(node).is_some();

    match pseudo {
        // "The :root pseudo-class represents an element that is the root of
        // the document."
        PseudoClass::Root => tree.document_element() == Some(node),

        PseudoClass::FirstChild => has_parent && no_element_before(&is_element),
        PseudoClass::LastChild => has_parent && no_element_after(&is_element),
        PseudoClass::OnlyChild => {
            has_parent && no_element_before(&is_element) && no_element_after(&is_element)
        }

        PseudoClass::FirstOfType => has_parent && no_element_before(&same_type),
        PseudoClass::LastOfType => has_parent && no_element_after(&same_type),
        PseudoClass::OnlyOfType => {
            has_parent && no_element_before(&same_type) && no_element_after(&same_type)
        }

        // [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
        // Comments do not count; text of any kind does.
        PseudoClass::Empty => tree.children(node).iter().all(|&child| {
            match tree.get(child).map(|n| &n.node_type) {
                Some(NodeType::Comment(_)) | None => true,
                Some(NodeType::Text(text)) => text.is_empty(),
                Some(_) => false,
            }
        }),

        // [§ 9.2 :link](https://www.w3.org/TR/selectors-4/#link)
        PseudoClass::Link => {
            matches!(element.tag_name.as_str(), "a" | "area") && element.attrs.contains_key("href")
        }

        PseudoClass::Disabled => element.attrs.contains_key("disabled"),
        PseudoClass::Enabled => !element.attrs.contains_key("disabled"),

        // [§ 10.2 :checked](https://www.w3.org/TR/selectors-4/#checked)
        PseudoClass::Checked => match element.tag_name.as_str() {
            "option" => element.attrs.contains_key("selected"),
            _ => element.attrs.contains_key("checked"),
        },
    }
}
