//! Selector parsing and matching.
//!
//! This crate implements the subset of
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/) that page
//! components use with `matches()`, `closest()` and `querySelector()`:
//! selector lists, compound selectors, the four combinators, attribute
//! selectors, structural pseudo-classes and `:not()`.
//!
//! Selectors are parsed once into a [`SelectorList`] and then matched any
//! number of times against nodes of a [`DomTree`](pagekit_dom::DomTree).
//!
//! ```ignore
//! let list: SelectorList = "ul.nav > li:first-child".parse()?;
//! if list.matches(&tree, node) { /* ... */ }
//! ```

mod matching;
mod parser;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use matching::{closest, query_selector, query_selector_all};

/// Why a selector string could not be parsed.
///
/// [§ 3.1 Parse a selector](https://www.w3.org/TR/selectors-4/#parse-a-selector):
/// "If the result is failure, ... throw a `SyntaxError`." Positions are
/// character offsets into the original input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The input (or one entry of a selector list) was blank.
    #[error("empty selector")]
    Empty,
    /// A character that cannot start or continue a selector here.
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Its character offset in the input.
        pos: usize,
    },
    /// A `>`, `+` or `~` with nothing after it.
    #[error("combinator without a selector after it at position {pos}")]
    DanglingCombinator {
        /// Character offset of the combinator.
        pos: usize,
    },
    /// `#`, `.`, `:` or `[` not followed by a name.
    #[error("expected a name after '{prefix}' at position {pos}")]
    MissingName {
        /// The character that needed a name.
        prefix: char,
        /// Its character offset in the input.
        pos: usize,
    },
    /// A quoted attribute value without its closing quote.
    #[error("unterminated string in attribute selector")]
    UnterminatedString,
    /// An attribute selector missing its closing `]`.
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
    /// A functional pseudo-class missing its closing `)`.
    #[error("unbalanced parentheses")]
    UnbalancedParens,
}

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors),
    /// stored lowercase. Examples: `div`, `mip-img`
    Type(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    /// that need tree context.
    PseudoClass(PseudoClass),

    /// [§ 4.3 The Negation Pseudo-class](https://www.w3.org/TR/selectors-4/#negation)
    ///
    /// "The negation pseudo-class, :not(), is a functional pseudo-class taking
    /// a selector list as an argument. It represents an element that is not
    /// represented by its argument."
    Not(SelectorList),

    /// Pseudo-classes and pseudo-elements that are accepted but can never
    /// match a static tree (`:hover`, `::before`, `:nth-child(2n)`, ...).
    NeverMatch,
}

/// Structural pseudo-classes per [§ 14 Tree-Structural pseudo-classes](https://www.w3.org/TR/selectors-4/#structural-pseudos)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    /// `:root` — "the root of the document"
    Root,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:first-of-type`
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:only-of-type`
    OnlyOfType,
    /// `:empty` — "an element that has no children except, optionally,
    /// document white space characters"
    Empty,
    /// `:link` — `a`/`area` with an `href`, all links count as unvisited
    Link,
    /// `:disabled` — has the `disabled` attribute
    Disabled,
    /// `:enabled` — lacks the `disabled` attribute
    Enabled,
    /// `:checked` — has the `checked` or `selected` attribute
    Checked,
}

/// The operator of an attribute selector with a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[attr=value]` — exactly `value`
    Equals,
    /// `[attr~=value]` — a whitespace-separated word equal to `value`
    Includes,
    /// `[attr|=value]` — `value` or `value-` prefix
    DashMatch,
    /// `[attr^=value]` — starts with `value`
    Prefix,
    /// `[attr$=value]` — ends with `value`
    Suffix,
    /// `[attr*=value]` — contains `value`
    Substring,
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Attribute name, lowercase.
    pub name: String,
    /// `None` for `[attr]` (presence only).
    pub operator: Option<(AttributeOperator, String)>,
    /// [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case):
    /// the `i` flag.
    pub case_insensitive: bool,
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The simple selectors that must all match.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A B`
    Descendant,
    /// `A > B`
    Child,
    /// `A + B`
    NextSibling,
    /// `A ~ B`
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Example: `div.container > ul.nav li` is stored as
/// ```text
/// subject: [li]
/// combinators: [(Descendant, [ul.nav]), (Child, [div.container])]
/// ```
/// i.e. right-to-left, the order matching walks the tree in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector (the subject of the selector).
    pub subject: CompoundSelector,
    /// Chain of (combinator, compound) pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#grouping)
///
/// "A list of simple/compound/complex selectors is a comma-separated list
/// ... It represents the union of the elements represented by each
/// selector in the list."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    /// The alternatives, in source order.
    pub selectors: Vec<ComplexSelector>,
    source: String,
}

impl SelectorList {
    /// Parse a selector list such as `"mip-img, .lazy > img"`.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] describing the first syntax problem.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let selectors = parser::parse_selector_list(input)?;
        Ok(Self {
            selectors,
            source: input.trim().to_string(),
        })
    }

    /// The selector text this list was parsed from, trimmed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
