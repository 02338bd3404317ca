//! Selector text to [`ComplexSelector`]s.
//!
//! A small recursive-descent parser over characters. Positions in errors are
//! character offsets so they line up with what a user typed.

use pagekit_common::warn_once;

use crate::{
    AttributeOperator, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    PseudoClass, SelectorError, SelectorList, SimpleSelector,
};

type Result<T> = std::result::Result<T, SelectorError>;

/// [§ 4.3.9 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
/// "A letter, a non-ASCII code point, or U+005F LOW LINE (_)."
const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
/// "An ident-start code point, a digit, or U+002D HYPHEN-MINUS (-)."
const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

pub(crate) fn parse_selector_list(input: &str) -> Result<Vec<ComplexSelector>> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
    };
    let selectors = parser.selector_list(false)?;
    match parser.peek() {
        None => Ok(selectors),
        Some(ch) => Err(SelectorError::UnexpectedChar {
            ch,
            pos: parser.pos,
        }),
    }
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Returns whether any whitespace was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::UnexpectedChar { ch, pos: self.pos },
            None => SelectorError::Empty,
        }
    }

    /// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#grouping)
    ///
    /// Inside `:not(...)` the list stops at the closing parenthesis, which is
    /// left for the caller to consume.
    fn selector_list(&mut self, nested: bool) -> Result<Vec<ComplexSelector>> {
        let mut selectors = Vec::new();
        loop {
            let _ = self.skip_whitespace();
            if matches!(self.peek(), None | Some(',')) || (nested && self.peek() == Some(')')) {
                return Err(SelectorError::Empty);
            }
            selectors.push(self.complex()?);
            let _ = self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') if nested => return Ok(selectors),
                None if !nested => return Ok(selectors),
                None => return Err(SelectorError::UnbalancedParens),
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    /// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
    ///
    /// Parses left-to-right, then reverses so the rightmost compound (the
    /// subject) comes first.
    fn complex(&mut self) -> Result<ComplexSelector> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',' | ')') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                // [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
                // "A descendant combinator is whitespace that separates two
                // compound selectors."
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };

            if combinator != Combinator::Descendant {
                let at = self.pos;
                self.pos += 1;
                let _ = self.skip_whitespace();
                if matches!(self.peek(), None | Some(',' | ')')) {
                    return Err(SelectorError::DanglingCombinator { pos: at });
                }
            }

            combinators.push(combinator);
            compounds.push(self.compound()?);
        }

        let mut compounds = compounds.into_iter().rev();
        let subject = compounds.next().ok_or(SelectorError::Empty)?;
        Ok(ComplexSelector {
            subject,
            combinators: combinators.into_iter().rev().zip(compounds).collect(),
        })
    }

    /// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
    fn compound(&mut self) -> Result<CompoundSelector> {
        let mut simple_selectors = Vec::new();

        // "If it contains a type selector or universal selector, that selector
        // must come first in the sequence."
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                simple_selectors.push(SimpleSelector::Universal);
            }
            Some(c) if is_ident_start_char(c) || c == '-' || c == '\\' => {
                let name = self.ident();
                simple_selectors.push(SimpleSelector::Type(name.to_ascii_lowercase()));
            }
            _ => {}
        }

        loop {
            let at = self.pos;
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    let id = self.required_ident('#', at)?;
                    simple_selectors.push(SimpleSelector::Id(id));
                }
                Some('.') => {
                    self.pos += 1;
                    let class = self.required_ident('.', at)?;
                    simple_selectors.push(SimpleSelector::Class(class));
                }
                Some('[') => {
                    self.pos += 1;
                    let attribute = self.attribute(at)?;
                    simple_selectors.push(SimpleSelector::Attribute(attribute));
                }
                Some(':') => {
                    self.pos += 1;
                    let pseudo = self.pseudo(at)?;
                    simple_selectors.push(pseudo);
                }
                _ => break,
            }
        }

        if simple_selectors.is_empty() {
            return Err(self.unexpected());
        }
        Ok(CompoundSelector { simple_selectors })
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    ///
    /// Backslash escapes take the next character literally (`.a\:b`).
    fn ident(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.bump() {
                    name.push(escaped);
                }
            } else if is_ident_char(c) {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    fn required_ident(&mut self, prefix: char, pos: usize) -> Result<String> {
        let name = self.ident();
        if name.is_empty() {
            return Err(SelectorError::MissingName { prefix, pos });
        }
        Ok(name)
    }

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    ///
    /// Called after the opening `[`.
    fn attribute(&mut self, open: usize) -> Result<AttributeSelector> {
        let _ = self.skip_whitespace();
        let name = self.required_ident('[', open)?.to_ascii_lowercase();
        let _ = self.skip_whitespace();

        let operator = match (self.peek(), self.peek_at(1)) {
            (Some(']'), _) => {
                self.pos += 1;
                return Ok(AttributeSelector {
                    name,
                    operator: None,
                    case_insensitive: false,
                });
            }
            (Some('='), _) => {
                self.pos += 1;
                AttributeOperator::Equals
            }
            (Some(c), Some('=')) => {
                let op = match c {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    '*' => AttributeOperator::Substring,
                    _ => return Err(self.unexpected()),
                };
                self.pos += 2;
                op
            }
            (None, _) => return Err(SelectorError::UnterminatedAttribute),
            _ => return Err(self.unexpected()),
        };

        let _ = self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some('\\') => {
                            if let Some(escaped) = self.bump() {
                                value.push(escaped);
                            }
                        }
                        Some(c) => value.push(c),
                        None => return Err(SelectorError::UnterminatedString),
                    }
                }
                value
            }
            Some(_) => {
                let value = self.ident();
                if value.is_empty() {
                    return Err(self.unexpected());
                }
                value
            }
            None => return Err(SelectorError::UnterminatedAttribute),
        };

        let _ = self.skip_whitespace();
        // [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
        let mut case_insensitive = false;
        if let Some(flag @ ('i' | 'I' | 's' | 'S')) = self.peek() {
            case_insensitive = flag.eq_ignore_ascii_case(&'i');
            self.pos += 1;
            let _ = self.skip_whitespace();
        }

        match self.bump() {
            Some(']') => Ok(AttributeSelector {
                name,
                operator: Some((operator, value)),
                case_insensitive,
            }),
            None => Err(SelectorError::UnterminatedAttribute),
            Some(ch) => Err(SelectorError::UnexpectedChar {
                ch,
                pos: self.pos - 1,
            }),
        }
    }

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    /// [§ 11 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
    ///
    /// Called after the first `:`.
    fn pseudo(&mut self, colon: usize) -> Result<SimpleSelector> {
        let is_pseudo_element = self.peek() == Some(':');
        if is_pseudo_element {
            self.pos += 1;
        }
        let name = self.required_ident(':', colon)?.to_ascii_lowercase();

        if self.peek() == Some('(') {
            self.pos += 1;
            if name == "not" && !is_pseudo_element {
                let start = self.pos;
                let selectors = self.selector_list(true)?;
                let source: String = self.chars[start..self.pos].iter().collect();
                // Consume ')'
                self.pos += 1;
                return Ok(SimpleSelector::Not(SelectorList {
                    selectors,
                    source: source.trim().to_string(),
                }));
            }
            self.skip_balanced_parens()?;
            let _ = warn_once("Selector", &format!("unsupported :{name}() never matches"));
            return Ok(SimpleSelector::NeverMatch);
        }

        if is_pseudo_element {
            return Ok(SimpleSelector::NeverMatch);
        }

        let pseudo = match name.as_str() {
            "root" => PseudoClass::Root,
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            "first-of-type" => PseudoClass::FirstOfType,
            "last-of-type" => PseudoClass::LastOfType,
            "only-of-type" => PseudoClass::OnlyOfType,
            "empty" => PseudoClass::Empty,
            "link" | "any-link" => PseudoClass::Link,
            "disabled" => PseudoClass::Disabled,
            "enabled" => PseudoClass::Enabled,
            "checked" => PseudoClass::Checked,
            // Legacy single-colon pseudo-elements and interactive states.
            "before" | "after" | "first-line" | "first-letter" | "hover" | "focus" | "active"
            | "visited" | "focus-within" | "focus-visible" | "target" => {
                return Ok(SimpleSelector::NeverMatch);
            }
            _ => {
                let _ = warn_once("Selector", &format!("unknown pseudo-class :{name} never matches"));
                return Ok(SimpleSelector::NeverMatch);
            }
        };
        Ok(SimpleSelector::PseudoClass(pseudo))
    }

    /// Skip the argument of a functional pseudo-class, after its `(`.
    fn skip_balanced_parens(&mut self) -> Result<()> {
        let mut depth = 1u32;
        while let Some(c) = self.bump() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(SelectorError::UnbalancedParens)
    }
}
