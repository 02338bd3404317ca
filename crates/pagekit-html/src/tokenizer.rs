use strum_macros::Display;

use crate::token::{Attribute, Token};

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#elements-2)
///
/// The content model the tokenizer is in. Only the three models a fragment
/// parser needs are distinguished.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TokenizerState {
    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    Data,
    /// [§ 13.2.5.2 RCDATA state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-state):
    /// text with character references, ended by the matching end tag
    /// (`<title>`, `<textarea>`).
    RcData(String),
    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state):
    /// text taken verbatim (`<style>`, `<script>`, ...).
    RawText(String),
}

/// Elements whose content is RCDATA.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

/// Elements whose content is raw text.
const RAWTEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];

/// [§ 13.5 Named character references](https://html.spec.whatwg.org/multipage/named-characters.html)
///
/// The handful of named references that show up in hand-written fragments.
/// Anything else is left in the text untouched.
const NAMED_REFERENCES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '©'),
    ("reg", '®'),
    ("hellip", '…'),
    ("mdash", '—'),
    ("ndash", '–'),
];

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "Implementations must act as if they used the following state machine to tokenize HTML."
///
/// A forgiving tokenizer for markup fragments. Instead of the full per-character
/// state machine it scans whole constructs (tags, comments, text runs) at a
/// time, switching content model after RCDATA and RAWTEXT start tags.
pub struct HTMLTokenizer {
    input: Vec<char>,
    pos: usize,
    state: TokenizerState,
    token_stream: Vec<Token>,
}

impl HTMLTokenizer {
    /// Create a new tokenizer for the given input.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            state: TokenizerState::Data,
            token_stream: Vec::new(),
        }
    }

    /// Consume the tokenizer and return the token stream.
    /// Call this after [`run`](Self::run) to get the tokens for the tree builder.
    #[must_use]
    pub fn into_tokens(self) -> Vec<Token> {
        self.token_stream
    }

    /// Tokenize `input` in one go.
    #[must_use]
    pub fn tokenize(input: &str) -> Vec<Token> {
        let mut tokenizer = Self::new(input);
        tokenizer.run();
        tokenizer.into_tokens()
    }

    /// Run the tokenizer to completion. The stream always ends with
    /// [`Token::EndOfFile`].
    pub fn run(&mut self) {
        while self.pos < self.input.len() {
            match std::mem::replace(&mut self.state, TokenizerState::Data) {
                TokenizerState::Data => self.data_state(),
                TokenizerState::RcData(end) => self.text_until_end_tag(&end, true),
                TokenizerState::RawText(end) => self.text_until_end_tag(&end, false),
            }
        }
        self.token_stream.push(Token::EndOfFile);
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn starts_with_ignore_case(&self, needle: &str) -> bool {
        let mut offset = 0;
        for expected in needle.chars() {
            match self.peek_at(offset) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => offset += 1,
                _ => return false,
            }
        }
        true
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn emit_text(&mut self, data: String) {
        if data.is_empty() {
            return;
        }
        if let Some(Token::Text { data: previous }) = self.token_stream.last_mut() {
            previous.push_str(&data);
        } else {
            self.token_stream.push(Token::Text { data });
        }
    }

    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    fn data_state(&mut self) {
        if self.peek() != Some('<') {
            let start = self.pos;
            while self.peek().is_some_and(|c| c != '<') {
                self.pos += 1;
            }
            let raw: String = self.input[start..self.pos].iter().collect();
            self.emit_text(decode_character_references(&raw));
            return;
        }

        match self.peek_at(1) {
            // [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
            Some('!') => self.markup_declaration(),
            // [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
            Some('/') if self.peek_at(2).is_some_and(|c| c.is_ascii_alphabetic()) => {
                self.end_tag();
            }
            // "U+003E GREATER-THAN SIGN (>): This is a missing-end-tag-name parse
            // error. Switch to the data state." (`</>` is dropped)
            Some('/') if self.peek_at(2) == Some('>') => self.pos += 3,
            Some('/' | '?') => {
                self.pos += 1;
                self.bogus_comment();
            }
            // [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
            Some(c) if c.is_ascii_alphabetic() => self.start_tag(),
            // "Anything else: This is an invalid-first-character-of-tag-name
            // parse error. Emit a U+003C LESS-THAN SIGN character token."
            _ => {
                self.pos += 1;
                self.emit_text("<".to_string());
            }
        }
    }

    fn markup_declaration(&mut self) {
        // Skip "<!"
        self.pos += 2;
        if self.starts_with_ignore_case("--") {
            self.pos += 2;
            let data = self.take_until("-->");
            self.token_stream.push(Token::Comment { data });
        } else if self.starts_with_ignore_case("doctype") {
            self.pos += "doctype".len();
            let body = self.take_until(">");
            let name = body
                .split_ascii_whitespace()
                .next()
                .map(str::to_ascii_lowercase);
            self.token_stream.push(Token::Doctype { name });
        } else {
            self.bogus_comment();
        }
    }

    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    fn bogus_comment(&mut self) {
        let data = self.take_until(">");
        self.token_stream.push(Token::Comment { data });
    }

    /// Collect characters up to `terminator`, consuming the terminator too.
    /// At EOF everything that is left is returned.
    fn take_until(&mut self, terminator: &str) -> String {
        let start = self.pos;
        while self.pos < self.input.len() {
            if self.starts_with_ignore_case(terminator) {
                let data = self.input[start..self.pos].iter().collect();
                self.pos += terminator.chars().count();
                return data;
            }
            self.pos += 1;
        }
        self.input[start..].iter().collect()
    }

    fn tag_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || c == '/' || c == '>' {
                break;
            }
            name.push(c.to_ascii_lowercase());
            self.pos += 1;
        }
        name
    }

    fn end_tag(&mut self) {
        // Skip "</"
        self.pos += 2;
        let name = self.tag_name();
        // Attributes on end tags are ignored.
        let _ = self.take_until(">");
        self.token_stream.push(Token::EndTag { name });
    }

    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    /// through [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state).
    fn start_tag(&mut self) {
        // Skip "<"
        self.pos += 1;
        let name = self.tag_name();
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                // "EOF: This is an eof-in-tag parse error. Emit an end-of-file token."
                None => {
                    self.pos = self.input.len();
                    return;
                }
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('/') => {
                    self.pos += 1;
                    if self.peek() == Some('>') {
                        self_closing = true;
                        self.pos += 1;
                        break;
                    }
                }
                Some(_) => {
                    let attribute = self.attribute();
                    // "if there is already an attribute on the token with the exact
                    // same name, then this is a duplicate-attribute parse error and
                    // the new attribute must be removed from the token."
                    if !attributes.iter().any(|a| a.name == attribute.name) {
                        attributes.push(attribute);
                    }
                }
            }
        }

        if RCDATA_ELEMENTS.contains(&name.as_str()) {
            self.state = TokenizerState::RcData(name.clone());
        } else if RAWTEXT_ELEMENTS.contains(&name.as_str()) {
            self.state = TokenizerState::RawText(name.clone());
        }

        self.token_stream.push(Token::StartTag {
            name,
            self_closing,
            attributes,
        });
    }

    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    fn attribute(&mut self) -> Attribute {
        let mut name = String::new();
        // "U+003D EQUALS SIGN (=) ... Start a new attribute ... Set that
        // attribute's name to the current input character" when `=` comes first.
        if self.peek() == Some('=') {
            name.push('=');
            self.pos += 1;
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || matches!(c, '/' | '>' | '=') {
                break;
            }
            name.push(c.to_ascii_lowercase());
            self.pos += 1;
        }

        self.skip_whitespace();
        if self.peek() != Some('=') {
            return Attribute::new(name, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();

        let raw = match self.peek() {
            // [§ 13.2.5.36 Attribute value (double-quoted) state]
            // [§ 13.2.5.37 Attribute value (single-quoted) state]
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                let raw: String = self.input[start..self.pos].iter().collect();
                if self.peek().is_some() {
                    self.pos += 1;
                }
                raw
            }
            // [§ 13.2.5.38 Attribute value (unquoted) state]
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_ascii_whitespace() && c != '>')
                {
                    self.pos += 1;
                }
                self.input[start..self.pos].iter().collect()
            }
        };

        Attribute::new(name, decode_character_references(&raw))
    }

    /// RCDATA / RAWTEXT content up to the "appropriate end tag token".
    fn text_until_end_tag(&mut self, end: &str, resolve_references: bool) {
        let start = self.pos;
        let closing = format!("</{end}");
        while self.pos < self.input.len() {
            if self.starts_with_ignore_case(&closing) {
                let after = self.peek_at(closing.chars().count());
                if after.is_none_or(|c| c.is_ascii_whitespace() || c == '/' || c == '>') {
                    break;
                }
            }
            self.pos += 1;
        }
        let raw: String = self.input[start..self.pos].iter().collect();
        let data = if resolve_references {
            decode_character_references(&raw)
        } else {
            raw
        };
        self.emit_text(data);
        // The end tag itself, if present, is tokenized in the data state.
    }
}

/// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
///
/// Resolves numeric references and the named references in
/// `NAMED_REFERENCES`. References that cannot be resolved are kept verbatim.
#[must_use]
pub fn decode_character_references(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match resolve_reference(rest) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve the reference at the start of `input` (which begins with `&`),
/// returning the character and the number of bytes consumed.
fn resolve_reference(input: &str) -> Option<(char, usize)> {
    let semicolon = input.find(';')?;
    let body = &input[1..semicolon];

    // [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
    let ch = if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        // "If the number is 0x00 ... or a surrogate ... or greater than
        // 0x10FFFF, then set the character reference code to 0xFFFD."
        char::from_u32(code)
            .filter(|&c| c != '\0')
            .unwrap_or('\u{fffd}')
    } else {
        NAMED_REFERENCES
            .iter()
            .find(|(name, _)| *name == body)
            .map(|&(_, ch)| ch)?
    };

    Some((ch, semicolon + 1))
}
