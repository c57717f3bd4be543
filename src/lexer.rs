//! Low-level tokenization of TeX input.
//!
//! The lexer cuts the input into [`Token`]s: coalesced whitespace, control
//! words (`\frac`), control symbols (`\%`), whole `\verb` constructs and
//! ordinary characters with their trailing combining marks attached. The end
//! of input is reported as a token whose text is `"EOF"`.

use std::collections::HashMap;

/// A half-open byte range into the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub start: usize,
    pub end: usize,
}

impl SourceLocation {
    /// Span covering `first` through `last`, when both carry locations.
    pub fn range(first: &Token, last: &Token) -> Option<SourceLocation> {
        SourceLocation::span(first.loc, last.loc)
    }

    /// Union of two optional spans.
    pub fn span(a: Option<SourceLocation>, b: Option<SourceLocation>) -> Option<SourceLocation> {
        match (a, b) {
            (Some(a), Some(b)) => Some(SourceLocation { start: a.start, end: b.end }),
            _ => None,
        }
    }
}

/// A lexed token: a control sequence name (with its backslash), a single
/// character (possibly with combining marks), a space, or the `"EOF"`
/// sentinel.
///
/// Tokens produced by macro expansion carry no location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub text: String,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
}

impl Token {
    pub fn new(text: impl Into<String>, loc: Option<SourceLocation>) -> Self {
        Token { text: text.into(), loc }
    }

    /// A token with the given text, spanning from `self` to `end`.
    pub fn range(&self, end: &Token, text: impl Into<String>) -> Token {
        Token { text: text.into(), loc: SourceLocation::range(self, end) }
    }
}

/// Catcode for comment characters; `%` starts a line comment.
pub const CATCODE_COMMENT: u8 = 14;
/// Catcode for active characters; an active `%` is an ordinary token.
pub const CATCODE_ACTIVE: u8 = 13;

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    catcodes: HashMap<char, u8>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut catcodes = HashMap::new();
        catcodes.insert('%', CATCODE_COMMENT);
        Lexer { input, pos: 0, catcodes }
    }

    pub fn set_catcode(&mut self, ch: char, code: u8) {
        self.catcodes.insert(ch, code);
    }

    pub fn catcode(&self, ch: char) -> Option<u8> {
        self.catcodes.get(&ch).copied()
    }

    /// Produces the next token, or the `"EOF"` sentinel at end of input.
    pub fn next_token(&mut self) -> Token {
        loop {
            let rest = &self.input[self.pos..];
            match rest.chars().next() {
                None => {
                    return Token::new(
                        "EOF",
                        Some(SourceLocation { start: self.pos, end: self.pos }),
                    );
                }
                Some('%') if self.catcode('%') == Some(CATCODE_COMMENT) => {
                    match rest.find('\n') {
                        Some(i) => self.pos += i + 1,
                        None => self.pos = self.input.len(),
                    }
                }
                Some(c) if c.is_ascii_whitespace() => {
                    let start = self.pos;
                    self.skip_whitespace();
                    return Token::new(" ", Some(SourceLocation { start, end: self.pos }));
                }
                Some('\\') => return self.lex_control_sequence(),
                Some(c) => {
                    // An ordinary character absorbs its trailing combining marks.
                    let start = self.pos;
                    let mut end = start + c.len_utf8();
                    for mark in self.input[end..].chars() {
                        if ('\u{0300}'..='\u{036f}').contains(&mark) {
                            end += mark.len_utf8();
                        } else {
                            break;
                        }
                    }
                    self.pos = end;
                    return Token::new(
                        &self.input[start..end],
                        Some(SourceLocation { start, end }),
                    );
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.input[self.pos..]
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn lex_control_sequence(&mut self) -> Token {
        let start = self.pos;
        let after = &self.input[start + 1..];
        match after.chars().next() {
            // A backslash just before end of input stands alone.
            None => {
                self.pos = self.input.len();
                Token::new("\\", Some(SourceLocation { start, end: self.pos }))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                if after.starts_with("verb")
                    && after[4..].chars().next().map_or(false, |d| !d.is_ascii_alphabetic())
                {
                    if let Some(token) = self.lex_verb() {
                        return token;
                    }
                }
                let mut end = start + 1;
                for c in after.chars() {
                    if c.is_ascii_alphabetic() {
                        end += 1;
                    } else {
                        break;
                    }
                }
                let token = Token::new(
                    &self.input[start..end],
                    Some(SourceLocation { start, end }),
                );
                // Whitespace after a control word belongs to the word.
                self.pos = end;
                self.skip_whitespace();
                token
            }
            Some(c) => {
                let end = start + 1 + c.len_utf8();
                self.pos = end;
                Token::new(&self.input[start..end], Some(SourceLocation { start, end }))
            }
        }
    }

    /// Captures a whole `\verb⟨d⟩..⟨d⟩` or `\verb*⟨d⟩..⟨d⟩` construct as one
    /// token. The body may not span lines. `None` means the construct does
    /// not close on this line; the input is then re-lexed as a plain `\verb`
    /// control word.
    fn lex_verb(&mut self) -> Option<Token> {
        let start = self.pos;
        let mut i = start + 5; // past "\verb"
        let mut chars = self.input[i..].chars();
        let mut delim = chars.next()?;
        if delim == '*' {
            i += 1;
            delim = chars.next()?;
        }
        if delim == '\n' {
            return None;
        }
        let body_start = i + delim.len_utf8();
        let line_end = self.input[body_start..]
            .find('\n')
            .map(|k| body_start + k)
            .unwrap_or(self.input.len());
        let k = self.input[body_start..line_end].find(delim)?;
        let end = body_start + k + delim.len_utf8();
        self.pos = end;
        Some(Token::new(
            &self.input[start..end],
            Some(SourceLocation { start, end }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_texts(input: &str) -> Vec<String> {
        let mut lexer = Lexer::new(input);
        let mut texts = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.text == "EOF" {
                break;
            }
            texts.push(token.text);
        }
        texts
    }

    #[test]
    fn string_to_tokens() {
        assert_eq!(lex_texts(r"\end  { ]   "), vec!["\\end", "{", " ", "]", " "]);
        assert_eq!(lex_texts(r"\if\fi a\!"), vec!["\\if", "\\fi", "a", "\\!"]);
        assert_eq!(lex_texts(r"abc\abc"), vec!["a", "b", "c", "\\abc"]);
        assert_eq!(lex_texts(r"\\\a a\"), vec!["\\\\", "\\a", "a", "\\"]);
        assert_eq!(
            lex_texts(r"{{a}b\}c}d"),
            vec!["{", "{", "a", "}", "b", "\\}", "c", "}", "d"]
        );
    }

    #[test]
    fn control_words_swallow_trailing_spaces() {
        assert_eq!(lex_texts("\\cs 1"), vec!["\\cs", "1"]);
        assert_eq!(lex_texts("\\cs    1"), vec!["\\cs", "1"]);
        assert_eq!(lex_texts("\\cs\n\n\t?"), vec!["\\cs", "?"]);
        // A control symbol keeps following whitespace as a space token.
        assert_eq!(lex_texts("\\% 1"), vec!["\\%", " ", "1"]);
    }

    #[test]
    fn whitespace_coalesces() {
        assert_eq!(lex_texts("1     +       2"), vec!["1", " ", "+", " ", "2"]);
        assert_eq!(lex_texts(" \t\n x"), vec![" ", "x"]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(lex_texts("a% ignored\nb"), vec!["a", "b"]);
        assert_eq!(lex_texts("a% no newline"), vec!["a"]);
    }

    #[test]
    fn active_percent_is_a_token() {
        let mut lexer = Lexer::new("a%b");
        lexer.set_catcode('%', CATCODE_ACTIVE);
        assert_eq!(lexer.next_token().text, "a");
        assert_eq!(lexer.next_token().text, "%");
        assert_eq!(lexer.next_token().text, "b");
    }

    #[test]
    fn combining_marks_stick_to_their_base() {
        assert_eq!(lex_texts("e\u{0301}x"), vec!["e\u{0301}", "x"]);
        assert_eq!(lex_texts("e\u{0301}\u{0302}"), vec!["e\u{0301}\u{0302}"]);
    }

    #[test]
    fn verb_captures_whole_construct() {
        assert_eq!(lex_texts(r"\verb|x y|z"), vec![r"\verb|x y|", "z"]);
        assert_eq!(lex_texts(r"\verb*!a b!"), vec![r"\verb*!a b!"]);
        // Unterminated: falls back to a plain control word.
        assert_eq!(lex_texts(r"\verb|x y"), vec![r"\verb", "|", "x", " ", "y"]);
        // A letter after \verb makes a longer control word instead.
        assert_eq!(lex_texts(r"\verbatim"), vec![r"\verbatim"]);
    }

    #[test]
    fn source_locations_cover_token_bytes() {
        let mut lexer = Lexer::new(r"a \frac b");
        let a = lexer.next_token();
        assert_eq!(a.loc, Some(SourceLocation { start: 0, end: 1 }));
        let _space = lexer.next_token();
        let frac = lexer.next_token();
        assert_eq!(frac.loc, Some(SourceLocation { start: 2, end: 7 }));
        let b = lexer.next_token();
        let composite = frac.range(&b, "\\frac b");
        assert_eq!(composite.loc, Some(SourceLocation { start: 2, end: 9 }));
    }
}
