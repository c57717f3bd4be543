//! The macro expander sitting between the lexer and the parser.
//!
//! The parser never talks to the [`Lexer`] directly: it pulls tokens from a
//! [`MacroExpander`], which replaces macro calls by their expansion on the
//! fly. Macro definitions live in a [`Namespace`] whose `begin_group` /
//! `end_group` pairs scope redefinitions the way TeX groups do.

use std::collections::HashMap;

use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token};
use crate::settings::Settings;
use crate::Mode;

/// A macro table with group-scoped undo.
///
/// `set` inside a group records the shadowed value; `end_group` restores it.
#[derive(Debug, Default, Clone)]
pub struct Namespace {
    current: HashMap<String, String>,
    undef_stack: Vec<HashMap<String, Option<String>>>,
}

impl Namespace {
    pub fn new() -> Self {
        Namespace::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.current.get(name).map(String::as_str)
    }

    /// Defines or redefines a macro in the innermost group.
    pub fn set(&mut self, name: &str, expansion: &str) {
        let Namespace { current, undef_stack } = self;
        if let Some(top) = undef_stack.last_mut() {
            top.entry(name.to_string())
                .or_insert_with(|| current.get(name).cloned());
        }
        current.insert(name.to_string(), expansion.to_string());
    }

    pub fn begin_group(&mut self) {
        self.undef_stack.push(HashMap::new());
    }

    pub fn end_group(&mut self) {
        if let Some(undefs) = self.undef_stack.pop() {
            for (name, old) in undefs {
                match old {
                    Some(expansion) => self.current.insert(name, expansion),
                    None => self.current.remove(&name),
                };
            }
        }
    }

    /// Unwinds every group still open.
    pub fn end_groups(&mut self) {
        while !self.undef_stack.is_empty() {
            self.end_group();
        }
    }
}

/// A one-token-at-a-time stream of macro-expanded tokens.
pub struct MacroExpander<'a> {
    lexer: Lexer<'a>,
    stack: Vec<Token>,
    macros: Namespace,
    mode: Mode,
    expansion_count: usize,
    max_expand: usize,
}

impl<'a> MacroExpander<'a> {
    pub fn new(input: &'a str, settings: &Settings) -> Self {
        MacroExpander {
            lexer: Lexer::new(input),
            stack: Vec::new(),
            macros: Namespace::new(),
            mode: Mode::Math,
            expansion_count: 0,
            max_expand: settings.max_expand,
        }
    }

    /// The next token of the logical stream, with macros expanded away.
    pub fn expand_next_token(&mut self) -> ParseResult<Token> {
        loop {
            let token = match self.stack.pop() {
                Some(token) => token,
                None => self.lexer.next_token(),
            };
            if token.text.starts_with('\\') {
                if let Some(expansion) = self.macros.get(&token.text) {
                    self.expansion_count += 1;
                    if self.expansion_count > self.max_expand {
                        return Err(ParseError::new(
                            "Too many expansions: infinite loop or need to increase maxExpand setting",
                        ));
                    }
                    let expansion = expansion.to_string();
                    let mut tokens = lex_expansion(&expansion);
                    tokens.reverse();
                    self.stack.append(&mut tokens);
                    continue;
                }
            }
            return Ok(token);
        }
    }

    pub fn macros(&self) -> &Namespace {
        &self.macros
    }

    pub fn macros_mut(&mut self) -> &mut Namespace {
        &mut self.macros
    }

    pub fn begin_group(&mut self) {
        self.macros.begin_group();
    }

    pub fn end_group(&mut self) {
        self.macros.end_group();
    }

    pub fn end_groups(&mut self) {
        self.macros.end_groups();
    }

    /// Records the parser's current mode. The expander itself is
    /// mode-agnostic, but downstream consumers of the stream may not be.
    pub fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_catcode(&mut self, ch: char, code: u8) {
        self.lexer.set_catcode(ch, code);
    }

    pub fn catcode(&self, ch: char) -> Option<u8> {
        self.lexer.catcode(ch)
    }
}

/// Tokens of a macro expansion carry no source location.
fn lex_expansion(expansion: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(expansion);
    let mut tokens = Vec::new();
    loop {
        let mut token = lexer.next_token();
        if token.text == "EOF" {
            break;
        }
        token.loc = None;
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_all(expander: &mut MacroExpander) -> Vec<String> {
        let mut texts = Vec::new();
        loop {
            let token = expander.expand_next_token().expect("expansion failed");
            if token.text == "EOF" {
                break;
            }
            texts.push(token.text);
        }
        texts
    }

    #[test]
    fn passes_tokens_through() {
        let settings = Settings::default();
        let mut expander = MacroExpander::new(r"a\frac{b}", &settings);
        assert_eq!(expand_all(&mut expander), vec!["a", "\\frac", "{", "b", "}"]);
    }

    #[test]
    fn expands_macros() {
        let settings = Settings::default();
        let mut expander = MacroExpander::new(r"\color{red}x", &settings);
        expander.macros_mut().set("\\color", "\\textcolor");
        assert_eq!(
            expand_all(&mut expander),
            vec!["\\textcolor", "{", "r", "e", "d", "}", "x"]
        );
    }

    #[test]
    fn expansion_can_contain_macros() {
        let settings = Settings::default();
        let mut expander = MacroExpander::new(r"\b", &settings);
        expander.macros_mut().set("\\b", r"\c1");
        expander.macros_mut().set("\\c", "2");
        assert_eq!(expand_all(&mut expander), vec!["2", "1"]);
    }

    #[test]
    fn runaway_expansion_fails() {
        let settings = Settings::default();
        let mut expander = MacroExpander::new(r"\loop", &settings);
        expander.macros_mut().set("\\loop", "\\loop");
        let err = expander.expand_next_token().unwrap_err();
        assert!(err.message().contains("Too many expansions"));
    }

    #[test]
    fn groups_scope_macro_definitions() {
        let mut ns = Namespace::new();
        ns.set("\\a", "1");
        ns.begin_group();
        ns.set("\\a", "2");
        ns.set("\\b", "3");
        assert_eq!(ns.get("\\a"), Some("2"));
        assert_eq!(ns.get("\\b"), Some("3"));
        ns.end_group();
        assert_eq!(ns.get("\\a"), Some("1"));
        assert_eq!(ns.get("\\b"), None);
    }

    #[test]
    fn end_groups_unwinds_everything() {
        let mut ns = Namespace::new();
        ns.begin_group();
        ns.set("\\a", "1");
        ns.begin_group();
        ns.set("\\a", "2");
        ns.end_groups();
        assert_eq!(ns.get("\\a"), None);
    }
}
