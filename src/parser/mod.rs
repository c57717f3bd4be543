//! Parses token streams of TeX formulas into [`ParseNode`]s.
//!
//! The [`parse`] function covers the common case. The [`Parser`] struct gives
//! control over [`Settings`], e.g. strictness and the unknown-command
//! fallback.

pub mod nodes;
pub mod symbols;
pub mod functions;

use regex::Regex;

use crate::dimensions::{Measurement, MeasurementError};
use crate::error::{ParseError, ParseResult};
use crate::expander::MacroExpander;
use crate::lexer::{SourceLocation, Token, CATCODE_ACTIVE, CATCODE_COMMENT};
use crate::settings::Settings;
use crate::Mode;

use self::functions::{ArgType, FunctionSpec};
use self::nodes::{
    ColorToken, OrdGroup, ParseNode, Raw, Size, StyleLevel, Styling, SupSub, Symbol, Text, Url,
    Verb,
};
use self::symbols::Group;

/// Tokens that always terminate an expression.
const END_OF_EXPRESSION: &[&str] = &["}", "\\endgroup", "\\end", "\\right", "&"];

/// Argument budget for superscripts and subscripts.
const SUPSUB_GREEDINESS: i32 = 1;

/// Control sequences that may legitimately produce no node, so reaching one
/// while parsing a group is not an undefined-command error.
fn is_implicit_command(text: &str) -> bool {
    matches!(text, "^" | "_" | "\\limits" | "\\nolimits")
}

lazy_static! {
    static ref VERB_RE: Regex = Regex::new(r"^\\verb[^a-zA-Z]").unwrap();
    static ref COLOR_RE: Regex = Regex::new(r"(?i)^(#[a-f0-9]{3}|#?[a-f0-9]{6}|[a-z]+)$").unwrap();
    static ref HEX6_RE: Regex = Regex::new(r"^[a-fA-F0-9]{6}$").unwrap();
    static ref SIZE_TOKEN_RE: Regex =
        Regex::new(r"^[-+]? *(?:$|\d+|\d+\.\d*|\.\d*) *[a-z]{0,2} *$").unwrap();
    static ref URL_UNESCAPE_RE: Regex = Regex::new(r"\\([#$%&~_^{}])").unwrap();
}

/// Parses a formula with default [`Settings`].
pub fn parse(input: &str) -> ParseResult<Vec<ParseNode>> {
    let settings = Settings::default();
    Parser::new(input, &settings).parse()
}

/// Parses a formula with the given [`Settings`].
pub fn parse_with_settings(input: &str, settings: &Settings) -> ParseResult<Vec<ParseNode>> {
    Parser::new(input, settings).parse()
}

/// A recursive-descent parser with one token of lookahead.
///
/// The lookahead lives in a single slot: [`Parser::fetch`] fills it from the
/// macro expander and [`Parser::consume`] empties it. A parser owns its
/// mutable state (mode, lookahead, `\left`/`\right` depth) and is used from a
/// single thread.
pub struct Parser<'a> {
    /// The current parsing mode.
    pub mode: Mode,
    /// Nesting depth of `\left`..`\right` pairs, maintained by their
    /// handlers.
    pub left_right_depth: u32,
    gullet: MacroExpander<'a>,
    settings: &'a Settings,
    next_token: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, settings: &'a Settings) -> Self {
        Parser {
            mode: Mode::Math,
            left_right_depth: 0,
            gullet: MacroExpander::new(input, settings),
            settings,
            next_token: None,
        }
    }

    /// Parses the input to the end. This is the main entry point.
    pub fn parse(mut self) -> ParseResult<Vec<ParseNode>> {
        let result = self.parse_top();
        // Close whatever macro scopes an error left open.
        self.gullet.end_groups();
        result
    }

    fn parse_top(&mut self) -> ParseResult<Vec<ParseNode>> {
        if !self.settings.global_group {
            self.gullet.begin_group();
        }
        if self.settings.color_is_text_color {
            self.gullet.macros_mut().set("\\color", "\\textcolor");
        }
        let expression = self.parse_expression(false, None)?;
        self.expect("EOF", true)?;
        if !self.settings.global_group {
            self.gullet.end_group();
        }
        Ok(expression)
    }

    // ------------------------
    // Token plumbing
    // ------------------------

    /// Returns the cached lookahead, filling the slot from the expander when
    /// empty.
    pub(crate) fn fetch(&mut self) -> ParseResult<Token> {
        match &self.next_token {
            Some(token) => Ok(token.clone()),
            None => {
                let token = self.gullet.expand_next_token()?;
                self.next_token = Some(token.clone());
                Ok(token)
            }
        }
    }

    /// Discards the lookahead.
    pub(crate) fn consume(&mut self) {
        self.next_token = None;
    }

    /// Fails unless the lookahead text is `text`, consuming it when asked.
    pub(crate) fn expect(&mut self, text: &str, consume: bool) -> ParseResult<()> {
        let token = self.fetch()?;
        if token.text != text {
            return Err(ParseError::with_token(
                format!("Expected '{}', got '{}'", text, token.text),
                &token,
            ));
        }
        if consume {
            self.consume();
        }
        Ok(())
    }

    fn consume_spaces(&mut self) -> ParseResult<()> {
        while self.fetch()?.text == " " {
            self.consume();
        }
        Ok(())
    }

    /// Switches mode, telling the expander about it.
    pub(crate) fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.gullet.switch_mode(mode);
    }

    // ------------------------
    // Expressions
    // ------------------------

    /// Parses atoms until a terminator: one of the fixed end-of-expression
    /// tokens, the caller-supplied `break_on_token_text`, or (with
    /// `break_on_infix`) any registered infix command.
    pub(crate) fn parse_expression(
        &mut self,
        break_on_infix: bool,
        break_on_token_text: Option<&str>,
    ) -> ParseResult<Vec<ParseNode>> {
        let mut body = Vec::new();
        loop {
            if self.mode == Mode::Math {
                self.consume_spaces()?;
            }
            let lex = self.fetch()?;
            if END_OF_EXPRESSION.contains(&lex.text.as_str()) {
                break;
            }
            if break_on_token_text == Some(lex.text.as_str()) {
                break;
            }
            if break_on_infix {
                if let Some(func) = functions::get(&lex.text) {
                    if func.infix {
                        break;
                    }
                }
            }
            match self.parse_atom(break_on_token_text)? {
                Some(atom) => body.push(atom),
                None => break,
            }
        }
        if self.mode == Mode::Text {
            form_ligatures(&mut body);
        }
        self.handle_infix_nodes(body)
    }

    /// Rewrites the single allowed infix node of a sibling list into its
    /// prefix form, splitting the list into numerator and denominator.
    fn handle_infix_nodes(&mut self, body: Vec<ParseNode>) -> ParseResult<Vec<ParseNode>> {
        let mut found: Option<(usize, nodes::Infix)> = None;
        for (i, node) in body.iter().enumerate() {
            if let ParseNode::Infix(infix) = node {
                if found.is_some() {
                    return Err(ParseError::with_opt_token(
                        "only one infix operator per group",
                        infix.token.as_ref(),
                    ));
                }
                found = Some((i, infix.clone()));
            }
        }
        let Some((index, infix)) = found else {
            return Ok(body);
        };
        // An infix node with no replacement function is a broken registry
        // entry, not something to skip silently.
        if infix.replace_with.is_empty() {
            return Err(ParseError::with_opt_token(
                "Invalid infix operator: empty replacement function",
                infix.token.as_ref(),
            ));
        }

        let mut numer_body = body;
        let denom_body = numer_body.split_off(index + 1);
        numer_body.truncate(index);
        let numer = self.wrap_infix_side(numer_body);
        let denom = self.wrap_infix_side(denom_body);

        let func_name = infix.replace_with.clone();
        let token = infix.token.clone();
        let args = if func_name == "\\\\abovefrac" {
            vec![numer, ParseNode::Infix(infix), denom]
        } else {
            vec![numer, denom]
        };
        let node = self.call_function(&func_name, args, Vec::new(), token.as_ref(), None)?;
        Ok(vec![node])
    }

    /// A side of an infix split: an existing lone group is reused, anything
    /// else gets wrapped.
    fn wrap_infix_side(&self, mut side: Vec<ParseNode>) -> ParseNode {
        if side.len() == 1 && matches!(side[0], ParseNode::OrdGroup(_)) {
            side.swap_remove(0)
        } else {
            ParseNode::OrdGroup(OrdGroup {
                mode: self.mode,
                loc: None,
                body: side,
                semisimple: false,
            })
        }
    }

    // ------------------------
    // Atoms
    // ------------------------

    /// Parses a nucleus with its superscripts, subscripts, primes and limit
    /// modifiers.
    pub(crate) fn parse_atom(
        &mut self,
        break_on_token_text: Option<&str>,
    ) -> ParseResult<Option<ParseNode>> {
        let mut base = self.parse_group("atom", false, None, break_on_token_text, None, false)?;

        // Scripts are a math-mode concept.
        if self.mode == Mode::Text {
            return Ok(base);
        }

        let mut superscript: Option<ParseNode> = None;
        let mut subscript: Option<ParseNode> = None;
        loop {
            self.consume_spaces()?;
            let lex = self.fetch()?;
            match lex.text.as_str() {
                "\\limits" | "\\nolimits" => {
                    let limits = lex.text == "\\limits";
                    match base.as_mut() {
                        Some(ParseNode::Op(op)) => {
                            op.limits = limits;
                            op.always_handle_sup_sub = true;
                        }
                        Some(ParseNode::OperatorName(op)) if op.always_handle_sup_sub => {
                            op.limits = limits;
                        }
                        _ => {
                            return Err(ParseError::with_token(
                                "Limit controls must follow a math operator",
                                &lex,
                            ))
                        }
                    }
                    self.consume();
                }
                "^" => {
                    if superscript.is_some() {
                        return Err(ParseError::with_token("Double superscript", &lex));
                    }
                    superscript = Some(self.handle_sup_subscript("superscript")?);
                }
                "_" => {
                    if subscript.is_some() {
                        return Err(ParseError::with_token("Double subscript", &lex));
                    }
                    subscript = Some(self.handle_sup_subscript("subscript")?);
                }
                "'" => {
                    if superscript.is_some() {
                        return Err(ParseError::with_token("Double superscript", &lex));
                    }
                    let prime = ParseNode::TextOrd(Symbol {
                        mode: self.mode,
                        loc: None,
                        text: "\\prime".into(),
                    });
                    let mut primes = vec![prime.clone()];
                    self.consume();
                    while self.fetch()?.text == "'" {
                        primes.push(prime.clone());
                        self.consume();
                    }
                    // A superscript directly after the primes joins them.
                    if self.fetch()?.text == "^" {
                        primes.push(self.handle_sup_subscript("superscript")?);
                    }
                    superscript = Some(ParseNode::OrdGroup(OrdGroup {
                        mode: self.mode,
                        loc: None,
                        body: primes,
                        semisimple: false,
                    }));
                }
                _ => break,
            }
        }

        if superscript.is_some() || subscript.is_some() {
            Ok(Some(ParseNode::SupSub(SupSub {
                mode: self.mode,
                loc: None,
                base: base.map(Box::new),
                sup: superscript.map(Box::new),
                sub: subscript.map(Box::new),
            })))
        } else {
            Ok(base)
        }
    }

    /// Parses the group after `^` or `_`.
    fn handle_sup_subscript(&mut self, name: &str) -> ParseResult<ParseNode> {
        let symbol_token = self.fetch()?;
        self.consume();
        let group =
            self.parse_group(name, false, Some(SUPSUB_GREEDINESS), None, None, true)?;
        group.ok_or_else(|| {
            ParseError::with_token(
                format!("Expected group after '{}'", symbol_token.text),
                &symbol_token,
            )
        })
    }

    // ------------------------
    // Groups
    // ------------------------

    /// Parses a delimited group (`{..}`, `[..]` when optional, or
    /// `\begingroup..\endgroup`), a function call, or a single symbol.
    ///
    /// With a `mode` argument the whole call runs in that mode; the outer
    /// mode is restored on every exit path.
    pub(crate) fn parse_group(
        &mut self,
        name: &str,
        optional: bool,
        greediness: Option<i32>,
        break_on_token_text: Option<&str>,
        mode: Option<Mode>,
        consume_spaces: bool,
    ) -> ParseResult<Option<ParseNode>> {
        let outer_mode = self.mode;
        if let Some(mode) = mode {
            self.switch_mode(mode);
        }
        let result =
            self.parse_group_body(name, optional, greediness, break_on_token_text, consume_spaces);
        if mode.is_some() {
            self.switch_mode(outer_mode);
        }
        result
    }

    fn parse_group_body(
        &mut self,
        name: &str,
        optional: bool,
        greediness: Option<i32>,
        break_on_token_text: Option<&str>,
        consume_spaces: bool,
    ) -> ParseResult<Option<ParseNode>> {
        // Spaces are skipped after any mode switch so they are consumed in
        // the target mode.
        if consume_spaces {
            self.consume_spaces()?;
        }
        let first_token = self.fetch()?;
        let text = first_token.text.clone();

        if (optional && text == "[") || (!optional && (text == "{" || text == "\\begingroup")) {
            let group_end = match text.as_str() {
                "[" => "]",
                "{" => "}",
                _ => "\\endgroup",
            };
            self.consume();
            // Macro definitions inside the group stay inside the group.
            self.gullet.begin_group();
            let expression = self.parse_expression(false, Some(group_end))?;
            let last_token = self.fetch()?;
            self.expect(group_end, true)?;
            self.gullet.end_group();
            Ok(Some(ParseNode::OrdGroup(OrdGroup {
                mode: self.mode,
                loc: SourceLocation::range(&first_token, &last_token),
                body: expression,
                semisimple: text == "\\begingroup",
            })))
        } else if optional {
            Ok(None)
        } else {
            let result = alt!(
                self.parse_function(break_on_token_text, Some(name), greediness),
                self.parse_symbol()
            );
            match result {
                Some(node) => Ok(Some(node)),
                None => {
                    if text.starts_with('\\') && !is_implicit_command(&text) {
                        if self.settings.throw_on_error {
                            return Err(ParseError::with_token(
                                format!("Undefined control sequence: {}", text),
                                &first_token,
                            ));
                        }
                        let node = self.format_unsupported_cmd(&text);
                        self.consume();
                        Ok(Some(node))
                    } else {
                        Ok(None)
                    }
                }
            }
        }
    }

    // ------------------------
    // Function dispatch
    // ------------------------

    /// Parses a registered function with its arguments. `Ok(None)` when the
    /// lookahead is not a registered command.
    pub(crate) fn parse_function(
        &mut self,
        break_on_token_text: Option<&str>,
        name: Option<&str>,
        greediness: Option<i32>,
    ) -> ParseResult<Option<ParseNode>> {
        let token = self.fetch()?;
        let func = token.text.clone();
        let func_data = match functions::get(&func) {
            Some(func_data) => func_data,
            None => return Ok(None),
        };
        self.consume();

        if let Some(greediness) = greediness {
            if func_data.greediness <= greediness {
                let as_name = name.map(|n| format!(" as {}", n)).unwrap_or_default();
                return Err(ParseError::with_token(
                    format!("Got function '{}' with no arguments{}", func, as_name),
                    &token,
                ));
            }
        }
        if self.mode == Mode::Text && !func_data.allowed_in_text {
            return Err(ParseError::with_token(
                format!("Can't use function '{}' in text mode", func),
                &token,
            ));
        }
        if self.mode == Mode::Math && !func_data.allowed_in_math {
            return Err(ParseError::with_token(
                format!("Can't use function '{}' in math mode", func),
                &token,
            ));
        }

        let (args, opt_args) = self.parse_arguments(&func, func_data)?;
        self.call_function(&func, args, opt_args, Some(&token), break_on_token_text)
            .map(Some)
    }

    /// Invokes the handler registered for `name`.
    pub(crate) fn call_function(
        &mut self,
        name: &str,
        args: Vec<ParseNode>,
        opt_args: Vec<Option<ParseNode>>,
        token: Option<&Token>,
        break_on_token_text: Option<&str>,
    ) -> ParseResult<ParseNode> {
        let func_data = functions::get(name)
            .ok_or_else(|| ParseError::new(format!("No function handler for {}", name)))?;
        let context = functions::FunctionContext {
            parser: self,
            func_name: name,
            token,
            break_on_token_text,
        };
        (func_data.handler)(context, args, opt_args)
    }

    /// Parses the declared arguments of a function.
    fn parse_arguments(
        &mut self,
        func: &str,
        func_data: &FunctionSpec,
    ) -> ParseResult<(Vec<ParseNode>, Vec<Option<ParseNode>>)> {
        let total = func_data.num_args + func_data.num_optional_args;
        if total == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        let base_greediness = func_data.greediness;
        let mut args = Vec::with_capacity(func_data.num_args);
        let mut opt_args = Vec::with_capacity(func_data.num_optional_args);
        for i in 0..total {
            let arg_type = func_data.arg_types.and_then(|types| types.get(i)).copied();
            let is_optional = i < func_data.num_optional_args;
            // Spaces are consumed between positional arguments, and before
            // the first one only in math mode. Nothing is pre-consumed in
            // front of a leading optional argument.
            let consume_spaces =
                (i > 0 && !is_optional) || (i == 0 && !is_optional && self.mode == Mode::Math);
            let name = format!("argument to '{}'", func);
            let arg =
                self.parse_group_of_type(&name, arg_type, is_optional, Some(base_greediness), consume_spaces)?;
            match arg {
                Some(arg) => {
                    if is_optional {
                        opt_args.push(Some(arg));
                    } else {
                        args.push(arg);
                    }
                }
                None if is_optional => opt_args.push(None),
                None => {
                    let token = self.fetch()?;
                    return Err(ParseError::with_token(
                        format!("Expected group after '{}'", func),
                        &token,
                    ));
                }
            }
        }
        Ok((args, opt_args))
    }

    // ------------------------
    // Typed arguments
    // ------------------------

    fn parse_group_of_type(
        &mut self,
        name: &str,
        arg_type: Option<ArgType>,
        optional: bool,
        greediness: Option<i32>,
        consume_spaces: bool,
    ) -> ParseResult<Option<ParseNode>> {
        match arg_type {
            Some(ArgType::Color) => {
                if consume_spaces {
                    self.consume_spaces()?;
                }
                self.parse_color_group(optional)
            }
            Some(ArgType::Size) => {
                if consume_spaces {
                    self.consume_spaces()?;
                }
                self.parse_size_group(optional)
            }
            Some(ArgType::Url) => self.parse_url_group(optional, consume_spaces),
            Some(ArgType::Math) => {
                self.parse_group(name, optional, greediness, None, Some(Mode::Math), consume_spaces)
            }
            Some(ArgType::Text) => {
                self.parse_group(name, optional, greediness, None, Some(Mode::Text), consume_spaces)
            }
            Some(ArgType::Hbox) => {
                // An hbox argument is text-mode content in the current style.
                let group = self.parse_group(
                    name,
                    optional,
                    greediness,
                    None,
                    Some(Mode::Text),
                    consume_spaces,
                )?;
                Ok(group.map(|group| {
                    ParseNode::Styling(Styling {
                        mode: group.mode(),
                        loc: None,
                        style: StyleLevel::Text,
                        body: vec![group],
                    })
                }))
            }
            Some(ArgType::Raw) => {
                if consume_spaces {
                    self.consume_spaces()?;
                }
                if optional && self.fetch()?.text == "{" {
                    return Ok(None);
                }
                match self.parse_string_group("raw", optional, true)? {
                    Some(token) => Ok(Some(ParseNode::Raw(Raw {
                        mode: Mode::Text,
                        loc: token.loc,
                        string: token.text,
                    }))),
                    None => {
                        let token = self.fetch()?;
                        Err(ParseError::with_token("Expected raw group", &token))
                    }
                }
            }
            Some(ArgType::Original) | None => {
                self.parse_group(name, optional, greediness, None, None, consume_spaces)
            }
        }
    }

    /// Accumulates raw token text up to a matching `}` (or `]` when
    /// optional). In `raw` mode matched nested delimiters are allowed, and a
    /// single non-delimiter token counts as a group of its own.
    fn parse_string_group(
        &mut self,
        mode_name: &str,
        optional: bool,
        raw: bool,
    ) -> ParseResult<Option<Token>> {
        let group_begin = if optional { "[" } else { "{" };
        let group_end = if optional { "]" } else { "}" };
        let begin_token = self.fetch()?;
        if begin_token.text != group_begin {
            if optional {
                return Ok(None);
            }
            if raw
                && begin_token.text != "EOF"
                && begin_token.text.chars().any(|c| !matches!(c, '{' | '}' | '[' | ']'))
            {
                self.consume();
                return Ok(Some(begin_token));
            }
        }
        // String accumulation happens in text mode; restored on every path.
        let outer_mode = self.mode;
        self.mode = Mode::Text;
        let result = self.parse_string_group_body(mode_name, group_begin, group_end, raw);
        self.mode = outer_mode;
        result.map(Some)
    }

    fn parse_string_group_body(
        &mut self,
        mode_name: &str,
        group_begin: &str,
        group_end: &str,
        raw: bool,
    ) -> ParseResult<Token> {
        self.expect(group_begin, true)?;
        let mut string = String::new();
        let first_token = self.fetch()?;
        let mut last_token = first_token.clone();
        let mut nested: i32 = 0;
        loop {
            let next = self.fetch()?;
            if next.text == group_end && (!raw || nested == 0) {
                break;
            }
            if next.text == "EOF" {
                return Err(ParseError::with_token(
                    format!("Unexpected end of input in {}", mode_name),
                    &first_token.range(&last_token, string),
                ));
            } else if next.text == group_begin {
                nested += 1;
            } else if next.text == group_end {
                nested -= 1;
            }
            last_token = next;
            string.push_str(&last_token.text);
            self.consume();
        }
        self.expect(group_end, true)?;
        Ok(first_token.range(&last_token, string))
    }

    /// Maximal-munch accumulation: consumes tokens while the accumulated
    /// text still matches `regex`.
    fn parse_regex_group(&mut self, regex: &Regex, mode_name: &str) -> ParseResult<Token> {
        let outer_mode = self.mode;
        self.mode = Mode::Text;
        let result = self.parse_regex_group_body(regex, mode_name);
        self.mode = outer_mode;
        result
    }

    fn parse_regex_group_body(&mut self, regex: &Regex, mode_name: &str) -> ParseResult<Token> {
        let first_token = self.fetch()?;
        let mut last_token = first_token.clone();
        let mut string = String::new();
        loop {
            let next = self.fetch()?;
            if next.text == "EOF" {
                break;
            }
            let candidate = format!("{}{}", string, next.text);
            if !regex.is_match(&candidate) {
                break;
            }
            last_token = next;
            string = candidate;
            self.consume();
        }
        if string.is_empty() {
            return Err(ParseError::with_token(
                format!("Invalid {}: '{}'", mode_name, first_token.text),
                &first_token,
            ));
        }
        Ok(first_token.range(&last_token, string))
    }

    /// Parses a color argument: `#rgb`, `#rrggbb`, `rrggbb` or a color name.
    fn parse_color_group(&mut self, optional: bool) -> ParseResult<Option<ParseNode>> {
        let res = match self.parse_string_group("color", optional, false)? {
            Some(res) => res,
            None => return Ok(None),
        };
        if !COLOR_RE.is_match(&res.text) {
            return Err(ParseError::with_token(
                format!("Invalid color: '{}'", res.text),
                &res,
            ));
        }
        let mut color = res.text.clone();
        if HEX6_RE.is_match(&color) {
            // Hex colors may omit their leading #.
            color.insert(0, '#');
        }
        Ok(Some(ParseNode::ColorToken(ColorToken {
            mode: self.mode,
            loc: res.loc,
            color,
        })))
    }

    /// Parses a size argument: `1.5em`, `{-2 pt}` and, for some commands, an
    /// empty group standing for zero.
    fn parse_size_group(&mut self, optional: bool) -> ParseResult<Option<ParseNode>> {
        let mut is_blank = false;
        let res = if !optional && self.fetch()?.text != "{" {
            Some(self.parse_regex_group(&SIZE_TOKEN_RE, "size")?)
        } else {
            self.parse_string_group("size", optional, false)?
        };
        let mut res = match res {
            Some(res) => res,
            None => return Ok(None),
        };
        if !optional && res.text.is_empty() {
            // An empty required size reads as zero, e.g. \genfrac{}{}{}{}..
            res.text = "0pt".into();
            is_blank = true;
        }
        let value = Measurement::parse_tex(&res.text).map_err(|err| match err {
            MeasurementError::Malformed => {
                ParseError::with_token(format!("Invalid size: '{}'", res.text), &res)
            }
            MeasurementError::UnknownUnit(unit) => {
                ParseError::with_token(format!("Invalid unit: '{}'", unit), &res)
            }
        })?;
        Ok(Some(ParseNode::Size(Size {
            mode: self.mode,
            loc: res.loc,
            value,
            is_blank,
        })))
    }

    /// Parses a URL argument. `%` must not start a comment inside the URL,
    /// so its catcode is made active for the duration and restored on every
    /// exit path.
    fn parse_url_group(
        &mut self,
        optional: bool,
        consume_spaces: bool,
    ) -> ParseResult<Option<ParseNode>> {
        if consume_spaces {
            self.consume_spaces()?;
        }
        self.gullet.set_catcode('%', CATCODE_ACTIVE);
        let result = self.parse_string_group("url", optional, true);
        self.gullet.set_catcode('%', CATCODE_COMMENT);
        let res = match result? {
            Some(res) => res,
            None => return Ok(None),
        };
        // hyperref unescapes these inside \url and \href arguments.
        let url = URL_UNESCAPE_RE.replace_all(&res.text, "$1").into_owned();
        Ok(Some(ParseNode::Url(Url { mode: self.mode, loc: res.loc, url })))
    }

    // ------------------------
    // Symbols
    // ------------------------

    /// Parses a single nucleus: a `\verb` construct, a known symbol, or
    /// Unicode text. Returns `Ok(None)` on structural tokens (`{`, `^`,
    /// `EOF`, ...).
    pub(crate) fn parse_symbol(&mut self) -> ParseResult<Option<ParseNode>> {
        let nucleus = self.fetch()?;
        let mut text = nucleus.text.clone();

        if VERB_RE.is_match(&text) {
            self.consume();
            let mut body = text[5..].to_string();
            let star = body.starts_with('*');
            if star {
                body.remove(0);
            }
            let chars: Vec<char> = body.chars().collect();
            if chars.len() < 2 || chars.first() != chars.last() {
                return Err(ParseError::with_token(
                    "\\verb ended by end of line instead of matching delimiter",
                    &nucleus,
                ));
            }
            let body: String = chars[1..chars.len() - 1].iter().collect();
            return Ok(Some(ParseNode::Verb(Verb {
                mode: Mode::Text,
                loc: nucleus.loc,
                body,
                star,
            })));
        }

        // Precomposed Latin letters without a symbol entry of their own are
        // decomposed into base plus combining marks.
        if let Some(first) = text.chars().next() {
            if let Some(expansion) = symbols::unicode_symbol(first) {
                if symbols::lookup(self.mode, &first.to_string()).is_none() {
                    if self.mode == Mode::Math {
                        self.settings.report_nonstrict(
                            "unicodeTextInMathMode",
                            &format!(
                                "Accented Unicode text character \"{}\" used in math mode",
                                first
                            ),
                            Some(&nucleus),
                        )?;
                    }
                    text = format!("{}{}", expansion, &text[first.len_utf8()..]);
                }
            }
        }

        // Strip trailing combining marks; they fold back as accents below.
        let mut mark_start = text.len();
        for (i, c) in text.char_indices().rev() {
            if ('\u{0300}'..='\u{036f}').contains(&c) {
                mark_start = i;
            } else {
                break;
            }
        }
        let marks: String = text[mark_start..].to_string();
        if !marks.is_empty() {
            text.truncate(mark_start);
            if text == "i" {
                text = "\u{0131}".into(); // dotless i
            } else if text == "j" {
                text = "\u{0237}".into(); // dotless j
            }
        }

        let loc = nucleus.loc;
        let symbol = if let Some(group) = symbols::lookup(self.mode, &text) {
            if self.mode == Mode::Math && symbols::EXTRA_LATIN.contains(text.as_str()) {
                self.settings.report_nonstrict(
                    "unicodeTextInMathMode",
                    &format!("Latin-1/Unicode text character \"{}\" used in math mode", text),
                    Some(&nucleus),
                )?;
            }
            match group {
                Group::Atom(family) => ParseNode::Atom(nodes::Atom {
                    family,
                    mode: self.mode,
                    loc,
                    text: text.clone(),
                }),
                Group::MathOrd => {
                    ParseNode::MathOrd(Symbol { mode: self.mode, loc, text: text.clone() })
                }
                Group::TextOrd => {
                    ParseNode::TextOrd(Symbol { mode: self.mode, loc, text: text.clone() })
                }
                Group::Spacing => {
                    ParseNode::Spacing(Symbol { mode: self.mode, loc, text: text.clone() })
                }
            }
        } else if text.chars().next().map_or(false, |c| c as u32 >= 0x80) {
            let first = text.chars().next().unwrap_or('\u{fffd}');
            if !symbols::supported_codepoint(first) {
                self.settings.report_nonstrict(
                    "unknownSymbol",
                    &format!("Unrecognized Unicode character \"{}\" ({})", first, first as u32),
                    Some(&nucleus),
                )?;
            } else if self.mode == Mode::Math {
                self.settings.report_nonstrict(
                    "unicodeTextInMathMode",
                    &format!("Unicode text character \"{}\" used in math mode", first),
                    Some(&nucleus),
                )?;
            }
            // All accepted non-math Unicode renders as text.
            ParseNode::TextOrd(Symbol { mode: Mode::Text, loc, text: text.clone() })
        } else {
            return Ok(None);
        };
        self.consume();

        // Fold the stripped marks over the base, outermost last.
        let mut node = symbol;
        for mark in marks.chars() {
            let accent = symbols::unicode_accent(mark).ok_or_else(|| {
                ParseError::with_token(format!("Unknown accent ' {}'", mark), &nucleus)
            })?;
            let label = accent.label(self.mode).ok_or_else(|| {
                ParseError::with_token(
                    format!("Accent {} unsupported in {} mode", mark, self.mode),
                    &nucleus,
                )
            })?;
            node = ParseNode::Accent(nodes::Accent {
                mode: self.mode,
                loc,
                label: label.into(),
                is_stretchy: false,
                is_shifty: true,
                base: Box::new(node),
            });
        }
        Ok(Some(node))
    }

    /// Renders an unknown command as error-colored text.
    fn format_unsupported_cmd(&self, text: &str) -> ParseNode {
        let body = text
            .chars()
            .map(|c| {
                ParseNode::TextOrd(Symbol { mode: Mode::Text, loc: None, text: c.to_string() })
            })
            .collect();
        let text_node = ParseNode::Text(Text { mode: self.mode, loc: None, body, font: None });
        ParseNode::Color(nodes::Color {
            mode: self.mode,
            loc: None,
            color: self.settings.error_color.clone(),
            body: vec![text_node],
        })
    }
}

/// Collapses text-mode ligatures in place: `--`, `---`, ` `` ` and `''`.
/// Idempotent; collapsed runs are not reconsidered.
pub(crate) fn form_ligatures(group: &mut Vec<ParseNode>) {
    fn lig_text(node: &ParseNode) -> Option<&str> {
        match node {
            ParseNode::TextOrd(sym) => Some(&sym.text),
            _ => None,
        }
    }
    fn merged(group: &[ParseNode], from: usize, to: usize, text: &str) -> ParseNode {
        let loc = SourceLocation::span(
            match &group[from] {
                ParseNode::TextOrd(sym) => sym.loc,
                _ => None,
            },
            match &group[to] {
                ParseNode::TextOrd(sym) => sym.loc,
                _ => None,
            },
        );
        ParseNode::TextOrd(Symbol { mode: Mode::Text, loc, text: text.into() })
    }

    let mut i = 0;
    while i + 1 < group.len() {
        let v = match lig_text(&group[i]) {
            Some(text) => text.to_string(),
            None => {
                i += 1;
                continue;
            }
        };
        if v == "-" && lig_text(&group[i + 1]) == Some("-") {
            if i + 2 < group.len() && lig_text(&group[i + 2]) == Some("-") {
                let node = merged(group, i, i + 2, "---");
                group.splice(i..i + 3, [node]);
            } else {
                let node = merged(group, i, i + 1, "--");
                group.splice(i..i + 2, [node]);
            }
        } else if (v == "'" || v == "`") && lig_text(&group[i + 1]) == Some(v.as_str()) {
            let node = merged(group, i, i + 1, &v.repeat(2));
            group.splice(i..i + 2, [node]);
        }
        i += 1;
    }
}

// --------------
//     TESTS
// --------------

#[cfg(test)]
mod tests {
    use super::nodes::ParseNode;
    use super::symbols::Family;
    use super::{form_ligatures, parse, Parser};
    use crate::error::ParseResult;
    use crate::lexer::Token;
    use crate::settings::{Settings, StrictMode};
    use crate::Mode;

    fn parse_strict(input: &str) -> ParseResult<Vec<ParseNode>> {
        let mut settings = Settings::default();
        settings.strict = StrictMode::Error;
        Parser::new(input, &settings).parse()
    }

    fn parse_lenient(input: &str) -> ParseResult<Vec<ParseNode>> {
        let mut settings = Settings::default();
        settings.throw_on_error = false;
        Parser::new(input, &settings).parse()
    }

    #[test]
    fn simple_symbols() {
        let mut errs: Vec<String> = Vec::new();
        should_pass!(errs, parse, [r"h", r"", r"1+1", r"\alpha\beta"]);
        should_equate!(errs, parse, [("    x    y    ", "xy"), ("    x   ^ y    ", "x^y")]);
        display_errors!(errs);
    }

    #[test]
    fn ord_symbols() {
        let expr = "1234|/@.\"`abcdefgzABCDEFGZ";
        let parse_nodes = parse(expr).unwrap();
        assert_eq!(parse_nodes.len(), expr.chars().count());
        for node in &parse_nodes {
            assert!(
                matches!(node, ParseNode::MathOrd(_) | ParseNode::TextOrd(_)),
                "expected an ord, got {:?}",
                node
            );
        }
    }

    #[test]
    fn atom_families() {
        let cases = [
            (r"+-*\cdot\pm\div", Family::Bin),
            (r"=<>\leq\geq\neq", Family::Rel),
            (",;", Family::Punct),
            ("([", Family::Open),
            (")]?!", Family::Close),
        ];
        for (expr, family) in cases {
            for node in parse(expr).unwrap() {
                match node {
                    ParseNode::Atom(atom) => assert_eq!(atom.family, family, "in {:?}", expr),
                    other => panic!("expected an atom in {:?}, got {:?}", expr, other),
                }
            }
        }
    }

    #[test]
    fn scripts() {
        let mut errs: Vec<String> = Vec::new();
        should_pass!(errs,
                     parse,
                     [r"1_2^3",
                      r"_1",
                      r"^\alpha",
                      r"_2^\alpha",
                      r"1_\frac12",
                      r"x_{1+2}",
                      r"x^{2+3}_{3-2}",
                      r"a^{b^c}",
                      r"{a_b}^c",
                      r"x'",
                      r"x''^2",
                      r"x'_2"]);
        should_fail!(errs,
                     parse,
                     [r"1_", r"1^", r"x_x_x", r"x^x^x", r"x^x_x^x", r"x_x^x_x", r"x^2'"]);
        should_equate!(errs,
                       parse,
                       [(r"x_\alpha^\beta", r"x^\beta_\alpha"), (r"_2^3", r"^3_2")]);
        display_errors!(errs);

        assert_eq!(parse("x^x^x").unwrap_err().message(), "Double superscript");
        assert_eq!(parse("x_x_x").unwrap_err().message(), "Double subscript");
    }

    #[test]
    fn supsub_structure() {
        let nodes = parse("x^2").unwrap();
        let ParseNode::SupSub(supsub) = &nodes[0] else {
            panic!("expected supsub, got {:?}", nodes[0]);
        };
        assert!(
            matches!(supsub.base.as_deref(), Some(ParseNode::MathOrd(sym)) if sym.text == "x")
        );
        assert!(
            matches!(supsub.sup.as_deref(), Some(ParseNode::TextOrd(sym)) if sym.text == "2")
        );
        assert!(supsub.sub.is_none());

        let nodes = parse("^3").unwrap();
        let ParseNode::SupSub(supsub) = &nodes[0] else {
            panic!("expected supsub, got {:?}", nodes[0]);
        };
        assert!(supsub.base.is_none());
        assert!(supsub.sup.is_some());
    }

    #[test]
    fn primes() {
        let nodes = parse("x''").unwrap();
        let ParseNode::SupSub(supsub) = &nodes[0] else {
            panic!("expected supsub, got {:?}", nodes[0]);
        };
        let Some(ParseNode::OrdGroup(group)) = supsub.sup.as_deref() else {
            panic!("expected ordgroup superscript, got {:?}", supsub.sup);
        };
        assert_eq!(group.body.len(), 2);
        for prime in &group.body {
            assert!(matches!(prime, ParseNode::TextOrd(sym) if sym.text == "\\prime"));
        }

        // A superscript right after the primes becomes the last child.
        let nodes = parse("x'^2").unwrap();
        let ParseNode::SupSub(supsub) = &nodes[0] else {
            panic!("expected supsub, got {:?}", nodes[0]);
        };
        let Some(ParseNode::OrdGroup(group)) = supsub.sup.as_deref() else {
            panic!("expected ordgroup superscript, got {:?}", supsub.sup);
        };
        assert_eq!(group.body.len(), 2);
        assert!(matches!(&group.body[0], ParseNode::TextOrd(sym) if sym.text == "\\prime"));
        assert!(matches!(&group.body[1], ParseNode::TextOrd(sym) if sym.text == "2"));
    }

    #[test]
    fn fractions() {
        let mut errs: Vec<String> = Vec::new();
        should_pass!(errs,
                     parse,
                     [r"\frac{1}{2}",
                      r"\frac12",
                      r"\frac 1 2",
                      r"\frac\alpha\beta",
                      r"\dfrac{a}{b}",
                      r"\tfrac{a}{b}",
                      r"\binom{n}{k}",
                      r"x^\frac12"]);
        should_fail!(errs, parse, [r"\frac", r"\frac{1}", r"\frac\sqrt2 3"]);
        should_differ!(errs, parse, [(r"\frac12", r"\frac{1}{2}")]);
        display_errors!(errs);

        let nodes = parse(r"\frac{1}{2}").unwrap();
        let ParseNode::GenFrac(frac) = &nodes[0] else {
            panic!("expected genfrac, got {:?}", nodes[0]);
        };
        assert!(frac.has_bar_line);
        assert!(frac.left_delim.is_none());
        assert!(
            matches!(frac.numer.as_ref(), ParseNode::OrdGroup(g) if g.body.len() == 1)
        );

        let nodes = parse(r"\binom{n}{k}").unwrap();
        let ParseNode::GenFrac(binom) = &nodes[0] else {
            panic!("expected genfrac, got {:?}", nodes[0]);
        };
        assert!(!binom.has_bar_line);
        assert_eq!(binom.left_delim.as_deref(), Some("("));
        assert_eq!(binom.right_delim.as_deref(), Some(")"));

        let err = parse(r"x^\kern1em").unwrap_err();
        assert_eq!(
            err.message(),
            "Got function '\\kern' with no arguments as superscript"
        );
    }

    #[test]
    fn infix_operators() {
        let mut errs: Vec<String> = Vec::new();
        should_pass!(errs,
                     parse,
                     [r"a \over b",
                      r"{1 \over 2}",
                      r"a {b \over c} {d \over e}",
                      r"{1 \atop 2}",
                      r"{n \choose k}",
                      r"{1 \above{2pt} 3}",
                      r"a \above 2pt b"]);
        should_fail!(errs, parse, [r"a \over b \over c", r"a \over b \atop c"]);
        should_equate!(errs, parse, [(r"{1 \over 2}", r"{\frac{1}{2}}")]);
        display_errors!(errs);

        assert_eq!(
            parse(r"a \over b \over c").unwrap_err().message(),
            "only one infix operator per group"
        );

        // The rewrite wraps loose siblings and reuses existing lone groups.
        let nodes = parse(r"a \over b").unwrap();
        assert_eq!(nodes.len(), 1);
        let ParseNode::GenFrac(frac) = &nodes[0] else {
            panic!("expected genfrac, got {:?}", nodes[0]);
        };
        assert!(
            matches!(frac.numer.as_ref(), ParseNode::OrdGroup(g) if g.body.len() == 1)
        );

        // One rewrite per group.
        let nodes = parse(r"a {b \over c} {d \over e}").unwrap();
        assert_eq!(nodes.len(), 3);
        for group in &nodes[1..] {
            assert!(
                matches!(group, ParseNode::OrdGroup(g)
                    if g.body.len() == 1 && matches!(g.body[0], ParseNode::GenFrac(_)))
            );
        }

        // \above carries its bar size into the rewritten fraction.
        let nodes = parse(r"{1 \above{2pt} 3}").unwrap();
        let ParseNode::OrdGroup(group) = &nodes[0] else {
            panic!("expected ordgroup, got {:?}", nodes[0]);
        };
        let ParseNode::GenFrac(frac) = &group.body[0] else {
            panic!("expected genfrac, got {:?}", group.body[0]);
        };
        let bar_size = frac.bar_size.expect("bar size");
        assert_eq!(bar_size.number, 2.0);

        // \atop drops the bar.
        let nodes = parse(r"{1 \atop 2}").unwrap();
        let ParseNode::OrdGroup(group) = &nodes[0] else {
            panic!("expected ordgroup, got {:?}", nodes[0]);
        };
        assert!(matches!(&group.body[0], ParseNode::GenFrac(f) if !f.has_bar_line));
    }

    #[test]
    fn genfrac_command() {
        let nodes = parse(r"\genfrac(){0.8pt}{0}{a}{b}").unwrap();
        let ParseNode::GenFrac(frac) = &nodes[0] else {
            panic!("expected genfrac, got {:?}", nodes[0]);
        };
        assert_eq!(frac.left_delim.as_deref(), Some("("));
        assert_eq!(frac.right_delim.as_deref(), Some(")"));
        assert!(frac.has_bar_line);
        assert_eq!(frac.bar_size.map(|m| m.number), Some(0.8));
        assert_eq!(frac.style, Some(super::nodes::StyleLevel::Display));

        // Blank size argument: default bar, no explicit thickness.
        let nodes = parse(r"\genfrac{}{}{}{}{a}{b}").unwrap();
        let ParseNode::GenFrac(frac) = &nodes[0] else {
            panic!("expected genfrac, got {:?}", nodes[0]);
        };
        assert!(frac.left_delim.is_none());
        assert!(frac.right_delim.is_none());
        assert!(frac.has_bar_line);
        assert!(frac.bar_size.is_none());
        assert!(frac.style.is_none());

        assert!(parse(r"\genfrac(){x}{0}{a}{b}").is_err());
    }

    #[test]
    fn radicals() {
        let mut errs: Vec<String> = Vec::new();
        should_pass!(errs, parse, [r"\sqrt{x}", r"\sqrt2", r"\sqrt\alpha", r"\sqrt[3]{x}"]);
        should_fail!(errs, parse, [r"\sqrt", r"\sqrt^2"]);
        should_differ!(errs, parse, [(r"\sqrt2_3", r"\sqrt{2_3}")]);
        display_errors!(errs);

        let nodes = parse(r"\sqrt[3]{x}").unwrap();
        let ParseNode::Sqrt(sqrt) = &nodes[0] else {
            panic!("expected sqrt, got {:?}", nodes[0]);
        };
        assert!(sqrt.index.is_some());
    }

    #[test]
    fn colors() {
        let mut errs: Vec<String> = Vec::new();
        should_pass!(errs,
                     parse,
                     [r"\color{red} x", r"\textcolor{#fff}{x}", r"\textcolor{ff0000}{x}"]);
        should_fail!(errs, parse, [r"\color{##f} x", r"\textcolor{bad!}{x}"]);
        display_errors!(errs);

        let nodes = parse(r"\color{#fff} x").unwrap();
        assert_eq!(nodes.len(), 1);
        let ParseNode::Color(color) = &nodes[0] else {
            panic!("expected color, got {:?}", nodes[0]);
        };
        assert_eq!(color.color, "#fff");
        assert!(matches!(&color.body[0], ParseNode::MathOrd(sym) if sym.text == "x"));

        // Six bare hex digits gain a leading #.
        let nodes = parse(r"\textcolor{ff0000}{x}").unwrap();
        assert!(matches!(&nodes[0], ParseNode::Color(c) if c.color == "#ff0000"));

        // A color declaration stops at its group boundary.
        let nodes = parse(r"{a \color{red} b} c").unwrap();
        assert_eq!(nodes.len(), 2);
        let ParseNode::OrdGroup(group) = &nodes[0] else {
            panic!("expected ordgroup, got {:?}", nodes[0]);
        };
        assert_eq!(group.body.len(), 2);
        assert!(matches!(&group.body[1], ParseNode::Color(c) if c.body.len() == 1));

        assert!(parse(r"\color{##f} x")
            .unwrap_err()
            .message()
            .starts_with("Invalid color:"));
    }

    #[test]
    fn color_is_text_color() {
        let mut settings = Settings::default();
        settings.color_is_text_color = true;
        let via_setting =
            tree_json!(Parser::new(r"\color{red}{x}", &settings).parse());
        let direct = tree_json!(parse(r"\textcolor{red}{x}"));
        assert_eq!(via_setting, direct);
    }

    #[test]
    fn kerning_and_sizes() {
        let mut errs: Vec<String> = Vec::new();
        should_pass!(errs,
                     parse,
                     [r"\kern1.5em x",
                      r"\kern{-2pt}",
                      r"\mkern18mu",
                      r"\hskip 1em",
                      r"\rule{1em}{2pt}",
                      r"\rule[1ex]{1em}{2pt}"]);
        should_fail!(errs, parse, [r"\kern1xy", r"\kern", r"\rule{1em}"]);
        display_errors!(errs);

        let nodes = parse(r"\kern1.5em").unwrap();
        let ParseNode::Kern(kern) = &nodes[0] else {
            panic!("expected kern, got {:?}", nodes[0]);
        };
        assert_eq!(kern.dimension.number, 1.5);
        assert_eq!(kern.dimension.unit, crate::dimensions::TexUnit::Em);

        assert_eq!(parse(r"\kern1xy").unwrap_err().message(), "Invalid unit: 'xy'");

        let nodes = parse(r"\rule[1ex]{1em}{2pt}").unwrap();
        let ParseNode::Rule(rule) = &nodes[0] else {
            panic!("expected rule, got {:?}", nodes[0]);
        };
        assert!(rule.shift.is_some());

        // LaTeX constrains mu units to the math-spacing commands.
        assert!(parse_strict(r"\mkern1em").is_err());
        assert!(parse_strict(r"\kern1mu").is_err());
        assert!(parse(r"\mkern1em").is_ok());
        assert!(parse(r"\kern1mu").is_ok());
    }

    #[test]
    fn verb() {
        let nodes = parse(r"\verb|x y|").unwrap();
        let ParseNode::Verb(verb) = &nodes[0] else {
            panic!("expected verb, got {:?}", nodes[0]);
        };
        assert_eq!(verb.body, "x y");
        assert!(!verb.star);
        assert_eq!(verb.mode, Mode::Text);

        let nodes = parse(r"\verb*!a b!").unwrap();
        assert!(matches!(&nodes[0], ParseNode::Verb(v) if v.star && v.body == "a b"));

        // Without a closing delimiter on the line there is no verb construct,
        // just an ordinary (and unknown) \verb control word.
        assert_eq!(
            parse(r"\verb|x y").unwrap_err().message(),
            "Undefined control sequence: \\verb"
        );
        let nodes = parse_lenient(r"\verb|x y").unwrap();
        assert_eq!(nodes.len(), 4);
        assert!(matches!(&nodes[0], ParseNode::Color(_)));
        assert!(matches!(&nodes[1], ParseNode::TextOrd(sym) if sym.text == "|"));
    }

    #[test]
    fn urls() {
        let nodes = parse(r"\url{http://a.b/c}").unwrap();
        let ParseNode::Href(href) = &nodes[0] else {
            panic!("expected href, got {:?}", nodes[0]);
        };
        assert_eq!(href.href, "http://a.b/c");
        assert_eq!(href.body.len(), "http://a.b/c".chars().count());

        // hyperref-style escapes are unescaped.
        let nodes = parse(r"\url{a\%b\_c}").unwrap();
        assert!(matches!(&nodes[0], ParseNode::Href(h) if h.href == "a%b_c"));

        // % is an ordinary character inside the URL, a comment outside.
        let nodes = parse("\\url{a%b} c% trailing\n").unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(matches!(&nodes[0], ParseNode::Href(h) if h.href == "a%b"));

        let nodes = parse(r"\href{http://x}{y}").unwrap();
        let ParseNode::Href(href) = &nodes[0] else {
            panic!("expected href, got {:?}", nodes[0]);
        };
        assert_eq!(href.href, "http://x");
        assert!(matches!(&href.body[0], ParseNode::MathOrd(sym) if sym.text == "y"));
    }

    #[test]
    fn images() {
        let nodes = parse(r"\includegraphics{images/pic.png}").unwrap();
        let ParseNode::Img(img) = &nodes[0] else {
            panic!("expected img, got {:?}", nodes[0]);
        };
        assert_eq!(img.src, "images/pic.png");
        assert_eq!(img.alt, "pic");
        assert!(img.width.is_none());

        let nodes = parse(r"\includegraphics[width=2em, totalheight=1.5em]{p.png}").unwrap();
        let ParseNode::Img(img) = &nodes[0] else {
            panic!("expected img, got {:?}", nodes[0]);
        };
        assert_eq!(img.width.map(|m| m.number), Some(2.0));
        assert_eq!(img.total_height.map(|m| m.number), Some(1.5));
        assert!(img.height.is_none());

        assert!(parse(r"\includegraphics[depth=2em]{p.png}")
            .unwrap_err()
            .message()
            .starts_with("Invalid key:"));
    }

    #[test]
    fn text_mode_and_ligatures() {
        let nodes = parse(r"\text{a--b}").unwrap();
        let ParseNode::Text(text) = &nodes[0] else {
            panic!("expected text, got {:?}", nodes[0]);
        };
        assert_eq!(text.body.len(), 3);
        assert!(matches!(&text.body[1], ParseNode::TextOrd(sym) if sym.text == "--"));

        let nodes = parse(r"\text{---}").unwrap();
        let ParseNode::Text(text) = &nodes[0] else {
            panic!("expected text, got {:?}", nodes[0]);
        };
        assert_eq!(text.body.len(), 1);
        assert!(matches!(&text.body[0], ParseNode::TextOrd(sym) if sym.text == "---"));

        let nodes = parse(r"\text{``x''}").unwrap();
        let ParseNode::Text(text) = &nodes[0] else {
            panic!("expected text, got {:?}", nodes[0]);
        };
        assert_eq!(text.body.len(), 3);
        assert!(matches!(&text.body[0], ParseNode::TextOrd(sym) if sym.text == "``"));
        assert!(matches!(&text.body[2], ParseNode::TextOrd(sym) if sym.text == "''"));

        // Spaces are significant in text mode.
        let nodes = parse(r"\text{a b}").unwrap();
        let ParseNode::Text(text) = &nodes[0] else {
            panic!("expected text, got {:?}", nodes[0]);
        };
        assert_eq!(text.body.len(), 3);
        assert!(matches!(&text.body[1], ParseNode::Spacing(_)));

        let nodes = parse(r"\textbf{x}").unwrap();
        assert!(matches!(&nodes[0], ParseNode::Text(t) if t.font.as_deref() == Some("textbf")));

        assert_eq!(
            parse(r"\text{\frac{1}{2}}").unwrap_err().message(),
            "Can't use function '\\frac' in text mode"
        );
    }

    #[test]
    fn ligatures_are_idempotent() {
        let textord = |text: &str| {
            ParseNode::TextOrd(super::nodes::Symbol {
                mode: Mode::Text,
                loc: None,
                text: text.into(),
            })
        };
        let mut body = vec![
            textord("a"),
            textord("-"),
            textord("-"),
            textord("-"),
            textord("b"),
            textord("'"),
            textord("'"),
        ];
        form_ligatures(&mut body);
        let once = body.clone();
        form_ligatures(&mut body);
        assert_eq!(body, once);
        assert!(matches!(&body[1], ParseNode::TextOrd(sym) if sym.text == "---"));
        assert!(matches!(&body[3], ParseNode::TextOrd(sym) if sym.text == "''"));
    }

    #[test]
    fn delimited() {
        let mut errs: Vec<String> = Vec::new();
        should_pass!(errs,
                     parse,
                     [r"\left(\right)",
                      r"\left.\right)",
                      r"\left(\right.",
                      r"\left(x+1\right]",
                      r"\left\{x\right\}",
                      r"\left(a\middle|b\right)",
                      r"\left(\frac{1}{2}\right)"]);
        should_fail!(errs,
                     parse,
                     [r"\left1\right)", r"\left(", r"\left(\right", r"\middle|x", r"\right)"]);
        display_errors!(errs);

        let nodes = parse(r"\left(x\right]").unwrap();
        let ParseNode::LeftRight(leftright) = &nodes[0] else {
            panic!("expected leftright, got {:?}", nodes[0]);
        };
        assert_eq!(leftright.left, "(");
        assert_eq!(leftright.right, "]");
        assert_eq!(leftright.body.len(), 1);

        assert_eq!(
            parse(r"\middle|x").unwrap_err().message(),
            "\\middle without preceding \\left"
        );
        assert_eq!(
            parse(r"\right)").unwrap_err().message(),
            "Expected 'EOF', got '\\right'"
        );
    }

    #[test]
    fn limit_controls() {
        let mut errs: Vec<String> = Vec::new();
        should_pass!(errs,
                     parse,
                     [r"\sum\limits_n x",
                      r"\int\nolimits_a^b f",
                      r"\lim\limits_{x}",
                      r"\operatornamewithlimits{argmax}\limits_x"]);
        should_fail!(errs,
                     parse,
                     [r"x\limits_n", r"\limits", r"\operatorname{sn}\limits_x"]);
        display_errors!(errs);

        let nodes = parse(r"\sum\limits_n").unwrap();
        let ParseNode::SupSub(supsub) = &nodes[0] else {
            panic!("expected supsub, got {:?}", nodes[0]);
        };
        let Some(ParseNode::Op(op)) = supsub.base.as_deref() else {
            panic!("expected op base, got {:?}", supsub.base);
        };
        assert!(op.limits);
        assert!(op.always_handle_sup_sub);
        assert!(op.symbol);

        assert_eq!(
            parse(r"x\limits_n").unwrap_err().message(),
            "Limit controls must follow a math operator"
        );
    }

    #[test]
    fn operators() {
        let nodes = parse(r"\lim").unwrap();
        assert!(matches!(&nodes[0], ParseNode::Op(op) if op.limits && !op.symbol));
        let nodes = parse(r"\sin").unwrap();
        assert!(matches!(&nodes[0], ParseNode::Op(op) if !op.limits && !op.symbol));
        let nodes = parse(r"\int").unwrap();
        assert!(matches!(&nodes[0], ParseNode::Op(op) if !op.limits && op.symbol));

        let nodes = parse(r"\operatorname{sn}").unwrap();
        let ParseNode::OperatorName(op) = &nodes[0] else {
            panic!("expected operatorname, got {:?}", nodes[0]);
        };
        assert_eq!(op.body.len(), 2);
        assert!(!op.always_handle_sup_sub);
    }

    #[test]
    fn styling() {
        let nodes = parse(r"a \displaystyle b^2").unwrap();
        assert_eq!(nodes.len(), 2);
        let ParseNode::Styling(styling) = &nodes[1] else {
            panic!("expected styling, got {:?}", nodes[1]);
        };
        assert_eq!(styling.style, super::nodes::StyleLevel::Display);
        assert_eq!(styling.body.len(), 1);
        assert!(matches!(&styling.body[0], ParseNode::SupSub(_)));
    }

    #[test]
    fn raisebox() {
        let nodes = parse(r"\raisebox{1em}{x}").unwrap();
        let ParseNode::Raisebox(raisebox) = &nodes[0] else {
            panic!("expected raisebox, got {:?}", nodes[0]);
        };
        assert_eq!(raisebox.dy.number, 1.0);
        // The box content arrives as text wrapped in a text-style styling.
        let ParseNode::Styling(styling) = raisebox.body.as_ref() else {
            panic!("expected styling body, got {:?}", raisebox.body);
        };
        assert_eq!(styling.style, super::nodes::StyleLevel::Text);
        assert!(matches!(&styling.body[0], ParseNode::OrdGroup(g) if g.mode == Mode::Text));
    }

    #[test]
    fn unknown_commands() {
        assert_eq!(
            parse(r"\foo").unwrap_err().message(),
            "Undefined control sequence: \\foo"
        );

        let nodes = parse_lenient(r"\foo").unwrap();
        let ParseNode::Color(color) = &nodes[0] else {
            panic!("expected color, got {:?}", nodes[0]);
        };
        assert_eq!(color.color, "#cc0000");
        let ParseNode::Text(text) = &color.body[0] else {
            panic!("expected text, got {:?}", color.body[0]);
        };
        assert_eq!(text.body.len(), 4);
        for (node, expected) in text.body.iter().zip(["\\", "f", "o", "o"]) {
            assert!(matches!(node, ParseNode::TextOrd(sym) if sym.text == expected));
        }
    }

    #[test]
    fn unicode_symbols_and_accents() {
        let mut errs: Vec<String> = Vec::new();
        should_equate!(errs, parse, [(r"é", r"\acute e"), (r"ñ", r"\tilde n")]);
        display_errors!(errs);

        assert!(parse_strict("é").is_err());
        assert!(parse("é").is_ok());

        // Text mode uses the text-accent spellings.
        let nodes = parse(r"\text{é}").unwrap();
        let ParseNode::Text(text) = &nodes[0] else {
            panic!("expected text, got {:?}", nodes[0]);
        };
        let ParseNode::Accent(accent) = &text.body[0] else {
            panic!("expected accent, got {:?}", text.body[0]);
        };
        assert_eq!(accent.label, "\\'");
        assert!(!accent.is_stretchy);
        assert!(accent.is_shifty);
        assert!(matches!(accent.base.as_ref(), ParseNode::TextOrd(sym) if sym.text == "e"));

        // An accented i loses its dot.
        let nodes = parse(r"\text{ï}").unwrap();
        let ParseNode::Text(text) = &nodes[0] else {
            panic!("expected text, got {:?}", nodes[0]);
        };
        let ParseNode::Accent(accent) = &text.body[0] else {
            panic!("expected accent, got {:?}", text.body[0]);
        };
        assert!(matches!(accent.base.as_ref(), ParseNode::TextOrd(sym) if sym.text == "\u{0131}"));

        // Unsupported scripts degrade to text, or fail under strict.
        let nodes = parse("★").unwrap();
        assert!(matches!(&nodes[0], ParseNode::TextOrd(sym) if sym.mode == Mode::Text));
        assert!(parse_strict("★").is_err());
    }

    #[test]
    fn groups() {
        let nodes = parse(r"\begingroup x\endgroup").unwrap();
        assert!(matches!(&nodes[0], ParseNode::OrdGroup(g) if g.semisimple));
        let nodes = parse(r"{x}").unwrap();
        assert!(matches!(&nodes[0], ParseNode::OrdGroup(g) if !g.semisimple));

        assert_eq!(parse(r"{x").unwrap_err().message(), "Expected '}', got 'EOF'");
        assert_eq!(
            parse(r"\begingroup x}").unwrap_err().message(),
            "Expected '\\endgroup', got '}'"
        );
        assert_eq!(parse(r"x}").unwrap_err().message(), "Expected 'EOF', got '}'");
        assert_eq!(parse("a & b").unwrap_err().message(), "Expected 'EOF', got '&'");
        assert_eq!(
            parse(r"\end{array}").unwrap_err().message(),
            "Expected 'EOF', got '\\end'"
        );
    }

    #[test]
    fn spacing_symbols() {
        let nodes = parse(r"a\quad b").unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(matches!(&nodes[1], ParseNode::Spacing(sym) if sym.text == "\\quad"));
        let nodes = parse("a~b").unwrap();
        assert!(matches!(&nodes[1], ParseNode::Spacing(sym) if sym.text == "~"));
    }

    #[test]
    fn comments() {
        let nodes = parse("a% a comment\nb").unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn lookahead_tokens_carry_positions() {
        // Error positions point into the source.
        let err = parse("x^x^x").unwrap_err();
        let token: &Token = err.token.as_ref().expect("token attribution");
        assert_eq!(token.text, "^");
        assert_eq!(token.loc.map(|loc| loc.start), Some(3));
    }
}
