//! Nodes are the output of parsing.
//!
//! Every node kind is a variant of [`ParseNode`] carrying a `type` tag in its
//! serialized form, the [`Mode`] it was parsed in and, when it comes straight
//! from source text, a byte span. Trees are built once and never mutated
//! afterwards, with two exceptions during parsing itself: `\limits` patches
//! the preceding operator, and ligature formation rewrites sibling runs
//! before the list is handed to a parent.

use crate::dimensions::Measurement;
use crate::lexer::{SourceLocation, Token};
use crate::Mode;

use super::symbols::Family;

/// A node of the parsed tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ParseNode {
    /// A symbol taking part in math spacing, e.g. `+` (family `bin`).
    #[serde(rename = "atom")]
    Atom(Atom),
    /// An ordinary math symbol, e.g. `x` or `\alpha`.
    #[serde(rename = "mathord")]
    MathOrd(Symbol),
    /// An ordinary text symbol; digits are textords even in math mode.
    #[serde(rename = "textord")]
    TextOrd(Symbol),
    /// Explicit spacing like `\quad` or `~`.
    #[serde(rename = "spacing")]
    Spacing(Symbol),
    /// A braced group `{..}`, or a `\begingroup..\endgroup` one when
    /// `semisimple` is set.
    #[serde(rename = "ordgroup")]
    OrdGroup(OrdGroup),
    /// A base with superscript and/or subscript.
    #[serde(rename = "supsub")]
    SupSub(SupSub),
    /// An infix command such as `\over`, rewritten away before a tree is
    /// returned.
    #[serde(rename = "infix")]
    Infix(Infix),
    /// An accented nucleus.
    #[serde(rename = "accent")]
    Accent(Accent),
    /// Colored content.
    #[serde(rename = "color")]
    Color(Color),
    /// A parsed color argument.
    #[serde(rename = "color-token")]
    ColorToken(ColorToken),
    /// A parsed size argument.
    #[serde(rename = "size")]
    Size(Size),
    /// A parsed URL argument.
    #[serde(rename = "url")]
    Url(Url),
    /// A parsed raw-string argument.
    #[serde(rename = "raw")]
    Raw(Raw),
    /// A style change scoped to its body.
    #[serde(rename = "styling")]
    Styling(Styling),
    /// Text-mode content.
    #[serde(rename = "text")]
    Text(Text),
    /// A `\verb` construct.
    #[serde(rename = "verb")]
    Verb(Verb),
    /// A generalized fraction: `\frac`, `\binom`, `\genfrac`, and the
    /// rewritten forms of `\over`/`\above`/`\atop`/`\choose`.
    #[serde(rename = "genfrac")]
    GenFrac(GenFrac),
    /// A radical.
    #[serde(rename = "sqrt")]
    Sqrt(Sqrt),
    /// A big operator or named function operator.
    #[serde(rename = "op")]
    Op(Op),
    /// `\operatorname{..}`.
    #[serde(rename = "operatorname")]
    OperatorName(OperatorName),
    /// Fixed spacing from `\kern` and friends.
    #[serde(rename = "kern")]
    Kern(Kern),
    /// A filled rectangle.
    #[serde(rename = "rule")]
    Rule(Rule),
    /// A hyperlink.
    #[serde(rename = "href")]
    Href(Href),
    /// An included image.
    #[serde(rename = "img")]
    Img(Img),
    /// Vertically shifted content.
    #[serde(rename = "raisebox")]
    Raisebox(Raisebox),
    /// A `\left..\right` pair with its body.
    #[serde(rename = "leftright")]
    LeftRight(LeftRight),
    /// The `\right` half, only ever seen by the `\left` handler.
    #[serde(rename = "leftright-right")]
    LeftRightRight(LeftRightRight),
    /// A `\middle` delimiter.
    #[serde(rename = "middle")]
    Middle(Middle),
}

/// Cf [`ParseNode::Atom`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Atom {
    pub family: Family,
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub text: String,
}

/// Shared payload of [`ParseNode::MathOrd`], [`ParseNode::TextOrd`] and
/// [`ParseNode::Spacing`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub text: String,
}

/// Cf [`ParseNode::OrdGroup`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrdGroup {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub body: Vec<ParseNode>,
    pub semisimple: bool,
}

/// Cf [`ParseNode::SupSub`]. At least one of `sup`/`sub` is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupSub {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub base: Option<Box<ParseNode>>,
    pub sup: Option<Box<ParseNode>>,
    pub sub: Option<Box<ParseNode>>,
}

/// Cf [`ParseNode::Infix`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Infix {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    /// Name of the prefix function this infix command rewrites to.
    pub replace_with: String,
    /// Bar thickness, for `\above`.
    pub size: Option<Measurement>,
    #[serde(skip)]
    pub token: Option<Token>,
}

/// Cf [`ParseNode::Accent`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accent {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    /// The accent command, e.g. `\hat`.
    pub label: String,
    pub is_stretchy: bool,
    pub is_shifty: bool,
    pub base: Box<ParseNode>,
}

/// Cf [`ParseNode::Color`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Color {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub color: String,
    pub body: Vec<ParseNode>,
}

/// Cf [`ParseNode::ColorToken`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorToken {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub color: String,
}

/// Cf [`ParseNode::Size`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Size {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub value: Measurement,
    /// Set when an empty `{}` argument defaulted to `0pt`.
    pub is_blank: bool,
}

/// Cf [`ParseNode::Url`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Url {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub url: String,
}

/// Cf [`ParseNode::Raw`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raw {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub string: String,
}

/// Style levels for [`Styling`] and [`GenFrac`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleLevel {
    Display,
    Text,
    Script,
    ScriptScript,
}

/// Cf [`ParseNode::Styling`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Styling {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub style: StyleLevel,
    pub body: Vec<ParseNode>,
}

/// Cf [`ParseNode::Text`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub body: Vec<ParseNode>,
    /// The requesting command without its backslash, e.g. `textbf`. Absent
    /// for plain `\text`.
    pub font: Option<String>,
}

/// Cf [`ParseNode::Verb`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verb {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub body: String,
    pub star: bool,
}

/// Cf [`ParseNode::GenFrac`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenFrac {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub numer: Box<ParseNode>,
    pub denom: Box<ParseNode>,
    pub has_bar_line: bool,
    pub left_delim: Option<String>,
    pub right_delim: Option<String>,
    /// Forced style, or inherit when absent.
    pub style: Option<StyleLevel>,
    pub bar_size: Option<Measurement>,
}

/// Cf [`ParseNode::Sqrt`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sqrt {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub body: Box<ParseNode>,
    pub index: Option<Box<ParseNode>>,
}

/// Cf [`ParseNode::Op`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Op {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    /// Whether scripts attach above and below rather than to the side.
    pub limits: bool,
    pub always_handle_sup_sub: bool,
    /// Set for single-glyph operators like `\sum`.
    pub symbol: bool,
    /// The defining command, e.g. `\lim` or `\int`.
    pub name: String,
}

/// Cf [`ParseNode::OperatorName`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorName {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub body: Vec<ParseNode>,
    pub always_handle_sup_sub: bool,
    pub limits: bool,
}

/// Cf [`ParseNode::Kern`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kern {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub dimension: Measurement,
}

/// Cf [`ParseNode::Rule`]. While intended as lines, rules can be any
/// rectangle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub shift: Option<Measurement>,
    pub width: Measurement,
    pub height: Measurement,
}

/// Cf [`ParseNode::Href`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Href {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub href: String,
    pub body: Vec<ParseNode>,
}

/// Cf [`ParseNode::Img`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Img {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub src: String,
    pub alt: String,
    pub width: Option<Measurement>,
    pub height: Option<Measurement>,
    pub total_height: Option<Measurement>,
}

/// Cf [`ParseNode::Raisebox`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raisebox {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub dy: Measurement,
    pub body: Box<ParseNode>,
}

/// Cf [`ParseNode::LeftRight`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeftRight {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub body: Vec<ParseNode>,
    pub left: String,
    pub right: String,
}

/// Cf [`ParseNode::LeftRightRight`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeftRightRight {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub delim: String,
}

/// Cf [`ParseNode::Middle`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Middle {
    pub mode: Mode,
    #[serde(skip)]
    pub loc: Option<SourceLocation>,
    pub delim: String,
}

impl ParseNode {
    /// The mode the node was parsed in.
    pub fn mode(&self) -> Mode {
        match self {
            ParseNode::Atom(n) => n.mode,
            ParseNode::MathOrd(n) | ParseNode::TextOrd(n) | ParseNode::Spacing(n) => n.mode,
            ParseNode::OrdGroup(n) => n.mode,
            ParseNode::SupSub(n) => n.mode,
            ParseNode::Infix(n) => n.mode,
            ParseNode::Accent(n) => n.mode,
            ParseNode::Color(n) => n.mode,
            ParseNode::ColorToken(n) => n.mode,
            ParseNode::Size(n) => n.mode,
            ParseNode::Url(n) => n.mode,
            ParseNode::Raw(n) => n.mode,
            ParseNode::Styling(n) => n.mode,
            ParseNode::Text(n) => n.mode,
            ParseNode::Verb(n) => n.mode,
            ParseNode::GenFrac(n) => n.mode,
            ParseNode::Sqrt(n) => n.mode,
            ParseNode::Op(n) => n.mode,
            ParseNode::OperatorName(n) => n.mode,
            ParseNode::Kern(n) => n.mode,
            ParseNode::Rule(n) => n.mode,
            ParseNode::Href(n) => n.mode,
            ParseNode::Img(n) => n.mode,
            ParseNode::Raisebox(n) => n.mode,
            ParseNode::LeftRight(n) => n.mode,
            ParseNode::LeftRightRight(n) => n.mode,
            ParseNode::Middle(n) => n.mode,
        }
    }

    /// For symbol-like nodes, the symbol text.
    pub fn symbol_text(&self) -> Option<&str> {
        match self {
            ParseNode::Atom(atom) => Some(&atom.text),
            ParseNode::MathOrd(sym) | ParseNode::TextOrd(sym) => Some(&sym.text),
            _ => None,
        }
    }
}

/// The contents of a function argument: a braced group contributes its body,
/// anything else is a singleton.
pub fn ord_argument(node: ParseNode) -> Vec<ParseNode> {
    match node {
        ParseNode::OrdGroup(group) => group.body,
        node => vec![node],
    }
}

/// Unwraps a braced group holding exactly one node.
pub fn normalize_argument(node: ParseNode) -> ParseNode {
    match node {
        ParseNode::OrdGroup(mut group) if group.body.len() == 1 => {
            match group.body.pop() {
                Some(inner) => inner,
                None => ParseNode::OrdGroup(group),
            }
        }
        node => node,
    }
}
