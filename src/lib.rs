/*! # A TeX math expression parser.

This library takes a formula written in TeX syntax (e.g. `\cos\frac{\pi}{4}`)
and parses it into a tree of [`ParseNode`]s that a layout or rendering stage
can consume.

## Basic usage

The simplest entry point is [`parse`]:

```
let nodes = textree::parse(r"e = \lim_{n \to \infty} \left(1 + \frac{1}{n}\right)^n").expect("parse error");
```

Parsing behavior can be tuned through [`Settings`], for instance to degrade
unknown commands into colored placeholders instead of failing:

```
let mut settings = textree::Settings::default();
settings.throw_on_error = false;
let nodes = textree::parse_with_settings(r"x + \unknowncommand", &settings).unwrap();
```

## Pipeline

Parsing is split in three stages, each usable on its own:

  1. The [`lexer`](crate::lexer) turns the input into [`Token`](crate::lexer::Token)s,
     honoring catcode overrides (`%` may be a comment starter or an ordinary
     character).
  2. The [`expander`](crate::expander) sits between the lexer and the parser. It
     expands macros (`\color` may be remapped to `\textcolor`, user macros can
     be installed on its namespace) and hands the parser one token at a time.
  3. The [`parser`](crate::parser) proper consumes the expanded token stream and
     builds the tree: atoms with scripts, groups, functions with typed
     arguments, infix rewriting, ligatures.

The resulting tree serializes with `serde`; every node carries a `type` tag
(`"atom"`, `"supsub"`, `"genfrac"`, ...) so downstream tools can dispatch on it.
*/

#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

#[macro_use]
mod macros;

#[deny(missing_docs)]
pub mod error;
#[deny(missing_docs)]
pub mod settings;
pub mod lexer;
pub mod expander;
pub mod dimensions;
#[warn(missing_docs)]
pub mod parser;

use std::fmt;

pub use crate::error::{ParseError, ParseResult};
pub use crate::parser::nodes::ParseNode;
pub use crate::parser::{parse, parse_with_settings, Parser};
pub use crate::settings::{Settings, StrictMode};

/// The two parsing modes of TeX this parser distinguishes.
///
/// The mode decides which symbols and functions are available, whether spaces
/// are significant and how bare Unicode characters are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Mathematical content, the default at top level.
    Math,
    /// Plain text content, entered through `\text{..}` and friends.
    Text,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Math => write!(f, "math"),
            Mode::Text => write!(f, "text"),
        }
    }
}
