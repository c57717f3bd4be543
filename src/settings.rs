//! Knobs controlling how permissive parsing is.

use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

/// How the parser reacts to input that is valid here but not in LaTeX
/// (for instance a bare Unicode text character in math mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrictMode {
    /// Accept silently.
    Ignore,
    /// Accept, but log a warning through the `log` crate.
    Warn,
    /// Reject with a [`ParseError`].
    Error,
}

/// Parsing settings, consumed by reference by [`Parser`](crate::Parser).
#[derive(Debug, Clone)]
pub struct Settings {
    /// When set, the top-level expression is parsed in the surrounding macro
    /// scope instead of opening a fresh group of its own.
    pub global_group: bool,
    /// Makes `\color` behave like `\textcolor` (two arguments) rather than as
    /// a declaration affecting the rest of the group.
    pub color_is_text_color: bool,
    /// When unset, unknown commands render as error-colored text instead of
    /// failing the whole parse.
    pub throw_on_error: bool,
    /// Reaction to LaTeX-incompatible but parseable input.
    pub strict: StrictMode,
    /// Color used for the unknown-command fallback rendering.
    pub error_color: String,
    /// Upper bound on macro expansions, as a guard against recursive macros.
    pub max_expand: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            global_group: false,
            color_is_text_color: false,
            throw_on_error: true,
            strict: StrictMode::Warn,
            error_color: "#cc0000".into(),
            max_expand: 1000,
        }
    }
}

impl Settings {
    /// Reports LaTeX-incompatible input.
    ///
    /// Depending on [`Settings::strict`] this is a no-op, a logged warning or
    /// a fatal error attributed to `token`.
    pub fn report_nonstrict(
        &self,
        error_code: &str,
        error_msg: &str,
        token: Option<&Token>,
    ) -> ParseResult<()> {
        match self.strict {
            StrictMode::Ignore => Ok(()),
            StrictMode::Warn => {
                warn!(
                    "LaTeX-incompatible input and strict mode is set to 'warn': {} [{}]",
                    error_msg, error_code
                );
                Ok(())
            }
            StrictMode::Error => Err(ParseError::with_opt_token(
                format!(
                    "LaTeX-incompatible input and strict mode is set to 'error': {} [{}]",
                    error_msg, error_code
                ),
                token,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictness_levels() {
        let mut settings = Settings::default();

        settings.strict = StrictMode::Ignore;
        assert!(settings.report_nonstrict("unicodeTextInMathMode", "msg", None).is_ok());

        settings.strict = StrictMode::Warn;
        assert!(settings.report_nonstrict("unicodeTextInMathMode", "msg", None).is_ok());

        settings.strict = StrictMode::Error;
        let err = settings
            .report_nonstrict("unicodeTextInMathMode", "msg", None)
            .unwrap_err();
        assert!(err.message().contains("unicodeTextInMathMode"));
    }
}
