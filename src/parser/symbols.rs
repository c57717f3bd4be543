//! Symbol tables: what a character or named command means in each mode.

use crate::Mode;

/// Families of symbols that take part in math spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Bin,
    Close,
    Inner,
    Open,
    Punct,
    Rel,
}

/// What the symbol table knows about a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// A spacing atom of the given family.
    Atom(Family),
    /// An ordinary math symbol.
    MathOrd,
    /// An ordinary text symbol.
    TextOrd,
    /// Explicit spacing.
    Spacing,
}

/// Looks up a token text in the symbol table of `mode`.
pub fn lookup(mode: Mode, text: &str) -> Option<Group> {
    match mode {
        Mode::Math => math_symbol(text),
        Mode::Text => text_symbol(text),
    }
}

#[cfg_attr(rustfmt, rustfmt_skip)]
fn math_symbol(text: &str) -> Option<Group> {
    use self::Family::*;

    let group = match text {
        // Greek letters by name
        "\\Gamma" | "\\Delta" | "\\Theta" | "\\Lambda" | "\\Xi" | "\\Pi" | "\\Sigma" |
        "\\Upsilon" | "\\Phi" | "\\Psi" | "\\Omega" |
        "\\alpha" | "\\beta" | "\\gamma" | "\\delta" | "\\epsilon" | "\\zeta" | "\\eta" |
        "\\theta" | "\\iota" | "\\kappa" | "\\lambda" | "\\mu" | "\\nu" | "\\xi" |
        "\\omicron" | "\\pi" | "\\rho" | "\\sigma" | "\\tau" | "\\upsilon" | "\\phi" |
        "\\chi" | "\\psi" | "\\omega" |
        "\\varepsilon" | "\\vartheta" | "\\varpi" | "\\varrho" | "\\varsigma" | "\\varphi"
            => Group::MathOrd,

        // Other ordinary named symbols
        "\\infty" | "\\prime" | "\\hbar" | "\\ell" | "\\partial" | "\\nabla" |
        "\\emptyset" | "\\varnothing" | "\\forall" | "\\exists" | "\\neg" | "\\lnot" |
        "\\top" | "\\bot" | "\\aleph" | "\\beth" | "\\Re" | "\\Im" | "\\wp" | "\\angle" |
        "\\triangle" | "\\backslash" | "\\vert" | "\\Vert" | "\\|" | "\\imath" | "\\jmath" |
        "\\vdots"
            => Group::MathOrd,

        // Binary operators
        "\\pm" | "\\mp" | "\\times" | "\\div" | "\\cdot" | "\\ast" | "\\star" |
        "\\cap" | "\\cup" | "\\sqcap" | "\\sqcup" | "\\vee" | "\\wedge" | "\\setminus" |
        "\\oplus" | "\\ominus" | "\\otimes" | "\\oslash" | "\\odot" | "\\circ" |
        "\\bullet" | "\\dagger" | "\\ddagger" | "\\amalg" | "\\uplus" | "\\wr"
            => Group::Atom(Bin),

        // Relations
        "\\leq" | "\\le" | "\\geq" | "\\ge" | "\\neq" | "\\ne" | "\\equiv" | "\\sim" |
        "\\simeq" | "\\approx" | "\\cong" | "\\ll" | "\\gg" | "\\prec" | "\\succ" |
        "\\subset" | "\\supset" | "\\subseteq" | "\\supseteq" | "\\in" | "\\ni" |
        "\\notin" | "\\propto" | "\\perp" | "\\mid" | "\\parallel" | "\\asymp" |
        "\\smile" | "\\frown" | "\\doteq" | "\\models" | "\\dashv" | "\\vdash" |
        "\\rightarrow" | "\\leftarrow" | "\\to" | "\\gets" | "\\mapsto" |
        "\\Rightarrow" | "\\Leftarrow" | "\\leftrightarrow" | "\\Leftrightarrow" |
        "\\iff" | "\\implies" | "\\impliedby" | "\\longrightarrow" | "\\longleftarrow" |
        "\\uparrow" | "\\downarrow" | "\\updownarrow" | "\\Uparrow" | "\\Downarrow" |
        "\\Updownarrow" | "\\nearrow" | "\\searrow" | "\\swarrow" | "\\nwarrow" |
        "\\hookrightarrow" | "\\hookleftarrow"
            => Group::Atom(Rel),

        // Delimiters by name
        "\\lbrace" | "\\langle" | "\\lceil" | "\\lfloor" | "\\lbrack" | "\\{"
            => Group::Atom(Open),
        "\\rbrace" | "\\rangle" | "\\rceil" | "\\rfloor" | "\\rbrack" | "\\}"
            => Group::Atom(Close),

        // Inner dots
        "\\cdots" | "\\ldots" | "\\ddots" | "\\dots" | "\\dotsb"
            => Group::Atom(Inner),

        "\\cdotp" | "\\colon" => Group::Atom(Punct),

        // Spacing commands
        "\\ " | "~" | "\\space" | "\\nobreakspace" |
        "\\," | "\\thinspace" | "\\:" | "\\medspace" | "\\;" | "\\thickspace" |
        "\\!" | "\\negthinspace" | "\\enspace" | "\\quad" | "\\qquad"
            => Group::Spacing,

        // Escaped specials render as plain characters
        "\\$" | "\\%" | "\\#" | "\\&" | "\\_" => Group::TextOrd,

        _ => return math_char(text),
    };
    Some(group)
}

/// Single characters in math mode. Texts longer than one char (control
/// sequences, accented clusters) have no entry here.
fn math_char(text: &str) -> Option<Group> {
    use self::Family::*;

    let mut chars = text.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let group = match c {
        '0'..='9' => Group::TextOrd,
        'a'..='z' | 'A'..='Z' => Group::MathOrd,
        '\u{0391}'..='\u{03a9}' | '\u{03b1}'..='\u{03c9}' |
        '\u{03d1}' | '\u{03d5}' | '\u{03d6}' | '\u{03f1}' | '\u{03f5}' => Group::MathOrd,
        '+' | '-' | '*' => Group::Atom(Bin),
        '(' | '[' => Group::Atom(Open),
        ')' | ']' | '?' | '!' => Group::Atom(Close),
        '=' | '<' | '>' | ':' => Group::Atom(Rel),
        ',' | ';' => Group::Atom(Punct),
        '/' | '@' | '.' | '"' | '`' | '|' => Group::TextOrd,
        // Latin-1 letters accepted in math with a strict-mode diagnostic
        'Ç' | 'Ð' | 'Þ' | 'ç' | 'þ' => Group::MathOrd,
        _ => return None,
    };
    Some(group)
}

#[cfg_attr(rustfmt, rustfmt_skip)]
fn text_symbol(text: &str) -> Option<Group> {
    let group = match text {
        "\\$" | "\\%" | "\\#" | "\\&" | "\\_" | "\\{" | "\\}" => Group::TextOrd,
        "\\ " | " " | "~" | "\\space" | "\\nobreakspace" |
        "\\," | "\\thinspace" | "\\enspace" => Group::Spacing,
        _ => return text_char(text),
    };
    Some(group)
}

fn text_char(text: &str) -> Option<Group> {
    let mut chars = text.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match c {
        'a'..='z' | 'A'..='Z' | '0'..='9' => Some(Group::TextOrd),
        '!' | '@' | '*' | '(' | ')' | '-' | '=' | '+' | '<' | '>' | '"' | ';' | ':' |
        '?' | '/' | '.' | ',' | '\'' | '`' | '|' | '[' | ']' => Some(Group::TextOrd),
        // Latin-1 and dotless letters available as text
        'ı' | 'ȷ' | 'ß' | 'æ' | 'œ' | 'Æ' | 'Œ' | 'ø' | 'Ø' | 'å' | 'Å' |
        'Ç' | 'Ð' | 'Þ' | 'ç' | 'þ' => Some(Group::TextOrd),
        _ => None,
    }
}

/// Latin-1 characters present in the math table only for compatibility;
/// strict mode flags their use there.
pub const EXTRA_LATIN: &str = "ÇÐÞçþ";

/// Decomposition of precomposed Latin letters into base plus combining marks,
/// applied when the precomposed character has no symbol entry of its own.
#[cfg_attr(rustfmt, rustfmt_skip)]
pub fn unicode_symbol(c: char) -> Option<&'static str> {
    Some(match c {
        'á' => "a\u{0301}", 'à' => "a\u{0300}", 'ä' => "a\u{0308}", 'â' => "a\u{0302}",
        'ã' => "a\u{0303}", 'ā' => "a\u{0304}", 'ă' => "a\u{0306}", 'å' => "a\u{030a}",
        'é' => "e\u{0301}", 'è' => "e\u{0300}", 'ë' => "e\u{0308}", 'ê' => "e\u{0302}",
        'ē' => "e\u{0304}", 'ĕ' => "e\u{0306}", 'ě' => "e\u{030c}",
        'í' => "i\u{0301}", 'ì' => "i\u{0300}", 'ï' => "i\u{0308}", 'î' => "i\u{0302}",
        'ī' => "i\u{0304}",
        'ó' => "o\u{0301}", 'ò' => "o\u{0300}", 'ö' => "o\u{0308}", 'ô' => "o\u{0302}",
        'õ' => "o\u{0303}", 'ō' => "o\u{0304}", 'ő' => "o\u{030b}",
        'ú' => "u\u{0301}", 'ù' => "u\u{0300}", 'ü' => "u\u{0308}", 'û' => "u\u{0302}",
        'ū' => "u\u{0304}", 'ů' => "u\u{030a}", 'ű' => "u\u{030b}",
        'ý' => "y\u{0301}", 'ỳ' => "y\u{0300}", 'ÿ' => "y\u{0308}", 'ŷ' => "y\u{0302}",
        'ñ' => "n\u{0303}", 'ń' => "n\u{0301}", 'ň' => "n\u{030c}",
        'š' => "s\u{030c}", 'ž' => "z\u{030c}", 'č' => "c\u{030c}", 'ř' => "r\u{030c}",
        'ć' => "c\u{0301}", 'ġ' => "g\u{0307}", 'ḡ' => "g\u{0304}",
        'Á' => "A\u{0301}", 'À' => "A\u{0300}", 'Ä' => "A\u{0308}", 'Â' => "A\u{0302}",
        'Ã' => "A\u{0303}", 'Å' => "A\u{030a}",
        'É' => "E\u{0301}", 'È' => "E\u{0300}", 'Ë' => "E\u{0308}", 'Ê' => "E\u{0302}",
        'Í' => "I\u{0301}", 'Ì' => "I\u{0300}", 'Ï' => "I\u{0308}", 'Î' => "I\u{0302}",
        'Ó' => "O\u{0301}", 'Ò' => "O\u{0300}", 'Ö' => "O\u{0308}", 'Ô' => "O\u{0302}",
        'Õ' => "O\u{0303}",
        'Ú' => "U\u{0301}", 'Ù' => "U\u{0300}", 'Ü' => "U\u{0308}", 'Û' => "U\u{0302}",
        'Ñ' => "N\u{0303}", 'Š' => "S\u{030c}", 'Ž' => "Z\u{030c}",
        _ => return None,
    })
}

/// Per-mode accent commands for a combining mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeAccent {
    pub math: Option<&'static str>,
    pub text: Option<&'static str>,
}

impl UnicodeAccent {
    pub fn label(&self, mode: Mode) -> Option<&'static str> {
        match mode {
            Mode::Math => self.math,
            Mode::Text => self.text,
        }
    }
}

/// The accent command equivalent to a combining diacritical mark.
pub fn unicode_accent(mark: char) -> Option<UnicodeAccent> {
    let accent = match mark {
        '\u{0300}' => UnicodeAccent { math: Some("\\grave"), text: Some("\\`") },
        '\u{0301}' => UnicodeAccent { math: Some("\\acute"), text: Some("\\'") },
        '\u{0302}' => UnicodeAccent { math: Some("\\hat"), text: Some("\\^") },
        '\u{0303}' => UnicodeAccent { math: Some("\\tilde"), text: Some("\\~") },
        '\u{0304}' => UnicodeAccent { math: Some("\\bar"), text: Some("\\=") },
        '\u{0306}' => UnicodeAccent { math: Some("\\breve"), text: Some("\\u") },
        '\u{0307}' => UnicodeAccent { math: Some("\\dot"), text: Some("\\.") },
        '\u{0308}' => UnicodeAccent { math: Some("\\ddot"), text: Some("\\\"") },
        '\u{030a}' => UnicodeAccent { math: Some("\\mathring"), text: Some("\\r") },
        '\u{030b}' => UnicodeAccent { math: None, text: Some("\\H") },
        '\u{030c}' => UnicodeAccent { math: Some("\\check"), text: Some("\\v") },
        _ => return None,
    };
    Some(accent)
}

/// Whether a codepoint belongs to a script this parser can at least render
/// as text. Anything else draws an `unknownSymbol` diagnostic under strict
/// mode.
pub fn supported_codepoint(c: char) -> bool {
    matches!(c as u32,
        0x0000..=0x007f            // ascii
        | 0x00a0..=0x024f          // latin-1 and latin extended
        | 0x0300..=0x036f          // combining marks
        | 0x0370..=0x03ff          // greek
        | 0x0400..=0x04ff          // cyrillic
        | 0x1e00..=0x1eff          // latin extended additional
        | 0x1f00..=0x1fff          // greek extended
        | 0x3000..=0x30ff          // cjk punctuation and kana
        | 0x4e00..=0x9fff          // cjk ideographs
        | 0xac00..=0xd7a3          // hangul
        | 0xff00..=0xff60          // fullwidth forms
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mode;

    #[test]
    fn char_classification() {
        assert_eq!(lookup(Mode::Math, "x"), Some(Group::MathOrd));
        assert_eq!(lookup(Mode::Math, "4"), Some(Group::TextOrd));
        assert_eq!(lookup(Mode::Math, "+"), Some(Group::Atom(Family::Bin)));
        assert_eq!(lookup(Mode::Math, "("), Some(Group::Atom(Family::Open)));
        assert_eq!(lookup(Mode::Math, "!"), Some(Group::Atom(Family::Close)));
        assert_eq!(lookup(Mode::Math, "="), Some(Group::Atom(Family::Rel)));
        assert_eq!(lookup(Mode::Math, ","), Some(Group::Atom(Family::Punct)));
        assert_eq!(lookup(Mode::Math, "'"), None);
        assert_eq!(lookup(Mode::Math, "{"), None);
        assert_eq!(lookup(Mode::Text, "'"), Some(Group::TextOrd));
        assert_eq!(lookup(Mode::Text, "-"), Some(Group::TextOrd));
    }

    #[test]
    fn named_symbols() {
        assert_eq!(lookup(Mode::Math, "\\alpha"), Some(Group::MathOrd));
        assert_eq!(lookup(Mode::Math, "\\pm"), Some(Group::Atom(Family::Bin)));
        assert_eq!(lookup(Mode::Math, "\\leq"), Some(Group::Atom(Family::Rel)));
        assert_eq!(lookup(Mode::Math, "\\cdots"), Some(Group::Atom(Family::Inner)));
        assert_eq!(lookup(Mode::Math, "\\quad"), Some(Group::Spacing));
        assert_eq!(lookup(Mode::Math, "\\alpha "), None);
        assert_eq!(lookup(Mode::Text, "\\alpha"), None);
    }

    #[test]
    fn unicode_tables() {
        assert_eq!(unicode_symbol('é'), Some("e\u{0301}"));
        assert_eq!(unicode_symbol('e'), None);

        let acute = unicode_accent('\u{0301}').unwrap();
        assert_eq!(acute.label(Mode::Math), Some("\\acute"));
        assert_eq!(acute.label(Mode::Text), Some("\\'"));
        let double_acute = unicode_accent('\u{030b}').unwrap();
        assert_eq!(double_acute.label(Mode::Math), None);
        assert!(unicode_accent('\u{0327}').is_none());
    }

    #[test]
    fn codepoint_support() {
        assert!(supported_codepoint('a'));
        assert!(supported_codepoint('é'));
        assert!(supported_codepoint('Ж'));
        assert!(!supported_codepoint('★'));
    }
}
