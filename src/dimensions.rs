//! Lengths as they appear in size arguments, e.g. `1.5em` or `-2pt`.

use std::fmt;

use regex::Regex;

/// The units a size argument may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TexUnit {
    Pt,
    Mm,
    Cm,
    In,
    Bp,
    Pc,
    Dd,
    Cc,
    Nd,
    Nc,
    Sp,
    Px,
    Ex,
    Em,
    Mu,
}

impl TexUnit {
    /// The unit for the two-letter TeX name, if recognized.
    pub fn parse(name: &str) -> Option<TexUnit> {
        Some(match name {
            "pt" => TexUnit::Pt,
            "mm" => TexUnit::Mm,
            "cm" => TexUnit::Cm,
            "in" => TexUnit::In,
            "bp" => TexUnit::Bp,
            "pc" => TexUnit::Pc,
            "dd" => TexUnit::Dd,
            "cc" => TexUnit::Cc,
            "nd" => TexUnit::Nd,
            "nc" => TexUnit::Nc,
            "sp" => TexUnit::Sp,
            "px" => TexUnit::Px,
            "ex" => TexUnit::Ex,
            "em" => TexUnit::Em,
            "mu" => TexUnit::Mu,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TexUnit::Pt => "pt",
            TexUnit::Mm => "mm",
            TexUnit::Cm => "cm",
            TexUnit::In => "in",
            TexUnit::Bp => "bp",
            TexUnit::Pc => "pc",
            TexUnit::Dd => "dd",
            TexUnit::Cc => "cc",
            TexUnit::Nd => "nd",
            TexUnit::Nc => "nc",
            TexUnit::Sp => "sp",
            TexUnit::Px => "px",
            TexUnit::Ex => "ex",
            TexUnit::Em => "em",
            TexUnit::Mu => "mu",
        }
    }
}

impl fmt::Display for TexUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a measurement failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasurementError {
    /// No number-plus-unit shape was found at all.
    Malformed,
    /// A number was found but the unit is not one of [`TexUnit`].
    UnknownUnit(String),
}

/// A number with a unit, the payload of a size argument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub number: f64,
    pub unit: TexUnit,
}

lazy_static! {
    static ref MEASUREMENT_RE: Regex =
        Regex::new(r"([-+]?) *(\d+(?:\.\d*)?|\.\d+) *([a-z]{2})").unwrap();
}

impl Measurement {
    /// Extracts a measurement from TeX-style text such as `"1.5em"`,
    /// `"- 2 pt"` or `"+.5mu"`.
    pub fn parse_tex(text: &str) -> Result<Measurement, MeasurementError> {
        let caps = MEASUREMENT_RE
            .captures(text)
            .ok_or(MeasurementError::Malformed)?;
        let number: f64 = format!("{}{}", &caps[1], &caps[2])
            .parse()
            .map_err(|_| MeasurementError::Malformed)?;
        let unit =
            TexUnit::parse(&caps[3]).ok_or_else(|| MeasurementError::UnknownUnit(caps[3].into()))?;
        Ok(Measurement { number, unit })
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.number, self.unit)
    }
}
