//! Rules documents: how a binary is laid out, for the decompiler.
//!
//! ```json
//! {
//!   "format": "[1]d$kind; [1=Point,2=Label]?$kind",
//!   "sizes": {"coord": 2},
//!   "structs": {"Point": ["[coord]$x", "[coord]$y"], "Label": "[1:4]s"},
//!   "defines": {"+1": "POINT", "#02": "LABEL"}
//! }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleDocument {
    pub format: FieldList,
    /// Named widths, in bytes.
    pub sizes: BTreeMap<String, usize>,
    pub structs: BTreeMap<String, FieldList>,
    /// Literal key (`+N`, `-N` or `#hex`) to symbolic name.
    pub defines: BTreeMap<String, String>,
}

impl RuleDocument {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Field specs as one string (split on newlines and `;`) or a list of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldList {
    Text(String),
    Lines(Vec<String>),
}

impl Default for FieldList {
    fn default() -> Self {
        FieldList::Lines(Vec::new())
    }
}

impl FieldList {
    pub fn lines(&self) -> Vec<&str> {
        match self {
            FieldList::Text(text) => text.split(['\n', ';']).map(str::trim).collect(),
            FieldList::Lines(lines) => lines.iter().map(String::as_str).collect(),
        }
    }
}

/// How a field is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `f`
    Float,
    /// `b`
    Binary,
    /// `h` or `x`
    Hex,
    /// `d` or no format character
    Decimal,
    /// `s` or `c`
    Text,
    /// `!`
    Define,
    /// `?`
    Switch,
}

impl Format {
    fn from_char(c: Option<&str>) -> Self {
        match c {
            Some("f") => Format::Float,
            Some("b") => Format::Binary,
            Some("h") | Some("x") => Format::Hex,
            Some("s") | Some("c") => Format::Text,
            Some("!") => Format::Define,
            Some("?") => Format::Switch,
            _ => Format::Decimal,
        }
    }

    fn as_char(self) -> char {
        match self {
            Format::Float => 'f',
            Format::Binary => 'b',
            Format::Hex => 'h',
            Format::Decimal => 'd',
            Format::Text => 's',
            Format::Define => '!',
            Format::Switch => '?',
        }
    }
}

/// Repeat count of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Length {
    Once,
    Count(usize),
    /// Value of an earlier capture in the same struct occurrence.
    Capture(String),
}

/// One reader instruction: `[type[:length]]fmt$name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub ty: String,
    pub length: Length,
    pub format: Format,
    /// Capture name without the `$`.
    pub capture: Option<String>,
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.ty)?;
        match &self.length {
            Length::Once => {}
            Length::Count(n) => write!(f, ":{}", n)?,
            Length::Capture(name) => write!(f, ":${}", name)?,
        }
        write!(f, "]{}", self.format.as_char())?;
        if let Some(name) = &self.capture {
            write!(f, "${}", name)?;
        }
        Ok(())
    }
}

/// Extracts field specs from format lines. Text that is not a field spec is skipped.
#[derive(Debug, Clone)]
pub struct FieldParser {
    pattern: Regex,
}

impl FieldParser {
    pub fn new() -> Result<Self, regex::Error> {
        let pattern = Regex::new(r"\[([^:\]]*)\s*(:\s*[^\]]*)?\](x|h|d|b|f|s|c|!|\?)?\s*(\$[a-zA-Z0-9_]+)?")?;
        Ok(FieldParser { pattern })
    }

    pub fn parse_line(&self, line: &str) -> Vec<FieldSpec> {
        self.pattern
            .captures_iter(line)
            .map(|caps| {
                let ty = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
                let length = match caps.get(2).map(|m| m.as_str()[1..].trim()) {
                    None => Length::Once,
                    Some(n) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => {
                        n.parse().map_or_else(|_| Length::Capture(n.to_string()), Length::Count)
                    }
                    Some(name) => Length::Capture(name.trim_start_matches('$').to_string()),
                };
                FieldSpec {
                    ty,
                    length,
                    format: Format::from_char(caps.get(3).map(|m| m.as_str())),
                    capture: caps.get(4).map(|m| m.as_str()[1..].to_string()),
                }
            })
            .collect()
    }

    pub fn parse(&self, fields: &FieldList) -> Vec<FieldSpec> {
        fields.lines().into_iter().flat_map(|line| self.parse_line(line)).collect()
    }
}
