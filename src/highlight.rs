//! Token styling for editors. Tolerant: unrecognised characters become
//! [`Style::Error`] spans instead of failing.

use crate::config::ConfigError;
use crate::grammar::{script_lexer, Kind};
use crate::lexer::Lexer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Definition,
    Padding,
    Number,
    Variable,
    Text,
    Comment,
    Error,
}

impl From<Kind> for Style {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Def | Kind::SizeDef => Style::Definition,
            Kind::Pad => Style::Padding,
            Kind::Int | Kind::Hex | Kind::Bin | Kind::Float => Style::Number,
            Kind::Var => Style::Variable,
            Kind::Str => Style::Text,
            Kind::Comment => Style::Comment,
            // Whitespace is never emitted by the highlighter.
            Kind::Whitespace | Kind::Mismatch => Style::Error,
        }
    }
}

/// Styled byte range of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub style: Style,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct Highlighter {
    lexer: Lexer<Kind>,
}

impl Highlighter {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Highlighter { lexer: script_lexer()? })
    }

    pub fn highlight(&self, source: &str) -> Vec<Span> {
        self.lexer
            .scan(source, &[Kind::Whitespace], true)
            .unwrap_or_default()
            .into_iter()
            .map(|t| Span { style: t.kind.into(), start: t.start, end: t.end })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_every_token() {
        let spans = Highlighter::new().expect("highlighter").highlight("[int] +5 name /* c */ 'x' !");
        let styles: Vec<_> = spans.iter().map(|s| s.style).collect();
        assert_eq!(
            styles,
            vec![Style::Padding, Style::Number, Style::Variable, Style::Comment, Style::Text, Style::Error]
        );
        assert_eq!((spans[1].start, spans[1].end), (6, 8));
    }
}
