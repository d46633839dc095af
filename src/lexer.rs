//! Ordered-pattern tokenizer.
//!
//! A [`Lexer`] joins an ordered list of `(kind, pattern)` pairs into one
//! alternation (first pattern wins at a position) followed by a catch-all that
//! matches any single character. It knows nothing about the script language;
//! the token kinds come from the caller.
//!
//! Offsets are byte indices into the scanned text; lines are 1-based.

use regex::{Captures, Regex};
use std::fmt::Debug;

/// Closed set of token kinds a [`Lexer`] can produce.
pub trait TokenKind: Copy + Eq + Debug {
    /// Kind given to a single character that no pattern recognised.
    const MISMATCH: Self;
}

/// One recognised lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<K> {
    pub kind: K,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

/// Unrecognised input while scanning in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected {text:?} at offset {offset} on line {line}")]
pub struct LexError {
    pub text: String,
    pub offset: usize,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Lexer<K> {
    combined: Regex,
    /// Each pattern anchored on its own, used when the combined match is empty.
    anchored: Vec<Regex>,
    /// Group name per kind; the last entry belongs to the catch-all.
    groups: Vec<String>,
    kinds: Vec<K>,
}

impl<K: TokenKind> Lexer<K> {
    /// Build a lexer from patterns in priority order.
    pub fn new<P: AsRef<str>>(patterns: &[(K, P)]) -> Result<Self, regex::Error> {
        let mut alternation = Vec::with_capacity(patterns.len() + 1);
        let mut anchored = Vec::with_capacity(patterns.len());
        let mut groups = Vec::with_capacity(patterns.len() + 1);
        let mut kinds = Vec::with_capacity(patterns.len() + 1);
        for (i, (kind, pattern)) in patterns.iter().enumerate() {
            let group = format!("kind{}", i);
            alternation.push(format!("(?P<{}>{})", group, pattern.as_ref()));
            anchored.push(Regex::new(&format!(r"\A(?:{})", pattern.as_ref()))?);
            groups.push(group);
            kinds.push(*kind);
        }
        let mismatch = format!("kind{}", patterns.len());
        alternation.push(format!("(?P<{}>(?s:.))", mismatch));
        groups.push(mismatch);
        kinds.push(K::MISMATCH);

        let combined = Regex::new(&format!(r"\A(?:{})", alternation.join("|")))?;
        Ok(Lexer { combined, anchored, groups, kinds })
    }

    /// Tokenize `text`, dropping kinds listed in `remove`.
    ///
    /// With `ignore_errors` unset, the first unrecognised character fails the scan.
    pub fn scan(&self, text: &str, remove: &[K], ignore_errors: bool) -> Result<Vec<Token<K>>, LexError> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        let mut line = 1;
        let mut counted_to = 0;

        while pos < text.len() {
            let rest = &text[pos..];
            let (kind, len) = match self.combined.captures(rest) {
                Some(caps) => {
                    let len = caps.get(0).map_or(0, |m| m.end());
                    if len == 0 {
                        self.first_non_empty(rest)
                    } else {
                        (self.matched_kind(&caps), len)
                    }
                }
                None => break,
            };

            line += text[counted_to..pos].matches('\n').count();
            counted_to = pos;
            let lexeme = &rest[..len];

            if kind == K::MISMATCH && !ignore_errors {
                return Err(LexError { text: lexeme.to_string(), offset: pos, line });
            }
            if !remove.contains(&kind) {
                tokens.push(Token { kind, text: lexeme.to_string(), start: pos, end: pos + len, line });
            }
            pos += len;
        }
        Ok(tokens)
    }

    fn matched_kind(&self, caps: &Captures<'_>) -> K {
        let mut set = self
            .groups
            .iter()
            .zip(&self.kinds)
            .filter(|(group, _)| caps.name(group.as_str()).is_some())
            .map(|(_, kind)| *kind);
        let kind = set.next().unwrap_or(K::MISMATCH);
        debug_assert!(set.next().is_none(), "more than one token kind matched");
        kind
    }

    /// First pattern, in priority order, with a non-empty match at the start of `rest`.
    /// Falls back to a one-character mismatch.
    fn first_non_empty(&self, rest: &str) -> (K, usize) {
        for (re, kind) in self.anchored.iter().zip(&self.kinds) {
            if let Some(m) = re.find(rest) {
                if m.end() > 0 {
                    return (*kind, m.end());
                }
            }
        }
        (K::MISMATCH, rest.chars().next().map_or(1, char::len_utf8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Toy {
        Word,
        Number,
        Space,
        Bad,
    }

    impl TokenKind for Toy {
        const MISMATCH: Self = Toy::Bad;
    }

    fn toy() -> Lexer<Toy> {
        Lexer::new(&[(Toy::Word, r"[a-z]+"), (Toy::Number, r"[0-9]+"), (Toy::Space, r"\s*")]).expect("lexer")
    }

    #[test]
    fn scan_splits_and_tracks_lines() {
        let tokens = toy().scan("ab 12\ncd", &[Toy::Space], false).expect("scan");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Toy::Word, Toy::Number, Toy::Word]);
        assert_eq!(tokens[1].start, 3);
        assert_eq!(tokens[1].end, 5);
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn earlier_pattern_wins() {
        let lexer = Lexer::new(&[(Toy::Number, r"[0-9a-z]+"), (Toy::Word, r"[a-z]+")]).expect("lexer");
        let tokens = lexer.scan("abc", &[], false).expect("scan");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, Toy::Number);
    }

    #[test]
    fn mismatch_fails_in_strict_mode() {
        let err = toy().scan("ab\n !", &[], false).unwrap_err();
        assert_eq!(err.text, "!");
        assert_eq!(err.offset, 4);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn mismatch_is_kept_when_ignoring_errors() {
        let tokens = toy().scan("a!b", &[], true).expect("scan");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Toy::Word, Toy::Bad, Toy::Word]);
    }

    #[test]
    fn zero_width_matches_do_not_hide_later_patterns() {
        let lexer = Lexer::new(&[(Toy::Space, r"\s*"), (Toy::Word, r"[a-z]+")]).expect("lexer");
        let tokens = lexer.scan("ab cd", &[Toy::Space], false).expect("scan");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| t.kind == Toy::Word));
    }

    #[test]
    fn multibyte_mismatch_spans_whole_char() {
        let tokens = toy().scan("é", &[], true).expect("scan");
        assert_eq!(tokens[0].kind, Toy::Bad);
        assert_eq!(tokens[0].end, 'é'.len_utf8());
    }
}
