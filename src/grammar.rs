//! Script language definition: token kinds, their patterns in priority order,
//! and the built-in pad widths.

use crate::lexer::{Lexer, TokenKind};

/// Token kinds of the script language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `$name=<rest of line>`
    Def,
    /// `@name=<int>`
    SizeDef,
    /// `[spec]`
    Pad,
    Float,
    /// `+N` / `-N`
    Int,
    /// `#ff`
    Hex,
    /// `0101`, spaces and underscores allowed between digits
    Bin,
    Var,
    Str,
    Comment,
    Whitespace,
    Mismatch,
}

impl TokenKind for Kind {
    const MISMATCH: Self = Kind::Mismatch;
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Def => "def",
            Kind::SizeDef => "sizedef",
            Kind::Pad => "pad",
            Kind::Float => "float",
            Kind::Int => "int",
            Kind::Hex => "hex",
            Kind::Bin => "bin",
            Kind::Var => "var",
            Kind::Str => "str",
            Kind::Comment => "comment",
            Kind::Whitespace => "white_space",
            Kind::Mismatch => "mismatch",
        }
    }
}

const STRING_PREFIX: &str = r"(?i:r|u|f|fr|rf|b|br|rb)?";
const SQ_STRING: &str = r"'[^'\\\n]*(?:\\.[^'\\\n]*)*'?";
const DQ_STRING: &str = r#""[^"\\\n]*(?:\\.[^"\\\n]*)*"?"#;
// A quote inside a triple-quoted body may not start the closing delimiter.
const SQ3_STRING: &str = r"'''(?:[^'\\]|\\.|'[^'\\]|''[^'\\]|'\\.|''\\.)*(?:''')?";
const DQ3_STRING: &str = r#""""(?:[^"\\]|\\.|"[^"\\]|""[^"\\]|"\\.|""\\.)*(?:""")?"#;

/// Ordered `(kind, pattern)` table. Earlier entries win at the same position.
pub fn patterns() -> Vec<(Kind, String)> {
    let string = format!(
        "{p}(?:{sq3}|{dq3}|{sq}|{dq})",
        p = STRING_PREFIX,
        sq3 = SQ3_STRING,
        dq3 = DQ3_STRING,
        sq = SQ_STRING,
        dq = DQ_STRING,
    );
    vec![
        (Kind::Def, r"\$[a-zA-Z_][a-zA-Z_0-9]*=.*".to_string()),
        (Kind::SizeDef, r"@[a-zA-Z_][a-zA-Z_0-9]*=[0-9]+".to_string()),
        (Kind::Pad, r"\[[^\]]*\]".to_string()),
        (Kind::Float, r"[+-]?(?:[0-9]+\.[0-9]*|\.[0-9]+)".to_string()),
        (Kind::Int, r"[+-][0-9]+".to_string()),
        (Kind::Hex, r"#[a-fA-F0-9]+".to_string()),
        (Kind::Bin, r"(?:[01][ _]*)+".to_string()),
        (Kind::Var, r"\$?[a-zA-Z_][a-zA-Z_0-9]*".to_string()),
        (Kind::Str, string),
        (Kind::Comment, r"/\*(?:[^*]|\*+[^*/])*\*+/".to_string()),
        (Kind::Whitespace, r"\s+".to_string()),
    ]
}

/// Lexer for the script language.
pub fn script_lexer() -> Result<Lexer<Kind>, regex::Error> {
    Lexer::new(&patterns())
}

/// Built-in pad names and their byte widths.
pub const PAD_WIDTHS: &[(&str, usize)] = &[
    ("byte", 1),
    ("ubyte", 1),
    ("short", 2),
    ("ushort", 2),
    ("int", 4),
    ("uint", 4),
    ("long", 8),
    ("ulong", 8),
    ("big", 16),
    ("ubig", 16),
    ("i8", 1),
    ("u8", 1),
    ("i16", 2),
    ("u16", 2),
    ("i32", 4),
    ("u32", 4),
    ("i64", 8),
    ("u64", 8),
    ("i128", 16),
    ("u128", 16),
];

/// Width of a built-in pad name, ignoring case.
pub fn builtin_pad_width(name: &str) -> Option<usize> {
    PAD_WIDTHS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, w)| w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Kind> {
        script_lexer()
            .expect("lexer")
            .scan(src, &[Kind::Whitespace, Kind::Comment], false)
            .expect("scan")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn every_literal_kind_is_recognised() {
        assert_eq!(
            kinds("[int] +5 -3 #ff 1.5 0101 name 'txt' /* note */ @w=2"),
            vec![Kind::Pad, Kind::Int, Kind::Int, Kind::Hex, Kind::Float, Kind::Bin, Kind::Var, Kind::Str, Kind::SizeDef]
        );
    }

    #[test]
    fn def_takes_rest_of_line() {
        let tokens = script_lexer().expect("lexer").scan("$a=[1]+5 +6\n+7", &[Kind::Whitespace], false).expect("scan");
        assert_eq!(tokens[0].kind, Kind::Def);
        assert_eq!(tokens[0].text, "$a=[1]+5 +6");
        assert_eq!(tokens[1].kind, Kind::Int);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn signed_float_beats_int() {
        assert_eq!(kinds("-1.5"), vec![Kind::Float]);
        assert_eq!(kinds("-15"), vec![Kind::Int]);
    }

    #[test]
    fn binary_digits_absorb_separators() {
        let tokens = script_lexer().expect("lexer").scan("1010 _1111", &[], false).expect("scan");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, Kind::Bin);
    }

    #[test]
    fn string_quoting_forms() {
        assert_eq!(kinds(r#"'a' "b" '''c'd''' """e""" 'it\'s'"#), vec![Kind::Str; 5]);
        assert_eq!(kinds("''"), vec![Kind::Str]);
    }

    #[test]
    fn dollar_prefixed_reference_is_a_var() {
        assert_eq!(kinds("$a"), vec![Kind::Var]);
    }

    #[test]
    fn comments_may_contain_stars() {
        assert_eq!(kinds("/* a * b **/ +1"), vec![Kind::Int]);
    }

    #[test]
    fn pad_names_ignore_case() {
        assert_eq!(builtin_pad_width("INT"), Some(4));
        assert_eq!(builtin_pad_width("u128"), Some(16));
        assert_eq!(builtin_pad_width("word"), None);
    }
}
