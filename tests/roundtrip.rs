//! Decompiled text, prefixed with its header, compiles back to the original bytes.

use hexwriter::grammar::script_lexer;
use hexwriter::{Compiler, Config, Decompiler, Kind, RuleDocument};

fn roundtrip(json: &str, binary: &[u8]) {
    let rules = RuleDocument::from_json(json).expect("rules");
    let decompiler = Decompiler::new(Config::default()).expect("decompiler");
    let out = decompiler.decompile(&rules, binary).expect("decompile");
    let script = format!("{}{}", decompiler.header(&rules), out.text);
    let bytes = Compiler::new(Config::default()).expect("compiler").compile(&script).expect("recompile");
    assert_eq!(bytes, binary, "script was:\n{}", script);
}

#[test]
fn scalar_formats() {
    roundtrip(
        r#"{"format": "[1]d [2]h [1]b [4]f [8]f [short]d [1:3]s"}"#,
        &[0x80, 0x12, 0x34, 0x5a, 0x3f, 0xc0, 0, 0, 0x3f, 0xd0, 0, 0, 0, 0, 0, 0, 0xff, 0x9c, b'x', b'y', b'z'],
    );
}

#[test]
fn non_finite_floats() {
    roundtrip(
        r#"{"format": "[4]f [4]f [8]f"}"#,
        &[0x7f, 0xc0, 0, 1, 0x7f, 0x80, 0, 0, 0xff, 0xf0, 0, 0, 0, 0, 0, 0],
    );
}

#[test]
fn counted_arrays() {
    roundtrip(r#"{"format": "[1]d$n [short:$n]h [1]d"}"#, &[3, 0, 1, 0, 2, 0, 3, 0x7f]);
}

#[test]
fn nested_and_conditional_structs() {
    let json = r#"{
        "format": "[1]d$n [Item:$n]",
        "sizes": {"word": 2},
        "structs": {
            "Item": ["[1]d$tag", "[1=Num,2=Pair]?$tag"],
            "Num": "[word]d",
            "Pair": "[1]h [1]h"
        }
    }"#;
    roundtrip(json, &[2, 1, 0xff, 0x00, 2, 0xab, 0xcd]);
}

#[test]
fn defines_at_default_width() {
    let json = r##"{
        "format": "[int]! [int]! [int]!",
        "defines": {"#ff": "MASK", "-1": "NONE"}
    }"##;
    roundtrip(json, &[0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 7]);
}

#[test]
fn trailer_after_byte_field() {
    roundtrip(r#"{"format": "[1]d"}"#, &[4, 5, 6]);
}

#[test]
fn rescanning_tokens_keeps_kinds() {
    let lexer = script_lexer().expect("lexer");
    let source = "@w=2 [w] +1 -2 #ff\n$x=[1]+3\nx 1.25 0101 'a b' \"c\" /* skip */ name";
    let removed = [Kind::Whitespace, Kind::Comment];
    let first = lexer.scan(source, &removed, false).expect("first scan");
    let joined = first.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join("\n");
    let second = lexer.scan(&joined, &removed, false).expect("second scan");
    let kinds = |tokens: &[hexwriter::Token<Kind>]| tokens.iter().map(|t| t.kind).collect::<Vec<_>>();
    assert_eq!(kinds(&first), kinds(&second));
}
