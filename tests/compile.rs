//! Compiler integration tests: padding, literals, definitions and errors.

use hexwriter::{CompileError, Compiler, Config, LexError};

fn compiler() -> Compiler {
    Compiler::new(Config::default()).expect("compiler")
}

#[test]
fn padding_examples() {
    let c = compiler();
    assert_eq!(c.compile("[int]+5").expect("int"), vec![0x00, 0x00, 0x00, 0x05]);
    assert_eq!(c.compile("[1]+5").expect("byte"), vec![0x05]);
    assert_eq!(c.compile("[2]-1").expect("short"), vec![0xff, 0xff]);
}

#[test]
fn hex_literal_fills_one_byte() {
    assert_eq!(compiler().compile("[1]#ff").expect("hex"), vec![0xff]);
}

#[test]
fn definition_keeps_its_original_width() {
    let c = compiler();
    assert_eq!(c.compile("$a=[1]+5\n[2]a").expect("bare reference"), vec![0x05]);
    assert_eq!(c.compile("$a=[1]+5\n[2]$a").expect("dollar reference"), vec![0x05]);
    // Without its own pad directive the right-hand side uses the default, not [1].
    assert_eq!(c.compile("[1]\n$b=+5\nb").expect("default width"), vec![0, 0, 0, 5]);
}

#[test]
fn definition_swallows_rest_of_its_line() {
    // The reference is part of the right-hand side, where `a` is not bound yet.
    match compiler().compile("$a=[1]+5 [2]$a") {
        Err(CompileError::UndefinedVariable { name, line }) => {
            assert_eq!(name, "a");
            assert_eq!(line, 1);
        }
        other => panic!("expected undefined variable, got {:?}", other),
    }
}

#[test]
fn definitions_do_not_see_enclosing_names() {
    let c = compiler();
    assert!(matches!(c.compile("$a=[1]+1\n$b=a\nb"), Err(CompileError::UndefinedVariable { .. })));
    assert!(matches!(c.compile("@w=2\n$a=[w]+5\na"), Err(CompileError::UnknownPad { .. })));
}

#[test]
fn mixed_script() {
    let src = r#"
/* header */
@word=2
$MAGIC=[4]#cafebabe
MAGIC
[word] +1 -2
[byte] 'AB' 1111_0000
[8] 0.5
"#;
    let bytes = compiler().compile(src).expect("compile");
    let mut expected = vec![0xca, 0xfe, 0xba, 0xbe, 0x00, 0x01, 0xff, 0xfe, b'A', b'B', 0xf0];
    expected.extend(0.5f64.to_be_bytes());
    assert_eq!(bytes, expected);
}

#[test]
fn named_widths_cover_all_builtins() {
    let c = compiler();
    for (name, width) in [("byte", 1), ("ushort", 2), ("u32", 4), ("long", 8), ("i128", 16)] {
        let bytes = c.compile(&format!("[{}]+1", name)).expect("builtin");
        assert_eq!(bytes.len(), width, "{}", name);
        assert_eq!(bytes.last(), Some(&1));
    }
}

#[test]
fn wide_pad_sign_extends() {
    let bytes = compiler().compile("[20]-1").expect("wide");
    assert_eq!(bytes, vec![0xff; 20]);
}

#[test]
fn each_compile_starts_clean() {
    let c = compiler();
    c.compile("@w=1 $x=+1").expect("first");
    assert!(matches!(c.compile("[w]+1"), Err(CompileError::UnknownPad { .. })));
    assert!(matches!(c.compile("x"), Err(CompileError::UndefinedVariable { .. })));
}

#[test]
fn errors_carry_location() {
    let c = compiler();
    match c.compile("+1\n[nope]+1") {
        Err(CompileError::UnknownPad { name, line }) => {
            assert_eq!(name, "nope");
            assert_eq!(line, 2);
        }
        other => panic!("expected unknown pad, got {:?}", other),
    }
    match c.compile("+1\n\n  ?") {
        Err(CompileError::Lex(LexError { text, line, .. })) => {
            assert_eq!(text, "?");
            assert_eq!(line, 3);
        }
        other => panic!("expected lex error, got {:?}", other),
    }
    let err = c.compile("missing").unwrap_err();
    assert_eq!(err.to_string(), "undefined variable \"missing\" on line 1");
}

#[test]
fn unknown_encoding_is_rejected() {
    assert!(Compiler::new(Config::default().with_encoding("no-such-charset")).is_err());
}
