//! # hexwriter: hand-written binary data
//!
//! A small two-way language for binary files. A script compiles to an exact
//! byte sequence; a byte sequence decompiles back to a script when a rules
//! document describes its layout.
//!
//! ## Script language
//!
//! - `[int]`, `[2]`, `[name]`, `[*]`: select the pad width for following numbers
//!   (`[*]` uses as few bytes as each value needs)
//! - `+5`, `-1`: signed integers, two's complement, big-endian
//! - `#ff`: hex; `0101_1010`: binary; `1.5`: float (f32 up to 4 bytes, else f64)
//! - `'text'`, `"text"`, `'''text'''`: strings in the configured encoding
//! - `$name=...`: bind the rest of the line, compiled at the default width
//! - `name` / `$name`: insert a binding; `@name=2`: define a pad width
//! - `/* ... */`: comment
//!
//! ## Rules documents
//!
//! JSON with `format`, `sizes`, `structs` and `defines`; each field spec is
//! `[type[:length]]fmt$capture` where `fmt` is one of `d h x b f s c ! ?`.
//!
//! ```
//! use hexwriter::{Compiler, Config, Decompiler, RuleDocument};
//!
//! let bytes = Compiler::new(Config::default()).unwrap().compile("[1]+2 [short]#0102 #0304").unwrap();
//! let rules = RuleDocument::from_json(r#"{"format": "[1]d$n [short:$n]h"}"#).unwrap();
//! let out = Decompiler::new(Config::default()).unwrap().decompile(&rules, &bytes).unwrap();
//! assert_eq!(out.text, "[1] +2\n[short] #0102\n[short] #0304\n");
//! ```

pub mod codec;
pub mod compiler;
pub mod config;
pub mod decompiler;
pub mod grammar;
pub mod highlight;
pub mod lexer;
pub mod literal;
pub mod rules;

pub use compiler::{CompileError, Compiler};
pub use config::{Config, ConfigError};
pub use decompiler::{leftover_trailer, DecompileError, Decompiled, Decompiler};
pub use grammar::Kind;
pub use highlight::{Highlighter, Span, Style};
pub use lexer::{LexError, Lexer, Token, TokenKind};
pub use rules::{FieldList, FieldSpec, Format, Length, RuleDocument};
