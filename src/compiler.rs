//! Script to bytes.
//!
//! The token stream is folded left to right over a scope holding the symbol
//! table, the pad-width table and the active pad width. A `$name=` right-hand
//! side is compiled in a fresh scope: no symbols, no sizedefs, and the pad width
//! restarts at the configured default.

use crate::codec::{pack_f32, pack_f64, IntLiteral};
use crate::config::{Config, ConfigError, TextCodec};
use crate::grammar::{builtin_pad_width, script_lexer, Kind};
use crate::lexer::{LexError, Lexer, Token};
use crate::literal::{unquote, LiteralError};
use log::{debug, trace};
use std::collections::HashMap;

/// Pad directive selecting minimal-bytes mode.
pub const UNSET_PAD: &str = "*";

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("unknown padding type {name:?} on line {line}")]
    UnknownPad { name: String, line: usize },
    #[error("undefined variable {name:?} on line {line}")]
    UndefinedVariable { name: String, line: usize },
    #[error("unexpected {} token {text:?} on line {line}", .kind.name())]
    UnexpectedToken { kind: Kind, text: String, line: usize },
    #[error("{text} does not fit in {width} byte(s) on line {line}")]
    Overflow { text: String, width: usize, line: usize },
    #[error("invalid number {text:?} on line {line}")]
    InvalidNumber { text: String, line: usize },
    #[error("line {line}: {source}")]
    String {
        line: usize,
        #[source]
        source: LiteralError,
    },
    #[error("text on line {line} cannot be encoded as {encoding}")]
    Encoding { line: usize, encoding: &'static str },
    #[error("definitions nested deeper than {limit} on line {line}")]
    DepthLimit { limit: usize, line: usize },
}

#[derive(Debug, Clone)]
pub struct Compiler {
    config: Config,
    text: TextCodec,
    lexer: Lexer<Kind>,
}

#[derive(Debug)]
struct Scope {
    symbols: HashMap<String, Vec<u8>>,
    pad_widths: HashMap<String, usize>,
    pad: Option<usize>,
}

impl Compiler {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let text = config.text_codec()?;
        let lexer = script_lexer()?;
        Ok(Compiler { config, text, lexer })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile a whole script. Nothing is returned on error.
    pub fn compile(&self, source: &str) -> Result<Vec<u8>, CompileError> {
        self.compile_scope(source, self.root_scope(), 0, 0)
    }

    fn root_scope(&self) -> Scope {
        Scope {
            symbols: HashMap::new(),
            pad_widths: HashMap::new(),
            pad: self.config.default_pad_width,
        }
    }

    fn compile_scope(&self, source: &str, mut scope: Scope, depth: usize, line_base: usize) -> Result<Vec<u8>, CompileError> {
        let tokens = self
            .lexer
            .scan(source, &[Kind::Whitespace, Kind::Comment], false)
            .map_err(|e| LexError { line: e.line + line_base, ..e })?;

        let mut out = Vec::new();
        for token in &tokens {
            let line = token.line + line_base;
            trace!("{} {:?} (line {})", token.kind.name(), token.text, line);
            match token.kind {
                Kind::Def => {
                    if depth >= self.config.max_depth {
                        return Err(CompileError::DepthLimit { limit: self.config.max_depth, line });
                    }
                    let (name, rhs) = split_assignment(&token.text);
                    let bytes = self.compile_scope(rhs, self.root_scope(), depth + 1, line - 1)?;
                    debug!("${} = {} byte(s)", name, bytes.len());
                    scope.symbols.insert(name.to_string(), bytes);
                }
                Kind::SizeDef => {
                    let (name, width) = split_assignment(&token.text);
                    let width = width.parse::<usize>().map_err(|_| CompileError::InvalidNumber {
                        text: width.to_string(),
                        line,
                    })?;
                    debug!("@{} = {} byte(s)", name, width);
                    scope.pad_widths.insert(name.to_ascii_lowercase(), width);
                }
                Kind::Pad => scope.pad = self.pad_width(token, &scope, line)?,
                Kind::Int => {
                    let (negative, digits) = match token.text.split_at(1) {
                        ("-", digits) => (true, digits),
                        (_, digits) => (false, digits),
                    };
                    out.extend(self.integer(token, digits, 10, negative, scope.pad, line)?);
                }
                Kind::Hex => out.extend(self.integer(token, &token.text[1..], 16, false, scope.pad, line)?),
                Kind::Bin => {
                    let digits: String = token.text.chars().filter(|c| *c == '0' || *c == '1').collect();
                    out.extend(self.integer(token, &digits, 2, false, scope.pad, line)?);
                }
                Kind::Float => out.extend(float(token, scope.pad, line)?),
                Kind::Var => {
                    let name = token.text.trim_start_matches('$');
                    let bytes = scope.symbols.get(name).ok_or_else(|| CompileError::UndefinedVariable {
                        name: name.to_string(),
                        line,
                    })?;
                    out.extend_from_slice(bytes);
                }
                Kind::Str => {
                    let text = unquote(&token.text).map_err(|source| CompileError::String { line, source })?;
                    let bytes = self.text.encode(&text).ok_or(CompileError::Encoding {
                        line,
                        encoding: self.text.name(),
                    })?;
                    out.extend(bytes);
                }
                Kind::Comment | Kind::Whitespace | Kind::Mismatch => {
                    return Err(CompileError::UnexpectedToken {
                        kind: token.kind,
                        text: token.text.clone(),
                        line,
                    });
                }
            }
        }
        Ok(out)
    }

    fn pad_width(&self, token: &Token<Kind>, scope: &Scope, line: usize) -> Result<Option<usize>, CompileError> {
        let spec = token.text[1..token.text.len() - 1].trim();
        if spec == UNSET_PAD {
            return Ok(None);
        }
        if !spec.is_empty() && spec.bytes().all(|b| b.is_ascii_digit()) {
            return spec
                .parse()
                .map(Some)
                .map_err(|_| CompileError::InvalidNumber { text: spec.to_string(), line });
        }
        let name = spec.to_ascii_lowercase();
        scope
            .pad_widths
            .get(&name)
            .copied()
            .or_else(|| builtin_pad_width(&name))
            .map(Some)
            .ok_or(CompileError::UnknownPad { name, line })
    }

    fn integer(
        &self,
        token: &Token<Kind>,
        digits: &str,
        radix: u32,
        negative: bool,
        pad: Option<usize>,
        line: usize,
    ) -> Result<Vec<u8>, CompileError> {
        let value = IntLiteral::parse(digits, radix, negative).ok_or_else(|| CompileError::InvalidNumber {
            text: token.text.clone(),
            line,
        })?;
        let width = pad.unwrap_or_else(|| value.minimal_width());
        value.to_bytes(width).ok_or_else(|| CompileError::Overflow {
            text: token.text.clone(),
            width,
            line,
        })
    }
}

/// Single precision at four bytes or less (and in minimal mode), double above.
fn float(token: &Token<Kind>, pad: Option<usize>, line: usize) -> Result<Vec<u8>, CompileError> {
    let invalid = || CompileError::InvalidNumber { text: token.text.clone(), line };
    match pad {
        Some(width) if width > 4 => token.text.parse::<f64>().map(pack_f64).map_err(|_| invalid()),
        _ => token.text.parse::<f32>().map(pack_f32).map_err(|_| invalid()),
    }
}

/// `$name=rest` / `@name=rest` into `(name, rest)`.
fn split_assignment(text: &str) -> (&str, &str) {
    let body = &text[1..];
    body.split_once('=').unwrap_or((body, ""))
}
