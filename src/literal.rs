//! String literals: evaluate script string tokens and quote decoded text back.

use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "literal.pest"]
struct LiteralParser;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("malformed string literal: {0}")]
    Syntax(String),
    #[error("formatted string literals are not supported")]
    Formatted,
    #[error("invalid escape {0:?}")]
    Escape(String),
}

/// Evaluate a quoted literal (with optional prefix letters) to its text.
pub fn unquote(source: &str) -> Result<String, LiteralError> {
    let literal = LiteralParser::parse(Rule::literal, source)
        .map_err(|e| LiteralError::Syntax(e.to_string()))?
        .next()
        .ok_or_else(|| LiteralError::Syntax("empty literal".to_string()))?;

    let mut raw = false;
    let mut body = "";
    for pair in literal.into_inner() {
        match pair.as_rule() {
            Rule::prefix => {
                let prefix = pair.as_str().to_ascii_lowercase();
                if prefix.contains('f') {
                    return Err(LiteralError::Formatted);
                }
                raw = prefix.contains('r');
            }
            Rule::triple_single | Rule::triple_double | Rule::single | Rule::double => {
                body = pair.into_inner().next().map_or("", |p| p.as_str());
            }
            _ => {}
        }
    }

    if raw {
        Ok(body.to_string())
    } else {
        expand_escapes(body)
    }
}

fn expand_escapes(body: &str) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(e) = chars.next() else {
            return Err(LiteralError::Escape("\\".to_string()));
        };
        match e {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut digits = e.to_string();
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(&d @ '0'..='7') => {
                            digits.push(d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                out.push(code_point(&digits, 8)?);
            }
            'x' | 'u' | 'U' => {
                let len = match e {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.by_ref().take(len).collect();
                if digits.len() != len {
                    return Err(LiteralError::Escape(format!("\\{}{}", e, digits)));
                }
                out.push(code_point(&digits, 16)?);
            }
            other => {
                // Unknown escapes stay as written.
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

fn code_point(digits: &str, radix: u32) -> Result<char, LiteralError> {
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| LiteralError::Escape(digits.to_string()))
}

/// Quote `text` as a literal that [`unquote`] turns back into `text`.
///
/// Single quotes unless the text holds a single quote and no double quote.
pub fn quote(text: &str) -> String {
    let delim = if text.contains('\'') && !text.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(delim);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let cp = c as u32;
                if cp <= 0xff {
                    out.push_str(&format!("\\x{:02x}", cp));
                } else if cp <= 0xffff {
                    out.push_str(&format!("\\u{:04x}", cp));
                } else {
                    out.push_str(&format!("\\U{:08x}", cp));
                }
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}
