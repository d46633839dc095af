//! Bytes back to script, driven by a [`RuleDocument`].
//!
//! Every struct occurrence (the top-level format included) is decoded by its
//! own activation with a fresh capture scope: lengths and `?` selectors only
//! see captures made earlier in the same occurrence. Each nested activation
//! works on the remaining tail of its parent's buffer.
//!
//! Output lines are `[type] value`, indented four spaces per nesting level,
//! so the text (after [`Decompiler::header`]) compiles back to the same bytes.

use crate::codec::{format_float, signed_value, unpack_float, unsigned_value};
use crate::config::{Config, ConfigError, TextCodec};
use crate::grammar::builtin_pad_width;
use crate::literal::quote;
use crate::rules::{FieldList, FieldParser, FieldSpec, Format, Length, RuleDocument};
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecompileError {
    #[error("unknown field type {ty:?} in {field}")]
    UnknownFieldType { ty: String, field: String },
    #[error("unknown variable {name:?} in {field}")]
    UnknownVariable { name: String, field: String },
    #[error("unknown struct {name:?} in {field}")]
    UnknownStruct { name: String, field: String },
    #[error("{field} has no selector variable")]
    MissingSelector { field: String },
    #[error("{field}: no struct for value {value}")]
    NoCase { value: i128, field: String },
    #[error("{field}: malformed case {entry:?}")]
    BadCaseTable { entry: String, field: String },
    #[error("{field}: needs {needed} byte(s) at offset {offset}, {available} left")]
    Truncated { field: String, offset: usize, needed: usize, available: usize },
    #[error("{field}: floats must be 4 or 8 bytes, not {width}")]
    FloatWidth { width: usize, field: String },
    #[error("{field}: {count} repetitions with only {available} byte(s) left")]
    RepeatCount { count: usize, available: usize, field: String },
    #[error("{field}: value does not fit in 128 bits")]
    TooWide { field: String },
    #[error("{field}: bytes are not valid {encoding}")]
    Encoding { field: String, encoding: &'static str },
    #[error("structs nested deeper than {limit} at {field}")]
    DepthLimit { limit: usize, field: String },
}

/// Rendered text and the number of bytes the format described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decompiled {
    pub text: String,
    pub consumed: usize,
}

#[derive(Debug, Clone)]
pub struct Decompiler {
    config: Config,
    text: TextCodec,
    fields: FieldParser,
}

/// Byte width of a field, resolved against the rules document.
enum Width<'r> {
    Fixed(usize),
    Struct(&'r FieldList),
    Switch,
}

/// One struct occurrence being decoded.
struct Activation<'b> {
    binary: &'b [u8],
    offset: usize,
    depth: usize,
    captures: HashMap<String, i128>,
    out: String,
}

impl<'b> Activation<'b> {
    fn take(&mut self, spec: &FieldSpec, n: usize) -> Result<&'b [u8], DecompileError> {
        let available = self.binary.len() - self.offset;
        if n > available {
            return Err(DecompileError::Truncated {
                field: spec.to_string(),
                offset: self.offset,
                needed: n,
                available,
            });
        }
        let binary = self.binary;
        let bytes = &binary[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

impl Decompiler {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let text = config.text_codec()?;
        let fields = FieldParser::new()?;
        Ok(Decompiler { config, text, fields })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode `binary` with the top-level format.
    ///
    /// Bytes the format does not describe are appended as a trailer line of
    /// `#hh` tokens; `consumed` counts only the described bytes.
    pub fn decompile(&self, rules: &RuleDocument, binary: &[u8]) -> Result<Decompiled, DecompileError> {
        let (mut text, consumed) = self.decode(rules, &rules.format, binary, 0)?;
        if consumed < binary.len() {
            debug!("{} undescribed byte(s) after offset {}", binary.len() - consumed, consumed);
            text.push('\n');
            text.push_str(&leftover_trailer(&binary[consumed..]));
        }
        Ok(Decompiled { text, consumed })
    }

    /// `$name=key` for every numeric define, then `@name=width` for every size.
    pub fn header(&self, rules: &RuleDocument) -> String {
        let mut out = String::new();
        for (key, name) in &rules.defines {
            if key.starts_with(['#', '+', '-']) {
                let _ = writeln!(out, "${}={}", name, key);
            }
        }
        for (name, width) in &rules.sizes {
            let _ = writeln!(out, "@{}={}", name, width);
        }
        out
    }

    /// One activation: decode `format` from the start of `binary`.
    fn decode(
        &self,
        rules: &RuleDocument,
        format: &FieldList,
        binary: &[u8],
        depth: usize,
    ) -> Result<(String, usize), DecompileError> {
        let mut act = Activation { binary, offset: 0, depth, captures: HashMap::new(), out: String::new() };

        for spec in self.fields.parse(format) {
            trace!("{} at offset {} (depth {})", spec, act.offset, depth);
            let count = repeat_count(&spec, &act.captures)?;
            let width = resolve_width(rules, &spec)?;
            // Fields that may consume nothing are bounded by the bytes left.
            let may_be_empty = match width {
                Width::Fixed(n) => n == 0 && spec.format != Format::Text,
                Width::Struct(_) | Width::Switch => true,
            };
            let available = binary.len() - act.offset;
            if may_be_empty && count > available.max(1) {
                return Err(DecompileError::RepeatCount { count, available, field: spec.to_string() });
            }
            let captured = match width {
                Width::Struct(fields) => {
                    let mut last: &[u8] = &[];
                    for _ in 0..count {
                        last = self.nested(rules, fields, &spec, &mut act)?;
                    }
                    Some(last)
                }
                Width::Switch => {
                    let fields = select_case(rules, &spec, &act.captures)?;
                    for _ in 0..count {
                        self.nested(rules, fields, &spec, &mut act)?;
                    }
                    // The selector is overwritten with the value of no bytes.
                    Some(&[][..])
                }
                Width::Fixed(width) => Some(self.fixed(rules, &spec, width, count, &mut act)?),
            };

            if let (Some(name), Some(bytes)) = (&spec.capture, captured) {
                match signed_value(bytes) {
                    Some(value) => {
                        act.captures.insert(name.clone(), value);
                    }
                    None => warn!("{}: {} byte capture does not fit in 128 bits, not stored", spec, bytes.len()),
                }
            }
        }
        Ok((act.out, act.offset))
    }

    /// Recurse into `fields` at the current offset; returns the bytes it consumed.
    fn nested<'b>(
        &self,
        rules: &RuleDocument,
        fields: &FieldList,
        spec: &FieldSpec,
        act: &mut Activation<'b>,
    ) -> Result<&'b [u8], DecompileError> {
        if act.depth >= self.config.max_depth {
            return Err(DecompileError::DepthLimit { limit: self.config.max_depth, field: spec.to_string() });
        }
        debug!("{} -> struct at offset {}", spec, act.offset);
        let binary = act.binary;
        let start = act.offset;
        let (text, used) = self.decode(rules, fields, &binary[start..], act.depth + 1)?;
        act.out.push_str(&text);
        act.offset += used;
        Ok(&binary[start..start + used])
    }

    /// Fixed-width field, all repetitions. Returns the bytes to capture.
    fn fixed<'b>(
        &self,
        rules: &RuleDocument,
        spec: &FieldSpec,
        width: usize,
        count: usize,
        act: &mut Activation<'b>,
    ) -> Result<&'b [u8], DecompileError> {
        if spec.format == Format::Text {
            // Width counts characters; the block is decoded as one string.
            let n = width.saturating_mul(count);
            let bytes = act.take(spec, n)?;
            let text = self.text.decode(bytes).ok_or_else(|| DecompileError::Encoding {
                field: spec.to_string(),
                encoding: self.text.name(),
            })?;
            act.line(&quote(&text));
            return Ok(bytes);
        }

        let mut last: &[u8] = &[];
        for _ in 0..count {
            let bytes = act.take(spec, width)?;
            let rendered = match spec.format {
                Format::Float => {
                    let value = unpack_float(bytes).ok_or_else(|| DecompileError::FloatWidth {
                        width,
                        field: spec.to_string(),
                    })?;
                    if value.is_finite() {
                        format!("[{}] {}", spec.ty, format_float(value, width == 4))
                    } else {
                        // NaN and infinities have no literal; keep the exact bits.
                        format!("[{}] #{}", spec.ty, hex_digits(bytes))
                    }
                }
                Format::Binary => {
                    let digits: String = bytes.iter().map(|b| format!("{:08b}", b)).collect();
                    format!("[{}] {}", spec.ty, digits)
                }
                Format::Hex => format!("[{}] #{}", spec.ty, hex_digits(bytes)),
                Format::Define => match define_name(rules, bytes) {
                    Some(name) => name.to_string(),
                    None => format!("[{}] {}", spec.ty, signed_text(spec, bytes)?),
                },
                Format::Decimal | Format::Text | Format::Switch => {
                    format!("[{}] {}", spec.ty, signed_text(spec, bytes)?)
                }
            };
            act.line(&rendered);
            last = bytes;
        }
        Ok(last)
    }
}

/// Width in priority order: `sizes`, literal integer, built-in name, struct, `?`.
fn resolve_width<'r>(rules: &'r RuleDocument, spec: &FieldSpec) -> Result<Width<'r>, DecompileError> {
    if let Some(&width) = rules.sizes.get(&spec.ty) {
        return Ok(Width::Fixed(width));
    }
    if !spec.ty.is_empty() && spec.ty.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(width) = spec.ty.parse() {
            return Ok(Width::Fixed(width));
        }
    }
    if let Some(width) = builtin_pad_width(&spec.ty) {
        return Ok(Width::Fixed(width));
    }
    if let Some(fields) = rules.structs.get(&spec.ty) {
        return Ok(Width::Struct(fields));
    }
    if spec.format == Format::Switch {
        return Ok(Width::Switch);
    }
    Err(DecompileError::UnknownFieldType { ty: spec.ty.clone(), field: spec.to_string() })
}

/// Negative counts mean no repetitions.
fn repeat_count(spec: &FieldSpec, captures: &HashMap<String, i128>) -> Result<usize, DecompileError> {
    match &spec.length {
        Length::Once => Ok(1),
        Length::Count(n) => Ok(*n),
        Length::Capture(name) => captures
            .get(name)
            .map(|&v| usize::try_from(v.max(0)).unwrap_or(usize::MAX))
            .ok_or_else(|| DecompileError::UnknownVariable { name: name.clone(), field: spec.to_string() }),
    }
}

/// Struct chosen by a `value=Struct,...` table for the selector's captured value.
fn select_case<'r>(
    rules: &'r RuleDocument,
    spec: &FieldSpec,
    captures: &HashMap<String, i128>,
) -> Result<&'r FieldList, DecompileError> {
    let selector = spec
        .capture
        .as_ref()
        .ok_or_else(|| DecompileError::MissingSelector { field: spec.to_string() })?;
    let value = *captures
        .get(selector)
        .ok_or_else(|| DecompileError::UnknownVariable { name: selector.clone(), field: spec.to_string() })?;

    for entry in spec.ty.split(',') {
        let bad = || DecompileError::BadCaseTable { entry: entry.to_string(), field: spec.to_string() };
        let (key, name) = entry.split_once('=').ok_or_else(bad)?;
        let key = parse_case_key(key.trim()).ok_or_else(bad)?;
        if key == value {
            let name = name.trim();
            return rules.structs.get(name).ok_or_else(|| DecompileError::UnknownStruct {
                name: name.to_string(),
                field: spec.to_string(),
            });
        }
    }
    Err(DecompileError::NoCase { value, field: spec.to_string() })
}

fn parse_case_key(key: &str) -> Option<i128> {
    match key.strip_prefix('#') {
        Some(hex) => u128::from_str_radix(hex, 16).ok().and_then(|v| i128::try_from(v).ok()),
        None => key.parse().ok(),
    }
}

/// Symbolic name for a `!` field: decimal keys match the signed value, `#hex`
/// keys the unsigned value.
fn define_name<'r>(rules: &'r RuleDocument, bytes: &[u8]) -> Option<&'r str> {
    let signed = signed_value(bytes);
    let unsigned = unsigned_value(bytes);
    rules.defines.iter().find_map(|(key, name)| {
        let hit = match key.strip_prefix('#') {
            Some(hex) => unsigned.is_some() && u128::from_str_radix(hex, 16).ok() == unsigned,
            None => signed.is_some() && key.parse::<i128>().ok() == signed,
        };
        hit.then_some(name.as_str())
    })
}

fn signed_text(spec: &FieldSpec, bytes: &[u8]) -> Result<String, DecompileError> {
    let value = signed_value(bytes).ok_or_else(|| DecompileError::TooWide { field: spec.to_string() })?;
    Ok(if value < 0 { value.to_string() } else { format!("+{}", value) })
}

fn hex_digits(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Undescribed bytes as space-separated `#hh` tokens, no zero padding.
pub fn leftover_trailer(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("#{:x}", b)).collect::<Vec<_>>().join(" ")
}
