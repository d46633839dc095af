//! Big-endian packing of integers and floats.
//!
//! Integers are two's complement at an arbitrary byte width. Values are carried
//! as sign + 128-bit magnitude so `u128`-range hex literals still work; wider
//! fields are sign-extended.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

/// Integer literal as sign and magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntLiteral {
    pub negative: bool,
    pub magnitude: u128,
}

impl IntLiteral {
    pub fn parse(digits: &str, radix: u32, negative: bool) -> Option<Self> {
        let magnitude = u128::from_str_radix(digits, radix).ok()?;
        Some(IntLiteral { negative: negative && magnitude != 0, magnitude })
    }

    /// Fewest bytes holding the value; zero takes one byte.
    pub fn minimal_width(&self) -> usize {
        if self.negative {
            // -2^(8w-1) is the most negative value in w bytes.
            let mut width = 1;
            while width < 16 && self.magnitude > 1u128 << (8 * width - 1) {
                width += 1;
            }
            if self.magnitude > 1u128 << 127 {
                17
            } else {
                width
            }
        } else {
            let bits = 128 - self.magnitude.leading_zeros() as usize;
            bits.div_ceil(8).max(1)
        }
    }

    /// Whether the value is representable in `width` bytes.
    pub fn fits(&self, width: usize) -> bool {
        if width >= 17 {
            return true;
        }
        if width == 0 {
            return self.magnitude == 0;
        }
        if self.negative {
            self.magnitude <= 1u128 << (8 * width - 1)
        } else {
            width == 16 || self.magnitude < 1u128 << (8 * width)
        }
    }

    /// Two's-complement bytes at `width`, or `None` if the value does not fit.
    pub fn to_bytes(&self, width: usize) -> Option<Vec<u8>> {
        if !self.fits(width) {
            return None;
        }
        let raw = if self.negative { self.magnitude.wrapping_neg() } else { self.magnitude };
        let mut full = [0u8; 16];
        BigEndian::write_u128(&mut full, raw);
        let fill = if self.negative { 0xff } else { 0x00 };
        let mut out = Vec::with_capacity(width);
        if width > 16 {
            out.resize(width - 16, fill);
            out.extend_from_slice(&full);
        } else {
            out.extend_from_slice(&full[16 - width..]);
        }
        Some(out)
    }
}

/// Signed big-endian value of `bytes`. Empty input is zero.
///
/// Fields wider than 16 bytes decode only when the extra leading bytes are
/// pure sign extension.
pub fn signed_value(bytes: &[u8]) -> Option<i128> {
    let Some(&first) = bytes.first() else {
        return Some(0);
    };
    let fill = if first & 0x80 != 0 { 0xff } else { 0x00 };
    let mut full = [fill; 16];
    if bytes.len() > 16 {
        let (extra, tail) = bytes.split_at(bytes.len() - 16);
        if extra.iter().any(|&b| b != fill) || (tail[0] & 0x80 != 0) != (fill == 0xff) {
            return None;
        }
        full.copy_from_slice(tail);
    } else {
        full[16 - bytes.len()..].copy_from_slice(bytes);
    }
    Some(BigEndian::read_i128(&full))
}

/// Unsigned big-endian value of at most 16 bytes.
pub fn unsigned_value(bytes: &[u8]) -> Option<u128> {
    if bytes.len() > 16 {
        return None;
    }
    let mut full = [0u8; 16];
    full[16 - bytes.len()..].copy_from_slice(bytes);
    Some(BigEndian::read_u128(&full))
}

pub fn pack_f32(value: f32) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    // Writing into a Vec cannot fail.
    let _ = out.write_f32::<BigEndian>(value);
    out
}

pub fn pack_f64(value: f64) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    let _ = out.write_f64::<BigEndian>(value);
    out
}

/// IEEE-754 value of a 4- or 8-byte field.
pub fn unpack_float(bytes: &[u8]) -> Option<f64> {
    match bytes.len() {
        4 => Some(BigEndian::read_f32(bytes) as f64),
        8 => Some(BigEndian::read_f64(bytes)),
        _ => None,
    }
}

/// Render a float so the script lexer reads it back as a float literal.
pub fn format_float(value: f64, single: bool) -> String {
    let mut text = if single { format!("{}", value as f32) } else { format!("{}", value) };
    if value.is_finite() && !text.contains('.') {
        text.push_str(".0");
    }
    text
}
