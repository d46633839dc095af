//! Engine configuration and text encoding.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use serde::{Deserialize, Serialize};

/// Settings shared by [`Compiler`](crate::Compiler) and [`Decompiler`](crate::Decompiler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Encoding label for string literals and text fields (WHATWG labels).
    pub text_encoding: String,
    /// Pad width a compile scope starts with; `None` is minimal-bytes mode.
    pub default_pad_width: Option<usize>,
    /// Deepest allowed nesting of definitions (compiler) or structs (decompiler).
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            text_encoding: "UTF-8".to_string(),
            default_pad_width: Some(4),
            max_depth: 64,
        }
    }
}

impl Config {
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.text_encoding = label.into();
        self
    }

    pub fn with_default_pad_width(mut self, width: Option<usize>) -> Self {
        self.default_pad_width = width;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn text_codec(&self) -> Result<TextCodec, ConfigError> {
        TextCodec::for_label(&self.text_encoding)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
    #[error("invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Resolved text encoding.
#[derive(Debug, Clone, Copy)]
pub struct TextCodec {
    encoding: &'static Encoding,
}

impl TextCodec {
    pub fn for_label(label: &str) -> Result<Self, ConfigError> {
        Encoding::for_label(label.trim().as_bytes())
            .map(|encoding| TextCodec { encoding })
            .ok_or_else(|| ConfigError::UnknownEncoding(label.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Encode without replacement; `None` if a character has no mapping.
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        if self.encoding == UTF_16LE || self.encoding == UTF_16BE {
            let big = self.encoding == UTF_16BE;
            let mut out = Vec::with_capacity(text.len() * 2);
            for unit in text.encode_utf16() {
                let bytes = if big { unit.to_be_bytes() } else { unit.to_le_bytes() };
                out.extend_from_slice(&bytes);
            }
            return Some(out);
        }
        let (bytes, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            None
        } else {
            Some(bytes.into_owned())
        }
    }

    /// Decode without replacement; `None` on malformed input.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.text_encoding, "UTF-8");
        assert_eq!(config.default_pad_width, Some(4));
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: Config = serde_json::from_str(r#"{"default_pad_width": null}"#).expect("json");
        assert_eq!(config.default_pad_width, None);
        assert_eq!(config.text_encoding, "UTF-8");
    }

    #[test]
    fn resolves_labels() {
        assert_eq!(TextCodec::for_label("utf8").expect("utf8").name(), "UTF-8");
        assert!(matches!(TextCodec::for_label("klingon"), Err(ConfigError::UnknownEncoding(_))));
    }

    #[test]
    fn utf16_encodes_by_hand() {
        let le = TextCodec::for_label("utf-16le").expect("le");
        assert_eq!(le.encode("A").expect("encode"), vec![0x41, 0x00]);
        assert_eq!(le.decode(&[0x41, 0x00]).expect("decode"), "A");
        let be = TextCodec::for_label("utf-16be").expect("be");
        assert_eq!(be.encode("A").expect("encode"), vec![0x00, 0x41]);
    }

    #[test]
    fn legacy_encoding_rejects_unmappable() {
        let latin = TextCodec::for_label("latin1").expect("latin1");
        assert_eq!(latin.encode("é").expect("encode"), vec![0xe9]);
        assert_eq!(latin.encode("漢"), None);
        assert_eq!(TextCodec::for_label("utf-8").expect("utf8").decode(&[0xff]), None);
    }
}
