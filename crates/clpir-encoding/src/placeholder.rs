//! Placeholder and escape bytes used inside logtypes.
//!
//! A logtype is the message's constant text with every variable replaced by
//! a single placeholder byte. Constant bytes that collide with a placeholder
//! or with the escape byte are prefixed with [`ESCAPE`].

use crate::error::{DecodeError, Result};

/// Escape byte (`\`).
pub const ESCAPE: u8 = b'\\';

/// Variable placeholder stored in a logtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Placeholder {
    /// Exact 64-bit (or 32-bit) integer.
    Integer = 0x11,
    /// Variable stored verbatim in the dictionary sequence.
    Dictionary = 0x12,
    /// Packed decimal float.
    Float = 0x13,
}

impl Placeholder {
    /// The byte written into the logtype.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Map a logtype byte back to its placeholder, if it is one.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x11 => Some(Self::Integer),
            0x12 => Some(Self::Dictionary),
            0x13 => Some(Self::Float),
            _ => None,
        }
    }

    /// True for placeholders whose value lives in the encoded-variable sequence.
    pub const fn is_encoded(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Dictionary => "DICTIONARY",
            Self::Float => "FLOAT",
        }
    }
}

/// Returns true if a constant byte must be escaped before entering a logtype.
pub fn needs_escape(byte: u8) -> bool {
    byte == ESCAPE || Placeholder::from_byte(byte).is_some()
}

/// Append constant text to a logtype, escaping reserved bytes.
pub fn escape_constant_into(constant: &str, logtype: &mut String) {
    let mut run_begin = 0;
    for (pos, byte) in constant.bytes().enumerate() {
        if needs_escape(byte) {
            logtype.push_str(&constant[run_begin..pos]);
            logtype.push(char::from(ESCAPE));
            run_begin = pos;
        }
    }
    logtype.push_str(&constant[run_begin..]);
}

/// Number of placeholders of each kind in a logtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaceholderCounts {
    pub integer: usize,
    pub float: usize,
    pub dictionary: usize,
}

impl PlaceholderCounts {
    /// Total number of variables referenced by the logtype.
    pub fn total(&self) -> usize {
        self.integer + self.float + self.dictionary
    }

    /// Number of entries consumed from the encoded-variable sequence.
    pub fn encoded(&self) -> usize {
        self.integer + self.float
    }
}

/// Count unescaped placeholders in a logtype.
pub fn count_placeholders(logtype: &str) -> Result<PlaceholderCounts> {
    let mut counts = PlaceholderCounts::default();
    let bytes = logtype.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let byte = bytes[pos];
        if byte == ESCAPE {
            if pos + 1 == bytes.len() {
                return Err(DecodeError::UnexpectedTrailingEscape);
            }
            pos += 2;
            continue;
        }
        match Placeholder::from_byte(byte) {
            Some(Placeholder::Integer) => counts.integer += 1,
            Some(Placeholder::Float) => counts.float += 1,
            Some(Placeholder::Dictionary) => counts.dictionary += 1,
            None => {}
        }
        pos += 1;
    }
    Ok(counts)
}
