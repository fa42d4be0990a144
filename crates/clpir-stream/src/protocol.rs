//! Wire constants of the IR stream.
//!
//! Tag values are part of the wire contract and must not change.

use std::fmt;

use bytes::{BufMut, BytesMut};
use clpir_encoding::{EightByte, FourByte, VariableEncoding};

use crate::cursor::ByteCursor;
use crate::error::Result;

/// Length of the magic number that opens every stream.
pub const MAGIC_NUMBER_LENGTH: usize = 4;

/// Magic number of four-byte streams.
pub const FOUR_BYTE_MAGIC_NUMBER: [u8; MAGIC_NUMBER_LENGTH] = [0xFD, 0x2F, 0xB5, 0x29];

/// Magic number of eight-byte streams.
pub const EIGHT_BYTE_MAGIC_NUMBER: [u8; MAGIC_NUMBER_LENGTH] = [0xFD, 0x2F, 0xB5, 0x30];

/// Terminates the stream.
pub const EOF: u8 = 0x00;

/// Metadata block tags.
pub mod metadata {
    /// Metadata is UTF-8 JSON.
    pub const ENCODING_JSON: u8 = 0x01;
    pub const LENGTH_UBYTE: u8 = 0x11;
    pub const LENGTH_USHORT: u8 = 0x12;
}

/// Event field tags.
pub mod payload {
    pub const VAR_FOUR_BYTE_ENCODING: u8 = 0x18;
    pub const VAR_EIGHT_BYTE_ENCODING: u8 = 0x19;

    pub const VAR_STR_LEN_UBYTE: u8 = 0x11;
    pub const VAR_STR_LEN_USHORT: u8 = 0x12;
    pub const VAR_STR_LEN_INT: u8 = 0x13;

    pub const LOGTYPE_STR_LEN_UBYTE: u8 = 0x21;
    pub const LOGTYPE_STR_LEN_USHORT: u8 = 0x22;
    pub const LOGTYPE_STR_LEN_INT: u8 = 0x23;

    pub const TIMESTAMP_VAL: u8 = 0x30;
    pub const TIMESTAMP_DELTA_BYTE: u8 = 0x31;
    pub const TIMESTAMP_DELTA_SHORT: u8 = 0x32;
    pub const TIMESTAMP_DELTA_INT: u8 = 0x33;
    pub const TIMESTAMP_DELTA_LONG: u8 = 0x34;
}

/// Which numeric width a stream uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingType {
    /// 32-bit variables, timestamps as deltas from the previous event.
    FourByte,
    /// 64-bit variables, absolute timestamps.
    EightByte,
}

impl EncodingType {
    pub const fn magic_number(self) -> [u8; MAGIC_NUMBER_LENGTH] {
        match self {
            Self::FourByte => FOUR_BYTE_MAGIC_NUMBER,
            Self::EightByte => EIGHT_BYTE_MAGIC_NUMBER,
        }
    }

    /// Identify a stream from its magic number.
    pub fn from_magic_number(magic: &[u8]) -> Option<Self> {
        if magic == FOUR_BYTE_MAGIC_NUMBER {
            Some(Self::FourByte)
        } else if magic == EIGHT_BYTE_MAGIC_NUMBER {
            Some(Self::EightByte)
        } else {
            None
        }
    }

    pub const fn uses_timestamp_deltas(self) -> bool {
        matches!(self, Self::FourByte)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::FourByte => "four-byte",
            Self::EightByte => "eight-byte",
        }
    }
}

impl fmt::Display for EncodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A variable width that can be carried in an IR stream.
pub trait IrEncoding: VariableEncoding {
    const ENCODING_TYPE: EncodingType;
    /// Tag preceding each encoded variable.
    const VAR_TAG: u8;

    /// Append one encoded variable, big-endian.
    fn put_var(dst: &mut BytesMut, var: Self::Var);

    /// Read one big-endian encoded variable.
    fn read_var(cursor: &mut ByteCursor<'_>) -> Result<Self::Var>;
}

impl IrEncoding for FourByte {
    const ENCODING_TYPE: EncodingType = EncodingType::FourByte;
    const VAR_TAG: u8 = payload::VAR_FOUR_BYTE_ENCODING;

    fn put_var(dst: &mut BytesMut, var: i32) {
        dst.put_i32(var);
    }

    fn read_var(cursor: &mut ByteCursor<'_>) -> Result<i32> {
        cursor.read_i32()
    }
}

impl IrEncoding for EightByte {
    const ENCODING_TYPE: EncodingType = EncodingType::EightByte;
    const VAR_TAG: u8 = payload::VAR_EIGHT_BYTE_ENCODING;

    fn put_var(dst: &mut BytesMut, var: i64) {
        dst.put_i64(var);
    }

    fn read_var(cursor: &mut ByteCursor<'_>) -> Result<i64> {
        cursor.read_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_numbers_are_distinct() {
        assert_ne!(FOUR_BYTE_MAGIC_NUMBER, EIGHT_BYTE_MAGIC_NUMBER);
        assert_eq!(
            EncodingType::from_magic_number(&FOUR_BYTE_MAGIC_NUMBER),
            Some(EncodingType::FourByte)
        );
        assert_eq!(
            EncodingType::from_magic_number(&EIGHT_BYTE_MAGIC_NUMBER),
            Some(EncodingType::EightByte)
        );
        assert_eq!(EncodingType::from_magic_number(b"\0\0\0\0"), None);
        assert_eq!(EncodingType::from_magic_number(&[0xFD, 0x2F]), None);
    }

    #[test]
    fn vars_are_big_endian() {
        let mut buf = BytesMut::new();
        <FourByte as IrEncoding>::put_var(&mut buf, 0x0102_0304);
        <EightByte as IrEncoding>::put_var(&mut buf, -2);
        assert_eq!(
            buf.as_ref(),
            &[1, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]
        );

        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(<FourByte as IrEncoding>::read_var(&mut cursor).unwrap(), 0x0102_0304);
        assert_eq!(<EightByte as IrEncoding>::read_var(&mut cursor).unwrap(), -2);
    }

    #[test]
    fn only_four_byte_uses_deltas() {
        assert!(EncodingType::FourByte.uses_timestamp_deltas());
        assert!(!EncodingType::EightByte.uses_timestamp_deltas());
        assert_eq!(EncodingType::EightByte.to_string(), "eight-byte");
    }
}
