//! Encoding of individual variable tokens into fixed-width values.
//!
//! Integers are stored exactly. Decimal floats are packed into the same width
//! with this layout (most to least significant bit):
//!
//! ```text
//! eight-byte: │ sign (1) │ unused (1) │ digits (54) │ digit count - 1 (4) │ decimal pos - 1 (4) │
//! four-byte:  │ sign (1) │ digits (25)             │ digit count - 1 (3) │ decimal pos - 1 (3) │
//! ```
//!
//! The decimal position is counted from the right, so leading and trailing
//! zeros both survive a round trip.

use std::fmt;

use crate::error::{DecodeError, Result};

/// Numeric width of encoded variables.
///
/// Implemented by [`FourByte`] and [`EightByte`]; every encoding routine is
/// generic over this trait.
pub trait VariableEncoding: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// Fixed-width encoded variable type.
    type Var: Copy + Eq + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Short name used in diagnostics.
    const NAME: &'static str;
    /// Size of one encoded variable in bytes.
    const VAR_SIZE: usize;
    /// Maximum number of decimal digits in a packed float.
    const MAX_FLOAT_DIGITS: usize;
    /// Width of the packed float's digit field.
    const FLOAT_DIGITS_BITS: u32;
    /// Width of the packed float's digit-count field.
    const FLOAT_NUM_DIGITS_BITS: u32;
    /// Width of the packed float's decimal-position field.
    const FLOAT_DECIMAL_POS_BITS: u32;

    /// Narrow an `i64` to this width, if it fits.
    fn var_from_i64(value: i64) -> Option<Self::Var>;
    /// Widen an encoded variable to `i64`.
    fn var_to_i64(var: Self::Var) -> i64;
    /// Reinterpret the low `VAR_SIZE * 8` bits as an encoded variable.
    fn var_from_bits(bits: u64) -> Self::Var;
    /// Raw bits of an encoded variable, zero-extended.
    fn var_to_bits(var: Self::Var) -> u64;
}

/// 32-bit encoded variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FourByte;

/// 64-bit encoded variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EightByte;

impl VariableEncoding for FourByte {
    type Var = i32;

    const NAME: &'static str = "four-byte";
    const VAR_SIZE: usize = 4;
    const MAX_FLOAT_DIGITS: usize = 8;
    const FLOAT_DIGITS_BITS: u32 = 25;
    const FLOAT_NUM_DIGITS_BITS: u32 = 3;
    const FLOAT_DECIMAL_POS_BITS: u32 = 3;

    fn var_from_i64(value: i64) -> Option<i32> {
        i32::try_from(value).ok()
    }

    fn var_to_i64(var: i32) -> i64 {
        i64::from(var)
    }

    fn var_from_bits(bits: u64) -> i32 {
        bits as u32 as i32
    }

    fn var_to_bits(var: i32) -> u64 {
        u64::from(var as u32)
    }
}

impl VariableEncoding for EightByte {
    type Var = i64;

    const NAME: &'static str = "eight-byte";
    const VAR_SIZE: usize = 8;
    const MAX_FLOAT_DIGITS: usize = 16;
    const FLOAT_DIGITS_BITS: u32 = 54;
    const FLOAT_NUM_DIGITS_BITS: u32 = 4;
    const FLOAT_DECIMAL_POS_BITS: u32 = 4;

    fn var_from_i64(value: i64) -> Option<i64> {
        Some(value)
    }

    fn var_to_i64(var: i64) -> i64 {
        var
    }

    fn var_from_bits(bits: u64) -> i64 {
        bits as i64
    }

    fn var_to_bits(var: i64) -> u64 {
        var as u64
    }
}

/// Outcome of classifying one variable token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable<'a, E: VariableEncoding> {
    Integer(E::Var),
    Float(E::Var),
    Dictionary(&'a str),
}

/// Classify and encode a variable token: integer first, then float, then dictionary.
pub fn encode_variable<E: VariableEncoding>(token: &str) -> Variable<'_, E> {
    if let Some(var) = encode_integer::<E>(token) {
        Variable::Integer(var)
    } else if let Some(var) = encode_float::<E>(token) {
        Variable::Float(var)
    } else {
        Variable::Dictionary(token)
    }
}

/// Encode the canonical decimal form of an integer.
///
/// Accepts an optional leading `-` followed by `0` or by digits without a
/// leading zero. `-0` is rejected since it would decode as `0`.
pub fn encode_integer<E: VariableEncoding>(token: &str) -> Option<E::Var> {
    let bytes = token.as_bytes();
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if digits[0] == b'0' && (digits.len() > 1 || digits.len() != bytes.len()) {
        return None;
    }

    let value: i64 = token.parse().ok()?;
    E::var_from_i64(value)
}

/// Decode an encoded integer back to its decimal text.
pub fn decode_integer<E: VariableEncoding>(var: E::Var) -> String {
    E::var_to_i64(var).to_string()
}

/// Encode a decimal float string such as `-12.50` or `.1`.
///
/// Requires at least one digit after a single `.`. Exponents, suffixes,
/// spaces, and a leading `+` are rejected.
pub fn encode_float<E: VariableEncoding>(token: &str) -> Option<E::Var> {
    let bytes = token.as_bytes();
    let (is_negative, body) = match bytes.strip_prefix(b"-") {
        Some(rest) => (true, rest),
        None => (false, bytes),
    };
    // Digits plus the decimal point.
    if body.len() > E::MAX_FLOAT_DIGITS + 1 {
        return None;
    }

    let mut digits = 0u64;
    let mut num_digits = 0usize;
    let mut decimal_pos = None;
    for (pos, &byte) in body.iter().enumerate() {
        match byte {
            b'0'..=b'9' => {
                digits = digits * 10 + u64::from(byte - b'0');
                num_digits += 1;
            }
            b'.' if decimal_pos.is_none() => decimal_pos = Some(body.len() - 1 - pos),
            _ => return None,
        }
    }

    let decimal_pos = decimal_pos.filter(|&pos| pos > 0)?;
    if num_digits == 0 || num_digits > E::MAX_FLOAT_DIGITS || digits > digits_mask::<E>() {
        return None;
    }

    Some(pack_float::<E>(is_negative, digits, num_digits, decimal_pos))
}

/// Decode a packed float back to its exact original text.
pub fn decode_float<E: VariableEncoding>(var: E::Var) -> Result<String> {
    let properties = FloatProperties::unpack::<E>(var);
    let num_digits = properties.num_digits;
    let decimal_pos = properties.decimal_pos;
    let fits = 10u64
        .checked_pow(num_digits as u32)
        .is_none_or(|limit| properties.digits < limit);
    if decimal_pos > num_digits || !fits {
        return Err(DecodeError::InvalidFloatEncoding(E::var_to_bits(var)));
    }

    let digits = format!("{:0width$}", properties.digits, width = num_digits);
    let split = num_digits - decimal_pos;
    let mut out = String::with_capacity(num_digits + 2);
    if properties.is_negative {
        out.push('-');
    }
    out.push_str(&digits[..split]);
    out.push('.');
    out.push_str(&digits[split..]);
    Ok(out)
}

/// Decoded fields of a packed float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatProperties {
    pub is_negative: bool,
    /// Digits with the decimal point removed.
    pub digits: u64,
    /// Number of decimal digits, including leading zeros.
    pub num_digits: usize,
    /// Number of digits right of the decimal point.
    pub decimal_pos: usize,
}

impl FloatProperties {
    /// Split a packed float into its fields without validating them.
    pub fn unpack<E: VariableEncoding>(var: E::Var) -> Self {
        let bits = E::var_to_bits(var);
        let sign_shift = (E::VAR_SIZE * 8 - 1) as u32;
        let digits_shift = E::FLOAT_NUM_DIGITS_BITS + E::FLOAT_DECIMAL_POS_BITS;
        Self {
            is_negative: (bits >> sign_shift) & 1 == 1,
            digits: (bits >> digits_shift) & digits_mask::<E>(),
            num_digits: ((bits >> E::FLOAT_DECIMAL_POS_BITS) & low_mask(E::FLOAT_NUM_DIGITS_BITS))
                as usize
                + 1,
            decimal_pos: (bits & low_mask(E::FLOAT_DECIMAL_POS_BITS)) as usize + 1,
        }
    }
}

fn pack_float<E: VariableEncoding>(
    is_negative: bool,
    digits: u64,
    num_digits: usize,
    decimal_pos: usize,
) -> E::Var {
    let sign_shift = (E::VAR_SIZE * 8 - 1) as u32;
    let mut bits = u64::from(is_negative) << sign_shift;
    bits |= (digits & digits_mask::<E>()) << (E::FLOAT_NUM_DIGITS_BITS + E::FLOAT_DECIMAL_POS_BITS);
    bits |= ((num_digits as u64 - 1) & low_mask(E::FLOAT_NUM_DIGITS_BITS)) << E::FLOAT_DECIMAL_POS_BITS;
    bits |= (decimal_pos as u64 - 1) & low_mask(E::FLOAT_DECIMAL_POS_BITS);
    E::var_from_bits(bits)
}

fn digits_mask<E: VariableEncoding>() -> u64 {
    low_mask(E::FLOAT_DIGITS_BITS)
}

fn low_mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}
