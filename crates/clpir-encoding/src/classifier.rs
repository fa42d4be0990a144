//! Token boundary detection.
//!
//! A token is a maximal run of non-delimiter bytes. Whether a token is a
//! variable is decided heuristically: it contains a decimal digit, it is a
//! multi-character hex run, or it directly follows `=` and contains a letter.

/// Bounds of one token in a message, as `[begin, end)` byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBounds {
    pub begin: usize,
    pub end: usize,
    /// The token should be encoded as a variable rather than kept as constant text.
    pub is_definite_variable: bool,
}

/// Bounds of one token in a wildcard search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WildcardTokenBounds {
    pub begin: usize,
    pub end: usize,
    /// The literal characters alone make the token a variable.
    pub is_definite_variable: bool,
    /// The token contains an unescaped `*` or `?`.
    pub contains_wildcard: bool,
}

impl WildcardTokenBounds {
    /// The token may match a variable once its wildcards are resolved.
    pub fn could_be_variable(&self) -> bool {
        self.is_definite_variable || self.contains_wildcard
    }
}

/// Returns true if `byte` separates tokens.
///
/// Everything except `+ - . 0-9 A-Z \ _ a-z` is a delimiter.
pub fn is_delim(byte: u8) -> bool {
    !(byte == b'+'
        || byte == b'-'
        || byte == b'.'
        || byte.is_ascii_digit()
        || byte.is_ascii_uppercase()
        || byte == b'\\'
        || byte == b'_'
        || byte.is_ascii_lowercase())
}

/// Returns true if `byte` is a wildcard in a search query.
pub fn is_wildcard(byte: u8) -> bool {
    byte == b'*' || byte == b'?'
}

/// Returns true for runs of two or more hex digits.
pub fn could_be_multi_digit_hex_value(token: &[u8]) -> bool {
    token.len() >= 2 && token.iter().all(u8::is_ascii_hexdigit)
}

/// Find the next token at or after `cursor`.
///
/// Returns `None` once no non-delimiter byte remains.
pub fn next_token_bounds(message: &str, cursor: usize) -> Option<TokenBounds> {
    let bytes = message.as_bytes();
    let begin = cursor + bytes.get(cursor..)?.iter().position(|&b| !is_delim(b))?;

    let mut contains_digit = false;
    let mut contains_alphabet = false;
    let mut end = begin;
    while end < bytes.len() {
        let byte = bytes[end];
        if byte.is_ascii_digit() {
            contains_digit = true;
        } else if byte.is_ascii_alphabetic() {
            contains_alphabet = true;
        } else if is_delim(byte) {
            break;
        }
        end += 1;
    }

    let is_definite_variable = contains_digit
        || (follows_equals(bytes, begin) && contains_alphabet)
        || could_be_multi_digit_hex_value(&bytes[begin..end]);

    Some(TokenBounds {
        begin,
        end,
        is_definite_variable,
    })
}

/// Find the next token at or after `cursor` that is a definite variable.
pub fn next_variable_bounds(message: &str, mut cursor: usize) -> Option<TokenBounds> {
    loop {
        let bounds = next_token_bounds(message, cursor)?;
        if bounds.is_definite_variable {
            return Some(bounds);
        }
        cursor = bounds.end;
    }
}

/// Iterator over every token in a message, variable or not.
pub fn tokens(message: &str) -> impl Iterator<Item = TokenBounds> + '_ {
    let mut cursor = 0;
    std::iter::from_fn(move || {
        let bounds = next_token_bounds(message, cursor)?;
        cursor = bounds.end;
        Some(bounds)
    })
}

/// Find the next token of a wildcard query at or after `cursor`.
///
/// `*` and `?` are token characters here. A backslash followed by a wildcard
/// is a literal pair and does not count as a wildcard.
pub fn next_wildcard_token_bounds(query: &str, cursor: usize) -> Option<WildcardTokenBounds> {
    let bytes = query.as_bytes();
    let begin = cursor
        + bytes
            .get(cursor..)?
            .iter()
            .position(|&b| !is_delim(b) || is_wildcard(b))?;

    let mut contains_digit = false;
    let mut contains_alphabet = false;
    let mut contains_wildcard = false;
    let mut end = begin;
    while end < bytes.len() {
        let byte = bytes[end];
        if byte == b'\\' && bytes.get(end + 1).copied().is_some_and(is_wildcard) {
            end += 2;
            continue;
        }
        if byte.is_ascii_digit() {
            contains_digit = true;
        } else if byte.is_ascii_alphabetic() {
            contains_alphabet = true;
        } else if is_wildcard(byte) {
            contains_wildcard = true;
        } else if is_delim(byte) {
            break;
        }
        end += 1;
    }

    // A wildcard may stand in for a delimiter, so hex runs only count when
    // the token is fully literal.
    let is_definite_variable = contains_digit
        || (follows_equals(bytes, begin) && contains_alphabet)
        || (!contains_wildcard && could_be_multi_digit_hex_value(&bytes[begin..end]));

    Some(WildcardTokenBounds {
        begin,
        end,
        is_definite_variable,
        contains_wildcard,
    })
}

fn follows_equals(bytes: &[u8], begin: usize) -> bool {
    begin > 0 && bytes[begin - 1] == b'='
}
