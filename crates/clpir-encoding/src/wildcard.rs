//! Matching wildcard queries against encoded variables.
//!
//! Wildcards are `*` (zero or more characters) and `?` (exactly one
//! character). A backslash makes the following character literal.

use crate::error::{DecodeError, Result};
use crate::placeholder::{Placeholder, ESCAPE};
use crate::variable::{decode_float, decode_integer, VariableEncoding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryChar {
    Literal(char),
    AnyOne,
    AnyMany,
}

fn query_chars(query: &str) -> Vec<QueryChar> {
    let mut out = Vec::with_capacity(query.len());
    let mut chars = query.chars();
    while let Some(c) = chars.next() {
        let qc = match c {
            '*' => QueryChar::AnyMany,
            '?' => QueryChar::AnyOne,
            '\\' => QueryChar::Literal(chars.next().unwrap_or('\\')),
            other => QueryChar::Literal(other),
        };
        out.push(qc);
    }
    out
}

/// Glob-match `text` against `pattern`.
///
/// Case-insensitive matching folds ASCII letters only.
pub fn wildcard_match(text: &str, pattern: &str, case_sensitive: bool) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = query_chars(pattern);
    let eq = |a: char, b: char| {
        if case_sensitive {
            a == b
        } else {
            a.eq_ignore_ascii_case(&b)
        }
    };

    let mut t = 0;
    let mut p = 0;
    // Pattern index after the last `*` and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(QueryChar::AnyMany) => {
                p += 1;
                backtrack = Some((p, t));
                continue;
            }
            Some(QueryChar::AnyOne) => {
                p += 1;
                t += 1;
                continue;
            }
            Some(&QueryChar::Literal(c)) if eq(c, text[t]) => {
                p += 1;
                t += 1;
                continue;
            }
            _ => {}
        }
        match backtrack {
            Some((star_p, star_t)) => {
                p = star_p;
                t = star_t + 1;
                backtrack = Some((star_p, star_t + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|qc| *qc == QueryChar::AnyMany)
}

/// Whether the wildcard token could match the decimal text of an encoded integer.
///
/// Conservative: may return true for tokens that turn out not to match.
pub fn could_be_int(token: &str) -> bool {
    let mut seen_prefix = false;
    let mut seen_minus = false;
    let mut seen_digit_or_wildcard = false;
    for qc in query_chars(token) {
        match qc {
            QueryChar::AnyMany => seen_digit_or_wildcard = true,
            QueryChar::AnyOne => {
                seen_prefix = true;
                seen_digit_or_wildcard = true;
            }
            QueryChar::Literal('-') => {
                if seen_minus || seen_prefix {
                    return false;
                }
                seen_minus = true;
                seen_prefix = true;
            }
            QueryChar::Literal(c) if c.is_ascii_digit() => {
                seen_prefix = true;
                seen_digit_or_wildcard = true;
            }
            QueryChar::Literal(_) => return false,
        }
    }
    seen_digit_or_wildcard
}

/// Whether the wildcard token could match the decimal text of an encoded float.
///
/// Conservative: may return true for tokens that turn out not to match.
pub fn could_be_float(token: &str) -> bool {
    let chars = query_chars(token);
    let mut seen_prefix = false;
    let mut seen_minus = false;
    let mut seen_point = false;
    let mut seen_digit = false;
    let mut seen_wildcard = false;
    for qc in &chars {
        match *qc {
            QueryChar::AnyMany => seen_wildcard = true,
            QueryChar::AnyOne => {
                seen_prefix = true;
                seen_wildcard = true;
            }
            QueryChar::Literal('-') => {
                if seen_minus || seen_prefix {
                    return false;
                }
                seen_minus = true;
                seen_prefix = true;
            }
            QueryChar::Literal('.') => {
                if seen_point {
                    return false;
                }
                seen_point = true;
                seen_prefix = true;
            }
            QueryChar::Literal(c) if c.is_ascii_digit() => {
                seen_prefix = true;
                seen_digit = true;
            }
            QueryChar::Literal(_) => return false,
        }
    }
    // A literal point must be followed by something that can supply a digit.
    if chars.last() == Some(&QueryChar::Literal('.')) {
        return false;
    }
    (seen_point || seen_wildcard) && (seen_digit || seen_wildcard)
}

/// Whether the wildcard token could match text that is not a variable.
pub fn could_be_static_text(token: &str) -> bool {
    let chars = query_chars(token);
    if chars
        .iter()
        .any(|qc| matches!(qc, QueryChar::Literal(c) if c.is_ascii_digit()))
    {
        return false;
    }
    // A wildcard can stand in for a delimiter or a non-hex character.
    if chars.iter().any(|qc| !matches!(qc, QueryChar::Literal(_))) {
        return true;
    }
    !(chars.len() >= 2
        && chars
            .iter()
            .all(|qc| matches!(qc, QueryChar::Literal(c) if c.is_ascii_hexdigit())))
}

/// Walk the encoded placeholders of `logtype`, yielding `(placeholder, var)` pairs.
fn for_each_encoded_var<E, F>(logtype: &str, encoded_vars: &[E::Var], mut f: F) -> Result<bool>
where
    E: VariableEncoding,
    F: FnMut(Placeholder, E::Var) -> Result<bool>,
{
    let bytes = logtype.as_bytes();
    let mut encoded = encoded_vars.iter().copied();
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
        if let Some(placeholder) = Placeholder::from_byte(byte).filter(|p| p.is_encoded()) {
            let var = encoded.next().ok_or(DecodeError::TooFewEncodedVars)?;
            if f(placeholder, var)? {
                return Ok(true);
            }
        }
        pos += 1;
    }
    Ok(false)
}

fn decode_encoded<E: VariableEncoding>(placeholder: Placeholder, var: E::Var) -> Result<String> {
    match placeholder {
        Placeholder::Float => decode_float::<E>(var),
        _ => Ok(decode_integer::<E>(var)),
    }
}

/// Whether any encoded variable of kind `placeholder` matches `wildcard_query`.
///
/// Only integer and float placeholders are considered; asking for
/// [`Placeholder::Dictionary`] always yields false.
pub fn matches_any_encoded_var<E: VariableEncoding>(
    wildcard_query: &str,
    placeholder: Placeholder,
    logtype: &str,
    encoded_vars: &[E::Var],
) -> Result<bool> {
    if !placeholder.is_encoded() {
        return Ok(false);
    }
    for_each_encoded_var::<E, _>(logtype, encoded_vars, |kind, var| {
        if kind != placeholder {
            return Ok(false);
        }
        let decoded = decode_encoded::<E>(kind, var)?;
        Ok(wildcard_match(&decoded, wildcard_query, true))
    })
}

/// Whether each `(placeholder, query)` matches a distinct encoded variable, in order.
///
/// Queries match as a subsequence: unmatched variables in between are skipped.
pub fn matches_encoded_vars_in_order<E: VariableEncoding>(
    logtype: &str,
    encoded_vars: &[E::Var],
    queries: &[(Placeholder, &str)],
) -> Result<bool> {
    if queries.is_empty() {
        return Ok(true);
    }
    let mut next_query = 0;
    for_each_encoded_var::<E, _>(logtype, encoded_vars, |kind, var| {
        let (wanted, query) = queries[next_query];
        if kind != wanted {
            return Ok(false);
        }
        let decoded = decode_encoded::<E>(kind, var)?;
        if wildcard_match(&decoded, query, true) {
            next_query += 1;
        }
        Ok(next_query == queries.len())
    })
}
