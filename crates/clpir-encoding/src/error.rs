/// Errors that can occur while reconstructing a message from its logtype.
///
/// Each error is scoped to a single message; decoding of other messages is
/// unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A dictionary placeholder was reached with no dictionary variables left.
    #[error("logtype references more dictionary variables than were supplied")]
    TooFewDictionaryVars,

    /// An integer or float placeholder was reached with no encoded variables left.
    #[error("logtype references more encoded variables than were supplied")]
    TooFewEncodedVars,

    /// The logtype ends with an escape byte that escapes nothing.
    #[error("unexpected escape character at end of logtype")]
    UnexpectedTrailingEscape,

    /// A packed float whose digit-count, decimal-position, and digit fields disagree.
    #[error("invalid packed float encoding 0x{0:x}")]
    InvalidFloatEncoding(u64),

    /// A dictionary id that the variable dictionary does not know.
    #[error("unknown dictionary variable id {0}")]
    UnknownDictionaryId(u64),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
