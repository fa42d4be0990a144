//! Logtype/variable message encoding for compressed log storage.
//!
//! Every log message is split into:
//! - A logtype: the constant text with one placeholder byte per variable
//! - Encoded variables: integers and decimal floats packed into fixed-width values
//! - Dictionary variables: every other variable, kept verbatim
//!
//! Near-duplicate messages share a logtype, and encoded variables can be
//! searched without decoding the whole message.

pub mod classifier;
pub mod decoder;
pub mod dictionary;
pub mod error;
pub mod message;
pub mod placeholder;
pub mod variable;
pub mod wildcard;

pub use classifier::{
    is_delim, next_token_bounds, next_variable_bounds, next_wildcard_token_bounds, tokens,
    TokenBounds, WildcardTokenBounds,
};
pub use decoder::{decode_message, decode_message_with, MessageRenderer};
pub use dictionary::{
    decode_with_dictionary, encode_with_dictionary, DictionaryEncodedMessage,
    InMemoryVariableDictionary, LogtypeDictionaryEncoder, VariableDictionary,
};
pub use error::{DecodeError, Result};
pub use message::{encode_message, encode_message_with, EncodedMessage, LogtypeBuilder, MessageHandler};
pub use placeholder::{count_placeholders, Placeholder, PlaceholderCounts, ESCAPE};
pub use variable::{
    decode_float, decode_integer, encode_float, encode_integer, encode_variable, EightByte,
    FloatProperties, FourByte, Variable, VariableEncoding,
};
pub use wildcard::{
    could_be_float, could_be_int, could_be_static_text, matches_any_encoded_var,
    matches_encoded_vars_in_order, wildcard_match,
};
