//! Self-describing binary IR stream of encoded log events.
//!
//! Stream layout:
//! ```text
//! ┌──────────────┬──────────────────────────────┬─────────┬─────┐
//! │ magic (4)    │ metadata (type, len, JSON)   │ event*  │ EOF │
//! └──────────────┴──────────────────────────────┴─────────┴─────┘
//! event: (dictionary var | encoded var)* · logtype · timestamp
//! ```
//!
//! Four-byte streams carry 32-bit variables and timestamp deltas; eight-byte
//! streams carry 64-bit variables and absolute timestamps.

pub mod config;
pub mod cursor;
pub mod deserializer;
pub mod error;
pub mod metadata;
pub mod protocol;
pub mod reader;
pub mod serializer;
pub mod writer;

pub use config::{IrConfig, PreambleConfig, DEFAULT_INITIAL_BUFFER_CAPACITY, DEFAULT_MAX_EVENT_SIZE};
pub use cursor::ByteCursor;
pub use deserializer::{
    deserialize_preamble, deserialize_preamble_owned, get_encoding_type, EncodedLogEvent,
    IrDecoder, LogEvent, OwnedPreamble, PreambleRef,
};
pub use error::{IrError, Result};
pub use metadata::{
    decode_metadata, validate_protocol_version, Metadata, VersionCompatibility,
    LEGACY_PROTOCOL_VERSION, PROTOCOL_VERSION,
};
pub use protocol::{EncodingType, IrEncoding};
pub use reader::IrReader;
pub use serializer::{EncoderState, IrEncoder};
pub use writer::IrWriter;
