//! Compressed log message encoding and the IR stream format.
//!
//! Log messages are split into a reusable logtype and a few variables, so
//! that near-duplicate lines compress well and variables can be searched
//! without decoding whole messages.
//!
//! # Crate Structure
//!
//! - [`encoding`]: tokenization, variable encoding, logtype building,
//!   message decoding, and wildcard matching against encoded variables
//! - [`stream`]: the binary IR stream (preamble plus encoded events) in
//!   four-byte and eight-byte variants

/// Re-export encoding types.
pub mod encoding {
    pub use clpir_encoding::*;
}

/// Re-export IR stream types.
pub mod stream {
    pub use clpir_stream::*;
}

pub use clpir_encoding::{EightByte, FourByte};
