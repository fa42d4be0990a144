//! In-memory IR stream serialization.

use std::marker::PhantomData;

use bytes::{BufMut, Bytes, BytesMut};
use clpir_encoding::{encode_message_with, MessageHandler};

use crate::config::{PreambleConfig, DEFAULT_INITIAL_BUFFER_CAPACITY};
use crate::error::{IrError, Result};
use crate::metadata::Metadata;
use crate::protocol::{metadata as meta_tags, payload, IrEncoding, EOF};

/// Where an [`IrEncoder`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Nothing written yet.
    Start,
    /// The preamble is written; events may follow.
    PreambleWritten,
    /// The EOF tag is written; nothing may follow.
    Closed,
}

/// Serializes a preamble and a sequence of log events into a growable buffer.
///
/// Four-byte streams store each timestamp as a delta from the previous event
/// (starting at the preamble's reference timestamp), so one encoder must own
/// exactly one stream.
#[derive(Debug)]
pub struct IrEncoder<E: IrEncoding> {
    buf: BytesMut,
    state: EncoderState,
    previous_timestamp: i64,
    _encoding: PhantomData<E>,
}

impl<E: IrEncoding> Default for IrEncoder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: IrEncoding> IrEncoder<E> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            state: EncoderState::Start,
            previous_timestamp: 0,
            _encoding: PhantomData,
        }
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Write the magic number and metadata block.
    pub fn encode_preamble(&mut self, config: &PreambleConfig) -> Result<()> {
        if self.state != EncoderState::Start {
            return Err(IrError::InvalidState("preamble already written"));
        }

        let metadata = Metadata::for_encoding::<E>(config);
        let json = serde_json::to_vec(&metadata)?;
        if json.len() > usize::from(u16::MAX) {
            return Err(IrError::EncodingTooLong {
                what: "metadata",
                len: json.len(),
                max: usize::from(u16::MAX),
            });
        }

        self.buf.reserve(E::ENCODING_TYPE.magic_number().len() + json.len() + 4);
        self.buf.put_slice(&E::ENCODING_TYPE.magic_number());
        self.buf.put_u8(meta_tags::ENCODING_JSON);
        if let Ok(len) = u8::try_from(json.len()) {
            self.buf.put_u8(meta_tags::LENGTH_UBYTE);
            self.buf.put_u8(len);
        } else {
            self.buf.put_u8(meta_tags::LENGTH_USHORT);
            self.buf.put_u16(json.len() as u16);
        }
        self.buf.put_slice(&json);

        self.previous_timestamp = config.reference_timestamp;
        self.state = EncoderState::PreambleWritten;
        tracing::debug!(
            encoding = %E::ENCODING_TYPE,
            metadata_len = json.len(),
            "IR preamble written"
        );
        Ok(())
    }

    /// Encode one log event.
    ///
    /// `timestamp` is absolute (epoch milliseconds); four-byte streams store
    /// it as a delta. On failure nothing is appended.
    pub fn encode_log_event(&mut self, timestamp: i64, message: &str) -> Result<()> {
        match self.state {
            EncoderState::Start => return Err(IrError::InvalidState("preamble not written")),
            EncoderState::Closed => return Err(IrError::InvalidState("stream closed")),
            EncoderState::PreambleWritten => {}
        }

        let start = self.buf.len();
        if let Err(err) = self.put_event(timestamp, message) {
            self.buf.truncate(start);
            return Err(err);
        }
        self.previous_timestamp = timestamp;
        Ok(())
    }

    fn put_event(&mut self, timestamp: i64, message: &str) -> Result<()> {
        let mut vars = EventSerializer::<E> {
            buf: &mut self.buf,
            _encoding: PhantomData,
        };
        let logtype = encode_message_with::<E, _>(message, &mut vars)?;

        put_length(
            &mut self.buf,
            "logtype",
            logtype.len(),
            [
                payload::LOGTYPE_STR_LEN_UBYTE,
                payload::LOGTYPE_STR_LEN_USHORT,
                payload::LOGTYPE_STR_LEN_INT,
            ],
        )?;
        self.buf.put_slice(logtype.as_bytes());

        if E::ENCODING_TYPE.uses_timestamp_deltas() {
            put_timestamp_delta(&mut self.buf, timestamp.wrapping_sub(self.previous_timestamp));
        } else {
            self.buf.put_u8(payload::TIMESTAMP_VAL);
            self.buf.put_i64(timestamp);
        }
        Ok(())
    }

    /// Append the EOF tag. The encoder accepts nothing afterwards.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            EncoderState::Start => return Err(IrError::InvalidState("preamble not written")),
            EncoderState::Closed => return Err(IrError::InvalidState("stream closed")),
            EncoderState::PreambleWritten => {}
        }
        self.buf.put_u8(EOF);
        self.state = EncoderState::Closed;
        tracing::debug!(encoding = %E::ENCODING_TYPE, "IR stream closed");
        Ok(())
    }

    /// Bytes serialized and not yet taken.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the bytes serialized so far, leaving the encoder's state intact.
    pub fn take_bytes(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Writes variables straight into the event buffer as they are found.
struct EventSerializer<'a, E> {
    buf: &'a mut BytesMut,
    _encoding: PhantomData<E>,
}

impl<E: IrEncoding> EventSerializer<'_, E> {
    fn put_encoded(&mut self, var: E::Var) {
        self.buf.put_u8(E::VAR_TAG);
        E::put_var(self.buf, var);
    }
}

impl<E: IrEncoding> MessageHandler<E> for EventSerializer<'_, E> {
    type Error = IrError;

    fn on_constant(&mut self, _constant: &str) -> Result<()> {
        Ok(())
    }

    fn on_encoded_int(&mut self, var: E::Var) -> Result<()> {
        self.put_encoded(var);
        Ok(())
    }

    fn on_encoded_float(&mut self, var: E::Var) -> Result<()> {
        self.put_encoded(var);
        Ok(())
    }

    fn on_dict_var(&mut self, var: &str) -> Result<()> {
        put_length(
            self.buf,
            "dictionary variable",
            var.len(),
            [
                payload::VAR_STR_LEN_UBYTE,
                payload::VAR_STR_LEN_USHORT,
                payload::VAR_STR_LEN_INT,
            ],
        )?;
        self.buf.put_slice(var.as_bytes());
        Ok(())
    }
}

/// Write the smallest length tag that fits `len`, then the length itself.
///
/// `tags` are the unsigned-byte, unsigned-short and signed-int tags.
fn put_length(dst: &mut BytesMut, what: &'static str, len: usize, tags: [u8; 3]) -> Result<()> {
    let [ubyte, ushort, int] = tags;
    if let Ok(len) = u8::try_from(len) {
        dst.put_u8(ubyte);
        dst.put_u8(len);
    } else if let Ok(len) = u16::try_from(len) {
        dst.put_u8(ushort);
        dst.put_u16(len);
    } else if let Ok(len) = i32::try_from(len) {
        dst.put_u8(int);
        dst.put_i32(len);
    } else {
        return Err(IrError::EncodingTooLong {
            what,
            len,
            max: i32::MAX as usize,
        });
    }
    Ok(())
}

fn put_timestamp_delta(dst: &mut BytesMut, delta: i64) {
    if let Ok(delta) = i8::try_from(delta) {
        dst.put_u8(payload::TIMESTAMP_DELTA_BYTE);
        dst.put_i8(delta);
    } else if let Ok(delta) = i16::try_from(delta) {
        dst.put_u8(payload::TIMESTAMP_DELTA_SHORT);
        dst.put_i16(delta);
    } else if let Ok(delta) = i32::try_from(delta) {
        dst.put_u8(payload::TIMESTAMP_DELTA_INT);
        dst.put_i32(delta);
    } else {
        dst.put_u8(payload::TIMESTAMP_DELTA_LONG);
        dst.put_i64(delta);
    }
}

#[cfg(test)]
mod tests {
    use clpir_encoding::{EightByte, FourByte};

    use super::*;
    use crate::protocol::{EIGHT_BYTE_MAGIC_NUMBER, FOUR_BYTE_MAGIC_NUMBER};

    fn preamble_len(bytes: &[u8]) -> usize {
        assert_eq!(bytes[4], meta_tags::ENCODING_JSON);
        match bytes[5] {
            meta_tags::LENGTH_UBYTE => 7 + usize::from(bytes[6]),
            meta_tags::LENGTH_USHORT => 8 + usize::from(u16::from_be_bytes([bytes[6], bytes[7]])),
            tag => panic!("unexpected length tag 0x{tag:02x}"),
        }
    }

    #[test]
    fn preamble_starts_with_magic_number() {
        let mut four = IrEncoder::<FourByte>::new();
        four.encode_preamble(&PreambleConfig::default()).unwrap();
        assert_eq!(&four.as_bytes()[..4], &FOUR_BYTE_MAGIC_NUMBER);
        assert_eq!(preamble_len(four.as_bytes()), four.as_bytes().len());

        let mut eight = IrEncoder::<EightByte>::new();
        eight.encode_preamble(&PreambleConfig::default()).unwrap();
        assert_eq!(&eight.as_bytes()[..4], &EIGHT_BYTE_MAGIC_NUMBER);
        assert_eq!(eight.state(), EncoderState::PreambleWritten);
    }

    #[test]
    fn long_metadata_uses_ushort_length() {
        let config = PreambleConfig {
            timestamp_pattern: "%Y-%m-%d %H:%M:%S,%3 ".repeat(20),
            ..PreambleConfig::default()
        };
        let mut encoder = IrEncoder::<EightByte>::new();
        encoder.encode_preamble(&config).unwrap();
        assert_eq!(encoder.as_bytes()[5], meta_tags::LENGTH_USHORT);
        assert_eq!(preamble_len(encoder.as_bytes()), encoder.as_bytes().len());
    }

    #[test]
    fn oversized_metadata_is_rejected_without_output() {
        let config = PreambleConfig {
            time_zone_id: "x".repeat(70_000),
            ..PreambleConfig::default()
        };
        let mut encoder = IrEncoder::<EightByte>::new();
        let err = encoder.encode_preamble(&config).unwrap_err();
        assert!(matches!(err, IrError::EncodingTooLong { what: "metadata", .. }));
        assert!(encoder.as_bytes().is_empty());
        assert_eq!(encoder.state(), EncoderState::Start);
    }

    #[test]
    fn eight_byte_event_layout() {
        let mut encoder = IrEncoder::<EightByte>::new();
        encoder.encode_preamble(&PreambleConfig::default()).unwrap();
        encoder.take_bytes();

        encoder.encode_log_event(1_000, "user=bob took 42 ms").unwrap();
        let mut expected = vec![payload::VAR_STR_LEN_UBYTE, 3];
        expected.extend_from_slice(b"bob");
        expected.push(payload::VAR_EIGHT_BYTE_ENCODING);
        expected.extend_from_slice(&42i64.to_be_bytes());
        let logtype = "user=\u{12} took \u{11} ms";
        expected.extend_from_slice(&[payload::LOGTYPE_STR_LEN_UBYTE, logtype.len() as u8]);
        expected.extend_from_slice(logtype.as_bytes());
        expected.push(payload::TIMESTAMP_VAL);
        expected.extend_from_slice(&1_000i64.to_be_bytes());
        assert_eq!(encoder.as_bytes(), expected.as_slice());
    }

    #[test]
    fn four_byte_timestamps_are_smallest_deltas() {
        let config = PreambleConfig {
            reference_timestamp: 1_000,
            ..PreambleConfig::default()
        };
        let mut encoder = IrEncoder::<FourByte>::new();
        encoder.encode_preamble(&config).unwrap();
        encoder.take_bytes();

        let cases = [
            (1_005, payload::TIMESTAMP_DELTA_BYTE, 2),
            (1_000, payload::TIMESTAMP_DELTA_BYTE, 2),
            (2_000, payload::TIMESTAMP_DELTA_SHORT, 3),
            (100_000, payload::TIMESTAMP_DELTA_INT, 5),
            (10_000_000_000, payload::TIMESTAMP_DELTA_LONG, 9),
        ];
        for (timestamp, tag, width) in cases {
            encoder.encode_log_event(timestamp, "x").unwrap();
            let event = encoder.take_bytes();
            // Logtype "x": tag, length, one byte.
            assert_eq!(&event[..3], &[payload::LOGTYPE_STR_LEN_UBYTE, 1, b'x']);
            assert_eq!(event[3], tag, "timestamp {timestamp}");
            assert_eq!(event.len() - 3, width);
        }
    }

    #[test]
    fn long_strings_use_wider_length_tags() {
        let mut encoder = IrEncoder::<EightByte>::new();
        encoder.encode_preamble(&PreambleConfig::default()).unwrap();
        encoder.take_bytes();

        let dict_var = format!("a1{}", "b".repeat(300));
        encoder.encode_log_event(0, &dict_var).unwrap();
        let event = encoder.take_bytes();
        assert_eq!(event[0], payload::VAR_STR_LEN_USHORT);
        assert_eq!(u16::from_be_bytes([event[1], event[2]]), 302);

        let constant = " ".repeat(70_000);
        encoder.encode_log_event(0, &constant).unwrap();
        let event = encoder.take_bytes();
        assert_eq!(event[0], payload::LOGTYPE_STR_LEN_INT);
        assert_eq!(i32::from_be_bytes([event[1], event[2], event[3], event[4]]), 70_000);
    }

    #[test]
    fn state_machine_rejects_misuse() {
        let mut encoder = IrEncoder::<FourByte>::new();
        assert!(matches!(
            encoder.encode_log_event(0, "early"),
            Err(IrError::InvalidState(_))
        ));
        assert!(matches!(encoder.close(), Err(IrError::InvalidState(_))));

        encoder.encode_preamble(&PreambleConfig::default()).unwrap();
        assert!(matches!(
            encoder.encode_preamble(&PreambleConfig::default()),
            Err(IrError::InvalidState(_))
        ));

        encoder.close().unwrap();
        assert_eq!(encoder.as_bytes().last(), Some(&EOF));
        assert_eq!(encoder.state(), EncoderState::Closed);
        assert!(matches!(
            encoder.encode_log_event(0, "late"),
            Err(IrError::InvalidState(_))
        ));
        assert!(matches!(encoder.close(), Err(IrError::InvalidState(_))));
    }
}
