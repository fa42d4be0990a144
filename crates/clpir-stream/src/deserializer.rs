//! In-memory IR stream deserialization.
//!
//! Every function here either consumes one complete unit (magic number,
//! preamble, or event) or leaves the cursor where it was. An
//! [`IrError::IncompleteIr`] can therefore be retried from the same position
//! once more bytes are available.

use std::marker::PhantomData;

use clpir_encoding::decode_message;

use crate::cursor::ByteCursor;
use crate::error::{IrError, Result};
use crate::metadata::{decode_metadata, Metadata};
use crate::protocol::{metadata as meta_tags, payload, EncodingType, IrEncoding, EOF, MAGIC_NUMBER_LENGTH};

/// Read the magic number and identify the stream's encoding.
///
/// Consumes the magic number on success; on failure the cursor is unchanged.
pub fn get_encoding_type(cursor: &mut ByteCursor<'_>) -> Result<EncodingType> {
    cursor.transaction(|c| {
        let magic = c.read_exact(MAGIC_NUMBER_LENGTH)?;
        EncodingType::from_magic_number(magic)
            .ok_or_else(|| IrError::corrupted(format!("unknown magic number {magic:02x?}")))
    })
}

/// A metadata block borrowed from the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreambleRef<'a> {
    /// Encoding of the metadata bytes (JSON is the only one defined).
    pub metadata_type: u8,
    /// Offset of the metadata bytes in the source buffer.
    pub metadata_pos: usize,
    pub metadata: &'a [u8],
}

impl PreambleRef<'_> {
    pub fn decode_metadata(&self) -> Result<Metadata> {
        decode_metadata(self.metadata_type, self.metadata)
    }
}

/// A metadata block detached from the source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedPreamble {
    pub metadata_type: u8,
    pub metadata: Vec<u8>,
}

impl From<PreambleRef<'_>> for OwnedPreamble {
    fn from(preamble: PreambleRef<'_>) -> Self {
        Self {
            metadata_type: preamble.metadata_type,
            metadata: preamble.metadata.to_vec(),
        }
    }
}

impl OwnedPreamble {
    pub fn decode_metadata(&self) -> Result<Metadata> {
        decode_metadata(self.metadata_type, &self.metadata)
    }
}

/// Read the metadata block that follows the magic number, without copying.
pub fn deserialize_preamble<'a>(cursor: &mut ByteCursor<'a>) -> Result<PreambleRef<'a>> {
    cursor.transaction(|c| {
        let metadata_type = c.read_u8()?;
        let len = match c.read_u8()? {
            meta_tags::LENGTH_UBYTE => usize::from(c.read_u8()?),
            meta_tags::LENGTH_USHORT => usize::from(c.read_u16()?),
            tag => {
                return Err(IrError::corrupted(format!(
                    "unknown metadata length tag 0x{tag:02x}"
                )))
            }
        };
        let metadata_pos = c.position();
        let metadata = c.read_exact(len)?;
        Ok(PreambleRef {
            metadata_type,
            metadata_pos,
            metadata,
        })
    })
}

/// Read the metadata block into its own buffer.
pub fn deserialize_preamble_owned(cursor: &mut ByteCursor<'_>) -> Result<OwnedPreamble> {
    deserialize_preamble(cursor).map(OwnedPreamble::from)
}

/// One event as stored: logtype, variables, and absolute timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLogEvent<E: IrEncoding> {
    pub timestamp: i64,
    pub logtype: String,
    pub encoded_vars: Vec<E::Var>,
    pub dictionary_vars: Vec<String>,
}

impl<E: IrEncoding> EncodedLogEvent<E> {
    /// Rebuild the event's message.
    pub fn decode(&self) -> Result<LogEvent> {
        let message =
            decode_message::<E>(&self.logtype, &self.encoded_vars, &self.dictionary_vars)?;
        Ok(LogEvent {
            timestamp: self.timestamp,
            message,
        })
    }
}

/// A decoded log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
}

/// Reads events of one stream, tracking the four-byte timestamp cursor.
#[derive(Debug, Clone)]
pub struct IrDecoder<E: IrEncoding> {
    metadata: Metadata,
    previous_timestamp: i64,
    _encoding: PhantomData<E>,
}

impl<E: IrEncoding> IrDecoder<E> {
    /// Decoder for a stream whose preamble has already been read.
    pub fn new(metadata: Metadata) -> Result<Self> {
        let previous_timestamp = if E::ENCODING_TYPE.uses_timestamp_deltas() {
            metadata.reference_timestamp()?.unwrap_or_default()
        } else {
            0
        };
        Ok(Self {
            metadata,
            previous_timestamp,
            _encoding: PhantomData,
        })
    }

    /// Read the magic number and preamble, then build a decoder.
    ///
    /// Fails with [`IrError::UnexpectedEncoding`] if the stream has the
    /// other width.
    pub fn from_stream_start(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            let found = get_encoding_type(c)?;
            if found != E::ENCODING_TYPE {
                return Err(IrError::UnexpectedEncoding {
                    expected: E::ENCODING_TYPE,
                    found,
                });
            }
            let metadata = deserialize_preamble(c)?.decode_metadata()?;
            tracing::debug!(
                encoding = %found,
                version = %metadata.version,
                "IR preamble read"
            );
            Self::new(metadata)
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Timestamp of the last event read (or the reference timestamp).
    pub fn previous_timestamp(&self) -> i64 {
        self.previous_timestamp
    }

    /// Read one event without decoding its message.
    ///
    /// Returns `Ok(None)` at the EOF tag.
    pub fn deserialize_encoded_event(
        &mut self,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<Option<EncodedLogEvent<E>>> {
        let previous_timestamp = self.previous_timestamp;
        let event = cursor.transaction(|c| read_event::<E>(c, previous_timestamp))?;
        match &event {
            Some(event) => self.previous_timestamp = event.timestamp,
            None => tracing::debug!(encoding = %E::ENCODING_TYPE, "IR EOF reached"),
        }
        Ok(event)
    }

    /// Read and decode one event. Returns `Ok(None)` at the EOF tag.
    ///
    /// An [`IrError::Decode`] still consumes the event, so the next call
    /// reads the event after it.
    pub fn deserialize_log_event(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<LogEvent>> {
        self.deserialize_encoded_event(cursor)?
            .map(|event| event.decode())
            .transpose()
    }
}

fn read_event<E: IrEncoding>(
    cursor: &mut ByteCursor<'_>,
    previous_timestamp: i64,
) -> Result<Option<EncodedLogEvent<E>>> {
    let mut tag = cursor.read_u8()?;
    if tag == EOF {
        return Ok(None);
    }

    let mut encoded_vars = Vec::new();
    let mut dictionary_vars = Vec::new();
    loop {
        match tag {
            t if t == E::VAR_TAG => encoded_vars.push(E::read_var(cursor)?),
            payload::VAR_STR_LEN_UBYTE => {
                let len = usize::from(cursor.read_u8()?);
                dictionary_vars.push(read_string(cursor, len, "dictionary variable")?);
            }
            payload::VAR_STR_LEN_USHORT => {
                let len = usize::from(cursor.read_u16()?);
                dictionary_vars.push(read_string(cursor, len, "dictionary variable")?);
            }
            payload::VAR_STR_LEN_INT => {
                let len = read_int_length(cursor)?;
                dictionary_vars.push(read_string(cursor, len, "dictionary variable")?);
            }
            _ => break,
        }
        tag = cursor.read_u8()?;
    }

    let logtype_len = match tag {
        payload::LOGTYPE_STR_LEN_UBYTE => usize::from(cursor.read_u8()?),
        payload::LOGTYPE_STR_LEN_USHORT => usize::from(cursor.read_u16()?),
        payload::LOGTYPE_STR_LEN_INT => read_int_length(cursor)?,
        tag => {
            return Err(IrError::corrupted(format!(
                "unexpected tag 0x{tag:02x} where a variable or logtype was expected"
            )))
        }
    };
    let logtype = read_string(cursor, logtype_len, "logtype")?;
    let timestamp = read_timestamp::<E>(cursor, previous_timestamp)?;

    Ok(Some(EncodedLogEvent {
        timestamp,
        logtype,
        encoded_vars,
        dictionary_vars,
    }))
}

fn read_timestamp<E: IrEncoding>(cursor: &mut ByteCursor<'_>, previous_timestamp: i64) -> Result<i64> {
    let tag = cursor.read_u8()?;
    if !E::ENCODING_TYPE.uses_timestamp_deltas() {
        return match tag {
            payload::TIMESTAMP_VAL => cursor.read_i64(),
            tag => Err(unexpected_timestamp_tag::<E>(tag)),
        };
    }

    let delta = match tag {
        payload::TIMESTAMP_DELTA_BYTE => i64::from(cursor.read_i8()?),
        payload::TIMESTAMP_DELTA_SHORT => i64::from(cursor.read_i16()?),
        payload::TIMESTAMP_DELTA_INT => i64::from(cursor.read_i32()?),
        payload::TIMESTAMP_DELTA_LONG => cursor.read_i64()?,
        tag => return Err(unexpected_timestamp_tag::<E>(tag)),
    };
    Ok(previous_timestamp.wrapping_add(delta))
}

fn unexpected_timestamp_tag<E: IrEncoding>(tag: u8) -> IrError {
    IrError::corrupted(format!(
        "unexpected timestamp tag 0x{tag:02x} in {} stream",
        E::ENCODING_TYPE
    ))
}

fn read_int_length(cursor: &mut ByteCursor<'_>) -> Result<usize> {
    let len = cursor.read_i32()?;
    usize::try_from(len).map_err(|_| IrError::corrupted(format!("negative length {len}")))
}

fn read_string(cursor: &mut ByteCursor<'_>, len: usize, what: &str) -> Result<String> {
    let bytes = cursor.read_exact(len)?;
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|err| IrError::corrupted(format!("{what} is not UTF-8: {err}")))
}
