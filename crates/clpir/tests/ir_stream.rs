use std::io::Cursor;

use clpir::stream::{
    deserialize_preamble, get_encoding_type, ByteCursor, EncodingType, IrDecoder, IrEncoder,
    IrError, IrReader, IrWriter, LogEvent, PreambleConfig, VersionCompatibility,
};
use clpir::{EightByte, FourByte};

const EVENTS: [(i64, &str); 5] = [
    (1_700_000_000_123, "2 workers started on port 8080"),
    (1_700_000_000_200, "request id=c0ffee took 12.75 ms"),
    // Out of order: a negative delta in four-byte streams.
    (1_700_000_000_150, "late write of 4096 bytes to /var/log/app1.log"),
    (1_700_000_100_000, "heartbeat"),
    (1_699_000_000_000, "clock reset by -1000000000 ms"),
];

fn config() -> PreambleConfig {
    PreambleConfig {
        timestamp_pattern: "%Y-%m-%dT%H:%M:%S.%3".to_string(),
        timestamp_pattern_syntax: "java::SimpleDateFormat".to_string(),
        time_zone_id: "America/Toronto".to_string(),
        reference_timestamp: 1_700_000_000_000,
    }
}

fn four_byte_stream() -> Vec<u8> {
    let mut encoder = IrEncoder::<FourByte>::new();
    encoder.encode_preamble(&config()).expect("preamble should encode");
    for (timestamp, message) in EVENTS {
        encoder
            .encode_log_event(timestamp, message)
            .expect("event should encode");
    }
    encoder.close().expect("stream should close");
    encoder.into_bytes().to_vec()
}

fn eight_byte_stream() -> Vec<u8> {
    let mut encoder = IrEncoder::<EightByte>::new();
    encoder.encode_preamble(&config()).expect("preamble should encode");
    for (timestamp, message) in EVENTS {
        encoder
            .encode_log_event(timestamp, message)
            .expect("event should encode");
    }
    encoder.close().expect("stream should close");
    encoder.into_bytes().to_vec()
}

fn preamble_end(bytes: &[u8]) -> usize {
    let mut cursor = ByteCursor::new(bytes);
    get_encoding_type(&mut cursor).expect("magic number");
    deserialize_preamble(&mut cursor).expect("preamble");
    cursor.position()
}

#[test]
fn encoding_type_detection() {
    let eight = eight_byte_stream();
    for len in 0..4 {
        let mut cursor = ByteCursor::new(&eight[..len]);
        assert!(matches!(get_encoding_type(&mut cursor), Err(IrError::IncompleteIr)));
    }

    let mut cursor = ByteCursor::new(b"PK\x03\x04rest");
    assert!(matches!(get_encoding_type(&mut cursor), Err(IrError::CorruptedIr(_))));

    assert_eq!(
        get_encoding_type(&mut ByteCursor::new(&eight)).expect("eight-byte magic"),
        EncodingType::EightByte
    );
    let four = four_byte_stream();
    assert_eq!(
        get_encoding_type(&mut ByteCursor::new(&four)).expect("four-byte magic"),
        EncodingType::FourByte
    );
}

#[test]
fn four_byte_events_roundtrip_with_negative_deltas() {
    let bytes = four_byte_stream();
    let mut cursor = ByteCursor::new(&bytes);
    let mut decoder =
        IrDecoder::<FourByte>::from_stream_start(&mut cursor).expect("preamble should decode");

    let metadata = decoder.metadata();
    assert_eq!(metadata.time_zone_id, "America/Toronto");
    assert_eq!(metadata.timestamp_pattern, "%Y-%m-%dT%H:%M:%S.%3");
    assert_eq!(
        metadata.reference_timestamp().expect("reference timestamp"),
        Some(1_700_000_000_000)
    );

    for (timestamp, message) in EVENTS {
        let event = decoder
            .deserialize_log_event(&mut cursor)
            .expect("event should decode")
            .expect("event before EOF");
        assert_eq!(event, LogEvent { timestamp, message: message.to_string() });
    }
    assert_eq!(decoder.deserialize_log_event(&mut cursor).expect("EOF"), None);
}

#[test]
fn eight_byte_events_roundtrip() {
    let bytes = eight_byte_stream();
    let mut cursor = ByteCursor::new(&bytes);
    let mut decoder =
        IrDecoder::<EightByte>::from_stream_start(&mut cursor).expect("preamble should decode");
    assert_eq!(decoder.metadata().reference_timestamp, None);

    let mut decoded = Vec::new();
    while let Some(event) = decoder.deserialize_log_event(&mut cursor).expect("event") {
        decoded.push((event.timestamp, event.message));
    }
    let expected: Vec<_> = EVENTS
        .iter()
        .map(|(timestamp, message)| (*timestamp, message.to_string()))
        .collect();
    assert_eq!(decoded, expected);
    assert_eq!(cursor.remaining(), 0);
}

#[test]
fn truncated_preamble_is_incomplete() {
    for bytes in [four_byte_stream(), eight_byte_stream()] {
        let end = preamble_end(&bytes);
        for len in 0..end {
            let mut cursor = ByteCursor::new(&bytes[..len]);
            let result = get_encoding_type(&mut cursor)
                .and_then(|_| deserialize_preamble(&mut cursor).map(|_| ()));
            assert!(
                matches!(result, Err(IrError::IncompleteIr)),
                "truncated at {len} of {end}"
            );
        }
    }
}

#[test]
fn corrupted_metadata_is_reported() {
    let bytes = eight_byte_stream();
    let mut cursor = ByteCursor::new(&bytes);
    get_encoding_type(&mut cursor).expect("magic number");
    let preamble = deserialize_preamble(&mut cursor).expect("preamble");
    let body = preamble.metadata_pos..preamble.metadata_pos + preamble.metadata.len();

    for pos in body {
        let mut corrupted = bytes.clone();
        corrupted[pos] = 0xFF;
        let mut cursor = ByteCursor::new(&corrupted);
        let err = IrDecoder::<EightByte>::from_stream_start(&mut cursor)
            .expect_err("corrupted metadata should fail");
        assert!(matches!(err, IrError::CorruptedIr(_)), "byte {pos}: {err}");
    }
}

#[test]
fn newer_protocol_version_is_rejected() {
    let json = br#"{"VERSION":"1.0.0","TZ_ID":"UTC"}"#;
    let mut bytes = EncodingType::EightByte.magic_number().to_vec();
    bytes.extend_from_slice(&[0x01, 0x11, json.len() as u8]);
    bytes.extend_from_slice(json);

    let err = IrDecoder::<EightByte>::from_stream_start(&mut ByteCursor::new(&bytes))
        .expect_err("version 1.0.0 is too new");
    assert!(matches!(
        err,
        IrError::UnsupportedVersion {
            compatibility: VersionCompatibility::TooNew,
            ..
        }
    ));
}

#[test]
fn writer_and_reader_roundtrip() {
    let mut writer = IrWriter::<_, FourByte>::new(Vec::<u8>::new());
    writer.write_preamble(&config()).expect("preamble");
    for (timestamp, message) in EVENTS {
        writer.write_event(timestamp, message).expect("event");
    }
    let bytes = writer.finish().expect("finish");
    assert_eq!(bytes, four_byte_stream());

    let mut reader = IrReader::<_, FourByte>::new(Cursor::new(bytes));
    assert_eq!(
        reader.read_preamble().expect("preamble").timestamp_pattern_syntax,
        "java::SimpleDateFormat"
    );
    let mut count = 0;
    while let Some(event) = reader.read_event().expect("event") {
        assert_eq!((event.timestamp, event.message.as_str()), EVENTS[count]);
        count += 1;
    }
    assert_eq!(count, EVENTS.len());
}

#[test]
fn reader_rejects_other_width() {
    let mut reader = IrReader::<_, EightByte>::new(Cursor::new(four_byte_stream()));
    assert!(matches!(
        reader.read_preamble(),
        Err(IrError::UnexpectedEncoding {
            expected: EncodingType::EightByte,
            found: EncodingType::FourByte,
        })
    ));
}
