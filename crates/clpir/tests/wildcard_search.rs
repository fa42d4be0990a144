use clpir::encoding::{
    could_be_float, could_be_int, could_be_static_text, encode_message, matches_any_encoded_var,
    matches_encoded_vars_in_order, next_wildcard_token_bounds, Placeholder,
};
use clpir::stream::{ByteCursor, IrDecoder, IrEncoder, PreambleConfig};
use clpir::{EightByte, FourByte};

const MESSAGE: &str = "batch 123 processed in 456.7 ms by worker-9";

#[test]
fn wildcard_matches_only_requested_kind() {
    let encoded = encode_message::<EightByte>(MESSAGE);
    let matches = |query, kind| {
        matches_any_encoded_var::<EightByte>(query, kind, &encoded.logtype, &encoded.encoded_vars)
            .expect("logtype should be well formed")
    };

    assert!(matches("1*3", Placeholder::Integer));
    assert!(!matches("1*3", Placeholder::Float));
    assert!(matches("4*7", Placeholder::Float));
    assert!(!matches("4*7", Placeholder::Integer));
    assert!(matches("45?.7", Placeholder::Float));
    assert!(!matches("*", Placeholder::Dictionary));
}

#[test]
fn wildcard_matches_events_read_from_a_stream() {
    let mut encoder = IrEncoder::<FourByte>::new();
    encoder
        .encode_preamble(&PreambleConfig::default())
        .expect("preamble should encode");
    encoder.encode_log_event(0, MESSAGE).expect("event should encode");
    encoder
        .encode_log_event(1, "batch 124 skipped")
        .expect("event should encode");
    encoder.close().expect("stream should close");
    let bytes = encoder.into_bytes();

    let mut cursor = ByteCursor::new(&bytes);
    let mut decoder = IrDecoder::<FourByte>::from_stream_start(&mut cursor).expect("preamble");
    let mut hits = Vec::new();
    while let Some(event) = decoder.deserialize_encoded_event(&mut cursor).expect("event") {
        let hit = matches_encoded_vars_in_order::<FourByte>(
            &event.logtype,
            &event.encoded_vars,
            &[(Placeholder::Integer, "12*"), (Placeholder::Float, "*.7")],
        )
        .expect("logtype should be well formed");
        hits.push(hit);
    }
    assert_eq!(hits, vec![true, false]);
}

#[test]
fn query_tokens_are_classified_conservatively() {
    let query = "batch 1*3 in *.7 ms by work?r";
    let mut tokens = Vec::new();
    let mut cursor = 0;
    while let Some(bounds) = next_wildcard_token_bounds(query, cursor) {
        tokens.push(&query[bounds.begin..bounds.end]);
        cursor = bounds.end;
    }
    assert_eq!(tokens, vec!["batch", "1*3", "in", "*.7", "ms", "by", "work?r"]);

    assert!(could_be_int("1*3"));
    assert!(could_be_float("1*3"));
    assert!(!could_be_float("work?r"));
    assert!(could_be_float("*.7"));
    assert!(!could_be_int("*.7"));
    assert!(!could_be_static_text("123"));
    assert!(could_be_static_text("batch"));
}
