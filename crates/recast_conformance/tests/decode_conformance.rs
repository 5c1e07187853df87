//! End-to-end decoding through resolved programs: schema evolution, the
//! fast string path, truncation, and call contract enforcement.

use proptest::prelude::*;
use recast_codec::BufferSource;
use recast_conformance::{encode, schema, Pipeline, USER_NAME_ONLY, USER_V1, USER_V2};
use recast_config::RecastConfig;
use recast_decoder::{read_datum, DecodeError, Decoder, Expect, Value, Violation};
use recast_resolve::ProgramCache;

fn pipeline() -> Pipeline {
    Pipeline::new(&RecastConfig::default())
}

fn alice() -> Vec<u8> {
    encode(|e| {
        e.write_string("Alice");
        e.write_int(30);
    })
}

#[test]
fn dropped_field_is_never_exposed() {
    let data = alice();
    let values = pipeline()
        .decode_all(&schema(USER_V1), &schema(USER_NAME_ONLY), &data)
        .unwrap();
    assert_eq!(
        values,
        [Value::Record(vec![(
            "name".to_string(),
            Value::String("Alice".to_string())
        )])]
    );
}

#[test]
fn dropped_field_bytes_are_consumed() {
    let data = alice();
    let p = pipeline();
    let mut decoder = p
        .decoder(&schema(USER_V1), &schema(USER_NAME_ONLY), &data)
        .unwrap();
    let order = decoder.read_field_order().unwrap();
    assert_eq!(order.len(), 1);
    assert_eq!(decoder.read_string().unwrap(), "Alice");
    decoder.finish().unwrap();
    assert_eq!(decoder.source().position(), data.len());
}

#[test]
fn evolved_reader_widens_and_defaults() {
    let data = alice();
    let values = pipeline()
        .decode_all(&schema(USER_V1), &schema(USER_V2), &data)
        .unwrap();
    let user = &values[0];
    assert_eq!(user.field("name"), Some(&Value::String("Alice".to_string())));
    assert_eq!(user.field("age"), Some(&Value::Long(30)));
    assert_eq!(user.field("email").map(Value::unwrap_union), Some(&Value::Null));
}

#[test]
fn truncated_length_prefixed_field() {
    let mut data = encode(|e| e.write_long(10));
    data.extend_from_slice(b"abc");
    let cache = ProgramCache::new();
    let string = schema(r#""string""#);
    let program = cache.resolve(&string, &string).unwrap();

    let mut decoder = Decoder::new(program.clone(), BufferSource::new(data.as_slice()));
    let err = decoder.read_string().unwrap_err();
    assert!(err.is_truncation(), "got {err}");

    let mut decoder = Decoder::new(program, BufferSource::new(data.as_slice()));
    assert_eq!(decoder.read_string_size().unwrap(), 10);
    let mut buf = [0u8; 10];
    let err = decoder.read_string_data(&mut buf, 0, 10).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Truncated {
            needed: 10,
            available: 3
        }
    ));
}

#[test]
fn truncated_record_reports_no_value() {
    let data = alice();
    let cut = &data[..4];
    let err = pipeline()
        .decode_all(&schema(USER_V1), &schema(USER_V1), cut)
        .unwrap_err();
    assert!(matches!(
        err,
        recast_conformance::PipelineError::Decode(e) if e.is_truncation()
    ));
}

#[test]
fn numeric_read_on_string_field_consumes_nothing() {
    let data = alice();
    let p = pipeline();
    let mut decoder = p.decoder(&schema(USER_V1), &schema(USER_V1), &data).unwrap();
    let err = decoder.read_long().unwrap_err();
    assert!(err.is_contract_violation());
    assert!(matches!(
        err,
        DecodeError::ContractViolation(Violation::OutOfStep {
            expected: Expect::String,
            requested: Expect::Long
        })
    ));
    assert_eq!(decoder.source().position(), 0);
    assert!(decoder.read_string().unwrap_err().is_contract_violation());
    assert_eq!(decoder.source().position(), 0);
}

#[test]
fn reading_past_an_array_block_is_a_violation() {
    let array = schema(r#"{"type":"array","items":"int"}"#);
    let data = encode(|e| {
        e.write_count(1);
        e.write_int(8);
        e.write_end();
    });
    let p = pipeline();
    let mut decoder = p.decoder(&array, &array, &data).unwrap();
    assert_eq!(decoder.read_array_start().unwrap(), 1);
    assert_eq!(decoder.read_int().unwrap(), 8);
    let before = decoder.source().position();
    let err = decoder.read_int().unwrap_err();
    assert!(matches!(
        err,
        DecodeError::ContractViolation(Violation::OutOfStep {
            expected: Expect::ArrayNext,
            requested: Expect::Int
        })
    ));
    assert_eq!(decoder.source().position(), before);
}

#[test]
fn fast_path_is_available_for_in_memory_sources() {
    let data = alice();
    let p = pipeline();
    let decoder = p.decoder(&schema(USER_V1), &schema(USER_V1), &data).unwrap();
    assert!(decoder.is_bulk_source());
}

#[test]
fn generic_reader_over_a_stream() {
    let data = [alice(), alice()].concat();
    let p = pipeline();
    let mut decoder = p
        .decoder(&schema(USER_V1), &schema(USER_NAME_ONLY), &data)
        .unwrap();
    let first = read_datum(&mut decoder).unwrap();
    let second = read_datum(&mut decoder).unwrap();
    assert_eq!(first, second);
    assert!(decoder.source().is_exhausted());
}

proptest! {
    #[test]
    fn size_then_data_matches_whole_reads(
        strings in proptest::collection::vec(".{0,40}", 1..8),
        blobs in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 1..8),
    ) {
        let record = schema(r#"{"type":"record","name":"Batch","fields":[
            {"name":"strings","type":{"type":"array","items":"string"}},
            {"name":"blobs","type":{"type":"array","items":"bytes"}}
        ]}"#);
        let data = encode(|e| {
            e.write_count(strings.len());
            for s in &strings {
                e.write_string(s);
            }
            e.write_end();
            e.write_count(blobs.len());
            for b in &blobs {
                e.write_bytes(b);
            }
            e.write_end();
        });
        let p = pipeline();
        let mut whole = p.decoder(&record, &record, &data).unwrap();
        let mut fast = p.decoder(&record, &record, &data).unwrap();

        let n = whole.read_array_start().unwrap();
        prop_assert_eq!(fast.read_array_start().unwrap(), n);
        for _ in 0..n {
            let expected = whole.read_string().unwrap();
            let len = fast.read_string_size().unwrap();
            let mut buf = vec![0u8; len];
            fast.read_string_data(&mut buf, 0, len).unwrap();
            prop_assert_eq!(buf, expected.into_bytes());
            prop_assert_eq!(fast.source().position(), whole.source().position());
        }
        prop_assert_eq!(whole.array_next().unwrap(), 0);
        prop_assert_eq!(fast.array_next().unwrap(), 0);

        let n = whole.read_array_start().unwrap();
        prop_assert_eq!(fast.read_array_start().unwrap(), n);
        for _ in 0..n {
            let expected = whole.read_bytes().unwrap();
            let len = fast.read_bytes_size().unwrap();
            let mut buf = vec![0u8; len + 2];
            fast.read_bytes_data(&mut buf, 2, len).unwrap();
            prop_assert_eq!(&buf[2..], expected.as_slice());
            prop_assert_eq!(fast.source().position(), whole.source().position());
        }
        prop_assert_eq!(whole.array_next().unwrap(), 0);
        prop_assert_eq!(fast.array_next().unwrap(), 0);
        whole.finish().unwrap();
        fast.finish().unwrap();
        prop_assert!(whole.source().is_exhausted());
        prop_assert!(fast.source().is_exhausted());
    }
}
