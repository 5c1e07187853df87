//! Configuration files driving the cache and decoder limits.

use recast_conformance::{encode, schema, Pipeline, PipelineError, USER_V1};
use recast_config::{load_config_from_str, CONFIG_FILE_NAME};
use recast_decoder::DecodeError;

#[test]
fn limits_from_file_apply_to_decoders() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[decoder]\nmax_bytes_len = 4\n",
    )
    .unwrap();
    let pipeline = Pipeline::from_dir(dir.path()).unwrap();

    let user = schema(USER_V1);
    let data = encode(|e| {
        e.write_string("Alice");
        e.write_int(30);
    });
    let err = pipeline.decode_all(&user, &user, &data).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Decode(DecodeError::LimitExceeded {
            what: "length",
            value: 5,
            limit: 4
        })
    ));

    let short = encode(|e| {
        e.write_string("Al");
        e.write_int(30);
    });
    assert_eq!(pipeline.decode_all(&user, &user, &short).unwrap().len(), 1);
}

#[test]
fn cache_settings_from_config() {
    let config = load_config_from_str("[cache]\ninitial_capacity = 8\nsize_warning_threshold = 2\n")
        .unwrap();
    let pipeline = Pipeline::new(&config);
    assert_eq!(pipeline.cache().settings().initial_capacity, 8);
    assert_eq!(pipeline.cache().settings().size_warning_threshold, Some(2));
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Pipeline::from_dir(dir.path()).is_err());
}

#[test]
fn depth_limit_from_config() {
    let config = load_config_from_str("[decoder]\nmax_depth = 4\n").unwrap();
    let pipeline = Pipeline::new(&config);
    let list = schema(
        r#"{"type":"record","name":"Cell","fields":[
            {"name":"value","type":"int"},
            {"name":"next","type":["null","Cell"]}
        ]}"#,
    );
    let data = encode(|e| {
        for i in 0..10 {
            e.write_int(i);
            e.write_index(if i < 9 { 1 } else { 0 });
        }
    });
    let err = pipeline.decode_all(&list, &list, &data).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Decode(DecodeError::LimitExceeded {
            what: "nesting depth",
            ..
        })
    ));
}
