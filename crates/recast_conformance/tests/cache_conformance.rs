//! Resolution cache behavior: memoization, concurrent publication, and key
//! discrimination.

use std::sync::Arc;

use rayon::prelude::*;
use recast_conformance::{
    encode, same_program, schema, CountingCompiler, Pipeline, USER_NAME_ONLY, USER_V1, USER_V2,
};
use recast_config::{CacheSettings, RecastConfig};
use recast_resolve::{ProgramCache, ProgramHandle};
use recast_schema::Schema;

fn counting_cache() -> ProgramCache<CountingCompiler> {
    ProgramCache::with_compiler(CountingCompiler::default(), CacheSettings::default())
}

#[test]
fn repeated_resolve_decodes_identically_without_recompiling() {
    let pipeline = Pipeline::with_compiler(&RecastConfig::default(), CountingCompiler::default());
    let writer = schema(USER_V1);
    let reader = schema(USER_V2);
    let data = encode(|e| {
        e.write_string("Dana");
        e.write_int(52);
        e.write_string("Eli");
        e.write_int(7);
    });

    let first = pipeline.decode_all(&writer, &reader, &data).unwrap();
    let second = pipeline.decode_all(&writer, &reader, &data).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(pipeline.cache().compiler().calls(), 1);
    assert_eq!(pipeline.cache().stats().hits, 1);
}

#[test]
fn separately_parsed_equal_schemas_hit_the_same_entry() {
    let cache = counting_cache();
    let a = cache.resolve(&schema(USER_V1), &schema(USER_V2)).unwrap();
    let b = cache.resolve(&schema(USER_V1), &schema(USER_V2)).unwrap();
    assert!(same_program(&a, &b));
    assert_eq!(cache.compiler().calls(), 1);
}

#[test]
fn concurrent_callers_observe_one_program() {
    const CALLERS: usize = 64;
    let cache = counting_cache();
    let writer = schema(USER_V1);
    let reader = schema(USER_V2);

    let handles: Vec<ProgramHandle> = (0..CALLERS)
        .into_par_iter()
        .map(|_| cache.resolve(&writer, &reader).unwrap())
        .collect();

    let published = cache.get(&writer, &reader).unwrap();
    assert!(handles.iter().all(|h| Arc::ptr_eq(h, &published)));
    assert_eq!(cache.len(), 1);

    let calls = cache.compiler().calls();
    assert!((1..=CALLERS).contains(&calls));
    let stats = cache.stats();
    assert_eq!(stats.compilations, calls as u64);
    assert_eq!(stats.discarded, calls as u64 - 1);
}

#[test]
fn concurrent_callers_on_many_pairs() {
    let cache = counting_cache();
    let schemas: Vec<Schema> = [USER_V1, USER_V2, USER_NAME_ONLY]
        .iter()
        .map(|s| schema(s))
        .collect();
    let pairs: Vec<(usize, usize)> = vec![(0, 1), (0, 2), (1, 2), (0, 0)];

    let resolved: Vec<(usize, ProgramHandle)> = (0..200)
        .into_par_iter()
        .map(|i| {
            let pair = i % pairs.len();
            let (w, r) = pairs[pair];
            (pair, cache.resolve(&schemas[w], &schemas[r]).unwrap())
        })
        .collect();

    assert_eq!(cache.len(), pairs.len());
    for (pair, handle) in &resolved {
        let (w, r) = pairs[*pair];
        let published = cache.get(&schemas[w], &schemas[r]).unwrap();
        assert!(Arc::ptr_eq(handle, &published));
    }
}

#[test]
fn different_writers_never_share_an_entry() {
    let cache = ProgramCache::new();
    let reader = schema(USER_NAME_ONLY);
    let from_v1 = cache.resolve(&schema(USER_V1), &reader).unwrap();
    let from_v2 = cache.resolve(&schema(USER_V2), &reader).unwrap();
    assert!(!same_program(&from_v1, &from_v2));
    assert_eq!(cache.len(), 2);
    assert_ne!(from_v1.writer(), from_v2.writer());
}

#[test]
fn swapped_pair_is_a_different_program() {
    let cache = ProgramCache::new();
    let v1 = schema(USER_V1);
    let v2 = schema(USER_V2);
    let forward = cache.resolve(&v1, &v2).unwrap();
    let backward = cache.resolve(&v2, &v1).unwrap();
    assert!(!same_program(&forward, &backward));
    assert_eq!(forward.writer(), backward.reader());
    assert_eq!(forward.reader(), backward.writer());
    assert_eq!(cache.len(), 2);
}

#[test]
fn failed_resolution_is_retried() {
    let cache = counting_cache();
    let writer = schema(USER_V2);
    let reader = schema(
        r#"{"type":"record","name":"User","namespace":"com.example","fields":[
            {"name":"name","type":"string"},
            {"name":"age","type":"int"}
        ]}"#,
    );
    assert!(cache.resolve(&writer, &reader).is_err());
    assert!(cache.resolve(&writer, &reader).is_err());
    assert!(cache.is_empty());
    assert_eq!(cache.compiler().calls(), 2);
}
