//! Conformance test helpers for recast.
//!
//! Provides a [`Pipeline`] that wires a configuration, a program cache, and
//! decoders together the way an application would, plus small builders for
//! schemas and encoded bytes used across the integration tests.

#![warn(missing_docs)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use recast_codec::{BinaryEncoder, BufferSource};
use recast_config::{load_config, ConfigError, DecoderLimits, RecastConfig};
use recast_decoder::{read_datum, DecodeError, Decoder, Value};
use recast_resolve::{
    ProgramCache, ProgramCompiler, ProgramHandle, Program, ResolveError, ResolvingCompiler,
};
use recast_schema::Schema;

/// A cache and decoder limits taken from one configuration.
pub struct Pipeline<C = ResolvingCompiler> {
    cache: ProgramCache<C>,
    limits: DecoderLimits,
}

impl Pipeline<ResolvingCompiler> {
    /// Builds a pipeline from a parsed configuration.
    pub fn new(config: &RecastConfig) -> Self {
        Self::with_compiler(config, ResolvingCompiler)
    }

    /// Loads `recast.toml` from `dir` and builds a pipeline from it.
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self::new(&load_config(dir)?))
    }
}

impl<C: ProgramCompiler> Pipeline<C> {
    /// Builds a pipeline whose cache compiles with `compiler`.
    pub fn with_compiler(config: &RecastConfig, compiler: C) -> Self {
        Self {
            cache: ProgramCache::with_compiler(compiler, config.cache.clone()),
            limits: config.decoder,
        }
    }

    /// Returns the program cache.
    pub fn cache(&self) -> &ProgramCache<C> {
        &self.cache
    }

    /// Resolves the pair and opens a decoder over `data`.
    pub fn decoder<'a>(
        &self,
        writer: &Schema,
        reader: &Schema,
        data: &'a [u8],
    ) -> Result<Decoder<BufferSource<&'a [u8]>>, ResolveError> {
        let program = self.cache.resolve(writer, reader)?;
        Ok(Decoder::with_limits(
            program,
            BufferSource::new(data),
            self.limits,
        ))
    }

    /// Decodes every datum in `data`, written with `writer`, as `reader`.
    pub fn decode_all(
        &self,
        writer: &Schema,
        reader: &Schema,
        data: &[u8],
    ) -> Result<Vec<Value>, PipelineError> {
        let mut decoder = self.decoder(writer, reader, data)?;
        decode_stream(&mut decoder).map_err(PipelineError::Decode)
    }
}

/// Either stage of a [`Pipeline`] failing.
#[derive(Debug)]
pub enum PipelineError {
    /// The schemas do not resolve.
    Resolve(ResolveError),
    /// The data does not decode.
    Decode(DecodeError),
}

impl From<ResolveError> for PipelineError {
    fn from(err: ResolveError) -> Self {
        PipelineError::Resolve(err)
    }
}

/// Reads data until the source is exhausted.
pub fn decode_stream(
    decoder: &mut Decoder<BufferSource<&[u8]>>,
) -> Result<Vec<Value>, DecodeError> {
    let mut values = Vec::new();
    while !decoder.source().is_exhausted() {
        values.push(read_datum(decoder)?);
    }
    Ok(values)
}

/// Parses a schema, panicking on invalid JSON.
pub fn schema(json: &str) -> Schema {
    Schema::parse_str(json).unwrap_or_else(|e| panic!("invalid test schema: {e}\n{json}"))
}

/// Encodes bytes with a [`BinaryEncoder`].
pub fn encode(write: impl FnOnce(&mut BinaryEncoder)) -> Vec<u8> {
    let mut enc = BinaryEncoder::new();
    write(&mut enc);
    enc.into_bytes()
}

/// Wraps the standard compiler and counts how often it runs.
#[derive(Debug, Default)]
pub struct CountingCompiler {
    calls: AtomicUsize,
}

impl CountingCompiler {
    /// Returns the number of compilations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProgramCompiler for CountingCompiler {
    fn compile(&self, writer: &Schema, reader: &Schema) -> Result<Program, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ResolvingCompiler.compile(writer, reader)
    }
}

/// Returns `true` if two handles are the same published program.
pub fn same_program(a: &ProgramHandle, b: &ProgramHandle) -> bool {
    std::sync::Arc::ptr_eq(a, b)
}

/// `{name: string, age: int}`.
pub const USER_V1: &str = r#"{"type":"record","name":"User","namespace":"com.example","fields":[
    {"name":"name","type":"string"},
    {"name":"age","type":"int"}
]}"#;

/// `{name: string}`, the reader that drops `age`.
pub const USER_NAME_ONLY: &str = r#"{"type":"record","name":"User","namespace":"com.example","fields":[
    {"name":"name","type":"string"}
]}"#;

/// `{name: string, age: long, email: string|null = null}`.
pub const USER_V2: &str = r#"{"type":"record","name":"User","namespace":"com.example","fields":[
    {"name":"name","type":"string"},
    {"name":"age","type":"long"},
    {"name":"email","type":["null","string"],"default":null}
]}"#;
