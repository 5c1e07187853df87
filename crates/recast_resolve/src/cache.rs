//! Process-wide memoization of resolution programs.
//!
//! The cache maps each [`SchemaPair`] to the one program published for it.
//! Lookups of an already-published pair never block on compilation: the map
//! is sharded, and compilation runs outside any shard lock. When several
//! threads miss on the same pair at once, each compiles, the first to insert
//! wins, and the rest adopt the winner's handle and drop their own program.
//! Failed compilations are not stored.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use recast_config::CacheSettings;
use recast_schema::Schema;
use tracing::{debug, trace, warn};

use crate::compiler::{ProgramCompiler, ResolvingCompiler};
use crate::error::ResolveError;
use crate::pair::SchemaPair;
use crate::program::ProgramHandle;

/// Counters describing cache activity since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the map.
    pub hits: u64,
    /// Lookups that found no published program.
    pub misses: u64,
    /// Successful compilations, including ones that lost a publish race.
    pub compilations: u64,
    /// Compiled programs dropped because another thread published first.
    pub discarded: u64,
    /// Compilations that failed.
    pub failures: u64,
}

/// A thread-safe memo from schema pairs to compiled programs.
///
/// Entries are never evicted: the set of schemas a process sees is assumed
/// to be small and long-lived. A warning is logged once when the entry count
/// crosses [`CacheSettings::size_warning_threshold`].
pub struct ProgramCache<C = ResolvingCompiler> {
    programs: DashMap<SchemaPair, ProgramHandle>,
    compiler: C,
    settings: CacheSettings,
    hits: AtomicU64,
    misses: AtomicU64,
    compilations: AtomicU64,
    discarded: AtomicU64,
    failures: AtomicU64,
    size_warned: AtomicBool,
}

impl ProgramCache<ResolvingCompiler> {
    /// Creates an empty cache with default settings and the standard compiler.
    pub fn new() -> Self {
        Self::with_settings(CacheSettings::default())
    }

    /// Creates an empty cache with the standard compiler.
    pub fn with_settings(settings: CacheSettings) -> Self {
        Self::with_compiler(ResolvingCompiler, settings)
    }
}

impl Default for ProgramCache<ResolvingCompiler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ProgramCompiler> ProgramCache<C> {
    /// Creates an empty cache that compiles with `compiler`.
    pub fn with_compiler(compiler: C, settings: CacheSettings) -> Self {
        Self {
            programs: DashMap::with_capacity(settings.initial_capacity),
            compiler,
            settings,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            compilations: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            size_warned: AtomicBool::new(false),
        }
    }

    /// Returns the program resolving `writer` into `reader`, compiling and
    /// publishing it on first use.
    ///
    /// Every call for equal pairs returns the same handle once one has been
    /// published, no matter which thread compiled it.
    pub fn resolve(&self, writer: &Schema, reader: &Schema) -> Result<ProgramHandle, ResolveError> {
        let key = SchemaPair::new(writer.clone(), reader.clone());
        if let Some(program) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(pair = %key, "resolution cache hit");
            return Ok(program);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(pair = %key, "resolution cache miss, compiling");

        let compiled = match self.compiler.compile(writer, reader) {
            Ok(program) => Arc::new(program),
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                debug!(pair = %key, error = %err, "schema resolution failed");
                return Err(err);
            }
        };
        self.compilations.fetch_add(1, Ordering::Relaxed);

        let published = {
            let entry = self
                .programs
                .entry(key)
                .or_insert_with(|| Arc::clone(&compiled));
            Arc::clone(entry.value())
        };
        if Arc::ptr_eq(&published, &compiled) {
            debug!(nodes = compiled.node_count(), "published resolution program");
            self.check_size();
        } else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            debug!("another thread published first, discarding compiled program");
        }
        Ok(published)
    }

    /// Returns the published program for a pair without compiling.
    pub fn get(&self, writer: &Schema, reader: &Schema) -> Option<ProgramHandle> {
        self.lookup(&SchemaPair::new(writer.clone(), reader.clone()))
    }

    /// Returns the number of published programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Returns `true` if nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Returns a snapshot of the activity counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            compilations: self.compilations.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Returns the settings the cache was created with.
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Returns the compiler.
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    // The shard read guard must be released before any entry() call on the
    // same key, so the handle is cloned out here.
    fn lookup(&self, key: &SchemaPair) -> Option<ProgramHandle> {
        self.programs.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn check_size(&self) {
        let Some(threshold) = self.settings.size_warning_threshold else {
            return;
        };
        let len = self.programs.len();
        if len >= threshold && !self.size_warned.swap(true, Ordering::Relaxed) {
            warn!(
                entries = len,
                threshold, "resolution cache is large; entries are never evicted"
            );
        }
    }
}
