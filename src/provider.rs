//! Access to the five record collections.
//!
//! A [`Catalog`] is an immutable snapshot. The [`Loader`] produces one from
//! the remote API, a still-valid [`DataCache`] entry, or the static JSON
//! files in the data directory, in that order of preference.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use serde::Serialize;

use crate::{
    data_dir::DataDir,
    error::Result,
    i18n::Language,
    record::{self, Record, RecordKind},
};

/// Read-only view over the loaded collections.
pub trait DataProvider {
    fn elements(&self) -> &[Record];
    fn usecases(&self) -> &[Record];
    fn documents(&self) -> &[Record];
    fn models(&self) -> &[Record];
    fn epds(&self) -> &[Record];

    fn records(&self, kind: RecordKind) -> &[Record] {
        match kind {
            RecordKind::Element => self.elements(),
            RecordKind::UseCase => self.usecases(),
            RecordKind::Document => self.documents(),
            RecordKind::Model => self.models(),
            RecordKind::Epd => self.epds(),
        }
    }

    /// Look a record up by id within one collection.
    fn find(&self, kind: RecordKind, id: &str) -> Option<&Record> {
        self.records(kind).iter().find(|r| r.id == id)
    }
}

/// Where a [`Catalog`] snapshot came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    #[default]
    Memory,
    Remote,
    Static,
    Cache,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Remote => "remote",
            Self::Static => "static",
            Self::Cache => "cache",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    elements: Vec<Record>,
    usecases: Vec<Record>,
    documents: Vec<Record>,
    models: Vec<Record>,
    epds: Vec<Record>,
    source: CatalogSource,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn source(&self) -> CatalogSource {
        self.source
    }

    /// Total number of records across all collections.
    pub fn len(&self) -> usize {
        RecordKind::ALL
            .iter()
            .map(|&kind| self.records(kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_mut(&mut self, kind: RecordKind) -> &mut Vec<Record> {
        match kind {
            RecordKind::Element => &mut self.elements,
            RecordKind::UseCase => &mut self.usecases,
            RecordKind::Document => &mut self.documents,
            RecordKind::Model => &mut self.models,
            RecordKind::Epd => &mut self.epds,
        }
    }
}

impl DataProvider for Catalog {
    fn elements(&self) -> &[Record] {
        &self.elements
    }

    fn usecases(&self) -> &[Record] {
        &self.usecases
    }

    fn documents(&self) -> &[Record] {
        &self.documents
    }

    fn models(&self) -> &[Record] {
        &self.models
    }

    fn epds(&self) -> &[Record] {
        &self.epds
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    /// Set the collection for `kind`, replacing anything set before.
    pub fn with(mut self, kind: RecordKind, records: Vec<Record>) -> Self {
        *self.catalog.slot_mut(kind) = records;
        self
    }

    pub fn source(mut self, source: CatalogSource) -> Self {
        self.catalog.source = source;
        self
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }
}

/// A source that can produce a whole catalog at once, such as the REST API.
pub trait RemoteCatalog: fmt::Debug {
    fn load(&self, lang: Language) -> Result<Catalog>;
}

/// Time-bounded copy of the last successful remote load.
#[derive(Debug, Clone)]
pub struct DataCache {
    entries: Option<Catalog>,
    fetched_at: Option<Instant>,
    ttl: Duration,
    enabled: bool,
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL, true)
    }
}

impl DataCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: None,
            fetched_at: None,
            ttl,
            enabled,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True when enabled, filled, and younger than the TTL at `now`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        self.enabled
            && self.entries.is_some()
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < self.ttl)
    }

    pub fn get_at(&self, now: Instant) -> Option<&Catalog> {
        if self.is_valid_at(now) {
            self.entries.as_ref()
        } else {
            None
        }
    }

    /// Remember `catalog` as fetched at `now`. No-op when disabled.
    pub fn store(&mut self, catalog: Catalog, now: Instant) {
        if !self.enabled {
            return;
        }
        self.entries = Some(catalog);
        self.fetched_at = Some(now);
    }

    pub fn clear(&mut self) {
        self.entries = None;
        self.fetched_at = None;
    }
}

/// JSON files named after each collection, e.g. `<dir>/usecases.json`.
#[derive(Debug, Clone)]
pub struct StaticSource {
    dir: DataDir,
}

impl StaticSource {
    pub fn new(dir: DataDir) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        self.dir.root()
    }

    pub fn path(&self, kind: RecordKind) -> PathBuf {
        self.dir.collection_file(kind)
    }

    /// Read one collection. Fails only when the file is unreadable or not
    /// a JSON array; bad rows inside it are skipped.
    pub fn read_collection(
        &self,
        kind: RecordKind,
        lang: Language,
    ) -> Result<Vec<Record>> {
        let content = std::fs::read_to_string(self.path(kind))?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&content)?;
        Ok(record::records_from_rows(kind, rows, lang))
    }

    /// Read every collection. Missing or malformed files become empty
    /// collections and are logged.
    pub fn load(&self, lang: Language) -> Catalog {
        let mut builder = Catalog::builder().source(CatalogSource::Static);
        for kind in RecordKind::ALL {
            let records = match self.read_collection(kind, lang) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path(kind).display(),
                        error = %e,
                        "could not read collection, using an empty list"
                    );
                    Vec::new()
                }
            };
            builder = builder.with(kind, records);
        }
        builder.build()
    }
}

/// Produces catalog snapshots: cache, then remote, then static files.
#[derive(Debug)]
pub struct Loader {
    remote: Option<Box<dyn RemoteCatalog>>,
    fallback: StaticSource,
    cache: DataCache,
    lang: Language,
}

impl Loader {
    pub fn new(fallback: StaticSource, lang: Language) -> Self {
        Self {
            remote: None,
            fallback,
            cache: DataCache::default(),
            lang,
        }
    }

    pub fn with_remote<R>(mut self, remote: Option<R>) -> Self
    where
        R: RemoteCatalog + 'static,
    {
        self.remote = remote.map(|r| Box::new(r) as Box<dyn RemoteCatalog>);
        self
    }

    pub fn with_cache(mut self, cache: DataCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn load(&mut self) -> Catalog {
        self.load_at(Instant::now())
    }

    /// Load as of `now`. Never fails: the static files are the last resort
    /// and an unreadable file only empties its own collection.
    pub fn load_at(&mut self, now: Instant) -> Catalog {
        if let Some(cached) = self.cache.get_at(now) {
            tracing::debug!(records = cached.len(), "using cached catalog");
            let mut catalog = cached.clone();
            catalog.source = CatalogSource::Cache;
            return catalog;
        }

        if let Some(remote) = &self.remote {
            match remote.load(self.lang) {
                Ok(catalog) => {
                    tracing::info!(records = catalog.len(), "loaded remote catalog");
                    self.cache.store(catalog.clone(), now);
                    return catalog;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "remote load failed, falling back to static files"
                    );
                }
            }
        }

        let catalog = self.fallback.load(self.lang);
        tracing::info!(
            dir = %self.fallback.dir().display(),
            records = catalog.len(),
            "loaded static catalog"
        );
        catalog
    }
}
