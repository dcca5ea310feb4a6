use std::time::Duration;

use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    error::{Error, Result},
    i18n::Language,
    provider::{Catalog, CatalogSource, RemoteCatalog},
    record::{RecordKind, records_from_rows},
};

/// Key shipped in unconfigured deployments; treated as no key at all.
pub const PLACEHOLDER_KEY: &str = "YOUR_SUPABASE_ANON_KEY";

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Connection settings for the hosted REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl RemoteConfig {
    /// `None` unless both a base URL and a real key are present.
    pub fn new(base_url: &str, api_key: &str, timeout_ms: u64) -> Option<Self> {
        let base_url = normalize_base_url(base_url);
        let api_key = api_key.trim();
        if base_url.is_empty() || api_key.is_empty() || api_key == PLACEHOLDER_KEY
        {
            return None;
        }

        Some(Self {
            base_url,
            api_key: api_key.to_string(),
            timeout_ms,
        })
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Fetches the five collections from the REST API.
#[derive(Clone)]
pub struct RemoteSource {
    config: RemoteConfig,
    http: Client,
}

impl std::fmt::Debug for RemoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSource")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl RemoteSource {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key).map_err(|e| {
            Error::Config(format!("invalid FACHKATALOG_API_KEY: {e}"))
        })?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| {
                Error::Config(format!("invalid FACHKATALOG_API_KEY: {e}"))
            })?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn table_url(&self, kind: RecordKind) -> String {
        format!(
            "{}/rest/v1/{}?select=*&order=id",
            self.config.base_url,
            kind.collection()
        )
    }

    async fn fetch_table(
        &self,
        kind: RecordKind,
    ) -> Result<Vec<serde_json::Value>> {
        let url = self.table_url(kind);
        tracing::debug!(%url, "fetching table");
        let rows = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<serde_json::Value>>()
            .await?;
        tracing::debug!(table = kind.collection(), rows = rows.len(), "fetched");
        Ok(rows)
    }

    /// Fetch every table concurrently. One failing table fails the load.
    pub async fn fetch_all(&self, lang: Language) -> Result<Catalog> {
        let (elements, usecases, documents, models, epds) = tokio::try_join!(
            self.fetch_table(RecordKind::Element),
            self.fetch_table(RecordKind::UseCase),
            self.fetch_table(RecordKind::Document),
            self.fetch_table(RecordKind::Model),
            self.fetch_table(RecordKind::Epd),
        )?;

        let tables = [
            (RecordKind::Element, elements),
            (RecordKind::UseCase, usecases),
            (RecordKind::Document, documents),
            (RecordKind::Model, models),
            (RecordKind::Epd, epds),
        ];
        Ok(tables
            .into_iter()
            .fold(Catalog::builder(), |builder, (kind, rows)| {
                builder.with(kind, records_from_rows(kind, rows, lang))
            })
            .source(CatalogSource::Remote)
            .build())
    }

    /// Blocking wrapper around [`RemoteSource::fetch_all`].
    pub fn load(&self, lang: Language) -> Result<Catalog> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Config(format!("failed to start tokio runtime: {e}"))
            })?;

        runtime.block_on(self.fetch_all(lang))
    }
}

impl RemoteCatalog for RemoteSource {
    fn load(&self, lang: Language) -> Result<Catalog> {
        RemoteSource::load(self, lang)
    }
}
