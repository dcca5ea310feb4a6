use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::i18n::{self, Language, Localized};

/// Lifecycle phases run from 1 (development) to 5 (deconstruction).
pub const MIN_PHASE: u8 = 1;
pub const MAX_PHASE: u8 = 5;

/// The five record collections of the catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Element,
    UseCase,
    Document,
    Model,
    Epd,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Element,
        RecordKind::UseCase,
        RecordKind::Document,
        RecordKind::Model,
        RecordKind::Epd,
    ];

    /// Singular route segment used for detail pages, e.g. `element/e1`.
    pub const fn route_prefix(self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::UseCase => "usecase",
            Self::Document => "document",
            Self::Model => "model",
            Self::Epd => "epd",
        }
    }

    /// Plural name shared by list routes, table names and data files.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Element => "elements",
            Self::UseCase => "usecases",
            Self::Document => "documents",
            Self::Model => "models",
            Self::Epd => "epds",
        }
    }

    /// Singular label shown next to a search hit.
    pub const fn type_label(self) -> &'static str {
        match self {
            Self::Element => "Element",
            Self::UseCase => "Anwendungsfall",
            Self::Document => "Dokument",
            Self::Model => "Fachmodell",
            Self::Epd => "EPD",
        }
    }

    /// Heading for a group of records of this kind.
    pub const fn group_label(self) -> &'static str {
        match self {
            Self::Element => "Elemente",
            Self::UseCase => "Anwendungsfälle",
            Self::Document => "Dokumente",
            Self::Model => "Fachmodelle",
            Self::Epd => "Ökobilanzdaten",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.collection())
    }

    /// Kind-specific columns kept for detail pages, with their labels.
    pub const fn detail_fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Element => &[
                ("related_classifications", "Klassifizierungen"),
                ("related_attributes", "Merkmale"),
                ("geometry", "Geometrie"),
            ],
            Self::UseCase => &[
                ("goals", "Ziele"),
                ("prerequisites", "Voraussetzungen"),
                ("implementation", "Umsetzung"),
                ("inputs", "Input"),
                ("outputs", "Output"),
                ("roles", "Rollen"),
                ("quality_criteria", "Qualitätskriterien"),
                ("process_url", "Prozess"),
                ("related_elements", "Verknüpfte Elemente"),
                ("related_documents", "Verknüpfte Dokumente"),
            ],
            Self::Document => &[
                ("formats", "Formate"),
                ("retention", "Aufbewahrung"),
                ("related_classifications", "Klassifizierungen"),
            ],
            Self::Model => &[
                ("related_elements", "Elemente"),
                ("related_classifications", "Klassifizierungen"),
            ],
            Self::Epd => &[
                ("unit", "Bezugseinheit"),
                ("gwp", "Treibhauspotenzial (GWP)"),
                ("ubp", "Umweltbelastungspunkte (UBP)"),
                ("penrt", "Primärenergie nicht erneuerbar (PENRT)"),
                ("pert", "Primärenergie erneuerbar (PERT)"),
                ("density", "Rohdichte"),
                ("biogenic_carbon", "Biogener Kohlenstoff"),
            ],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route_prefix())
    }
}

/// One catalog entry with every localized field already resolved.
///
/// Records are immutable once loaded. `category` is the single canonical
/// label used by filtering, search and facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub kind: RecordKind,
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `None` when the row has no tag collection at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// `None` when the row has no phase collection at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_change: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Columns listed in [`RecordKind::detail_fields`], translations
    /// already resolved.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Record {
    /// Minimal constructor; optional fields start empty.
    pub fn new(
        kind: RecordKind,
        id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            title: title.into(),
            category: category.into(),
            description: None,
            tags: None,
            phases: None,
            last_change: None,
            code: None,
            version: None,
            details: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_phases(mut self, phases: impl IntoIterator<Item = u8>) -> Self {
        self.phases = Some(phases.into_iter().collect());
        self
    }

    pub fn with_last_change(mut self, date: impl Into<String>) -> Self {
        self.last_change = Some(date.into());
        self
    }

    pub fn with_detail(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Kind-specific values in display order as `(column, label, value)`.
    pub fn detail_entries(
        &self,
    ) -> impl Iterator<Item = (&'static str, &'static str, &Value)> {
        self.kind.detail_fields().iter().filter_map(|&(key, label)| {
            Some((key, label, self.details.get(key)?))
        })
    }

    /// Tag labels, or an empty slice when the record has none.
    pub fn tag_slice(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn phase_slice(&self) -> &[u8] {
        self.phases.as_deref().unwrap_or_default()
    }

    /// Detail-page fragment for this record.
    pub fn fragment(&self) -> String {
        format!("{}/{}", self.kind.route_prefix(), self.id)
    }
}

/// A row as stored in the JSON files or returned by the REST API.
///
/// Tables written during the schema migration can carry current columns
/// (`name`, `domain`, `related_tags`, `last_change`) next to legacy ones
/// (`title`, `category`, `tags`, `lastChange`), so both are read and the
/// current column wins when it has a value.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub name: Option<Localized>,
    pub title: Option<Localized>,
    pub domain: Option<Localized>,
    pub category: Option<Localized>,
    pub description: Option<Localized>,
    pub related_tags: Option<Vec<Localized>>,
    pub tags: Option<Vec<Localized>>,
    pub phases: Option<Vec<i64>>,
    pub last_change: Option<String>,
    #[serde(rename = "lastChange")]
    pub last_change_legacy: Option<String>,
    pub code: Option<String>,
    pub version: Option<String>,
    /// Everything else; kind-specific columns are picked from here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawRecord {
    /// Resolve localized fields and normalize the row into a [`Record`].
    ///
    /// Phase values outside `1..=5` are dropped. Empty descriptions and
    /// dates become `None`.
    pub fn into_record(self, kind: RecordKind, lang: Language) -> Record {
        let RawRecord {
            id,
            name,
            title,
            domain,
            category,
            description,
            related_tags,
            tags,
            phases,
            last_change,
            last_change_legacy,
            code,
            version,
            mut extra,
        } = self;

        let description = i18n::resolve_opt(description.as_ref(), lang);
        let phases = phases.map(|phases| {
            phases
                .into_iter()
                .filter_map(|p| u8::try_from(p).ok())
                .filter(|p| (MIN_PHASE..=MAX_PHASE).contains(p))
                .collect()
        });
        let details = kind
            .detail_fields()
            .iter()
            .filter_map(|&(key, _)| {
                let value = extra.remove(key).filter(|v| !v.is_null())?;
                Some((key.to_string(), i18n::localize_value(value, lang)))
            })
            .collect();

        Record {
            kind,
            id,
            title: current_or_legacy(name.as_ref(), title.as_ref(), lang),
            category: current_or_legacy(domain.as_ref(), category.as_ref(), lang),
            description: (!description.is_empty()).then_some(description),
            tags: related_tags
                .or(tags)
                .map(|tags| i18n::resolve_tags(&tags, lang)),
            phases,
            last_change: [last_change, last_change_legacy]
                .into_iter()
                .flatten()
                .find(|d| !d.trim().is_empty()),
            code,
            version,
            details,
        }
    }
}

fn current_or_legacy(
    current: Option<&Localized>,
    legacy: Option<&Localized>,
    lang: Language,
) -> String {
    let resolved = i18n::resolve_opt(current, lang);
    if resolved.is_empty() {
        i18n::resolve_opt(legacy, lang)
    } else {
        resolved
    }
}

/// Convert one collection row by row. Rows that do not deserialize are
/// logged and skipped so they cannot take their neighbours down with them.
pub fn records_from_rows(
    kind: RecordKind,
    rows: Vec<Value>,
    lang: Language,
) -> Vec<Record> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            match serde_json::from_value::<RawRecord>(row) {
                Ok(raw) => Some(raw.into_record(kind, lang)),
                Err(e) => {
                    tracing::warn!(
                        collection = kind.collection(),
                        row = index,
                        error = %e,
                        "skipping malformed row"
                    );
                    None
                }
            }
        })
        .collect()
}
