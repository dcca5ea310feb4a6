//! Record filtering, sorting and facet extraction.
//!
//! Every filter takes any iterator of record references and returns the
//! surviving references in their original order, so filters compose by
//! plain function application:
//!
//! ```
//! use fachkatalog::filter::{filter_by_category, filter_by_phases, filter_by_tags};
//! use fachkatalog::record::{Record, RecordKind};
//!
//! let records = vec![
//!     Record::new(RecordKind::UseCase, "uc1", "Koordination", "Planung")
//!         .with_tags(["BIM"])
//!         .with_phases([2, 3]),
//!     Record::new(RecordKind::UseCase, "uc2", "Betrieb", "Betrieb")
//!         .with_tags(["FM"])
//!         .with_phases([4]),
//! ];
//!
//! let hits = filter_by_phases(
//!     filter_by_tags(filter_by_category(&records, "Planung"), &["BIM".into()]),
//!     &[3],
//! );
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].id, "uc1");
//! ```

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{record::Record, url_state::RouteState};

/// Keep records whose category equals `category` exactly. An empty
/// category keeps everything.
pub fn filter_by_category<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    category: &str,
) -> Vec<&'a Record> {
    records
        .into_iter()
        .filter(|r| category.is_empty() || r.category == category)
        .collect()
}

/// Keep records carrying every active tag. Records without a tag
/// collection are dropped as soon as any tag is active.
pub fn filter_by_tags<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    active: &[String],
) -> Vec<&'a Record> {
    records
        .into_iter()
        .filter(|r| {
            if active.is_empty() {
                return true;
            }
            let Some(tags) = r.tags.as_deref() else {
                return false;
            };
            active.iter().all(|tag| tags.contains(tag))
        })
        .collect()
}

/// Keep records carrying at least one active phase. Records without a
/// phase collection are dropped as soon as any phase is active.
pub fn filter_by_phases<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    active: &[u8],
) -> Vec<&'a Record> {
    records
        .into_iter()
        .filter(|r| {
            if active.is_empty() {
                return true;
            }
            let Some(phases) = r.phases.as_deref() else {
                return false;
            };
            active.iter().any(|phase| phases.contains(phase))
        })
        .collect()
}

/// Case-insensitive quick filter over title, category and description.
/// Unlike the global search there is no minimum query length.
pub fn filter_by_text<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    query: &str,
) -> Vec<&'a Record> {
    let needle = query.trim().to_lowercase();
    records
        .into_iter()
        .filter(|r| needle.is_empty() || matches_text(r, &needle))
        .collect()
}

/// `true` if the lowercased `needle` occurs in the record's title, category
/// or description.
pub fn matches_text(record: &Record, needle: &str) -> bool {
    [
        Some(record.title.as_str()),
        Some(record.category.as_str()),
        record.description.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

/// The three filter dimensions of a catalog page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub category: String,
    pub tags: Vec<String>,
    pub phases: Vec<u8>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.category.is_empty() && self.tags.is_empty() && self.phases.is_empty()
    }

    /// Conjunction of the three dimensions.
    pub fn apply<'a>(
        &self,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> Vec<&'a Record> {
        let by_category = filter_by_category(records, &self.category);
        let by_tags = filter_by_tags(by_category, &self.tags);
        filter_by_phases(by_tags, &self.phases)
    }
}

impl From<&RouteState> for FilterSet {
    fn from(state: &RouteState) -> Self {
        Self {
            category: state.category.clone(),
            tags: state.tags.clone(),
            phases: state.phases.clone(),
        }
    }
}

/// Sort key approximating German collation: accents folded, case ignored.
pub fn collation_key(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compare two titles by collation key, then by lowercased text, so that
/// `Apfel` sorts before `Äpfel` and both before `Birne`.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
}

/// Stable alphabetical sort by title. Titles that compare equal keep their
/// original order.
pub fn sort_by_title<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> Vec<&'a Record> {
    let mut keyed: Vec<(String, String, &Record)> = records
        .into_iter()
        .map(|r| (collation_key(&r.title), r.title.to_lowercase(), r))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, _, r)| r).collect()
}

/// Distinct non-empty categories, sorted.
pub fn unique_categories<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> Vec<String> {
    records
        .into_iter()
        .filter(|r| !r.category.is_empty())
        .map(|r| r.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct tags, sorted.
pub fn unique_tags<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> Vec<String> {
    records
        .into_iter()
        .flat_map(|r| r.tag_slice().iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of records per category.
pub fn category_counts<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        if !record.category.is_empty() {
            *counts.entry(record.category.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Number of records carrying each tag. A tag listed twice on one record
/// counts once.
pub fn tag_counts<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let distinct: BTreeSet<&String> = record.tag_slice().iter().collect();
        for tag in distinct {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    counts
}
