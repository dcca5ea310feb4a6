use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::{
    filter::{compare_titles, matches_text},
    provider::DataProvider,
    record::{Record, RecordKind},
};

/// Queries shorter than this (in characters, after trimming) match nothing.
pub const MIN_QUERY_CHARS: usize = 2;

/// Maximum hits per group in the global search preview.
pub const PREVIEW_LIMIT: usize = 3;

/// Order in which record groups are searched and presented.
pub const SEARCH_ORDER: [RecordKind; 5] = [
    RecordKind::UseCase,
    RecordKind::Element,
    RecordKind::Model,
    RecordKind::Document,
    RecordKind::Epd,
];

/// Trim and lowercase `query`; `None` if it is below the minimum length.
pub fn normalize_query(query: &str) -> Option<String> {
    let term = query.trim().to_lowercase();
    (term.chars().count() >= MIN_QUERY_CHARS).then_some(term)
}

/// Preview hits for one record kind.
#[derive(Debug, Clone, Serialize)]
pub struct SearchGroup<'a> {
    pub kind: RecordKind,
    pub label: &'static str,
    pub items: Vec<&'a Record>,
}

/// Search-as-you-type preview: at most [`PREVIEW_LIMIT`] hits per kind, in
/// collection order.
///
/// Always returns one group per kind in [`SEARCH_ORDER`]; groups are empty
/// when the query is too short.
pub fn global_search<'a, P>(provider: &'a P, query: &str) -> Vec<SearchGroup<'a>>
where
    P: DataProvider + ?Sized,
{
    let term = normalize_query(query);

    SEARCH_ORDER
        .iter()
        .map(|&kind| {
            let items = match &term {
                Some(term) => provider
                    .records(kind)
                    .iter()
                    .filter(|r| matches_text(r, term))
                    .take(PREVIEW_LIMIT)
                    .collect(),
                None => Vec::new(),
            };
            SearchGroup {
                kind,
                label: kind.group_label(),
                items,
            }
        })
        .collect()
}

/// Ordering of the full search result list.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SearchSort {
    /// Exact title, title prefix, title substring, other field.
    Relevance,
    /// Newest first; undated hits last.
    #[default]
    DateDesc,
    /// Oldest first; undated hits last.
    DateAsc,
}

impl SearchSort {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::DateDesc => "date-desc",
            Self::DateAsc => "date-asc",
        }
    }
}

/// One entry of the full search result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Human-readable kind, e.g. `Anwendungsfall`.
    pub type_label: &'static str,
    /// Detail-route prefix, e.g. `usecase`.
    pub category: &'static str,
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: Option<String>,
    /// 0 exact title, 1 title prefix, 2 title substring, 3 other field.
    pub relevance: u8,
}

impl SearchHit {
    pub fn fragment(&self) -> String {
        format!("{}/{}", self.category, self.id)
    }
}

/// Full search across every kind with no per-kind cap.
///
/// Hits are ordered by relevance, then title. Date sorts are applied on
/// top of that order and put undated hits last in both directions.
pub fn full_search<P>(provider: &P, query: &str, sort: SearchSort) -> Vec<SearchHit>
where
    P: DataProvider + ?Sized,
{
    let Some(term) = normalize_query(query) else {
        return Vec::new();
    };

    let mut hits: Vec<SearchHit> = SEARCH_ORDER
        .iter()
        .flat_map(|&kind| provider.records(kind).iter())
        .filter(|r| matches_text(r, &term))
        .map(|r| SearchHit {
            type_label: r.kind.type_label(),
            category: r.kind.route_prefix(),
            id: r.id.clone(),
            title: r.title.clone(),
            description: r.description.clone().unwrap_or_default(),
            date: r.last_change.clone(),
            relevance: relevance(&r.title.to_lowercase(), &term),
        })
        .collect();

    hits.sort_by(|a, b| {
        a.relevance
            .cmp(&b.relevance)
            .then_with(|| compare_titles(&a.title, &b.title))
    });

    match sort {
        SearchSort::Relevance => {}
        SearchSort::DateDesc => sort_by_date(&mut hits, true),
        SearchSort::DateAsc => sort_by_date(&mut hits, false),
    }

    hits
}

fn relevance(title: &str, term: &str) -> u8 {
    if title == term {
        0
    } else if title.starts_with(term) {
        1
    } else if title.contains(term) {
        2
    } else {
        3
    }
}

/// Stable date sort with missing (or unparseable) dates last.
fn sort_by_date(hits: &mut [SearchHit], descending: bool) {
    hits.sort_by(|a, b| {
        let a = a.date.as_deref().and_then(parse_date);
        let b = b.date.as_deref().and_then(parse_date);
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) if descending => b.cmp(&a),
            (Some(a), Some(b)) => a.cmp(&b),
        }
    });
}

/// Parse `YYYY-MM-DD`, RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` stamp.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()
}
