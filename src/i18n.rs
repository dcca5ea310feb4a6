//! Localized catalog text.
//!
//! Catalog rows carry user-facing text either as a plain string (legacy rows)
//! or as an object keyed by language code, e.g.
//! `{"de": "Wand", "fr": "Mur", "it": "Parete", "en": "Wall"}`.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Display language for resolved labels.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    Fr,
    It,
    En,
}

impl Language {
    /// Resolution order used when the selected language has no text.
    pub const ALL: [Language; 4] =
        [Language::De, Language::Fr, Language::It, Language::En];

    pub const fn code(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::Fr => "fr",
            Self::It => "it",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Self::De),
            "fr" => Ok(Self::Fr),
            "it" => Ok(Self::It),
            "en" => Ok(Self::En),
            other => Err(Error::Config(format!("unsupported language: {other}"))),
        }
    }
}

/// A text value that is either plain or translated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Localized {
    Plain(String),
    Translated(BTreeMap<String, String>),
}

impl Localized {
    /// Resolve to a single string.
    ///
    /// Tries `lang`, then German, then the first non-empty translation in
    /// [`Language::ALL`] order. Returns an empty string when nothing matches.
    pub fn resolve(&self, lang: Language) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Translated(map) => {
                let lookup = |l: Language| {
                    map.get(l.code()).filter(|text| !text.is_empty())
                };
                lookup(lang)
                    .or_else(|| lookup(Language::De))
                    .or_else(|| Language::ALL.into_iter().find_map(lookup))
                    .cloned()
                    .unwrap_or_default()
            }
        }
    }
}

impl From<&str> for Localized {
    fn from(text: &str) -> Self {
        Self::Plain(text.to_string())
    }
}

/// Resolve an optional value, mapping `None` to an empty string.
pub fn resolve_opt(value: Option<&Localized>, lang: Language) -> String {
    value.map(|v| v.resolve(lang)).unwrap_or_default()
}

/// Resolve a list of tag values, dropping entries that resolve to nothing.
pub fn resolve_tags(tags: &[Localized], lang: Language) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.resolve(lang))
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Resolve translated objects anywhere inside a JSON value.
///
/// An object is treated as a translation when it is non-empty and every key
/// is a language code holding a string (or null).
pub fn localize_value(value: Value, lang: Language) -> Value {
    match value {
        Value::Object(map) if is_translation(&map) => {
            let translations = map
                .into_iter()
                .filter_map(|(code, text)| match text {
                    Value::String(text) => Some((code, text)),
                    _ => None,
                })
                .collect();
            Value::String(Localized::Translated(translations).resolve(lang))
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, localize_value(value, lang)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|value| localize_value(value, lang))
                .collect(),
        ),
        other => other,
    }
}

fn is_translation(map: &Map<String, Value>) -> bool {
    !map.is_empty()
        && map.iter().all(|(key, value)| {
            Language::ALL.iter().any(|l| l.code() == key)
                && (value.is_string() || value.is_null())
        })
}
