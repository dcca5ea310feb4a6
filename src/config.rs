//! Runtime settings: CLI flag, then environment variable, then default.

use std::{fmt, path::Path, str::FromStr, time::Duration};

use crate::{
    data_dir::{DATA_DIR_ENV, DataDir},
    error::{Error, Result},
    i18n::Language,
    provider::{DataCache, Loader, StaticSource},
    remote::{DEFAULT_TIMEOUT_MS, RemoteConfig, RemoteSource},
};

pub const API_URL_ENV: &str = "FACHKATALOG_API_URL";
pub const API_KEY_ENV: &str = "FACHKATALOG_API_KEY";
pub const SOURCE_ENV: &str = "FACHKATALOG_SOURCE";
pub const CACHE_ENV: &str = "FACHKATALOG_CACHE";
pub const CACHE_TTL_ENV: &str = "FACHKATALOG_CACHE_TTL_SECS";
pub const TIMEOUT_ENV: &str = "FACHKATALOG_TIMEOUT_MS";
pub const LANG_ENV: &str = "FACHKATALOG_LANG";

/// Where collections are loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Source {
    /// REST API, falling back to the static files on failure.
    Remote,
    /// JSON files in the data directory only.
    Static,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Remote => "remote",
            Self::Static => "static",
        })
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "static" => Ok(Self::Static),
            other => Err(Error::Config(format!("unknown data source: {other}"))),
        }
    }
}

/// Values given on the command line. `None` defers to the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    pub data_dir: Option<&'a Path>,
    pub api_url: Option<&'a str>,
    pub source: Option<Source>,
    pub no_cache: bool,
    pub lang: Option<Language>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: DataDir,
    /// `None` when no URL or no real key is configured.
    pub remote: Option<RemoteConfig>,
    pub source: Source,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub lang: Language,
}

impl Settings {
    pub fn resolve(overrides: &Overrides<'_>) -> Result<Self> {
        Self::resolve_with(overrides, |name| std::env::var(name).ok())
    }

    /// Resolve against an arbitrary environment lookup.
    pub fn resolve_with(
        overrides: &Overrides<'_>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let data_dir = DataDir::resolve_with(
            overrides.data_dir,
            env(DATA_DIR_ENV).map(Into::into),
        )?;

        let timeout_ms = env(TIMEOUT_ENV)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let api_url = overrides.api_url.map(str::to_string).or_else(|| env(API_URL_ENV));
        let remote = match (api_url, env(API_KEY_ENV)) {
            (Some(url), Some(key)) => RemoteConfig::new(&url, &key, timeout_ms),
            _ => None,
        };

        let requested = match overrides.source {
            Some(source) => Some(source),
            None => env(SOURCE_ENV).map(|raw| raw.parse()).transpose()?,
        };
        let source = match (requested, &remote) {
            (Some(Source::Remote), None) => {
                tracing::warn!(
                    "remote source requested but no API URL/key configured, using static files"
                );
                Source::Static
            }
            (Some(source), _) => source,
            (None, Some(_)) => Source::Remote,
            (None, None) => Source::Static,
        };

        let cache_enabled =
            !overrides.no_cache && parse_enabled(env(CACHE_ENV).as_deref());
        let cache_ttl = env(CACHE_TTL_ENV)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map_or(DataCache::DEFAULT_TTL, Duration::from_secs);

        let lang = match overrides.lang {
            Some(lang) => lang,
            None => env(LANG_ENV)
                .map(|raw| raw.parse())
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Self {
            data_dir,
            remote,
            source,
            cache_enabled,
            cache_ttl,
            lang,
        })
    }

    /// Build the loader these settings describe.
    pub fn loader(&self) -> Result<Loader> {
        let remote = match (&self.remote, self.source) {
            (Some(config), Source::Remote) => Some(RemoteSource::new(config.clone())?),
            _ => None,
        };

        Ok(Loader::new(StaticSource::new(self.data_dir.clone()), self.lang)
            .with_remote(remote)
            .with_cache(DataCache::new(self.cache_ttl, self.cache_enabled)))
    }
}

/// Anything but an explicit off value enables the feature.
fn parse_enabled(raw: Option<&str>) -> bool {
    !matches!(
        raw.map(|value| value.trim().to_ascii_lowercase()).as_deref(),
        Some("off" | "none" | "0" | "false")
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::remote::PLACEHOLDER_KEY;

    fn resolve(
        overrides: &Overrides<'_>,
        vars: &[(&str, &str)],
    ) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::resolve_with(overrides, |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            data_dir: Some(tmp.path()),
            ..Default::default()
        };
        let settings = resolve(&overrides, &[]).unwrap();

        assert!(settings.remote.is_none());
        assert_eq!(settings.source, Source::Static);
        assert!(settings.cache_enabled);
        assert_eq!(settings.cache_ttl, Duration::from_secs(300));
        assert_eq!(settings.lang, Language::De);
    }

    #[test]
    fn configured_remote_becomes_the_default_source() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            data_dir: Some(tmp.path()),
            ..Default::default()
        };
        let settings = resolve(
            &overrides,
            &[
                (API_URL_ENV, "https://x.supabase.co/"),
                (API_KEY_ENV, "secret"),
                (TIMEOUT_ENV, "750"),
            ],
        )
        .unwrap();

        let remote = settings.remote.unwrap();
        assert_eq!(remote.base_url, "https://x.supabase.co");
        assert_eq!(remote.timeout_ms, 750);
        assert_eq!(settings.source, Source::Remote);
    }

    #[test]
    fn placeholder_key_disables_remote() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            data_dir: Some(tmp.path()),
            source: Some(Source::Remote),
            ..Default::default()
        };
        let settings = resolve(
            &overrides,
            &[(API_URL_ENV, "https://x.supabase.co"), (API_KEY_ENV, PLACEHOLDER_KEY)],
        )
        .unwrap();

        assert!(settings.remote.is_none());
        assert_eq!(settings.source, Source::Static);
    }

    #[test]
    fn flags_beat_environment() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            data_dir: Some(tmp.path()),
            api_url: Some("https://flag.example"),
            source: Some(Source::Static),
            no_cache: true,
            lang: Some(Language::It),
        };
        let settings = resolve(
            &overrides,
            &[
                (API_URL_ENV, "https://env.example"),
                (API_KEY_ENV, "secret"),
                (SOURCE_ENV, "remote"),
                (LANG_ENV, "fr"),
            ],
        )
        .unwrap();

        assert_eq!(settings.remote.unwrap().base_url, "https://flag.example");
        assert_eq!(settings.source, Source::Static);
        assert!(!settings.cache_enabled);
        assert_eq!(settings.lang, Language::It);
    }

    #[test]
    fn cache_switch_and_ttl_from_environment() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            data_dir: Some(tmp.path()),
            ..Default::default()
        };
        let settings =
            resolve(&overrides, &[(CACHE_ENV, "off"), (CACHE_TTL_ENV, "60")]).unwrap();

        assert!(!settings.cache_enabled);
        assert_eq!(settings.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn invalid_language_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            data_dir: Some(tmp.path()),
            ..Default::default()
        };
        let err = resolve(&overrides, &[(LANG_ENV, "es")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err}");
    }
}
