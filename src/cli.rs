use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::{
    config::{Overrides, Source},
    i18n::Language,
    search::SearchSort,
    url_state::ViewMode,
};

#[derive(Debug, Parser)]
#[command(
    name = "fachkatalog",
    version,
    about = "Browse, filter and search the construction reference catalog"
)]
pub struct Cli {
    /// Directory holding the static collection files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the REST API (the key comes from FACHKATALOG_API_KEY)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where to load collections from
    #[arg(long, value_enum, global = true)]
    pub source: Option<Source>,

    /// Always fetch fresh data instead of reusing the cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Language used to resolve translated labels
    #[arg(long, value_enum, global = true)]
    pub lang: Option<Language>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> Overrides<'_> {
        Overrides {
            data_dir: self.data_dir.as_deref(),
            api_url: self.api_url.as_deref(),
            source: self.source,
            no_cache: self.no_cache,
            lang: self.lang,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a location fragment into its route and filters
    Decode(DecodeArgs),
    /// Build a canonical location fragment
    Encode(EncodeArgs),
    /// Toggle one filter value on a fragment and print the result
    Toggle(ToggleArgs),
    /// Render the page a fragment points at
    Open(OpenArgs),
    /// Search every collection
    Search(SearchArgs),
    /// Navigate interactively, reading commands from stdin
    Browse,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Decode --

#[derive(Debug, Parser)]
pub struct DecodeArgs {
    /// Fragment, with or without the leading '#'
    pub fragment: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Encode --

#[derive(Debug, Parser)]
pub struct EncodeArgs {
    /// Route, optionally with an id (e.g. `usecases`, `element/e1`)
    pub route: String,

    /// Tag filter (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Category filter
    #[arg(long, default_value = "")]
    pub category: String,

    /// Lifecycle phase filter, 1-5 (repeatable)
    #[arg(long = "phase")]
    pub phases: Vec<u8>,

    /// Emit an explicit view mode
    #[arg(long, value_enum)]
    pub view: Option<ViewMode>,
}

// -- Toggle --

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dimension {
    Tag,
    Category,
    Phase,
}

#[derive(Debug, Parser)]
pub struct ToggleArgs {
    /// Current fragment
    pub fragment: String,

    /// Filter dimension to toggle
    #[arg(value_enum)]
    pub dimension: Dimension,

    /// Value to add or remove
    pub value: String,
}

// -- Open --

#[derive(Debug, Parser)]
pub struct OpenArgs {
    /// Fragment to open; defaults to the home page
    #[arg(default_value = "home")]
    pub fragment: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List every matching record instead of the first batch
    #[arg(long)]
    pub all: bool,

    /// Result order on the search page
    #[arg(long, value_enum, default_value_t = SearchSort::default())]
    pub sort: SearchSort,
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Return the full result list instead of the grouped preview
    #[arg(long)]
    pub full: bool,

    /// Result order for the full list
    #[arg(long, value_enum, default_value_t = SearchSort::default())]
    pub sort: SearchSort,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "fachkatalog",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_encode_repeated_filters() {
        let cli = Cli::parse_from([
            "fachkatalog",
            "encode",
            "usecases",
            "--tag",
            "BIM",
            "--tag",
            "Holz",
            "--phase",
            "3",
            "--view",
            "list",
        ]);
        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.route, "usecases");
                assert_eq!(args.tags, ["BIM", "Holz"]);
                assert_eq!(args.phases, [3]);
                assert!(args.category.is_empty());
                assert_eq!(args.view, Some(ViewMode::List));
            }
            _ => panic!("expected encode command"),
        }
    }

    #[test]
    fn parse_search_defaults() {
        let cli = Cli::parse_from(["fachkatalog", "search", "beton"]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query, "beton");
                assert!(!args.full);
                assert!(!args.json);
                assert_eq!(args.sort, SearchSort::DateDesc);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "fachkatalog",
            "open",
            "elements",
            "--source",
            "static",
            "--lang",
            "fr",
            "--no-cache",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.source, Some(Source::Static));
        assert_eq!(overrides.lang, Some(Language::Fr));
        assert!(overrides.no_cache);
    }

    #[test]
    fn toggle_dimension_parses() {
        let cli =
            Cli::parse_from(["fachkatalog", "toggle", "usecase/uc010", "phase", "3"]);
        match cli.command {
            Command::Toggle(args) => {
                assert_eq!(args.dimension, Dimension::Phase);
                assert_eq!(args.value, "3");
            }
            _ => panic!("expected toggle command"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
