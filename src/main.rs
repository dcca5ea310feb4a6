use std::io::{BufRead, IsTerminal, Write};

use clap::{Parser, ValueEnum};
use fachkatalog::{
    Catalog,
    Error,
    Result,
    Router,
    Settings,
    cli::{Cli, Command, DecodeArgs, Dimension, OpenArgs, SearchArgs, ToggleArgs},
    provider::Loader,
    render::{JsonRenderer, TextRenderer},
    search::{self, SearchSort},
    url_state::{self, ViewMode},
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("FACHKATALOG_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Command::Decode(args) => cmd_decode(args)?,
        Command::Encode(args) => {
            println!(
                "{}",
                url_state::encode(
                    &args.route,
                    &args.tags,
                    &args.category,
                    &args.phases,
                    args.view,
                )
            );
        }
        Command::Toggle(args) => println!("{}", toggle(args)?),
        Command::Open(args) => {
            let mut loader = Settings::resolve(&cli.overrides())?.loader()?;
            cmd_open(loader.load(), args)?;
        }
        Command::Search(args) => {
            let mut loader = Settings::resolve(&cli.overrides())?.loader()?;
            cmd_search(&loader.load(), args)?;
        }
        Command::Browse => {
            let loader = Settings::resolve(&cli.overrides())?.loader()?;
            cmd_browse(loader)?;
        }
        Command::Completions(args) => args.generate(),
    }

    Ok(())
}

fn cmd_decode(args: &DecodeArgs) -> Result<()> {
    let state = url_state::decode(&args.fragment);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!("route:    {}", state.route);
    if let Some(id) = &state.id {
        println!("id:       {id}");
    }
    if !state.tags.is_empty() {
        println!("tags:     {}", state.tags.join(", "));
    }
    if !state.category.is_empty() {
        println!("category: {}", state.category);
    }
    if !state.phases.is_empty() {
        let phases: Vec<String> =
            state.phases.iter().map(ToString::to_string).collect();
        println!("phases:   {}", phases.join(", "));
    }
    if !state.search_query.is_empty() {
        println!("query:    {}", state.search_query);
    }
    println!("view:     {}", state.view.as_str());
    Ok(())
}

fn toggle(args: &ToggleArgs) -> Result<String> {
    let state = url_state::decode(&args.fragment);
    Ok(match args.dimension {
        Dimension::Tag => state.toggle_tag(&args.value),
        Dimension::Category => state.toggle_category(&args.value),
        Dimension::Phase => state.toggle_phase(parse_phase(&args.value)?),
    })
}

fn parse_phase(raw: &str) -> Result<u8> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Input(format!("invalid phase: {raw}")))
}

fn cmd_open(catalog: Catalog, args: &OpenArgs) -> Result<()> {
    let stdout = std::io::stdout().lock();

    if args.json {
        let mut router = Router::new(catalog, JsonRenderer::new(stdout));
        router.set_search_sort(args.sort)?;
        router.navigate(&args.fragment)
    } else {
        let renderer = TextRenderer::new(stdout).show_all(args.all);
        let mut router = Router::new(catalog, renderer);
        router.set_search_sort(args.sort)?;
        router.navigate(&args.fragment)
    }
}

fn cmd_search(catalog: &Catalog, args: &SearchArgs) -> Result<()> {
    let stdout = std::io::stdout().lock();

    if args.full {
        let hits = search::full_search(catalog, &args.query, args.sort);
        if args.json {
            serde_json::to_writer_pretty(stdout, &hits)?;
            println!();
        } else {
            TextRenderer::new(stdout).results(&hits)?;
        }
    } else {
        let groups = search::global_search(catalog, &args.query);
        if args.json {
            serde_json::to_writer_pretty(stdout, &groups)?;
            println!();
        } else {
            TextRenderer::new(stdout).preview(&groups)?;
        }
    }
    Ok(())
}

const BROWSE_HELP: &str = "\
commands:
  go <fragment>      open a location
  search <query>     full search
  tag <value>        toggle a tag filter
  category <value>   toggle the category filter
  phase <1-5>        toggle a phase filter
  view grid|list     switch the view mode
  sort <order>       relevance, date-desc or date-asc
  clear              remove all filters
  reload             fetch fresh data
  where              print the current fragment
  quit               leave";

fn cmd_browse(mut loader: Loader) -> Result<()> {
    let interactive = std::io::stdin().is_terminal();
    let renderer = TextRenderer::new(std::io::stdout());
    let mut router = Router::new(loader.load(), renderer);
    router.navigate(url_state::DEFAULT_FRAGMENT)?;

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            eprint!("\n{}> ", router.fragment());
            std::io::stderr().flush()?;
        }
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, arg) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, a)| (c, a.trim()));

        let outcome = match command {
            "quit" | "exit" | "q" => break,
            "help" | "?" => {
                println!("{BROWSE_HELP}");
                Ok(())
            }
            "where" => {
                println!("#{}", router.fragment());
                Ok(())
            }
            "go" => router.navigate(arg),
            "search" => router.search(arg),
            "tag" => router.toggle_tag(arg),
            "category" => router.toggle_category(arg),
            "phase" => parse_phase(arg).and_then(|p| router.toggle_phase(p)),
            "view" => match ViewMode::parse(arg) {
                Some(view) => router.switch_view(view),
                None => Err(Error::Input(format!("unknown view: {arg}"))),
            },
            "sort" => SearchSort::from_str(arg, true)
                .map_err(Error::Input)
                .and_then(|sort| router.set_search_sort(sort)),
            "clear" => router.clear_filters(),
            "reload" => {
                loader.clear_cache();
                router.replace_provider(loader.load())
            }
            other => Err(Error::Input(format!(
                "unknown command: {other} (try 'help')"
            ))),
        };

        if let Err(e) = outcome {
            eprintln!("error: {e}");
        }
    }

    Ok(())
}
