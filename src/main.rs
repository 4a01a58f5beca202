//! CLI entry point for `fotosearch`.

use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use unicode_width::UnicodeWidthChar;

use fotosearch::catalog::position::page_number;
use fotosearch::catalog::{index, Catalog};
use fotosearch::config::Config;
use fotosearch::model::photo::Photo;
use fotosearch::model::user::UserContext;
use fotosearch::search::collection::CollectionQuery;
use fotosearch::search::expression::Expression;
use fotosearch::search::form::SearchForm;
use fotosearch::search::parser::{parse_or_fallback, parse_query};
use fotosearch::search::token::tokenize;

#[derive(Parser)]
#[command(
    name = "fotosearch",
    version,
    about = "Search a historical photo archive",
    after_help = "Query syntax: caption:dog, year:1912, year:1900..1920, tag:\"red barn\",\n\
                  AND / OR, -negation, (grouping), a | b (prefer a, else b)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog JSON file (defaults to [catalog] default_path)
    #[arg(long, global = true, value_name = "FILE", env = "FOTOSEARCH_CATALOG")]
    catalog: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a query is tokenized, parsed and described
    Parse {
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Search photos
    Search {
        /// Query text
        #[arg(default_value = "")]
        query: String,
        #[command(flatten)]
        filters: FormArgs,
        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Use the grid page size instead of the photo page size
        #[arg(long)]
        grid: bool,
        #[command(flatten)]
        viewer: ViewerArgs,
        #[arg(long)]
        json: bool,
    },
    /// Show the year timeline of a query
    Years {
        query: Option<String>,
        #[command(flatten)]
        viewer: ViewerArgs,
        #[arg(long)]
        json: bool,
    },
    /// Show where a photo falls in a query's results
    Position {
        /// Accession number (FI0000042) or numeric id
        photo: String,
        query: Option<String>,
        #[command(flatten)]
        viewer: ViewerArgs,
        #[arg(long)]
        json: bool,
    },
    /// List donors, terms, tags or places with photo counts
    Browse {
        #[arg(value_enum)]
        index: BrowseIndex,
        #[arg(long)]
        json: bool,
    },
    /// Show the active configuration and where it is read from
    Config {
        /// Write the active configuration to the config file
        #[arg(long)]
        save: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Structured search form filters.
#[derive(Args)]
struct FormArgs {
    /// Subject term name
    #[arg(long)]
    term: Option<String>,
    /// Donor name ("Last, First" or either part)
    #[arg(long)]
    donor: Option<String>,
    #[arg(long)]
    start_year: Option<i32>,
    #[arg(long)]
    end_year: Option<i32>,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    county: String,
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "")]
    country: String,
}

/// Who is searching.
#[derive(Args)]
struct ViewerArgs {
    /// Search as this user id
    #[arg(long, value_name = "ID")]
    user: Option<u64>,
    /// Include unpublished photos
    #[arg(long)]
    unpublished: bool,
    /// See every proposed tag
    #[arg(long)]
    reviewer: bool,
}

impl ViewerArgs {
    fn context(&self) -> UserContext {
        UserContext {
            user_id: self.user,
            can_view_unpublished: self.unpublished,
            can_review_tags: self.reviewer,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BrowseIndex {
    Donors,
    Terms,
    Tags,
    Cities,
    Counties,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = fotosearch::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Parse { query, json } => cmd_parse(&query, json),
        Commands::Search {
            query,
            filters,
            page,
            grid,
            viewer,
            json,
        } => {
            let catalog = open_catalog(cli.catalog.as_deref(), &config)?;
            let form = build_form(&catalog, query, filters)?;
            let page_size = if grid {
                config.search.grid_page_size
            } else {
                config.search.page_size
            };
            cmd_search(&catalog, &form, &viewer.context(), page, page_size, json)
        }
        Commands::Years {
            query,
            viewer,
            json,
        } => {
            let catalog = open_catalog(cli.catalog.as_deref(), &config)?;
            let query = build_query(query.as_deref(), &config, viewer.context())?;
            cmd_years(&catalog, &query, json)
        }
        Commands::Position {
            photo,
            query,
            viewer,
            json,
        } => {
            let catalog = open_catalog(cli.catalog.as_deref(), &config)?;
            let query = build_query(query.as_deref(), &config, viewer.context())?;
            cmd_position(&catalog, &config, &photo, &query, json)
        }
        Commands::Browse { index, json } => {
            let catalog = open_catalog(cli.catalog.as_deref(), &config)?;
            cmd_browse(&catalog, index, json)
        }
        Commands::Config { save } => cmd_config(&config, save),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = fotosearch::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "fotosearch.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Load the catalog named on the command line, else the configured one.
fn open_catalog(path: Option<&Path>, config: &Config) -> anyhow::Result<Catalog> {
    let Some(path) = path.or(config.catalog.default_path.as_deref()) else {
        anyhow::bail!("No catalog given. Use --catalog or set [catalog] default_path");
    };
    if !path.exists() {
        anyhow::bail!("Catalog not found: {}", path.display());
    }
    Ok(Catalog::load(path)?)
}

/// Parse free query text according to the `[search]` settings.
fn build_expression(text: &str, config: &Config) -> anyhow::Result<Option<Expression>> {
    if config.search.fallback_to_simple {
        return Ok(parse_or_fallback(text));
    }
    match parse_query(text) {
        Ok(expr) => Ok(Some(expr.shakeout())),
        Err(e) if e.is_no_expression() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn build_query(
    text: Option<&str>,
    config: &Config,
    user: UserContext,
) -> anyhow::Result<CollectionQuery> {
    let expr = match text {
        Some(text) => build_expression(text, config)?,
        None => None,
    };
    Ok(CollectionQuery::new(expr, user))
}

/// Resolve the form's term and donor names against the catalog.
fn build_form(catalog: &Catalog, query: String, filters: FormArgs) -> anyhow::Result<SearchForm> {
    let term = match &filters.term {
        Some(name) => {
            let found = catalog
                .photos()
                .iter()
                .flat_map(|photo| &photo.terms)
                .find(|term| term.term.eq_ignore_ascii_case(name));
            match found {
                Some(term) => Some(term.clone()),
                None => anyhow::bail!("Unknown term '{name}'"),
            }
        }
        None => None,
    };
    let donor = match &filters.donor {
        Some(name) => {
            let found = catalog
                .photos()
                .iter()
                .filter_map(|photo| photo.donor.as_ref())
                .find(|donor| donor.answers_to(name));
            match found {
                Some(donor) => Some(donor.clone()),
                None => anyhow::bail!("Unknown donor '{name}'"),
            }
        }
        None => None,
    };
    Ok(SearchForm {
        query,
        term,
        donor,
        start_year: filters.start_year,
        end_year: filters.end_year,
        city: filters.city,
        county: filters.county,
        state: filters.state,
        country: filters.country,
    })
}

/// Print the active configuration, optionally saving it.
fn cmd_config(config: &Config, save: bool) -> anyhow::Result<()> {
    if save {
        fotosearch::config::save_config(config)?;
    }
    let path = fotosearch::config::config_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());
    println!("# config file: {path}");
    println!(
        "# log file:    {}",
        fotosearch::config::log_file_path(config).display()
    );
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "fotosearch", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Show every stage of query processing.
fn cmd_parse(query: &str, json: bool) -> anyhow::Result<()> {
    let tokens: Vec<String> = match tokenize(query) {
        Ok(tokens) => tokens.iter().map(ToString::to_string).collect(),
        Err(e) => vec![format!("<{e}>")],
    };
    let parsed = parse_query(query);
    let expr = parse_or_fallback(query);
    let collection = CollectionQuery::new(expr.clone(), UserContext::anonymous());

    if json {
        let output = serde_json::json!({
            "query": query,
            "tokens": tokens,
            "parse_error": parsed.as_ref().err().map(ToString::to_string),
            "expression": expr.as_ref().map(ToString::to_string),
            "is_collection": expr.as_ref().is_some_and(Expression::is_collection),
            "description": collection.to_string(),
            "cache_key": collection.cache_encoding(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {:<14} {}", "Tokens", tokens.join(" "));
    if let Err(e) = &parsed {
        println!("  {:<14} {} (searching as plain text)", "Parse error", e);
    }
    match &expr {
        Some(expr) => {
            println!("  {:<14} {}", "Expression", expr);
            println!("  {:<14} {}", "Collection", expr.is_collection());
        }
        None => println!("  {:<14} (none)", "Expression"),
    }
    println!("  {:<14} {}", "Description", collection);
    println!("  {:<14} {}", "Cache key", collection.cache_encoding());
    println!();
    Ok(())
}

/// Run a search and print one page of results.
fn cmd_search(
    catalog: &Catalog,
    form: &SearchForm,
    user: &UserContext,
    page: usize,
    page_size: usize,
    json: bool,
) -> anyhow::Result<()> {
    if page == 0 {
        anyhow::bail!("Pages start at 1");
    }
    let expr = match form.as_expression() {
        Ok(expr) => Some(expr),
        Err(e) if e.is_no_expression() => None,
        Err(e) => return Err(e.into()),
    };
    let query = CollectionQuery::new(expr, user.clone());

    let results = query.filter(&catalog.all());
    let total = results.len();
    let pages = results.page_count(page_size);
    let shown = results.page(page, page_size);

    if json {
        let output = serde_json::json!({
            "description": query.to_string(),
            "cache_key": query.cache_encoding(),
            "result_count": total,
            "page": page,
            "pages": pages,
            "results": shown.iter().map(|p| photo_json(p)).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {query}");
    println!("  {total} result(s), page {page} of {}", pages.max(1));
    println!();
    if shown.is_empty() {
        return Ok(());
    }
    println!(
        "  {:<10} {:<5} {:<30} {:<40}",
        "Accession", "Year", "Location", "Caption"
    );
    println!("  {}", "-".repeat(88));
    for photo in shown {
        println!(
            "  {:<10} {:<5} {} {}",
            photo.accession_number(),
            photo.year.map(|y| y.to_string()).unwrap_or_default(),
            pad(&truncate(&photo.location(), 29), 30),
            truncate(&photo.caption, 40),
        );
    }
    println!();
    Ok(())
}

/// Print the year index and the year links of a query.
fn cmd_years(catalog: &Catalog, query: &CollectionQuery, json: bool) -> anyhow::Result<()> {
    let results = query.filter(&catalog.all());
    let index = results.year_index();
    let links = results.year_links();

    if json {
        let output = serde_json::json!({
            "description": query.to_string(),
            "year_index": index,
            "year_links": links,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {query}: {} photo(s)", results.len());
    println!();
    println!("  {:<6} {:<10} {:>6}", "Year", "First", "Rank");
    for entry in &index {
        println!(
            "  {:<6} FI{:07} {:>6}",
            entry.year, entry.photo_id, entry.rank
        );
    }
    if !links.is_empty() {
        println!();
        println!("  Timeline:");
        for link in &links {
            println!("    {}  -> FI{:07} (rank {})", link.year, link.photo_id, link.rank);
        }
    }
    println!();
    Ok(())
}

/// Print a photo's position and page within a query's results.
fn cmd_position(
    catalog: &Catalog,
    config: &Config,
    photo: &str,
    query: &CollectionQuery,
    json: bool,
) -> anyhow::Result<()> {
    let id = Photo::accession_to_id(photo)
        .or_else(|| photo.parse().ok())
        .ok_or_else(|| anyhow::anyhow!("Not an accession number or id: '{photo}'"))?;
    let Some(photo) = catalog.get(id) else {
        anyhow::bail!("No photo with id {id}");
    };

    let results = query.filter(&catalog.all());
    let Some(position) = results.photo_position(photo) else {
        anyhow::bail!("{} has no year and cannot be positioned", photo.accession_number());
    };
    let page = page_number(position, config.search.page_size);
    let grid_page = page_number(position, config.search.grid_page_size);
    let member = results.contains(photo.id);

    if json {
        let output = serde_json::json!({
            "photo": photo_json(photo),
            "description": query.to_string(),
            "in_results": member,
            "position": position,
            "page": page,
            "grid_page": grid_page,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {:<12} {}", "Photo", photo.accession_number());
    println!("  {:<12} {}", "Query", query);
    println!("  {:<12} {}", "In results", member);
    println!("  {:<12} {}", "Position", position);
    println!("  {:<12} {}", "Page", page);
    println!("  {:<12} {}", "Grid page", grid_page);
    println!();
    Ok(())
}

/// Print a browse index.
fn cmd_browse(catalog: &Catalog, which: BrowseIndex, json: bool) -> anyhow::Result<()> {
    let all = catalog.all();
    let entries = match which {
        BrowseIndex::Donors => index::donors(&all),
        BrowseIndex::Terms => index::terms(&all),
        BrowseIndex::Tags => index::tags(&all),
        BrowseIndex::Cities => index::cities(&all),
        BrowseIndex::Counties => index::counties(&all),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!();
    for entry in &entries {
        println!("  {:>6}  {}", entry.count, entry.name);
    }
    println!();
    Ok(())
}

fn photo_json(photo: &Photo) -> serde_json::Value {
    serde_json::json!({
        "id": photo.id,
        "accession_number": photo.accession_number(),
        "year": photo.year,
        "caption": photo.caption,
        "location": photo.location(),
        "donor": photo.donor.as_ref().map(ToString::to_string),
        "is_published": photo.is_published,
    })
}

/// Cut `text` to at most `width` terminal columns.
fn truncate(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

/// Right-pad `text` with spaces to `width` terminal columns.
fn pad(text: &str, width: usize) -> String {
    let used: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}
