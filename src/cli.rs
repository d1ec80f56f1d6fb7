use std::cmp;
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use atty::Stream;
use clap::{Parser, Subcommand};
use serde_json::json;
use simple_glossary_rs::{
    AutolinkConfig, Autolinker, DocumentContext, GlossaryUris, ListingFilter, ListingQuery,
    MatchStrategy, TermIndex, TermsFile, first_letter_counts, list_terms,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "simple-glossary",
    about = "Autolink glossary terms and browse glossary listings",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// Log skipped terms and other diagnostics to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Link the first occurrence of each glossary term in a document.
    Autolink {
        /// JSON terms file.
        #[arg(short, long)]
        terms: PathBuf,
        /// Document to process. Reads stdin when omitted.
        input: Option<PathBuf>,
        /// The document is the glossary entry with this title.
        #[arg(long, conflicts_with = "page_title")]
        entry_title: Option<String>,
        /// The document is an ordinary page with this title.
        #[arg(long)]
        page_title: Option<String>,
        #[arg(long, value_enum, default_value_t = MatchStrategy::Pattern)]
        strategy: MatchStrategy,
        /// Class attribute for inserted links.
        #[arg(long)]
        class_name: Option<String>,
    },
    /// Print the listing URI for each title.
    Uri {
        /// Titles to build URIs for.
        #[arg(required = true)]
        titles: Vec<String>,
        #[arg(long, default_value = "http://localhost")]
        site_url: String,
        #[arg(long, default_value = "glossary")]
        archive_slug: String,
    },
    /// Count terms per first letter.
    Letters {
        #[arg(short, long)]
        terms: PathBuf,
    },
    /// Show one page of the alphabetical listing.
    List {
        #[arg(short, long)]
        terms: PathBuf,
        /// Only terms starting with this letter. Disables paging.
        #[arg(long)]
        letter: Option<String>,
        /// Only terms starting with this text.
        #[arg(long)]
        begins_with: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        per_page: usize,
    },
    /// List terms that start with the provided prefix.
    Prefix {
        #[arg(short, long)]
        terms: PathBuf,
        /// Prefix to search for.
        prefix: String,
        /// Maximum number of matches to return.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Autolink {
            terms,
            input,
            entry_title,
            page_title,
            strategy,
            class_name,
        } => {
            let context = match (entry_title, page_title) {
                (Some(title), _) => DocumentContext::glossary_entry(title),
                (None, Some(title)) => DocumentContext::page(title),
                (None, None) => DocumentContext::none(),
            };
            let mut config = AutolinkConfig {
                strategy,
                ..AutolinkConfig::default()
            };
            if let Some(class_name) = class_name {
                config.class_name = class_name;
            }
            handle_autolink(&terms, input.as_deref(), &context, config, cli.json)
        }
        Command::Uri {
            titles,
            site_url,
            archive_slug,
        } => {
            let uris = GlossaryUris::new(site_url).with_archive_slug(archive_slug);
            handle_uri(&uris, titles, cli.json)
        }
        Command::Letters { terms } => handle_letters(&terms, cli.json),
        Command::List {
            terms,
            letter,
            begins_with,
            page,
            per_page,
        } => {
            let query = ListingQuery {
                filter: ListingFilter::from_params(letter.as_deref(), begins_with.as_deref()),
                page,
                per_page,
            };
            handle_list(&terms, &query, cli.json)
        }
        Command::Prefix {
            terms,
            prefix,
            limit,
        } => handle_prefix(&terms, prefix, limit, cli.json),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

fn load_terms(path: &Path) -> Result<TermsFile, Box<dyn Error>> {
    let file = TermsFile::from_path(path)
        .map_err(|err| format!("Failed to load terms from {}: {err}", path.display()))?;
    info!(path = %path.display(), count = file.entries.len(), "loaded glossary terms");
    Ok(file)
}

fn read_input(input: Option<&Path>) -> Result<String, Box<dyn Error>> {
    match input {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
            Ok(content)
        }
        None => {
            if atty::is(Stream::Stdin) {
                return Err("No input file given and stdin is a terminal".into());
            }
            Ok(io::read_to_string(io::stdin())?)
        }
    }
}

fn handle_autolink(
    terms_path: &Path,
    input: Option<&Path>,
    context: &DocumentContext,
    config: AutolinkConfig,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let terms = load_terms(terms_path)?.terms();
    let content = read_input(input)?;
    let linker = Autolinker::new(config);
    let report = linker.link_report(&content, &terms, context);
    info!(
        linked = report.linked.len(),
        skipped = report.skipped.len(),
        strategy = %linker.config().strategy,
        "autolinked document"
    );

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.content);
    }
    Ok(())
}

fn handle_uri(uris: &GlossaryUris, titles: Vec<String>, as_json: bool) -> Result<(), Box<dyn Error>> {
    let rows: Vec<(String, String)> = titles
        .into_iter()
        .map(|title| {
            let uri = uris.term_uri(&title);
            (title, uri)
        })
        .collect();

    if as_json {
        let payload: Vec<_> = rows
            .iter()
            .map(|(title, uri)| json!({ "title": title, "target_uri": uri }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let width = column_width(rows.iter().map(|(title, _)| title.as_str()), "TITLE");
        println!("{:<width$}  {}", "TITLE", "TARGET_URI", width = width);
        println!("{:-<width$}  {}", "", "----------", width = width);
        for (title, uri) in &rows {
            println!("{:<width$}  {}", title, uri, width = width);
        }
    }
    Ok(())
}

fn handle_letters(terms_path: &Path, as_json: bool) -> Result<(), Box<dyn Error>> {
    let file = load_terms(terms_path)?;
    let counts = first_letter_counts(file.titles());

    if as_json {
        let payload: Vec<_> = counts
            .iter()
            .map(|(letter, count)| {
                json!({
                    "letter": letter,
                    "count": count,
                    "uri": file.uris.filter_uri(letter, &ListingFilter::None, false),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if counts.is_empty() {
        println!("No glossary terms.");
    } else {
        println!("{:<6}  {}", "LETTER", "COUNT");
        println!("{:-<6}  {}", "", "-----");
        for (letter, count) in &counts {
            println!("{:<6}  {}", letter, count);
        }
    }
    Ok(())
}

fn handle_list(terms_path: &Path, query: &ListingQuery, as_json: bool) -> Result<(), Box<dyn Error>> {
    let terms = load_terms(terms_path)?.terms();
    let page = list_terms(&terms, query);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }
    if page.items.is_empty() {
        println!("No terms found.");
        return Ok(());
    }
    println!(
        "Page {} of {} ({} matching terms)",
        page.page, page.total_pages, page.total
    );
    let width = column_width(page.items.iter().map(|term| term.title.as_str()), "TITLE");
    println!("{:<width$}  {}", "TITLE", "TARGET_URI", width = width);
    println!("{:-<width$}  {}", "", "----------", width = width);
    for term in &page.items {
        println!("{:<width$}  {}", term.title, term.target_uri, width = width);
    }
    Ok(())
}

fn handle_prefix(
    terms_path: &Path,
    prefix: String,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let file = load_terms(terms_path)?;
    let index = TermIndex::build(file.titles())?;
    let limit = cmp::max(1, limit);
    let matches = index.prefix(&prefix, limit);

    if as_json {
        let payload = json!({
            "prefix": prefix,
            "limit": limit,
            "results": matches.iter().map(|title| {
                json!({ "title": title, "target_uri": file.uris.term_uri(title) })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if matches.is_empty() {
        println!("No terms matched prefix \"{prefix}\".");
    } else {
        println!("Matches for prefix \"{prefix}\":");
        for title in &matches {
            println!("  {title}");
        }
    }
    Ok(())
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|value| value.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.len())
}
