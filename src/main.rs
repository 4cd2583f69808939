use cgs_find::config::{Config, DEFAULT_CONFIG};
use cgs_find::extract::{chapter_url, extract};
use cgs_find::index::LookupIndex;
use cgs_find::manifest::{load_manifest, SectionDocument};
use cgs_find::search::{resolve_with_strategy, Strategy};
use cgs_find::selection::{Selection, View};
use cgs_find::source::{ChapterSource, DirSource};
use cgs_find::text::{SectionBody, SectionText};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// cgs - Find statute sections and read them in isolation
#[derive(Parser)]
#[command(name = "cgs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Manifest file or crawler output directory (overrides config)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log decisions to stderr (same as RUST_LOG=info)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search sections by citation or by words
    Search {
        /// Citation ("4-62a", "Sec. 4-62") or descriptive words
        query: Vec<String>,

        /// Maximum results to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the text of one section
    Show {
        /// Query whose top result is shown
        query: Vec<String>,

        /// Exact record id (titleKey|chapterKey|sectionKey)
        #[arg(long)]
        id: Option<String>,

        /// Directory of cached chapter pages (overrides config)
        #[arg(long)]
        chapters: Option<PathBuf>,

        /// Print sanitized markup instead of plain text
        #[arg(long)]
        html: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show manifest and index statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive search mode
    Repl {
        /// Directory of cached chapter pages (overrides config)
        #[arg(long)]
        chapters: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(&cli.config)?;
    if let Some(manifest) = cli.manifest {
        config.manifest = manifest;
    }

    match cli.command {
        Commands::Search { query, limit, json } => {
            let limit = limit.unwrap_or(config.limit);
            cmd_search(&query.join(" "), limit, json, cli.quiet, &config)
        }
        Commands::Show { query, id, chapters, html, json } => {
            if let Some(dir) = chapters {
                config.chapters = dir;
            }
            cmd_show(&query.join(" "), id.as_deref(), html, json, cli.quiet, &config)
        }
        Commands::Stats { json } => cmd_stats(json, &config),
        Commands::Repl { chapters } => {
            if let Some(dir) = chapters {
                config.chapters = dir;
            }
            cmd_repl(&config, cli.quiet)
        }
    }
}

fn load_index(config: &Config) -> Result<LookupIndex, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let manifest = load_manifest(&config.manifest)?;
    let index = LookupIndex::from_manifest(&manifest);
    tracing::info!(
        manifest = %config.manifest.display(),
        sections = index.len(),
        elapsed = ?start.elapsed(),
        "loaded manifest"
    );
    Ok(index)
}

fn cmd_search(
    query: &str,
    limit: usize,
    json: bool,
    quiet: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let index = load_index(config)?;
    print_search(&index, query, limit, json, quiet)?;
    Ok(())
}

/// Print results and return the ids shown, in order.
fn print_search(
    index: &LookupIndex,
    query: &str,
    limit: usize,
    json: bool,
    quiet: bool,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let resolution = resolve_with_strategy(index, query);
    let results: Vec<&SectionDocument> =
        resolution.documents.into_iter().take(limit).collect();

    if json {
        let output = serde_json::json!({
            "query": query,
            "strategy": resolution.strategy,
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(results.iter().map(|d| d.id.clone()).collect());
    }

    if results.is_empty() {
        println!("{}", "No sections found.".yellow());
        return Ok(Vec::new());
    }

    if let Some(header) = search_header(results.len(), query, resolution.strategy, quiet) {
        println!("{}\n", header);
    }

    for (i, doc) in results.iter().enumerate() {
        print_document(i + 1, doc);
    }

    Ok(results.iter().map(|d| d.id.clone()).collect())
}

/// Summary line above search results; suppressed by `--quiet`.
fn search_header(count: usize, query: &str, strategy: Strategy, quiet: bool) -> Option<String> {
    if quiet {
        return None;
    }
    let how = match strategy {
        Strategy::Identifier => "citation",
        Strategy::Text => "text",
        Strategy::Empty => "empty",
    };
    Some(format!(
        "{} results for: {} {}",
        count.to_string().green().bold(),
        query.cyan(),
        format!("({})", how).dimmed()
    ))
}

fn print_document(rank: usize, doc: &SectionDocument) {
    println!("{:>3}. {}", rank.to_string().dimmed(), doc.heading.cyan());

    let chapter = join_nonempty(&doc.chapter_label, &doc.chapter_name);
    let title = join_nonempty(&doc.title_label, &doc.title_name);
    let context: Vec<&str> = [chapter.as_str(), title.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !context.is_empty() {
        println!("     {}", context.join(" · "));
    }
    println!("     {}", doc.id.dimmed());
}

fn join_nonempty(label: &str, name: &str) -> String {
    match (label.is_empty(), name.is_empty()) {
        (false, false) => format!("{} - {}", label, name),
        (false, true) => label.to_string(),
        (true, false) => name.to_string(),
        (true, true) => String::new(),
    }
}

fn cmd_show(
    query: &str,
    id: Option<&str>,
    html: bool,
    json: bool,
    quiet: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let index = load_index(config)?;

    let doc = match id {
        Some(id) => index
            .get(id)
            .ok_or_else(|| format!("No section with id: {}", id))?,
        None => resolve_with_strategy(&index, query)
            .documents
            .into_iter()
            .next()
            .ok_or_else(|| format!("No section matches: {}", query))?,
    };

    let markup = read_chapter(&DirSource::new(&config.chapters), doc)?;
    let body = SectionBody::resolve(doc, markup.as_deref());

    print_section(doc, &body, html, json, quiet)
}

/// Chapter markup for `doc`, or `None` when it is not cached but the
/// manifest stores the section's text.
fn read_chapter(
    source: &impl ChapterSource,
    doc: &SectionDocument,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    match source.chapter(&doc.url) {
        Ok(markup) => Ok(Some(markup)),
        Err(e) if doc.content.is_some() => {
            tracing::info!(id = %doc.id, error = %e, "using stored section text");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_section(
    doc: &SectionDocument,
    body: &SectionBody,
    html: bool,
    json: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let (fragment, text, repealed) = match body {
            SectionBody::Extracted(fragment) => (
                Some(fragment.as_str()),
                Some(SectionText::from_fragment(fragment, &doc.heading)),
                None,
            ),
            SectionBody::Stored(text) => (None, Some(text.clone()), None),
            SectionBody::Repealed(note) => (None, None, Some(note.as_str())),
            SectionBody::Missing => (None, None, None),
        };
        let output = serde_json::json!({
            "id": doc.id,
            "heading": doc.heading,
            "url": doc.url,
            "chapter_url": chapter_url(&doc.url),
            "found": matches!(body, SectionBody::Extracted(_)),
            "stored": matches!(body, SectionBody::Stored(_)),
            "html": fragment,
            "text": text,
            "repealed": repealed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", doc.heading.green().bold());
    if let Some(context) = section_context(doc, quiet) {
        println!("{}\n", context.dimmed());
    }

    match body {
        SectionBody::Extracted(fragment) if html => println!("{}", fragment),
        SectionBody::Extracted(fragment) => {
            let text = SectionText::from_fragment(fragment, &doc.heading);
            if text.is_empty() {
                println!("{}", fragment);
            } else {
                print_text(&text);
            }
        }
        SectionBody::Stored(text) => print_text(text),
        SectionBody::Repealed(note) => println!("{} {}", "Repealed:".yellow().bold(), note),
        SectionBody::Missing => println!(
            "{} open the full chapter: {}",
            "Section text not found;".yellow(),
            chapter_url(&doc.url).cyan()
        ),
    }

    Ok(())
}

/// Chapter line under a section heading; suppressed by `--quiet`.
fn section_context(doc: &SectionDocument, quiet: bool) -> Option<String> {
    let context = join_nonempty(&doc.chapter_label, &doc.chapter_name);
    (!quiet && !context.is_empty()).then_some(context)
}

fn print_text(text: &SectionText) {
    println!("{}", text.text());
    for line in text.source.iter().chain(&text.history) {
        println!("\n{}", line.dimmed());
    }
    if !text.annotations.is_empty() {
        println!("\n{}", "Annotations".bold());
        for annotation in &text.annotations {
            println!("  {}", annotation.text);
        }
    }
}

fn cmd_stats(json: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = load_manifest(&config.manifest)?;
    let stats = manifest.stats();
    let index = LookupIndex::from_manifest(&manifest);

    if json {
        let output = serde_json::json!({
            "titles": stats.titles,
            "chapters": stats.chapters,
            "sections": stats.sections,
            "keys": index.bucket_count(),
            "unkeyed": index.unkeyed_count(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Index Statistics".green().bold());
    println!();
    println!("  Titles:            {}", stats.titles.to_string().cyan());
    println!("  Chapters:          {}", stats.chapters.to_string().cyan());
    println!("  Sections:          {}", stats.sections.to_string().cyan());
    println!("  Distinct keys:     {}", index.bucket_count().to_string().cyan());
    println!("  Unkeyed sections:  {}", index.unkeyed_count().to_string().dimmed());
    println!("  Manifest:          {}", config.manifest.display().to_string().dimmed());

    Ok(())
}

fn cmd_repl(config: &Config, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let index = load_index(config)?;
    let source = DirSource::new(&config.chapters);
    let mut selection = Selection::new();
    let mut last_results: Vec<String> = Vec::new();

    if !quiet {
        println!("{}", "cgs interactive mode".green().bold());
        println!(
            "{} sections loaded. Commands: <query>, show <n>, stats, help, quit\n",
            index.len().to_string().cyan()
        );
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", ">".cyan().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match ReplCommand::parse(line) {
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                println!("  <query>            - Search by citation or words");
                println!("  show <n>           - Show result n of the last search");
                println!("  stats              - Show statistics");
                println!("  quit               - Exit");
            }
            ReplCommand::Stats => {
                println!("  Sections:      {}", index.len().to_string().cyan());
                println!("  Distinct keys: {}", index.bucket_count().to_string().cyan());
            }
            ReplCommand::Show(n) => {
                let Some(doc) = last_results.get(n).and_then(|id| index.get(id)) else {
                    println!("{}", "No such result in the last search".yellow());
                    println!();
                    continue;
                };

                let ticket = selection.select(&doc.id);
                let markup = match read_chapter(&source, doc) {
                    Ok(markup) => markup,
                    Err(e) => {
                        println!("{}: {}", "error".red().bold(), e);
                        selection.complete(ticket, None);
                        println!();
                        continue;
                    }
                };
                selection.complete(ticket, markup.as_deref().and_then(|m| extract(doc, m)));

                let body = match selection.current() {
                    View::Ready(_, fragment) => SectionBody::Extracted(fragment.clone()),
                    _ => SectionBody::fallback(doc, markup.as_deref()),
                };
                if let Err(e) = print_section(doc, &body, false, false, quiet) {
                    println!("{}: {}", "error".red().bold(), e);
                }
            }
            ReplCommand::Search(query) => match print_search(&index, query, 10, false, quiet) {
                Ok(ids) => last_results = ids,
                Err(e) => println!("{}: {}", "error".red().bold(), e),
            },
        }
        println!();
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Quit,
    Help,
    Stats,
    /// Zero-based index into the last search results.
    Show(usize),
    Search(&'a str),
}

impl<'a> ReplCommand<'a> {
    /// Commands match only their exact form; any other line is a search.
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "quit" | "exit" | "q" if rest.is_empty() => ReplCommand::Quit,
            "help" | "?" if rest.is_empty() => ReplCommand::Help,
            "stats" if rest.is_empty() => ReplCommand::Stats,
            "show" => match rest.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                Some(n) => ReplCommand::Show(n),
                None => ReplCommand::Search(line),
            },
            _ => ReplCommand::Search(line),
        }
    }
}
