//! `filmdb`: build the movie indices and query them from the terminal.
//!
//! ```bash
//! filmdb index --dataset data/movies.jsonl
//! filmdb search "sci-fi movies about space from the 2010s"
//! filmdb search "heist thriller" --mode lexical --format json
//! filmdb repl
//! ```

mod indexing;
mod output;
mod session;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use filmdb_core::config::Settings;
use filmdb_core::logging::init_logging;
use filmdb_core::types::{ParsedQuery, SearchMode};

use crate::indexing::{run_index, IndexTargets};
use crate::output::{format_json, format_table};
use crate::session::SearchSession;

const REPL_LIMIT: usize = 10;

#[derive(Parser)]
#[command(name = "filmdb", version, about = "Hybrid lexical + semantic movie search")]
struct Cli {
    /// Config file (default: config.toml plus config.<RUST_ENV>.toml in the working directory)
    #[arg(short, long, global = true, env = "FILMDB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the lexical and vector indices from the dataset
    Index {
        /// Dataset to index instead of `data.dataset_path`
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Only rebuild the tantivy index
        #[arg(long, conflicts_with = "vector_only")]
        lexical_only: bool,
        /// Only rebuild the vector table
        #[arg(long)]
        vector_only: bool,
        /// Index at most this many records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run a single query
    Search {
        query: String,
        /// lexical | vector | fused (aliases: bm25, semantic, hybrid)
        #[arg(short, long)]
        mode: Option<SearchMode>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Use an external parser's `{search_term, filters}` JSON instead of the rule parser
        #[arg(long)]
        parsed_json: Option<PathBuf>,
    },
    /// Interactive search loop
    Repl {
        #[arg(short, long)]
        mode: Option<SearchMode>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    init_logging(&settings.logging);

    match cli.command {
        Commands::Index { dataset, lexical_only, vector_only, limit } => {
            let targets = IndexTargets { lexical: !vector_only, vector: !lexical_only };
            let dataset = dataset.unwrap_or_else(|| settings.data.dataset_path.clone());
            let summary = run_index(&settings, &dataset, targets, limit).await?;
            println!("{summary}");
        }
        Commands::Search { query, mode, format, limit, parsed_json } => {
            let mode = mode.unwrap_or(settings.search.strategy);
            let session = SearchSession::load(&settings, mode).await?;
            let external = match parsed_json {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read parsed query {}", path.display()))?;
                    Some(ParsedQuery::from_json(&text)?)
                }
                None => None,
            };
            let limit = limit.unwrap_or(settings.search.final_limit);
            let outcome = session.search(&query, external, limit).await?;
            let rendered = match format {
                OutputFormat::Table => format_table(&query, mode, &outcome.hits, &outcome.timing),
                OutputFormat::Json => format_json(&outcome.hits, &outcome.timing)?,
            };
            println!("{rendered}");
        }
        Commands::Repl { mode } => {
            let mode = mode.unwrap_or(settings.search.strategy);
            let session = SearchSession::load(&settings, mode).await?;
            repl(&session, mode).await?;
        }
    }
    Ok(())
}

async fn repl(session: &SearchSession, mode: SearchMode) -> Result<()> {
    info!(%mode, records = session.record_count(), "repl ready");
    println!("Search mode: {mode}. Type 'exit' or 'bye' to quit.");
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nfilmdb> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let query = line?.trim().to_string();
        if query.is_empty() {
            continue;
        }
        if matches!(query.to_lowercase().as_str(), "exit" | "bye") {
            break;
        }
        match session.search(&query, None, REPL_LIMIT).await {
            Ok(outcome) => println!("{}", format_table(&query, mode, &outcome.hits, &outcome.timing)),
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }
    println!("Goodbye!");
    Ok(())
}
