use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pubsearch_core::eval::{check_files, evaluate, DEFAULT_QUERIES};
use pubsearch_core::export::{documents_json, results_json, write_results_csv};
use pubsearch_core::persist::{load_meta, meta_path, save_meta, MetaFile, FORMAT_VERSION};
use pubsearch_core::{IndexConfig, IndexStore};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod input;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, query and evaluate a field-weighted publication index", long_about = None)]
struct Cli {
    /// JSON config file (field weights, normalizer options) used by `build`.
    /// Saved indexes carry their own configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index file
        #[arg(long)]
        output: PathBuf,
    },
    /// Run a query against a saved index
    Search {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Write results here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print index statistics as JSON
    Stats {
        #[arg(long)]
        index: PathBuf,
        /// Also list the heaviest terms
        #[arg(long, default_value_t = 20)]
        top_terms: usize,
    },
    /// Run the query and collection evaluation report
    Evaluate {
        #[arg(long)]
        index: PathBuf,
        /// Newline-separated queries; defaults to a built-in set
        #[arg(long)]
        queries: Option<PathBuf>,
        /// Also write the report to this JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export all stored documents as a JSON array
    Export {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = IndexConfig::load_or_default(cli.config.as_deref())?;
    let requested = cli.config.is_some().then_some(&config);

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output, &config),
        Commands::Search { index, query, k, format, out } => {
            let store = open(&index, requested)?;
            search(&store, &query, k, format, out.as_deref())
        }
        Commands::Stats { index, top_terms } => {
            let store = open(&index, requested)?;
            let meta = load_meta(&meta_path(&index)).ok();
            let report = serde_json::json!({
                "snapshot": meta,
                "statistics": store.statistics(),
                "top_terms": store.top_terms(top_terms),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Evaluate { index, queries, out } => {
            let store = open(&index, requested)?;
            run_evaluation(&store, &index, queries.as_deref(), out.as_deref())
        }
        Commands::Export { index, out } => {
            let store = open(&index, requested)?;
            let json = serde_json::to_string_pretty(&documents_json(&store))?;
            fs::write(&out, json).with_context(|| format!("writing {}", out.display()))?;
            tracing::info!(out = %out.display(), documents = store.doc_count(), "exported documents");
            Ok(())
        }
    }
}

fn open(index: &Path, requested: Option<&IndexConfig>) -> Result<IndexStore> {
    let store = IndexStore::load(index).with_context(|| format!("loading index {}", index.display()))?;
    if requested.is_some_and(|c| c != store.config()) {
        tracing::warn!(index = %index.display(), "--config differs from the index's own configuration, which is used instead");
    }
    Ok(store)
}

fn build_index(input: &Path, output: &Path, config: &IndexConfig) -> Result<()> {
    let records = input::read_all(input)?;
    let mut store = IndexStore::new(config);
    store.extend(records);
    store.save(output)?;

    let meta = MetaFile {
        num_docs: store.doc_count(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
    };
    save_meta(&meta_path(output), &meta)?;

    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}

fn search(store: &IndexStore, query: &str, k: usize, format: OutputFormat, out: Option<&Path>) -> Result<()> {
    let hits = store.search_top(query, k);
    let mut sink: Box<dyn Write> = match out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    match format {
        OutputFormat::Table => {
            for (rank, hit) in hits.iter().enumerate() {
                writeln!(
                    sink,
                    "{:>3}. [{:>8.2}] {} ({}) #{}",
                    rank + 1,
                    hit.score,
                    hit.record.text("title"),
                    hit.record.year_label(),
                    hit.doc_id
                )?;
            }
        }
        OutputFormat::Json => writeln!(sink, "{}", serde_json::to_string_pretty(&results_json(&hits))?)?,
        OutputFormat::Csv => write_results_csv(&hits, &mut sink)?,
    }
    sink.flush()?;
    Ok(())
}

fn run_evaluation(store: &IndexStore, index: &Path, queries: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let queries: Vec<String> = match queries {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?
            .lines()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_owned)
            .collect(),
        None => DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
    };

    let meta = meta_path(index);
    let files = check_files(&[("Index File", index), ("Meta File", meta.as_path())]);
    let report = evaluate(store, &queries, files);
    println!("{}", serde_json::to_string_pretty(&report)?);
    if let Some(out) = out {
        report.save(out)?;
    }
    tracing::info!(overall_score = report.overall_score, rating = ?report.rating, "evaluation complete");
    Ok(())
}
