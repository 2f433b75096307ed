//! `scribe`: decode files into chunk records, load them into a knowledge base
//! and search it.
//!
//! Records and results are written to stdout as JSON lines; logs go to stderr.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scribe_core::bootstrap::AppBuilder;
use scribe_core::config::KnowledgeBackend;
use scribe_memory::document::FileReport;
use scribe_memory::{Filters, SearchOptions};
use serde_json::{Value, json};

/// Metadata key tagging records with their owner.
const USER_ID_KEY: &str = "user_id";

#[derive(Parser)]
#[command(name = "scribe", version)]
#[command(about = "Knowledge-base ingestion: file decoding, chunking and vector search")]
struct Cli {
    /// Path to config file (default: config/default.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode files and print their chunk records
    Inspect {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Decode files and load them into the configured knowledge base
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Drop the collection before loading
        #[arg(long)]
        recreate: bool,

        /// Tag every record with this user id
        #[arg(long)]
        user: Option<String>,
    },

    /// Search the configured knowledge base
    Search {
        query: String,

        /// Maximum results (default: knowledge.search_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Metadata filter, repeatable
        #[arg(short, long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, Value)>,

        /// Restrict results to records owned by this user
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let builder = AppBuilder::from_path(cli.config.as_deref())?;
    init_subscriber(&builder.config().logging.level);
    tracing::debug!(path = %builder.config_path().display(), "configuration loaded");

    match cli.command {
        Command::Inspect { paths } => inspect(&builder, &paths).await,
        Command::Ingest {
            paths,
            recreate,
            user,
        } => ingest(&builder, &paths, recreate, user).await,
        Command::Search {
            query,
            limit,
            filters,
            user,
        } => search(&builder, &query, limit, filters, user).await,
    }
}

fn init_subscriber(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn inspect(builder: &AppBuilder, paths: &[PathBuf]) -> anyhow::Result<()> {
    let reports = builder.build_pipeline().process_paths(paths).await;
    let mut out = std::io::stdout().lock();
    for report in &reports {
        write_records(&mut out, report)?;
    }
    Ok(())
}

async fn ingest(
    builder: &AppBuilder,
    paths: &[PathBuf],
    recreate: bool,
    user: Option<String>,
) -> anyhow::Result<()> {
    if builder.config().knowledge.backend == KnowledgeBackend::Memory {
        tracing::warn!("memory backend selected, ingested records are discarded on exit");
    }

    let mut pipeline = builder.build_pipeline();
    if let Some(user) = user {
        pipeline = pipeline.with_tag(USER_ID_KEY, user);
    }
    let kb = builder.build_knowledge_base()?;

    let outcome = pipeline
        .ingest_paths(&kb, paths, recreate)
        .await
        .context("failed to load records into the knowledge base")?;

    let mut out = std::io::stdout().lock();
    for report in outcome.reports.iter().filter(|r| r.is_error()) {
        write_records(&mut out, report)?;
    }
    let summary = json!({
        "files": outcome.reports.len(),
        "failed": outcome.failed_files(),
        "loaded": outcome.loaded,
    });
    writeln!(out, "{summary}")?;

    tracing::info!(
        files = outcome.reports.len(),
        failed = outcome.failed_files(),
        loaded = outcome.loaded,
        "ingestion finished"
    );
    Ok(())
}

async fn search(
    builder: &AppBuilder,
    query: &str,
    limit: Option<usize>,
    filters: Vec<(String, Value)>,
    user: Option<String>,
) -> anyhow::Result<()> {
    let kb = builder.build_knowledge_base()?;

    let mut call_filters: Filters = filters.into_iter().collect();
    if let Some(user) = user {
        call_filters.insert(USER_ID_KEY.to_owned(), Value::String(user));
    }

    let mut options = SearchOptions::default().with_limit(builder.config().knowledge.search_limit);
    if let Some(limit) = limit {
        options = options.with_override_limit(limit);
    }
    if !call_filters.is_empty() {
        options = options.with_filters(call_filters);
    }

    let results = kb
        .search(query, options)
        .await
        .context("knowledge base search failed")?;

    let mut out = std::io::stdout().lock();
    for result in &results {
        serde_json::to_writer(&mut out, result)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_records(out: &mut impl Write, report: &FileReport) -> anyhow::Result<()> {
    for record in &report.records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Parse `key=value`. Values that read as JSON booleans or integers keep that type.
fn parse_filter(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty filter key in `{raw}`"));
    }

    let value = match serde_json::from_str::<Value>(value) {
        Ok(v @ Value::Bool(_)) => v,
        Ok(Value::Number(n)) if n.is_i64() => Value::Number(n),
        _ => Value::String(value.to_owned()),
    };
    Ok((key.to_owned(), value))
}
