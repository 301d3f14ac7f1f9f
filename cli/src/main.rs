//! # arxiv-insight
//!
//! Fetch recent arXiv papers matching a keyword and answer a task about them.
//!
//! Usage:
//!   arxiv-insight --keyword "pose estimation"                  # Summarize each match
//!   arxiv-insight -k nerf --category cs.CV --task extract-method
//!   arxiv-insight -k "diffusion" --rag                         # One answer over retrieved chunks
//!   arxiv-insight --list-categories

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use arxiv_insight_papers::{ARXIV_CATEGORIES, find_category};
use arxiv_insight_retrieval::{
    InsightConfig, InsightEngine, InsightOutcome, InsightReport, InsightRequest, TaskSelector,
};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "arxiv-insight",
    version,
    about = "Summarize recent arXiv papers that match a keyword"
)]
struct Cli {
    /// Keyword (case-insensitive phrase match on title and abstract)
    #[arg(short, long, default_value = "pose estimation")]
    keyword: String,

    /// Category label or code, e.g. "cs.CV" or "Robotics (cs.RO)"; "all" searches the defaults
    #[arg(short, long, default_value = "all")]
    category: String,

    /// Papers fetched per category
    #[arg(long, value_parser = clap::value_parser!(u16).range(10..=200))]
    max_fetch: Option<u16>,

    /// Matching papers to answer
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=20))]
    max_display: Option<u8>,

    /// Task: summarize, extract-research-question, extract-method,
    /// extract-contribution or structured-summary
    #[arg(short, long)]
    task: Option<String>,

    /// Answer once over chunks retrieved from all matches
    #[arg(long)]
    rag: bool,

    /// Only keep papers published within this many days
    #[arg(long)]
    days_back: Option<u32>,

    /// Config file (defaults to <config dir>/arxiv-insight/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// List selectable categories and exit
    #[arg(long)]
    list_categories: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "arxiv_insight_cli=debug,arxiv_insight_retrieval=debug,arxiv_insight_papers=debug,arxiv_insight_embeddings=debug"
    } else {
        "arxiv_insight_cli=info,arxiv_insight_retrieval=info,arxiv_insight_papers=warn,arxiv_insight_embeddings=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.list_categories {
        print!("{}", render_categories());
        return Ok(());
    }

    let config = InsightConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    debug!("Config: {config:?}");

    let request = build_request(&cli, &config)?;
    let engine = InsightEngine::from_config(&config).context("Failed to initialize engine")?;

    info!(
        "Searching {} for {:?} ({})",
        request.category.as_deref().unwrap_or("default categories"),
        request.keyword,
        request.task
    );
    let report = engine.run(&request).await.context("Request failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

/// Merge command-line overrides into the configured request defaults.
fn build_request(cli: &Cli, config: &InsightConfig) -> Result<InsightRequest> {
    let Some(category) = find_category(&cli.category) else {
        bail!(
            "Unknown category {:?}; run with --list-categories",
            cli.category
        );
    };

    let mut request = InsightRequest::from_config(cli.keyword.as_str(), config).with_rag(cli.rag);
    if let Some(code) = category.code {
        request = request.with_category(code);
    }
    if let Some(max_fetch) = cli.max_fetch {
        request = request.with_max_fetch(usize::from(max_fetch));
    }
    if let Some(max_display) = cli.max_display {
        request = request.with_max_display(usize::from(max_display));
    }
    if let Some(task) = &cli.task {
        request = request.with_task(TaskSelector::from_label(task));
    }
    if let Some(days_back) = cli.days_back {
        request = request.with_days_back(days_back);
    }
    Ok(request)
}

fn render_categories() -> String {
    let mut out = String::new();
    for category in ARXIV_CATEGORIES {
        let _ = writeln!(out, "{:<10} {}", category.code.unwrap_or("all"), category.label);
    }
    out
}

fn render_report(report: &InsightReport) -> String {
    let mut out = String::new();
    match &report.outcome {
        InsightOutcome::NoMatches => {
            let _ = writeln!(out, "No matching papers found for that keyword.");
        }
        InsightOutcome::PerPaper { answers } => {
            let _ = writeln!(out, "Found {} matching paper(s).", answers.len());
            for item in answers {
                let paper = &item.paper;
                let _ = writeln!(out, "\n---\n{}", paper.title);
                let _ = writeln!(out, "Authors: {}", paper.author_line());
                let _ = writeln!(
                    out,
                    "Published: {} | {}",
                    paper.published_date(),
                    paper.link
                );
                let _ = writeln!(out, "\nAbstract:\n{}", paper.abstract_text);
                let _ = writeln!(out, "\n{}:\n{}", report.task, item.answer);
            }
        }
        InsightOutcome::Rag {
            papers,
            contexts,
            answer,
        } => {
            let _ = writeln!(out, "Found {} matching paper(s).", papers.len());
            for paper in papers {
                let _ = writeln!(out, "- {} ({})", paper.title, paper.link);
            }
            let _ = writeln!(out, "\nRetrieved context:");
            for (i, context) in contexts.iter().enumerate() {
                let _ = writeln!(out, "{}. [{:.3}] {}", i + 1, context.score, context.text);
            }
            let _ = writeln!(out, "\n{} (RAG):\n{answer}", report.task);
        }
    }
    out
}
