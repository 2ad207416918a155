//! Command-line host for the report workflow.
//!
//! The binary plays the presentation layer: it collects inputs from flags,
//! drives one [`Workflow`] session end to end and writes the requested
//! exports. All workflow semantics live in the library modules.
//!
//! ## How To Use
//! - `outage-report health` checks that the backend answers.
//! - `outage-report generate --location "Lagos, Nigeria" --fetch-news --select 0,2 --pdf --docx`
//!   fetches news, selects articles 0 and 2, generates a report and exports it.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].

use crate::backend::HttpBackend;
use crate::config::ReporterConfig;
use crate::contract::Completion;
use crate::export::share::Osc52Clipboard;
use crate::load_config::{finalize, load_config};
use crate::workflow::Workflow;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI for outage-report: generate and export network outage reports.
#[derive(Parser)]
#[clap(
    name = "outage-report",
    version,
    about = "Generate, edit and export network outage reports via the report backend"
)]
pub struct Cli {
    /// Path to the YAML config file (defaults apply when omitted)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the report backend is reachable and healthy
    Health,
    /// Run one report workflow session and export the result
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct GenerateArgs {
    /// Location as "City, Country"
    #[clap(long)]
    pub location: Option<String>,

    /// Lookback window in hours (clamped to 1..=72)
    #[clap(long, allow_hyphen_values = true)]
    pub hours: Option<i64>,

    /// Use the template generator instead of the LLM
    #[clap(long)]
    pub no_llm: bool,

    /// Model name passed to the backend
    #[clap(long)]
    pub model: Option<String>,

    /// PNG or JPEG photo to attach
    #[clap(long)]
    pub image: Option<PathBuf>,

    /// Retrieve recent news for the location before generating
    #[clap(long)]
    pub fetch_news: bool,

    /// Comma-separated indices of retrieved articles to include
    #[clap(long, value_delimiter = ',')]
    pub select: Vec<usize>,

    /// Write a PDF export
    #[clap(long)]
    pub pdf: bool,

    /// Write a DOCX export
    #[clap(long)]
    pub docx: bool,

    /// Copy a share excerpt to the terminal clipboard
    #[clap(long)]
    pub share: bool,

    /// Directory for exports (overrides config export_dir)
    #[clap(long)]
    pub out_dir: Option<PathBuf>,
}

fn resolve_config(path: Option<PathBuf>) -> Result<ReporterConfig> {
    match path {
        Some(path) => load_config(path),
        None => finalize(ReporterConfig::default()),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = resolve_config(cli.config)?;
    let backend = HttpBackend::new(&config).context("Failed to construct backend client")?;

    match cli.command {
        Commands::Health => {
            if backend.health().await {
                println!("Backend at {} is healthy.", backend.endpoint());
                Ok(())
            } else {
                anyhow::bail!("Backend at {} is not reachable or unhealthy", backend.endpoint())
            }
        }
        Commands::Generate(args) => generate(&config, backend, args).await,
    }
}

async fn generate(config: &ReporterConfig, backend: HttpBackend, args: GenerateArgs) -> Result<()> {
    tracing::info!(command = "generate", "Starting report workflow");
    let defaults = backend.defaults().await;
    let mut workflow = Workflow::new(config, backend.clone(), backend);
    if let Some(defaults) = &defaults {
        workflow.apply_backend_defaults(defaults);
    }

    if let Some(location) = args.location {
        workflow.set_location(location);
    }
    if let Some(hours) = args.hours {
        workflow.set_hours(hours);
    }
    if args.no_llm {
        workflow.set_use_llm(false);
    }
    if let Some(model) = args.model {
        workflow.set_model(model);
    }

    if let Some(image) = args.image.as_deref() {
        if workflow.select_image(Some(image)).await != Completion::Applied {
            eprintln!("[WARN] Could not read image {}; continuing without it.", image.display());
        }
    }

    if !args.fetch_news && !args.select.is_empty() {
        eprintln!("[WARN] --select has no effect without --fetch-news; submitting without articles.");
    }

    if args.fetch_news {
        workflow.fetch_news().await;
        let articles = workflow.articles();
        let articles_empty = articles.is_empty();
        if articles_empty {
            println!("No articles found.");
        } else {
            println!("{} articles:", articles.len());
            for (idx, article) in articles.iter().enumerate() {
                println!(
                    "  [{idx}] {} ({})",
                    article.display_title(),
                    article.source_name().unwrap_or("unknown source")
                );
            }
        }
        for idx in &args.select {
            if !workflow.toggle_article(*idx, true) {
                eprintln!("[WARN] No article at index {idx}; ignoring.");
            }
        }
        if !articles_empty {
            println!("({} selected)", workflow.selected_count());
        }
    }

    println!("Generating report for {}...", workflow.input().location);
    if workflow.submit().await != Completion::Applied {
        let message = workflow.error().unwrap_or("Report generation failed.").to_string();
        eprintln!("[ERROR] {message}");
        return Err(anyhow::Error::msg(message));
    }

    if let Some(report) = workflow.report() {
        println!(
            "Report: {} ({}h, generated {})\n",
            report.location, report.hours, report.generated_at
        );
    }
    if let Some(text) = workflow.saved_text() {
        println!("{text}");
    }

    let out_dir = args.out_dir.unwrap_or_else(|| config.export_dir.clone());
    if args.pdf {
        match workflow.export_pdf() {
            Some(artifact) => println!("Wrote {}", artifact.write_to(&out_dir)?.display()),
            None => eprintln!("[WARN] Nothing to render; PDF skipped."),
        }
    }
    if args.docx {
        if let Some(artifact) = workflow.export_docx()? {
            println!("Wrote {}", artifact.write_to(&out_dir)?.display());
        }
    }
    if args.share {
        workflow.share(&Osc52Clipboard)?;
        if let Some(notice) = workflow.take_notice() {
            println!("{notice}");
        }
    }

    tracing::info!(command = "generate", "Report workflow complete");
    Ok(())
}
