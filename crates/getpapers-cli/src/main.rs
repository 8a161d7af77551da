//! get-papers-list - find PubMed papers with non-academic authors
//!
//! Searches PubMed for a query, fetches the matching articles and reports the
//! ones with at least one author affiliated with a company.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

mod config;
mod report;

use config::Config;

#[derive(Parser)]
#[command(name = "get-papers-list")]
#[command(about = "Fetch PubMed papers with pharmaceutical/biotech company affiliations")]
#[command(version)]
struct Cli {
    /// PubMed search query (supports full PubMed syntax)
    #[arg(required = true)]
    query: Vec<String>,

    /// Write results to this CSV file instead of the console
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Config file path (default: ./getpapers.toml or ~/.config/getpapers/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cap on the number of search hits to fetch
    #[arg(long)]
    max_results: Option<usize>,

    /// Contact email sent to NCBI with every request
    #[arg(long)]
    email: Option<String>,

    /// Print the effective settings before running
    #[arg(long)]
    show_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let progress = getpapers_core::ProgressContext::new();
    let multi = if progress.is_tty() {
        Some(progress.multi())
    } else {
        None
    };
    getpapers_core::init_logging(cli.debug, multi);

    match run(&cli, &progress) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, progress: &getpapers_core::ProgressContext) -> Result<()> {
    let file_config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    let mut pipeline = file_config.pipeline();
    if let Some(max_results) = cli.max_results {
        pipeline.max_results = max_results;
    }
    if let Some(email) = &cli.email {
        pipeline.email = Some(email.clone());
    }

    if cli.show_config {
        eprintln!("\n{}", config_table(&pipeline));
    }

    let query = cli.query.join(" ");
    let summary = getpapers_pubmed::run(&pipeline, &query, progress)?;

    match &cli.file {
        Some(path) => {
            report::write_csv_file(&summary.papers, path)?;
            println!("Results written to: {}", path.display());
        }
        None => println!("{}", report::render_table(&summary.papers)),
    }
    Ok(())
}

fn config_table(config: &getpapers_pubmed::Config) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["E-utilities URL", &config.base_url]);
    table.add_row(vec!["Tool", &config.tool]);
    table.add_row(vec!["Email", config.email.as_deref().unwrap_or("not set")]);
    table.add_row(vec![
        "API key",
        if config.api_key.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec!["Max results", &config.max_results.to_string()]);
    table.add_row(vec!["Batch size", &config.batch_size.to_string()]);
    table.add_row(vec!["Concurrency", &config.max_concurrency.to_string()]);
    table.add_row(vec![
        "Rate limit",
        &format!(
            "{} calls / {}ms",
            config.rate_limit_calls,
            config.rate_limit_period.as_millis()
        ),
    ]);
    table.add_row(vec![
        "Request timeout",
        &format!("{}s", config.request_timeout.as_secs()),
    ]);
    table
}
