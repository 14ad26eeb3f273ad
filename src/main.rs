mod cli;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use holdings_scraper::{Config, HoldingsScraper};
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::{prompt_ticker, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) config: file → env → flags ───────────────────────────────
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    if config.user_agent == Config::default().user_agent {
        warn!("using the default User-Agent; set EDGAR_USER_AGENT to a name and contact email");
    }

    // ─── 3) ticker ───────────────────────────────────────────────────
    let ticker = match cli.ticker.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => prompt_ticker(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    // ─── 4) scrape ───────────────────────────────────────────────────
    info!("Scraping started at {}", Local::now());
    let scraper = HoldingsScraper::new(config, ticker)?;
    let summary = scraper.scrape().await?;

    println!(
        "{}: {} filings found, {} written, {} skipped, {} without data, {} failed",
        scraper.ticker(),
        summary.filings_found,
        summary.written.len(),
        summary.skipped,
        summary.no_data,
        summary.failed
    );
    for path in &summary.written {
        println!("  {}", path.display());
    }

    Ok(())
}
