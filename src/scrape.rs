// src/scrape.rs

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::{
    config::Config,
    fetch::{
        client::EdgarClient,
        filing::{parse_filing_index, DataSource, FilingIndex},
        search::{find_filings, FilingRef},
    },
    holdings::{parse_ascii_table, parse_info_table, Holding},
    output::{output_path, write_ascii_report, write_xml_report, DataFormat, ReportHeader},
};

/// What happened to one filing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilingOutcome {
    Written { path: PathBuf, format: DataFormat, rows: usize },
    /// Output file already present and `skip_existing` is set.
    Skipped(PathBuf),
    /// The index page had neither an information table nor submission text.
    NoData,
}

#[derive(Debug, Default)]
pub struct ScrapeSummary {
    pub filings_found: usize,
    pub written: Vec<PathBuf>,
    pub skipped: usize,
    pub no_data: usize,
    pub failed: usize,
}

/// Finds every 13F filing for one fund identifier and writes its holdings.
pub struct HoldingsScraper {
    client: EdgarClient,
    config: Config,
    ticker: String,
}

impl HoldingsScraper {
    /// The ticker becomes part of every output file name, so it must not be
    /// empty or carry path separators.
    pub fn new(config: Config, ticker: impl Into<String>) -> Result<Self> {
        config.validate()?;
        let ticker = ticker.into().trim().to_string();
        if ticker.is_empty() {
            bail!("ticker must not be empty");
        }
        if ticker.contains(|c: char| matches!(c, '/' | '\\')) || ticker.contains("..") {
            bail!("ticker {:?} is not a plain identifier", ticker);
        }
        let client = EdgarClient::new(&config)?;
        Ok(Self {
            client,
            config,
            ticker,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub async fn scrape(&self) -> Result<ScrapeSummary> {
        let start = Instant::now();
        info!("Retrieving filings for: {}", self.ticker);

        let mut filings = find_filings(&self.client, &self.config, &self.ticker).await?;
        let mut summary = ScrapeSummary {
            filings_found: filings.len(),
            ..Default::default()
        };
        if self.config.latest_only {
            filings.truncate(1);
        }

        for filing in &filings {
            match self.process_filing(filing).await {
                // same filing date means same file; the later filing overwrote it
                Ok(FilingOutcome::Written { path, .. }) => {
                    if !summary.written.contains(&path) {
                        summary.written.push(path);
                    }
                }
                Ok(FilingOutcome::Skipped(_)) => summary.skipped += 1,
                Ok(FilingOutcome::NoData) => summary.no_data += 1,
                Err(e) => {
                    error!(url = %filing.index_url, error = ?e, "filing failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            written = summary.written.len(),
            skipped = summary.skipped,
            no_data = summary.no_data,
            failed = summary.failed,
            elapsed = ?start.elapsed(),
            "Scraping complete"
        );
        Ok(summary)
    }

    /// Fetch one filing's index page, pick its data source and write the file.
    #[instrument(level = "info", skip(self, filing), fields(form = %filing.form_type, url = %filing.index_url))]
    pub async fn process_filing(&self, filing: &FilingRef) -> Result<FilingOutcome> {
        let html = self.client.get_text(&filing.index_url).await?;
        let index = parse_filing_index(&html, &filing.index_url)?;
        let header = ReportHeader {
            ticker: self.ticker.clone(),
            filing_date: index.filing_date.clone(),
            period_of_report: index.period_of_report.clone(),
        };

        match index.data_source() {
            Some(DataSource::Xml(url)) => {
                let path = output_path(&self.config.output_dir, &header, DataFormat::Xml);
                if self.should_skip(&path) {
                    return Ok(FilingOutcome::Skipped(path));
                }
                info!("Getting holdings from: {}", url);
                match self.fetch_xml(&url).await {
                    Ok(holdings) if !holdings.is_empty() => {
                        write_xml_report(&path, &header, &holdings)?;
                        Ok(FilingOutcome::Written {
                            path,
                            format: DataFormat::Xml,
                            rows: holdings.len(),
                        })
                    }
                    Ok(_) => {
                        warn!(%url, "information table has no holdings");
                        self.ascii_fallback(&index, &header).await
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "information table unusable");
                        self.ascii_fallback(&index, &header).await
                    }
                }
            }
            Some(DataSource::Ascii(url)) => self.write_ascii(&url, &header).await,
            None => {
                warn!("No data link found for filing date: {}", index.filing_date);
                Ok(FilingOutcome::NoData)
            }
        }
    }

    async fn fetch_xml(&self, url: &Url) -> Result<Vec<Holding>> {
        let xml = self.client.get_text(url).await?;
        parse_info_table(&xml).with_context(|| format!("parsing information table {}", url))
    }

    async fn ascii_fallback(
        &self,
        index: &FilingIndex,
        header: &ReportHeader,
    ) -> Result<FilingOutcome> {
        match &index.ascii_link {
            Some(url) => self.write_ascii(url, header).await,
            None => Ok(FilingOutcome::NoData),
        }
    }

    async fn write_ascii(&self, url: &Url, header: &ReportHeader) -> Result<FilingOutcome> {
        let path = output_path(&self.config.output_dir, header, DataFormat::Ascii);
        if self.should_skip(&path) {
            return Ok(FilingOutcome::Skipped(path));
        }
        info!("Getting holdings from (ascii): {}", url);
        let text = self.client.get_text(url).await?;
        let rows = parse_ascii_table(&text);
        if rows.is_empty() {
            warn!(%url, "no <TABLE> block in submission text");
        }
        write_ascii_report(&path, header, &rows)?;
        Ok(FilingOutcome::Written {
            path,
            format: DataFormat::Ascii,
            rows: rows.len(),
        })
    }

    fn should_skip(&self, path: &Path) -> bool {
        let skip = self.config.skip_existing && path.exists();
        if skip {
            debug!(path = %path.display(), "already written, skipping");
        }
        skip
    }
}
