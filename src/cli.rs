use anyhow::{bail, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use holdings_scraper::Config;

/// Scrape 13F holdings for one filer from SEC EDGAR into tab-delimited files.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// CIK or ticker to search for. Prompted for when omitted.
    pub ticker: Option<String>,

    /// YAML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the output files.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// User-Agent sent to EDGAR; SEC asks for a name and contact email.
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Only scrape the most recent filing.
    #[arg(long)]
    pub latest: bool,

    /// Leave filings whose output file already exists alone.
    #[arg(long)]
    pub skip_existing: bool,
}

impl Cli {
    /// Flags win over the config file and environment.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(ua) = &self.user_agent {
            cfg.user_agent = ua.clone();
        }
        cfg.latest_only |= self.latest;
        cfg.skip_existing |= self.skip_existing;
    }
}

/// Ask until a non-empty ticker is entered.
pub fn prompt_ticker(input: &mut impl BufRead, output: &mut impl Write) -> Result<String> {
    loop {
        write!(output, "Please enter a ticker: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("no ticker given");
        }
        let ticker = line.trim();
        if !ticker.is_empty() {
            return Ok(ticker.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn prompt_skips_blank_lines() -> Result<()> {
        let mut input = Cursor::new("\n   \n0001279708\n");
        let mut output = Vec::new();
        let ticker = prompt_ticker(&mut input, &mut output)?;
        assert_eq!(ticker, "0001279708");
        assert_eq!(
            String::from_utf8(output)?.matches("Please enter a ticker: ").count(),
            3
        );
        Ok(())
    }

    #[test]
    fn prompt_fails_on_eof() {
        let mut input = Cursor::new("");
        assert!(prompt_ticker(&mut input, &mut Vec::new()).is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "holdings-scraper",
            "0001086364",
            "--output-dir",
            "out",
            "--latest",
        ]);
        let mut cfg = Config::default();
        cli.apply(&mut cfg);

        assert_eq!(cli.ticker.as_deref(), Some("0001086364"));
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert!(cfg.latest_only);
        assert!(!cfg.skip_existing);
    }
}
