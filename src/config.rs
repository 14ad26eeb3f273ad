// src/config.rs

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.sec.gov";

/// Runtime settings for a scrape. Every field has a default, so a YAML file
/// only needs the keys it wants to change.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// EDGAR host; relative links on result and index pages resolve here.
    pub base_url: String,
    /// SEC fair-access rules want a descriptive agent with contact details.
    pub user_agent: String,
    /// Form-type prefix handed to the company search (`13F` matches
    /// `13F-HR`, `13F-HR/A`, `13F-NT`, ...).
    pub form_type: String,
    pub page_size: u32,
    pub output_dir: PathBuf,
    pub max_retries: u32,
    pub backoff_ms: u64,
    /// Pause before every request.
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub latest_only: bool,
    pub skip_existing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("holdings-scraper/", env!("CARGO_PKG_VERSION")).to_string(),
            form_type: "13F".to_string(),
            page_size: 40,
            output_dir: PathBuf::from("."),
            max_retries: 3,
            backoff_ms: 500,
            request_delay_ms: 150,
            timeout_secs: 30,
            latest_only: false,
            skip_existing: false,
        }
    }
}

impl Config {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// YAML file (if given) or defaults, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok());
        debug!(?cfg, "loaded config");
        Ok(cfg)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("EDGAR_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("EDGAR_USER_AGENT") {
            self.user_agent = v;
        }
        if let Some(v) = lookup("HOLDINGS_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.page_size > 0, "page_size must be greater than zero");
        ensure!(!self.user_agent.trim().is_empty(), "user_agent must not be empty");
        Url::parse(&self.base_url)
            .with_context(|| format!("base_url {:?} is not a valid URL", self.base_url))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "output_dir: out\nlatest_only: true\npage_size: 100")?;

        let cfg = Config::from_yaml_file(tmp.path())?;
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert!(cfg.latest_only);
        assert_eq!(cfg.page_size, 100);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.form_type, "13F");
        assert_eq!(cfg.max_retries, 3);
        Ok(())
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> = [
            ("EDGAR_USER_AGENT", "Acme Research ops@acme.test"),
            ("HOLDINGS_OUTPUT_DIR", "/tmp/holdings"),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.user_agent, "Acme Research ops@acme.test");
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/holdings"));
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(Config::default().validate().is_ok());

        let cfg = Config {
            page_size: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            base_url: "not a url".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            user_agent: "  ".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
