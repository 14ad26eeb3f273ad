pub mod config;
pub mod fetch;
pub mod holdings;
pub mod output;
pub mod scrape;

pub use config::Config;
pub use scrape::{FilingOutcome, HoldingsScraper, ScrapeSummary};
