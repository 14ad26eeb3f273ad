// src/fetch/mod.rs

/// HTTP client with EDGAR pacing and retries.
pub mod client;
/// Filing index pages: metadata and the holdings data link.
pub mod filing;
/// Company search results and their pagination.
pub mod search;

pub use client::EdgarClient;
pub use filing::{parse_filing_index, DataSource, FilingIndex};
pub use search::{find_filings, parse_search_page, FilingRef, SearchPage};
