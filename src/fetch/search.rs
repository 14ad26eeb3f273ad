// src/fetch/search.rs

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, instrument, trace, warn};
use url::Url;

use super::client::EdgarClient;
use crate::config::Config;

static DOCUMENTS_BUTTON: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a#documentsbutton").expect("selector should parse"));
static NEXT_BUTTON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"input[value^="Next"]"#).expect("selector should parse"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("selector should parse"));

/// One row of the company search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingRef {
    /// First column of the result row, e.g. `13F-HR`. Empty if the row had none.
    pub form_type: String,
    /// The filing's `-index.htm` page.
    pub index_url: Url,
}

#[derive(Debug, Default)]
pub struct SearchPage {
    pub filings: Vec<FilingRef>,
    pub has_next: bool,
}

/// EDGAR company browse URL for one page of results.
pub fn search_url(
    base: &Url,
    fund_id: &str,
    form_type: &str,
    page_size: u32,
    start: u32,
) -> Result<Url> {
    let mut url = base
        .join("/cgi-bin/browse-edgar")
        .with_context(|| format!("building search URL on {}", base))?;
    url.query_pairs_mut()
        .append_pair("action", "getcompany")
        .append_pair("CIK", fund_id)
        .append_pair("type", form_type)
        .append_pair("dateb", "")
        .append_pair("owner", "include")
        .append_pair("count", &page_size.to_string())
        .append_pair("start", &start.to_string());
    Ok(url)
}

fn row_form_type(link: ElementRef<'_>) -> String {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")
        .and_then(|row| row.select(&CELL).next())
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Pull every `Documents` link (and the row's form type) off a results page.
pub fn parse_search_page(html: &str, base: &Url) -> SearchPage {
    let doc = Html::parse_document(html);

    let filings = doc
        .select(&DOCUMENTS_BUTTON)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            match base.join(href) {
                Ok(index_url) => {
                    trace!(url = %index_url, "Found filing");
                    Some(FilingRef {
                        form_type: row_form_type(link),
                        index_url,
                    })
                }
                Err(e) => {
                    warn!(href, error = %e, "unresolvable filing link");
                    None
                }
            }
        })
        .collect();

    SearchPage {
        filings,
        has_next: doc.select(&NEXT_BUTTON).next().is_some(),
    }
}

/// Walk every page of search results for `fund_id`, newest filing first.
#[instrument(level = "info", skip(client, config))]
pub async fn find_filings(
    client: &EdgarClient,
    config: &Config,
    fund_id: &str,
) -> Result<Vec<FilingRef>> {
    let mut filings = Vec::new();
    let mut seen: HashSet<Url> = HashSet::new();
    let mut start = 0;

    loop {
        let url = search_url(
            client.base(),
            fund_id,
            &config.form_type,
            config.page_size,
            start,
        )?;
        let html = client
            .get_text(&url)
            .await
            .with_context(|| format!("fetching search results for {}", fund_id))?;
        let page = parse_search_page(&html, client.base());
        debug!(start, found = page.filings.len(), has_next = page.has_next, "search page");

        let before = filings.len();
        filings.extend(
            page.filings
                .into_iter()
                .filter(|f| seen.insert(f.index_url.clone())),
        );
        // a server that ignores `start` hands back the same rows forever
        if filings.len() == before {
            if page.has_next {
                warn!(start, "search page repeated earlier results, stopping");
            }
            break;
        }
        if !page.has_next || config.latest_only {
            break;
        }
        start += config.page_size;
    }

    if filings.is_empty() {
        info!("No results found for ticker: {}", fund_id);
    } else {
        info!("{} filings found: {}", config.form_type, filings.len());
    }
    Ok(filings)
}
