// src/fetch/filing.rs

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html};
use tracing::trace;
use url::Url;

/// Sequence number EDGAR gives the information table document.
const INFO_TABLE_SEQ: &str = "2";
const COMPLETE_SUBMISSION: &str = "Complete submission text file";

/// What the filing index (`-index.htm`) page tells us about one filing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingIndex {
    pub filing_date: String,
    pub period_of_report: Option<String>,
    pub xml_link: Option<Url>,
    pub ascii_link: Option<Url>,
}

/// Where the holdings for a filing live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// 2013+ information table.
    Xml(Url),
    /// Complete submission text holding a legacy `<TABLE>`.
    Ascii(Url),
}

impl FilingIndex {
    pub fn data_source(&self) -> Option<DataSource> {
        self.xml_link
            .clone()
            .map(DataSource::Xml)
            .or_else(|| self.ascii_link.clone().map(DataSource::Ascii))
    }
}

fn text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Flatten the document into its elements, in document order.
fn elements(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect()
}

/// Text of the first `div` after the `div` labelled `label`.
fn labelled_value(els: &[ElementRef<'_>], label: &str) -> Option<String> {
    let pos = els
        .iter()
        .position(|el| el.value().name() == "div" && text(el) == label)?;
    els[pos + 1..]
        .iter()
        .find(|el| el.value().name() == "div")
        .map(text)
}

/// First anchor whose text ends with `suffix`, after the `td` reading `cell`.
fn link_after_cell(els: &[ElementRef<'_>], cell: &str, suffix: &str, page: &Url) -> Option<Url> {
    let pos = els
        .iter()
        .position(|el| el.value().name() == "td" && text(el) == cell)?;
    els[pos + 1..]
        .iter()
        .filter(|el| el.value().name() == "a" && text(el).ends_with(suffix))
        .filter_map(|el| el.value().attr("href"))
        .find_map(|href| page.join(href).ok())
}

pub fn parse_filing_index(html: &str, page_url: &Url) -> Result<FilingIndex> {
    let doc = Html::parse_document(html);
    let els = elements(&doc);

    let filing_date = labelled_value(&els, "Filing Date")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| anyhow!("no Filing Date on {}", page_url))?;
    let period_of_report = labelled_value(&els, "Period of Report").filter(|p| !p.is_empty());

    let xml_link = link_after_cell(&els, INFO_TABLE_SEQ, ".xml", page_url);
    let ascii_link = link_after_cell(&els, COMPLETE_SUBMISSION, ".txt", page_url);
    trace!(?xml_link, ?ascii_link, "data links");

    Ok(FilingIndex {
        filing_date,
        period_of_report,
        xml_link,
        ascii_link,
    })
}
