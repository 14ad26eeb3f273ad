// src/output.rs

use anyhow::{Context, Result};
use csv::{Terminator, Writer, WriterBuilder};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::holdings::{columns_for, Holding, MISSING};

/// Which parser produced the rows; decides the file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Xml,
    Ascii,
}

/// The three metadata lines at the top of every output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub ticker: String,
    pub filing_date: String,
    pub period_of_report: Option<String>,
}

impl ReportHeader {
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Ticker: {}", self.ticker),
            format!("Filing Date: {}", self.filing_date),
            format!(
                "Period of Report: {}",
                self.period_of_report.as_deref().unwrap_or(MISSING)
            ),
        ]
    }
}

/// `<ticker>_<filing_date>_filing_date.txt`, with `ASCII` before the
/// extension for legacy tables.
pub fn file_name(ticker: &str, filing_date: &str, format: DataFormat) -> String {
    let suffix = match format {
        DataFormat::Xml => "",
        DataFormat::Ascii => "ASCII",
    };
    format!("{}_{}_filing_date{}.txt", ticker, filing_date, suffix)
}

pub fn output_path(dir: &Path, header: &ReportHeader, format: DataFormat) -> PathBuf {
    dir.join(file_name(&header.ticker, &header.filing_date, format))
}

/// Tab-delimited writer with Excel's tab dialect conventions.
fn tab_writer(path: &Path) -> Result<Writer<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(Terminator::CRLF)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))
}

fn write_header(wtr: &mut Writer<File>, header: &ReportHeader) -> Result<()> {
    for line in header.lines() {
        wtr.write_record([line])?;
    }
    Ok(())
}

/// Metadata, a column header row, then one row per holding.
pub fn write_xml_report(path: &Path, header: &ReportHeader, holdings: &[Holding]) -> Result<()> {
    let columns = columns_for(holdings);
    let mut wtr = tab_writer(path)?;
    write_header(&mut wtr, header)?;
    wtr.write_record(columns.iter().map(|c| c.column_name()))?;
    for holding in holdings {
        wtr.write_record(holding.row(&columns))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    debug!(path = %path.display(), rows = holdings.len(), "wrote xml report");
    Ok(())
}

/// Metadata followed by the split table lines; the table brings its own
/// column headings.
pub fn write_ascii_report(path: &Path, header: &ReportHeader, rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = tab_writer(path)?;
    write_header(&mut wtr, header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    debug!(path = %path.display(), rows = rows.len(), "wrote ascii report");
    Ok(())
}
