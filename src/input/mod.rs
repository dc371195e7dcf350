//! Input list loading
//!
//! Reads the listing URLs from the first column of a CSV file or of the first
//! worksheet of an Excel workbook. The first row is a header. Every data row
//! becomes one [`ScrapeRequest`] whose `original_index` is its zero-based
//! position among the data rows; blank cells are kept (they route to the
//! unknown site) so that no row is ever dropped.

use crate::record::ScrapeRequest;
use crate::HarvestError;
use calamine::{open_workbook, Reader, Xlsx};
use std::path::Path;

/// Loads requests from `path`, choosing the reader by file extension
///
/// `.xlsx`/`.xlsm` files are read as workbooks, everything else as CSV.
pub fn load_requests(path: &Path) -> Result<Vec<ScrapeRequest>, HarvestError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let urls = match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => read_workbook_column(path)?,
        _ => read_csv_column(path)?,
    };

    let requests: Vec<ScrapeRequest> = urls
        .into_iter()
        .enumerate()
        .map(|(index, url)| ScrapeRequest::new(url, index))
        .collect();

    tracing::info!("Loaded {} URL(s) from {}", requests.len(), path.display());
    Ok(requests)
}

fn read_csv_column(path: &Path) -> Result<Vec<String>, HarvestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        urls.push(record.get(0).unwrap_or_default().trim().to_string());
    }
    Ok(urls)
}

fn read_workbook_column(path: &Path) -> Result<Vec<String>, HarvestError> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| HarvestError::Workbook(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| HarvestError::Workbook(format!("{}: workbook has no sheets", path.display())))?
        .map_err(|e| HarvestError::Workbook(format!("{}: {}", path.display(), e)))?;

    Ok(range
        .rows()
        .skip(1)
        .map(|row| {
            row.first()
                .map(|cell| cell.to_string().trim().to_string())
                .unwrap_or_default()
        })
        .collect())
}
