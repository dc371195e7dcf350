//! Output of harvested records
//!
//! This module handles:
//! - Restoring input order
//! - Writing the consolidated CSV table
//! - Recording run statistics

pub mod stats;

pub use stats::{print_statistics, RunStatistics, SiteStatistics};

use crate::record::NormalizedRecord;
use crate::HarvestError;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Byte-order mark so spreadsheet tools detect UTF-8
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column order of the output table
pub const COLUMNS: [&str; 11] = [
    "original_index",
    "image_urls",
    "original_url",
    "price",
    "shipping_fee",
    "total_price",
    "shipping_region",
    "title",
    "description",
    "condition",
    "merged_info",
];

/// Sorts records by their position in the input list (stable)
pub fn sort_by_original_index(records: &mut [NormalizedRecord]) {
    records.sort_by_key(|record| record.original_index);
}

/// `output_<YYYYmmddHHMM>.csv` for the given moment
pub fn output_file_name(at: DateTime<Local>) -> String {
    format!("output_{}.csv", at.format("%Y%m%d%H%M"))
}

/// Writes records as CSV (BOM, header, one row per record) in the given order
pub fn write_csv<W: Write>(mut writer: W, records: &[NormalizedRecord]) -> Result<(), HarvestError> {
    writer.write_all(UTF8_BOM)?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for record in records {
        csv_writer.write_record(row(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Sorts `records` and writes them to a timestamped file inside `directory`
///
/// Returns the path of the written file.
pub fn write_output(directory: &Path, mut records: Vec<NormalizedRecord>) -> Result<PathBuf, HarvestError> {
    std::fs::create_dir_all(directory)?;
    let path = directory.join(output_file_name(Local::now()));

    sort_by_original_index(&mut records);
    let file = File::create(&path)?;
    write_csv(file, &records)?;

    tracing::info!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(path)
}

/// One CSV row; partial records leave every listing column empty
fn row(record: &NormalizedRecord) -> Vec<String> {
    let mut cells = vec![record.original_index.to_string()];

    match &record.listing {
        Some(listing) => cells.extend([
            listing.joined_image_urls(),
            record.original_url.clone(),
            listing.price.to_string(),
            optional(listing.shipping_fee),
            optional(listing.total_price),
            listing.shipping_region.clone().unwrap_or_default(),
            listing.title.clone(),
            listing.description.clone().unwrap_or_default(),
            listing.condition.clone(),
            listing.merged_info.clone(),
        ]),
        None => {
            cells.push(String::new());
            cells.push(record.original_url.clone());
            cells.resize(COLUMNS.len(), String::new());
        }
    }

    cells
}

fn optional(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
