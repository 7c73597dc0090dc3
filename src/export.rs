use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::filter::FilteredView;

/// Column order of exported tables.
const EXPORT_COLUMNS: [&str; 5] = ["name", "category", "region", "rating", "preference_score"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode row: {0}")]
    Csv(#[from] csv::Error),
}

/// Serialize a filtered view's record set as CSV to any writer, preserving
/// the documented column order. An empty view yields a header-only table.
pub fn write_csv<W: io::Write>(view: &FilteredView, writer: W) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(EXPORT_COLUMNS)?;
    for d in view.records() {
        let rating = d.rating.to_string();
        let preference = d.preference_score.to_string();
        out.write_record([
            d.name.as_str(),
            d.category.as_str(),
            d.region.as_str(),
            rating.as_str(),
            preference.as_str(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Write the view to a CSV file at `path` (the download form of a filtered
/// view).
pub fn export_csv(view: &FilteredView, path: &Path) -> Result<(), ExportError> {
    let file = fs::File::create(path)?;
    write_csv(view, file)
}
