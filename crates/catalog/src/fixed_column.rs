use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use tracing::debug;

use crate::errors::IngestError;
use crate::schema::{CatalogField, RawRecord};

/// Column positions of the product export, header row excluded.
pub const FIXED_COLUMNS: [(usize, CatalogField); 6] = [
    (0, CatalogField::Code),
    (5, CatalogField::Name),
    (6, CatalogField::Color),
    (7, CatalogField::Size),
    (13, CatalogField::Price),
    (16, CatalogField::Image),
];

pub fn read_records(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    if !path.exists() {
        return Err(IngestError::SourceUnavailable {
            source_label: path.display().to_string(),
            reason: "file not found".to_string(),
        });
    }

    let extension =
        path.extension().and_then(|ext| ext.to_str()).unwrap_or_default().to_ascii_lowercase();
    let rows = match extension.as_str() {
        "csv" => read_csv_rows(path)?,
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook_rows(path)?,
        _ => {
            return Err(IngestError::UnsupportedFormat {
                path: path.display().to_string(),
                extension,
            })
        }
    };

    debug!(
        event_name = "catalog.file.read",
        path = %path.display(),
        rows = rows.len(),
        "fixed-column rows read"
    );

    Ok(rows.iter().map(|row| row_to_record(row)).collect())
}

pub fn row_to_record(row: &[String]) -> RawRecord {
    let mut record = RawRecord::default();
    for (position, field) in FIXED_COLUMNS {
        if let Some(value) = row.get(position) {
            record.fields.insert(field, value.clone());
        }
    }
    record
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|error| malformed(path, error.to_string()))?;

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|error| malformed(path, error.to_string()))?;
        rows.push(record.iter().map(|cell| String::from_utf8_lossy(cell).into_owned()).collect());
    }
    Ok(rows)
}

fn read_workbook_rows(path: &Path) -> Result<Vec<Vec<String>>, IngestError> {
    let mut workbook = open_workbook_auto(path).map_err(|error| malformed(path, error.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| malformed(path, "workbook has no worksheet".to_string()))?
        .map_err(|error| malformed(path, error.to_string()))?;

    Ok(range_rows(&range))
}

/// Rows of a worksheet as text, header row excluded.
fn range_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    range.rows().skip(1).map(|row| row.iter().map(cell_text).collect()).collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

fn malformed(path: &Path, reason: String) -> IngestError {
    IngestError::MalformedDocument {
        reason: format!("{}: {reason}", path.display()),
        excerpt: String::new(),
    }
}
