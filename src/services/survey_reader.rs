//! Survey CSV reading through a resolved header mapping.
//!
//! Turns raw CSV rows into typed [`Record`]s. Structural problems (file
//! access, malformed CSV, duplicate identifiers) are fatal; a single row's
//! bad coordinates are collected as a [`RecordFailure`] and the row skipped,
//! so the rest of the dataset still produces cards.

use crate::error::{Error, Result};
use crate::models::{Record, RecordFailure};
use crate::services::geolink;
use crate::services::schema_resolver::{CanonicalField, HeaderMapping};
use csv::StringRecord;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Read just the header row of the input CSV, for schema resolution
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        Error::csv_parsing(path.display().to_string(), "cannot open input CSV", Some(e))
    })?;
    let headers = reader.headers().map_err(|e| {
        Error::csv_parsing(path.display().to_string(), "cannot read header row", Some(e))
    })?;
    Ok(headers.iter().map(str::to_string).collect())
}

/// Read all data rows into records, in input order
///
/// Returns the successfully parsed records plus the per-row failures for
/// rows with unparseable coordinates. Duplicate or empty `object_id` values
/// violate the dataset invariant and are fatal.
pub fn read_records(
    path: &Path,
    mapping: &HeaderMapping,
) -> Result<(Vec<Record>, Vec<RecordFailure>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| {
            Error::csv_parsing(path.display().to_string(), "cannot open input CSV", Some(e))
        })?;

    let headers = reader.headers().map_err(|e| {
        Error::csv_parsing(path.display().to_string(), "cannot read header row", Some(e))
    })?;
    let columns = ColumnIndex::build(headers, mapping, path)?;

    let mut records = Vec::new();
    let mut failures = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (row_number, row) in reader.records().enumerate() {
        // Line number in the file, counting the header row
        let line = row_number + 2;
        let row = row.map_err(|e| {
            Error::csv_parsing(
                path.display().to_string(),
                format!("malformed data row {line}"),
                Some(e),
            )
        })?;

        let object_id = columns.cell(&row, CanonicalField::ObjectId).to_string();
        if object_id.is_empty() {
            return Err(Error::data_validation(format!(
                "row {line} has an empty identifier"
            )));
        }
        if !seen_ids.insert(object_id.clone()) {
            return Err(Error::data_validation(format!(
                "duplicate identifier '{object_id}' in input dataset"
            )));
        }

        let lon_raw = columns.cell(&row, CanonicalField::Longitude);
        let lat_raw = columns.cell(&row, CanonicalField::Latitude);
        let (longitude, latitude) = match geolink::parse_coordinates(&object_id, lon_raw, lat_raw)
        {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Skipping record '{}': {}", object_id, e);
                failures.push(RecordFailure::new(line, &object_id, e.to_string()));
                continue;
            }
        };

        records.push(Record {
            row: line,
            object_id: object_id.clone(),
            name: columns.cell(&row, CanonicalField::Name).to_string(),
            organization: columns.cell(&row, CanonicalField::Organization).to_string(),
            description: columns.cell(&row, CanonicalField::Description).to_string(),
            feasibility: columns.cell(&row, CanonicalField::Feasibility).to_string(),
            difficulty_score: parse_difficulty(
                &object_id,
                columns.cell(&row, CanonicalField::DifficultyScore),
            ),
            smooth_aspects: columns.cell(&row, CanonicalField::SmoothAspects).to_string(),
            challenges: columns.cell(&row, CanonicalField::Challenges).to_string(),
            funders: columns.cell(&row, CanonicalField::Funders).to_string(),
            longitude,
            latitude,
        });
    }

    debug!(
        "Read {} record(s), {} skipped from {}",
        records.len(),
        failures.len(),
        path.display()
    );
    Ok((records, failures))
}

/// Pre-computed column positions for each canonical field
struct ColumnIndex {
    positions: Vec<(CanonicalField, usize)>,
}

impl ColumnIndex {
    fn build(headers: &StringRecord, mapping: &HeaderMapping, path: &Path) -> Result<Self> {
        let mut positions = Vec::new();
        for &field in CanonicalField::all() {
            let column = mapping.column(field);
            let position = headers.iter().position(|h| h == column).ok_or_else(|| {
                Error::csv_parsing(
                    path.display().to_string(),
                    format!("resolved column '{column}' vanished from the header row"),
                    None,
                )
            })?;
            positions.push((field, position));
        }
        Ok(Self { positions })
    }

    fn cell<'r>(&self, row: &'r StringRecord, field: CanonicalField) -> &'r str {
        self.positions
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, idx)| row.get(*idx))
            .unwrap_or("")
            .trim()
    }
}

/// Parse the ordinal difficulty score; absent or unparseable values are
/// logged and treated as missing rather than failing the row
fn parse_difficulty(object_id: &str, raw: &str) -> Option<u8> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u8>() {
        Ok(score) if (1..=5).contains(&score) => Some(score),
        _ => {
            warn!(
                "Record '{}': difficulty score {:?} is not an integer 1-5, ignoring",
                object_id, raw
            );
            None
        }
    }
}
