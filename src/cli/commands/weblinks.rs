//! The weblinks command: derive map URLs from a coordinate CSV.
//!
//! Copies the input CSV and appends a `WebLink` column, leaving the cell
//! empty for rows whose coordinates do not parse. Useful for checking a
//! dataset's coordinates before a full card run.

use super::shared::setup_logging;
use crate::cli::args::WeblinksArgs;
use crate::error::{Error, Result};
use crate::services::geolink;
use std::path::PathBuf;
use tracing::{info, warn};

/// Derive the default output path `<stem>_with_links.<ext>`
fn default_output(input: &PathBuf) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "weblinks".to_string());
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    input.with_file_name(format!("{stem}_with_links.{extension}"))
}

pub fn run_weblinks(args: WeblinksArgs) -> Result<()> {
    setup_logging(args.verbose, false)?;

    let mut reader = csv::Reader::from_path(&args.input).map_err(|e| {
        Error::csv_parsing(
            args.input.display().to_string(),
            "cannot open input CSV",
            Some(e),
        )
    })?;
    let headers = reader.headers()?.clone();

    let find_column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let x_index = find_column("x").ok_or_else(|| {
        Error::data_validation("input CSV must contain an 'x' column for longitude")
    })?;
    let y_index = find_column("y").ok_or_else(|| {
        Error::data_validation("input CSV must contain a 'y' column for latitude")
    })?;

    let output = args.output.clone().unwrap_or_else(|| default_output(&args.input));
    let mut writer = csv::Writer::from_path(&output).map_err(|e| {
        Error::csv_parsing(output.display().to_string(), "cannot create output CSV", Some(e))
    })?;

    let mut out_headers = headers.clone();
    out_headers.push_field("WebLink");
    writer.write_record(&out_headers)?;

    let mut rows = 0usize;
    let mut skipped = 0usize;
    for (row_number, row) in reader.records().enumerate() {
        let row = row?;
        let lon_raw = row.get(x_index).unwrap_or("");
        let lat_raw = row.get(y_index).unwrap_or("");

        let row_id = (row_number + 2).to_string();
        let weblink = match geolink::parse_coordinates(&row_id, lon_raw, lat_raw)
            .and_then(|(lon, lat)| geolink::link(lon, lat, args.zoom))
        {
            Ok(url) => url,
            Err(e) => {
                warn!("Row {}: {e}", row_number + 2);
                skipped += 1;
                String::new()
            }
        };

        let mut out_row = row.clone();
        out_row.push_field(&weblink);
        writer.write_record(&out_row)?;
        rows += 1;
    }
    writer.flush().map_err(|e| Error::io("flushing output CSV", e))?;

    info!(
        "Wrote {} row(s) to {} ({} without a weblink)",
        rows,
        output.display(),
        skipped
    );
    Ok(())
}
