//! QR asset generation and the asset manifest.
//!
//! Encodes record weblinks as PNG images named deterministically by record
//! identifier, then records every asset in a CSV manifest as an audit trail.
//! Error-correction level M is fixed so printed cards survive scan
//! degradation; capacity overflow is a hard per-record error, never a
//! silent truncation.

use crate::constants::{MANIFEST_FILE_NAME, QR_MODULE_PIXELS, qr_file_name};
use crate::error::{Error, Result};
use crate::models::QrAsset;
use image::Luma;
use qrcode::{EcLevel, QrCode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Encode data into a PNG QR symbol at the fixed error-correction level M
///
/// Fails when the payload exceeds symbol capacity; never truncates.
pub fn encode_png(object_id: &str, data: &str, path: &Path) -> Result<()> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| Error::encoding(object_id, e.to_string()))?;

    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(QR_MODULE_PIXELS, QR_MODULE_PIXELS)
        .quiet_zone(true)
        .build();

    image
        .save(path)
        .map_err(|e| Error::image(object_id, e.to_string()))?;
    Ok(())
}

/// Generates QR assets into a fixed output directory
#[derive(Debug)]
pub struct QrAssetGenerator {
    output_dir: PathBuf,
}

impl QrAssetGenerator {
    /// Create a generator, creating the output directory if needed
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| {
            Error::io(
                format!("creating QR directory {}", output_dir.display()),
                e,
            )
        })?;
        Ok(Self { output_dir })
    }

    /// Encode a weblink into a PNG asset for one record
    ///
    /// The file name is a function of `object_id` only, so re-running the
    /// pipeline on an unchanged dataset overwrites in place.
    pub fn generate(&self, object_id: &str, url: &str) -> Result<QrAsset> {
        let file_path = self.output_dir.join(qr_file_name(object_id));
        encode_png(object_id, url, &file_path)?;
        debug!("QR asset written: {}", file_path.display());
        Ok(QrAsset {
            object_id: object_id.to_string(),
            file_path,
            source_url: url.to_string(),
        })
    }

    /// Write the asset manifest, one row per asset in the order given
    ///
    /// The caller passes assets in first-seen input order; this function
    /// preserves that order. A manifest failure leaves the already-written
    /// image assets untouched.
    pub fn write_manifest(&self, assets: &[QrAsset]) -> Result<PathBuf> {
        let manifest_path = self.output_dir.join(MANIFEST_FILE_NAME);
        let mut writer = csv::Writer::from_path(&manifest_path).map_err(|e| {
            Error::csv_parsing(
                manifest_path.display().to_string(),
                "cannot create manifest",
                Some(e),
            )
        })?;

        writer.write_record(["object_id", "file_path", "source_url"])?;
        for asset in assets {
            let file_path = asset.file_path.display().to_string();
            writer.write_record([
                asset.object_id.as_str(),
                file_path.as_str(),
                asset.source_url.as_str(),
            ])?;
        }
        writer
            .flush()
            .map_err(|e| Error::io("flushing manifest", e))?;

        info!(
            "Manifest written with {} asset(s): {}",
            assets.len(),
            manifest_path.display()
        );
        Ok(manifest_path)
    }
}
