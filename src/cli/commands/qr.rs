//! The qr command: encode a single string as a QR PNG.

use crate::cli::args::QrArgs;
use crate::error::Result;
use crate::services::qr_assets;

pub fn run_qr(args: QrArgs) -> Result<()> {
    let label = args
        .output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "qr".to_string());
    qr_assets::encode_png(&label, &args.data, &args.output)?;
    println!("QR code saved to: {}", args.output.display());
    Ok(())
}
