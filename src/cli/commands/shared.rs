//! Shared components for CLI commands: logging setup and the end-of-run
//! report.

use crate::error::Result;
use crate::models::RunSummary;
use colored::*;

/// Set up structured logging on stderr
///
/// `RUST_LOG` takes precedence; otherwise verbosity follows the command
/// flags (`--verbose` -> debug, `--quiet` -> warnings only).
pub fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cardpress={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
    Ok(())
}

/// Print the user-facing run report
///
/// Always distinguishes full success from partial output, and lists every
/// skipped record with its reason.
pub fn print_summary(summary: &RunSummary) {
    println!();
    if summary.is_partial() {
        println!("{}", "Run completed with partial output".yellow().bold());
    } else {
        println!("{}", "Run completed successfully".green().bold());
    }

    println!(
        "  {} {} of {} row(s) produced cards",
        "Cards:".bold(),
        summary.cards_written,
        summary.rows_read
    );
    println!(
        "  {} {} asset(s), {} page pair(s)",
        "QR codes:".bold(),
        summary.qr_generated,
        summary.page_pairs
    );
    match &summary.manifest_path {
        Some(path) => println!("  {} {}", "Manifest:".bold(), path.display()),
        None => println!("  {} {}", "Manifest:".bold(), "write failed (see log)".red()),
    }
    if let Some(path) = &summary.layout_path {
        println!("  {} {}", "Layout:".bold(), path.display());
    }
    match &summary.document_path {
        Some(path) => println!("  {} {}", "Document:".bold(), path.display()),
        None => println!("  {} {}", "Document:".bold(), "skipped".yellow()),
    }
    println!(
        "  {} {:.2}s",
        "Elapsed:".bold(),
        summary.processing_time.as_secs_f64()
    );

    if !summary.failures.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} record(s) skipped:", summary.failures.len())
                .yellow()
                .bold()
        );
        for failure in &summary.failures {
            println!(
                "  {} {}",
                format!("[{}]", failure.object_id).red(),
                failure.reason
            );
        }
    }
}
