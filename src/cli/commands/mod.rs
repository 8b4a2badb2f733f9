//! Subcommand implementations for the cardpress CLI.

pub mod generate;
pub mod qr;
pub mod shared;
pub mod weblinks;

use crate::cli::args::Commands;
use crate::error::Result;

/// Dispatch a parsed subcommand
pub fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Generate(args) => generate::run_generate(args),
        Commands::Weblinks(args) => weblinks::run_weblinks(args),
        Commands::Qr(args) => qr::run_qr(args),
    }
}
