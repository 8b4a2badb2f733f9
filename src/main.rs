use cardpress::cli::{args::Args, commands};
use clap::Parser;
use std::process;

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show an overview and exit cleanly
    let Some(command) = args.command else {
        show_help_and_commands();
        process::exit(0);
    };

    match commands::run(command) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {error:#}");
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Cardpress - Printable QR Card Generator");
    println!("=======================================");
    println!();
    println!("Convert survey CSV data into a printable deck of double-sided cards,");
    println!("each carrying a QR code linking to a map location.");
    println!();
    println!("USAGE:");
    println!("    cardpress <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    generate    Run the full card generation pipeline (main command)");
    println!("    weblinks    Derive map weblinks from a coordinate CSV");
    println!("    qr          Encode a single string as a QR PNG");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Generate a card deck from a survey export:");
    println!("    cardpress generate --input survey.csv --output output");
    println!();
    println!("    # Check coordinates by deriving weblinks only:");
    println!("    cardpress weblinks --input survey.csv --zoom 18");
    println!();
    println!("    # Encode one URL:");
    println!("    cardpress qr \"https://www.google.com/maps?q=44.97,-93.50&t=k&z=18\" qr.png");
    println!();
    println!("For detailed help on any command, use:");
    println!("    cardpress <COMMAND> --help");
}
