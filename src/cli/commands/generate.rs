//! The generate command: the full card generation pipeline.

use super::shared::{print_summary, setup_logging};
use crate::cli::args::GenerateArgs;
use crate::error::{Error, Result};
use crate::services::page_compositor::PandocCompiler;
use crate::services::pipeline::Pipeline;
use tracing::{debug, info};

/// Run the full pipeline and print the run report
///
/// Zero cards produced is an error (nonzero exit); partial success prints
/// the failure list and exits zero.
pub fn run_generate(args: GenerateArgs) -> Result<()> {
    setup_logging(args.verbose, args.quiet)?;
    debug!("Command line arguments: {:?}", args);

    if !args.input.exists() {
        return Err(Error::data_validation(format!(
            "input file not found: {}",
            args.input.display()
        )));
    }

    let config = args.to_config()?;
    info!(
        "Generating cards from {} into {}",
        args.input.display(),
        config.output_dir.display()
    );

    let compiler = PandocCompiler::new(config.compile_timeout);
    let pipeline = Pipeline::new(&config, &compiler);
    let summary = match pipeline.run(&args.input) {
        Ok(summary) => summary,
        Err(e @ Error::MissingHeaders { .. }) => {
            let mapping_path = config
                .mapping_file
                .clone()
                .unwrap_or_else(|| args.input.with_file_name(crate::constants::MAPPING_FILE_NAME));
            eprintln!();
            eprintln!(
                "The input CSV is missing required columns. If they exist under different"
            );
            eprintln!(
                "names, record the renames in {} as JSON, e.g.:",
                mapping_path.display()
            );
            eprintln!("  {{\"description\": \"Opportunity details\"}}");
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    if !args.quiet {
        print_summary(&summary);
    }
    Ok(())
}
