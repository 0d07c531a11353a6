use crate::cli::ModelArgs;
use crate::config::PartialAssemblyConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use springpp::{
    engine::{collaborators::ExternalTools, progress::ProgressReporter},
    workflows::assemble::{self, AssemblyReport, AssemblyRequest, AssemblyResources, Collaborators},
};
use tracing::{info, warn};

pub fn run(args: ModelArgs, quiet: bool) -> Result<()> {
    let partial_config = PartialAssemblyConfig::load(args.assembly.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args.assembly)?;

    info!("Loading template store, cross-reference and potential...");
    let resources = AssemblyResources::load(&config)?;
    let tools = ExternalTools::from_config(&config.tools);
    let collaborators = Collaborators {
        superposer: &tools.superposer,
        builder: &tools.builder,
    };

    let progress_handler = CliProgressHandler::for_output(quiet);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let request = AssemblyRequest {
        a_hhr: args.a_hhr,
        b_hhr: args.b_hhr,
        output: args.output,
    };

    println!("Starting complex assembly...");
    let report = assemble::run(&request, &resources, &config, collaborators, &reporter)?;

    if let Some(path) = &args.report {
        info!("Writing candidate report to {:?}", path);
        assemble::write_report_csv(&report.evaluated, path).map_err(|e| CliError::Report {
            path: path.clone(),
            source: e.into(),
        })?;
    }

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &AssemblyReport) {
    match (&report.best, &report.output) {
        (Some(best), Some(output)) => {
            println!(
                "✓ Best model ({} / {}, biomolecule {}) written to: {}",
                best.core_template,
                best.partner_template,
                best.biomolecule,
                output.display()
            );
            println!(
                "  Spring score {:.4}  TM-score {:.4}  Energy {:.4}  Clashes {:.4}",
                best.spring_score, best.tmscore, best.energy, best.clashes
            );
        }
        _ => {
            warn!("Assembly completed but no template pair qualified.");
            println!(
                "Warning: SPRING evaluated {} template pair(s) but none qualified; no model was written.",
                report.evaluated.len()
            );
        }
    }
}
