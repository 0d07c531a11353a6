use crate::cli::BatchArgs;
use crate::config::PartialAssemblyConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use springpp::{
    core::store::{ContentStore, StorePaths},
    engine::{
        collaborators::ExternalTools, error::EngineError, progress::ProgressReporter,
        scratch::ScratchSpace,
    },
    workflows::assemble::{self, AssemblyRequest, AssemblyResources, Collaborators},
};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Tally of a batch run.
#[derive(Debug, Default, PartialEq, Eq)]
struct BatchSummary {
    modeled: usize,
    unqualified: usize,
    failed: usize,
    missing: usize,
}

pub fn run(args: BatchArgs, quiet: bool) -> Result<()> {
    let partial_config = PartialAssemblyConfig::load(args.assembly.config.as_deref())?;
    let config = partial_config.merge_with_cli(&args.assembly)?;

    info!("Loading template store, cross-reference and potential...");
    let resources = AssemblyResources::load(&config)?;
    let hhr_store = ContentStore::open(StorePaths::new(&args.hhr_index, &args.hhr_data))?;
    let tools = ExternalTools::from_config(&config.tools);
    let collaborators = Collaborators {
        superposer: &tools.superposer,
        builder: &tools.builder,
    };

    let pairs = read_pairs(&args.pairs)?;
    info!("Read {} pair(s) from {:?}", pairs.len(), &args.pairs);
    fs::create_dir_all(&args.output_dir)?;

    let progress_handler = CliProgressHandler::for_output(quiet);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let inputs = ScratchSpace::new()?;
    let mut summary = BatchSummary::default();

    for (a, b) in &pairs {
        let a_hhr = inputs.file(a);
        let b_hhr = inputs.file(b);
        if !retrieve_entry(&hhr_store, a, &a_hhr)? || !retrieve_entry(&hhr_store, b, &b_hhr)? {
            summary.missing += 1;
            continue;
        }

        let request = AssemblyRequest {
            a_hhr,
            b_hhr,
            output: model_path(&args.output_dir, a, b),
        };
        println!("Modeling {} / {}...", a, b);
        match assemble::run(&request, &resources, &config, collaborators, &reporter) {
            Ok(report) if report.best.is_some() => summary.modeled += 1,
            Ok(_) => summary.unqualified += 1,
            Err(EngineError::MonomerFailed { query }) => {
                warn!(query = %query, "Failed to determine monomer model");
                summary.failed += 1;
            }
            Err(e) if e.is_entry_fault() => {
                warn!(a = %a, b = %b, error = %e, "Skipping pair");
                summary.failed += 1;
            }
            Err(e) => return Err(e.into()),
        }

        for path in [&request.a_hhr, &request.b_hhr] {
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove retrieved entry");
            }
        }
    }

    println!(
        "✓ {} model(s) written to {}; {} pair(s) without a qualifying template, {} with failed monomers, {} with missing entries.",
        summary.modeled,
        args.output_dir.display(),
        summary.unqualified,
        summary.failed,
        summary.missing
    );
    Ok(())
}

fn retrieve_entry(store: &ContentStore, identifier: &str, output: &Path) -> Result<bool> {
    let found = store.retrieve(identifier, output)?;
    if !found {
        warn!(identifier, "Failed to retrieve entry");
        println!("Failed to retrieve entry {}.", identifier);
    }
    Ok(found)
}

/// Output location of the model for one pair: `<dir>/<a>.<b>.pdb`.
fn model_path(output_dir: &Path, a: &str, b: &str) -> PathBuf {
    output_dir.join(format!("{}.{}.pdb", a, b))
}

/// Reads an interaction table: the first two columns of every non-blank line.
///
/// Identifiers name files in the output and scratch directories, so each must be a
/// single plain path component.
fn read_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let content = fs::read_to_string(path)?;
    let parse_error = |number: usize, message: String| CliError::FileParsing {
        path: path.to_path_buf(),
        source: anyhow::anyhow!("line {}: {}", number + 1, message),
    };
    let mut pairs = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let mut columns = line.split_whitespace();
        let Some(a) = columns.next() else {
            continue;
        };
        let Some(b) = columns.next() else {
            return Err(parse_error(number, "expected two identifiers".to_string()));
        };
        if let Some(invalid) = [a, b].into_iter().find(|id| !is_plain_identifier(id)) {
            return Err(parse_error(number, format!("'{}' is not a plain file name", invalid)));
        }
        pairs.push((a.to_string(), b.to_string()));
    }
    Ok(pairs)
}

fn is_plain_identifier(identifier: &str) -> bool {
    let mut components = Path::new(identifier).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    single_normal && !identifier.contains(['/', '\\'])
}
