use super::collaborators::{BackboneBuilder, CollaboratorError};
use super::config::TemplateConfig;
use super::error::EngineError;
use super::scratch::ScratchSpace;
use crate::core::alignment::threading::create_model;
use crate::core::io::hhr::HhrAlignment;
use crate::core::io::pdb::{PdbError, PdbFile};
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::core::store::{ContentStore, StoreError};
use crate::core::utils::identifiers::{TemplateId, entry_name};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// A rebuilt single-chain model of one query.
#[derive(Debug, Clone)]
pub struct Monomer {
    /// The homology hit whose template chain carries the model.
    pub hit: String,
    /// The full-atom reconstruction on disk, input to superposition.
    pub path: PathBuf,
    pub structure: Structure,
}

/// Copies the deposited structure of a template chain out of the content store.
///
/// Returns `false` when the store holds no entry for the structure.
pub fn retrieve_template(
    store: &ContentStore,
    template: &TemplateId,
    config: &TemplateConfig,
    output: &Path,
) -> Result<bool, StoreError> {
    let entry = entry_name(&config.entry_pattern, &template.code(), None);
    match config.compression.as_deref() {
        Some(suffix) => store.retrieve_compressed(&entry, suffix, output),
        None => store.retrieve(&entry, output),
    }
}

/// Builds the monomer model of one query on the template chain of `hit`.
///
/// The template is threaded with the query alignment, written as an alpha-carbon trace to
/// the scratch slot of `side` and rebuilt by `builder`. A template missing from the
/// store, a chain missing from the template or a failed or unreadable reconstruction
/// yields `None`; malformed template records are errors.
#[instrument(skip_all, name = "build_monomer", fields(hit = hit))]
pub fn build_monomer(
    alignment: &HhrAlignment,
    hit: &str,
    side: usize,
    store: &ContentStore,
    config: &TemplateConfig,
    builder: &dyn BackboneBuilder,
    scratch: &ScratchSpace,
) -> Result<Option<Monomer>, EngineError> {
    info!("Building model with {}", hit);
    let template = TemplateId::parse(hit)?;
    let model_path = scratch.monomer(side);

    if !retrieve_template(store, &template, config, &model_path)? {
        warn!(template = %template, "Template not found in database");
        return Ok(None);
    }
    let mut structure = PdbFile::read_from_path(&model_path)?;
    let label = template.chain();
    if !structure.has_chain(&label) {
        warn!(template = %template, chain = %label, "Chain not found in template");
        return Ok(None);
    }

    create_model(alignment, &mut structure, &label)?;
    PdbFile::write_chain_to_path(&structure, &label, &model_path)?;

    let rebuilt = match builder.rebuild(&model_path) {
        Ok(path) => path,
        Err(e) => {
            warn!(template = %template, error = %e, "Backbone reconstruction failed");
            return Ok(None);
        }
    };
    let structure = match PdbFile::read_from_path(&rebuilt) {
        Ok(structure) => structure,
        Err(PdbError::Io(e)) => return Err(e.into()),
        Err(e) => {
            let e = CollaboratorError::MalformedOutput {
                tool: builder.name(),
                reason: format!("{}: {}", rebuilt.display(), e),
            };
            warn!(template = %template, error = %e, "Backbone reconstruction failed");
            return Ok(None);
        }
    };
    Ok(Some(Monomer {
        hit: hit.to_string(),
        path: rebuilt,
        structure,
    }))
}
