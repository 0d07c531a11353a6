use crate::core::forcefield::potential::InterfacePotential;
use crate::core::forcefield::scoring::InterfaceScorer;
use crate::core::io::crossref::CrossReference;
use crate::core::io::hhr::{HhrAlignment, TemplateHits};
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::{StructureFile, WriteOptions};
use crate::core::models::structure::Structure;
use crate::core::store::{ContentStore, StorePaths};
use crate::core::utils::geometry::AffineTransform;
use crate::core::utils::identifiers::TemplateId;
use crate::engine::collaborators::{BackboneBuilder, CollaboratorError, Superposer};
use crate::engine::config::{AssemblyConfig, AssemblyPolicy, MonomerMode, OutputFrame};
use crate::engine::error::EngineError;
use crate::engine::interface::interface_residues;
use crate::engine::monomer::{Monomer, build_monomer, retrieve_template};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scratch::ScratchSpace;
use crate::engine::search::{TemplateCandidate, enumerate_candidates};
use crate::engine::state::{ComplexModel, ScoredCandidate, SearchState};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const CORE_CHAIN_TAG: &str = "0";
const PARTNER_CHAIN_TAG: &str = "1";

/// Data shared by every assembly run, loaded once.
#[derive(Debug)]
pub struct AssemblyResources {
    pub store: ContentStore,
    pub cross_reference: CrossReference,
    pub potential: InterfacePotential,
}

impl AssemblyResources {
    pub fn load(config: &AssemblyConfig) -> Result<Self, EngineError> {
        let data = &config.data;
        let store = ContentStore::open(StorePaths::new(&data.index_path, &data.data_path))?;
        let cross_reference =
            CrossReference::read_from_path(&data.cross_reference_path, config.search.all_partners)?;
        let potential = InterfacePotential::load(&data.potential_path)?;
        info!(
            templates = store.len(),
            interactions = cross_reference.interaction_count(),
            "Loaded assembly resources"
        );
        Ok(Self {
            store,
            cross_reference,
            potential,
        })
    }
}

/// The external tools used by a run.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub superposer: &'a dyn Superposer,
    pub builder: &'a dyn BackboneBuilder,
}

/// Inputs of one assembly: the two homology search results and the model to write.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    pub a_hhr: PathBuf,
    pub b_hhr: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AssemblyReport {
    /// The accepted candidate with the highest spring score, if any qualified.
    pub best: Option<ScoredCandidate>,
    /// Every scored candidate in evaluation order.
    pub evaluated: Vec<ScoredCandidate>,
    /// The written model, present whenever `best` is.
    pub output: Option<PathBuf>,
}

struct AssemblyContext<'a> {
    resources: &'a AssemblyResources,
    config: &'a AssemblyConfig,
    collaborators: Collaborators<'a>,
    scratch: &'a ScratchSpace,
    reporter: &'a ProgressReporter<'a>,
    scorer: InterfaceScorer<'a>,
}

/// What became of a template pair after its assemblies were scanned.
enum Outcome {
    Scored,
    Unusable,
}

#[instrument(skip_all, name = "assembly_workflow")]
pub fn run(
    request: &AssemblyRequest,
    resources: &AssemblyResources,
    config: &AssemblyConfig,
    collaborators: Collaborators,
    reporter: &ProgressReporter,
) -> Result<AssemblyReport, EngineError> {
    let scratch = ScratchSpace::new()?;
    run_in(request, resources, config, collaborators, reporter, &scratch)
}

/// Runs an assembly using a caller-provided scratch space.
pub fn run_in(
    request: &AssemblyRequest,
    resources: &AssemblyResources,
    config: &AssemblyConfig,
    collaborators: Collaborators,
    reporter: &ProgressReporter,
    scratch: &ScratchSpace,
) -> Result<AssemblyReport, EngineError> {
    info!(
        a = %request.a_hhr.display(),
        b = %request.b_hhr.display(),
        "Starting complex assembly"
    );
    let context = AssemblyContext {
        resources,
        config,
        collaborators,
        scratch,
        reporter,
        scorer: InterfaceScorer::new(&resources.potential),
    };

    reporter.report(Progress::PhaseStart {
        name: "Reading Homology Hits",
    });
    let a_hits = TemplateHits::read_from_path(&request.a_hhr, config.hits.min_score, config.hits.top_hits)?;
    let b_hits = TemplateHits::read_from_path(&request.b_hhr, config.hits.min_score, config.hits.top_hits)?;
    let candidates = enumerate_candidates(
        &a_hits,
        &b_hits,
        &resources.cross_reference,
        config.search.min_score,
        config.search.max_tries,
    );
    reporter.report(Progress::PhaseFinish);

    let mut state = SearchState::new(config.search.max_clashes);
    match config.search.monomer_mode {
        MonomerMode::TopHitOnly => {
            let core = build_top_monomer(&context, &request.a_hhr, &a_hits, 0)?;
            let partner = build_top_monomer(&context, &request.b_hhr, &b_hits, 1)?;
            evaluate_candidates(&context, &candidates, [&core, &partner], &mut state)?;
        }
        MonomerMode::IterateTopHits => {
            iterate_top_hits(&context, request, [&a_hits, &b_hits], &candidates, &mut state)?;
        }
    }

    let (best, evaluated) = state.into_parts();
    let Some((best, model)) = best else {
        warn!(evaluated = evaluated.len(), "Failed to determine a complex model");
        return Ok(AssemblyReport {
            best: None,
            evaluated,
            output: None,
        });
    };

    write_model(&model, &request.output, config.templates.show_template)?;
    info!(
        core = %best.core_template,
        partner = %best.partner_template,
        spring_score = best.spring_score,
        tmscore = best.tmscore,
        energy = best.energy,
        clashes = best.clashes,
        homology_score = best.homology_score,
        output = %request.output.display(),
        "Final model written"
    );
    Ok(AssemblyReport {
        best: Some(best),
        evaluated,
        output: Some(request.output.clone()),
    })
}

/// Writes the evaluated candidates as CSV, one row per candidate.
pub fn write_report_csv(evaluated: &[ScoredCandidate], path: &Path) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for candidate in evaluated {
        writer.serialize(candidate)?;
    }
    writer.flush()?;
    Ok(())
}

fn build_top_monomer(
    context: &AssemblyContext,
    hhr: &Path,
    hits: &TemplateHits,
    side: usize,
) -> Result<Monomer, EngineError> {
    let failed = || EngineError::MonomerFailed {
        query: hhr.display().to_string(),
    };
    let Some(top) = hits.top().first() else {
        warn!(query = %hhr.display(), "No homology hits above threshold");
        return Err(failed());
    };
    let alignment = HhrAlignment::read_from_path(hhr)?;
    build(context, &alignment, top, side)?.ok_or_else(failed)
}

fn iterate_top_hits(
    context: &AssemblyContext,
    request: &AssemblyRequest,
    hits: [&TemplateHits; 2],
    candidates: &[TemplateCandidate],
    state: &mut SearchState,
) -> Result<(), EngineError> {
    if hits[0].top().is_empty() || hits[1].top().is_empty() {
        warn!("No homology hits above threshold for one of the queries");
        return Ok(());
    }
    let a_alignment = HhrAlignment::read_from_path(&request.a_hhr)?;
    let b_alignment = HhrAlignment::read_from_path(&request.b_hhr)?;

    for a_top in hits[0].top() {
        let Some(core) = build(context, &a_alignment, a_top, 0)? else {
            warn!(query = %request.a_hhr.display(), hit = %a_top, "Failed to determine monomer model");
            continue;
        };
        for b_top in hits[1].top() {
            let Some(partner) = build(context, &b_alignment, b_top, 1)? else {
                warn!(query = %request.b_hhr.display(), hit = %b_top, "Failed to determine monomer model");
                continue;
            };
            evaluate_candidates(context, candidates, [&core, &partner], state)?;
        }
    }
    Ok(())
}

fn build(
    context: &AssemblyContext,
    alignment: &HhrAlignment,
    hit: &str,
    side: usize,
) -> Result<Option<Monomer>, EngineError> {
    context.reporter.report(Progress::PhaseStart {
        name: "Building Monomer",
    });
    let monomer = build_monomer(
        alignment,
        hit,
        side,
        &context.resources.store,
        &context.config.templates,
        context.collaborators.builder,
        context.scratch,
    );
    context.reporter.report(Progress::PhaseFinish);
    match monomer {
        Err(e) if e.is_entry_fault() => {
            warn!(hit, error = %e, "Skipping malformed monomer template");
            Ok(None)
        }
        other => other,
    }
}

#[instrument(skip_all, name = "candidate_search", fields(candidates = candidates.len()))]
fn evaluate_candidates(
    context: &AssemblyContext,
    candidates: &[TemplateCandidate],
    monomers: [&Monomer; 2],
    state: &mut SearchState,
) -> Result<(), EngineError> {
    let reporter = context.reporter;
    reporter.report(Progress::PhaseStart {
        name: "Evaluating Templates",
    });
    reporter.report(Progress::CandidateStart {
        total: candidates.len() as u64,
    });

    for candidate in candidates {
        info!(
            core = %candidate.templates[0],
            partner = %candidate.templates[1],
            "Evaluating complex template"
        );
        match evaluate_candidate(context, candidate, monomers, state) {
            Ok(Outcome::Scored) => {}
            Ok(Outcome::Unusable) => warn!(
                core = %candidate.templates[0],
                partner = %candidate.templates[1],
                "Skipping unusable template pair"
            ),
            Err(e) if e.is_entry_fault() => warn!(
                core = %candidate.templates[0],
                partner = %candidate.templates[1],
                error = %e,
                "Skipping malformed template pair"
            ),
            Err(e) => return Err(e),
        }
        reporter.report(Progress::CandidateEvaluated);
    }

    reporter.report(Progress::CandidateFinish);
    reporter.report(Progress::PhaseFinish);
    Ok(())
}

fn evaluate_candidate(
    context: &AssemblyContext,
    candidate: &TemplateCandidate,
    monomers: [&Monomer; 2],
    state: &mut SearchState,
) -> Result<Outcome, EngineError> {
    let core_id = TemplateId::parse(&candidate.templates[0])?;
    let partner_id = TemplateId::parse(&candidate.templates[1])?;

    let template_path = context.scratch.template();
    if !retrieve_template(
        &context.resources.store,
        &core_id,
        &context.config.templates,
        &template_path,
    )? {
        warn!(template = %core_id, "Template not found in database");
        return Ok(Outcome::Unusable);
    }
    let template = PdbFile::read_from_path(&template_path)?;

    let core_label = core_id.chain();
    let mut partner_label = partner_id.chain();
    if core_label == partner_label {
        partner_label = format!("{}_0", partner_label);
    }
    let labels = [core_label.as_str(), partner_label.as_str()];

    let biomolecules: Vec<u32> = template.biomolecule_ids().collect();
    for biomolecule in biomolecules {
        let unit = template.create_unit(biomolecule)?;
        let qualifies = unit.chain_count() > 1 && labels.iter().all(|label| unit.has_chain(label));
        if !qualifies {
            continue;
        }
        info!(biomolecule, "Evaluating biomolecule");

        let scored = score_assembly(context, candidate, biomolecule, &unit, labels, monomers, state)?;

        match context.config.search.assembly_policy {
            AssemblyPolicy::FirstQualifying => {
                return Ok(if scored { Outcome::Scored } else { Outcome::Unusable });
            }
            AssemblyPolicy::UntilScored if scored => return Ok(Outcome::Scored),
            AssemblyPolicy::UntilScored => {}
        }
    }
    Ok(Outcome::Unusable)
}

/// Superposes both monomers onto one assembly, scores the complex and offers it to the search.
///
/// Returns `false` when an external tool failed and the assembly could not be scored.
fn score_assembly(
    context: &AssemblyContext,
    candidate: &TemplateCandidate,
    biomolecule: u32,
    unit: &Structure,
    labels: [&str; 2],
    monomers: [&Monomer; 2],
    state: &mut SearchState,
) -> Result<bool, EngineError> {
    let scratch = context.scratch;
    let superposer = context.collaborators.superposer;
    let search = &context.config.search;
    let tool_failed = |e: CollaboratorError| {
        warn!(
            core = %candidate.templates[0],
            partner = %candidate.templates[1],
            biomolecule,
            error = %e,
            "Structural superposition failed"
        );
        false
    };

    let mut superpositions = Vec::with_capacity(2);
    let mut interfaces = Vec::with_capacity(2);
    for side in 0..2 {
        let target = scratch.template_chain(side);
        PdbFile::write_chain_to_path(unit, labels[side], &target)?;
        let superposition = match superposer.superpose(&monomers[side].path, &target, scratch) {
            Ok(superposition) => superposition,
            Err(e) => return Ok(tool_failed(e)),
        };
        interfaces.push(interface_residues(&superposition.alignment, unit, labels[side])?);
        superpositions.push(superposition);
    }

    let mut core = monomers[0].structure.clone();
    core.transform(&superpositions[0].transform);
    let mut partner = monomers[1].structure.clone();
    partner.transform(&superpositions[1].transform);

    let tmscore = superpositions[0].score.min(superpositions[1].score);
    let energy = -context.scorer.energy(&interfaces[0], &interfaces[1]);
    let clashes = context
        .scorer
        .clash_fraction(&core, &partner, search.clash_distance);
    let spring_score = tmscore + energy * search.energy_weight;

    info!(
        core = %candidate.templates[0],
        partner = %candidate.templates[1],
        biomolecule,
        homology_score = candidate.score,
        tmscore,
        energy,
        clashes,
        spring_score,
        "Scored template pair"
    );

    // Re-expressing the model in the monomer frame needs a reverse superposition,
    // which is only run for candidates that will be kept.
    let mut frame = AffineTransform::identity();
    if context.config.templates.output_frame == OutputFrame::Monomer
        && state.improves(spring_score, clashes)
    {
        match superposer.superpose(&scratch.template_chain(0), &monomers[0].path, scratch) {
            Ok(reverse) => frame = reverse.transform,
            Err(e) => return Ok(tool_failed(e)),
        }
    }

    let scored = ScoredCandidate {
        core_template: candidate.templates[0].clone(),
        partner_template: candidate.templates[1].clone(),
        core_hit: monomers[0].hit.clone(),
        partner_hit: monomers[1].hit.clone(),
        biomolecule,
        homology_score: candidate.score,
        core_tmscore: superpositions[0].score,
        partner_tmscore: superpositions[1].score,
        tmscore,
        energy,
        clashes,
        spring_score,
        accepted: false,
    };
    let accepted = state.offer(scored, || {
        let mut model = ComplexModel {
            core,
            partner,
            template: unit.clone(),
        };
        model.core.transform(&frame);
        model.partner.transform(&frame);
        model.template.transform(&frame);
        model
    });
    if !accepted {
        debug!(spring_score, clashes, "Candidate does not improve the current model");
    }
    Ok(true)
}

fn write_model(model: &ComplexModel, output: &Path, show_template: bool) -> Result<(), EngineError> {
    let core = WriteOptions::default().with_chain(CORE_CHAIN_TAG);
    PdbFile::write_to_path(&model.core, &core, output)?;
    let partner = WriteOptions::default().appending().with_chain(PARTNER_CHAIN_TAG);
    PdbFile::write_to_path(&model.partner, &partner, output)?;
    if show_template {
        PdbFile::write_to_path(&model.template, &WriteOptions::default().appending(), output)?;
    }
    Ok(())
}
