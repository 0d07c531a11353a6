use super::global::align_identity;
use crate::core::io::hhr::HhrAlignment;
use crate::core::models::residue::to_three_letter;
use crate::core::models::structure::{Structure, StructureError};
use std::collections::HashMap;
use tracing::{debug, warn};

const GAP: char = '-';

/// Outcome counters of threading a query onto a template chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadingSummary {
    /// Residues that received a query identity.
    pub threaded: usize,
    /// Threaded residues whose structure identity disagreed with the alignment template.
    pub mismatches: usize,
    /// Aligned columns whose template position could not be placed on the chain.
    pub skipped: usize,
}

/// Maps every ungapped template position of the alignment to a residue number of the chain.
///
/// The alignment numbers template residues contiguously, while the structure may skip
/// residue numbers or carry extra ones. Both sequences are aligned by identity and the
/// correspondence is read from the result; template positions without a structure
/// counterpart map to `None`.
pub fn map_sequence(
    alignment: &HhrAlignment,
    structure: &Structure,
    label: &str,
) -> Result<Vec<Option<isize>>, StructureError> {
    let chain_sequence = structure.sequence(label)?;
    let residue_numbers: Vec<isize> = structure
        .chain(label)
        .map(|chain| chain.residue_numbers().collect())
        .unwrap_or_default();
    let template_sequence = alignment.ungapped_template();

    let global = align_identity(chain_sequence.as_bytes(), template_sequence.as_bytes());
    debug!(
        chain = label,
        identities = global.score,
        structure_len = chain_sequence.len(),
        template_len = template_sequence.len(),
        "Mapped alignment template onto structure chain"
    );

    Ok(global
        .columns
        .iter()
        .filter(|column| column.b.is_some())
        .map(|column| column.a.map(|index| residue_numbers[index]))
        .collect())
}

/// Threads the query of `alignment` onto chain `label` of `structure`.
///
/// Every residue of the chain is first marked removed. Each aligned column without a
/// gap then restores the residue it maps to, with the query's residue type and the
/// query's sequence position as residue number. Residues no column reaches stay removed.
pub fn create_model(
    alignment: &HhrAlignment,
    structure: &mut Structure,
    label: &str,
) -> Result<ThreadingSummary, StructureError> {
    let mapping = map_sequence(alignment, structure, label)?;
    let residues: HashMap<isize, _> = structure
        .chain(label)
        .ok_or_else(|| StructureError::ChainNotFound(label.to_string()))?
        .iter()
        .collect();

    let mut previous: HashMap<isize, Option<String>> = HashMap::new();
    for (&number, &atom_id) in &residues {
        if let Some(atom) = structure.atom_mut(atom_id) {
            previous.insert(number, atom.residue_name.take());
        }
    }

    let mut summary = ThreadingSummary::default();
    let mut template_offset = 0usize;
    for block in &alignment.blocks {
        let mut query_offset: isize = 0;
        for (q, t) in block
            .query
            .sequence
            .chars()
            .zip(block.template.sequence.chars())
        {
            if q != GAP && t != GAP {
                match mapping.get(template_offset).copied().flatten() {
                    Some(number) => match residues.get(&number) {
                        Some(&atom_id) => {
                            let expected = to_three_letter(t);
                            let found = previous.get(&number).cloned().flatten();
                            if found.as_deref() != Some(expected) {
                                warn!(
                                    residue = number,
                                    found = found.as_deref().unwrap_or("-"),
                                    expected,
                                    "Ignoring mismatching template residue"
                                );
                                summary.mismatches += 1;
                            }
                            if let Some(atom) = structure.atom_mut(atom_id) {
                                atom.residue_name = Some(to_three_letter(q).to_string());
                                atom.residue_number = block.query.start + query_offset;
                                summary.threaded += 1;
                            }
                        }
                        None => {
                            warn!(residue = number, "Skipping missing residue");
                            summary.skipped += 1;
                        }
                    },
                    None => summary.skipped += 1,
                }
            }
            if q != GAP {
                query_offset += 1;
            }
            if t != GAP {
                template_offset += 1;
            }
        }
    }

    debug!(
        chain = label,
        threaded = summary.threaded,
        mismatches = summary.mismatches,
        skipped = summary.skipped,
        "Threaded query onto template chain"
    );
    Ok(summary)
}
