use super::collaborators::AlignmentRows;
use crate::core::forcefield::scoring::InterfaceResidue;
use crate::core::models::structure::{Structure, StructureError};

/// Template interface residues as occupied by a superposed monomer.
///
/// Each structurally equivalent column of the superposition alignment places the
/// monomer's residue type at the position of the template chain's alpha-carbon. Template
/// residues are walked in ascending residue-number order; columns beyond the end of the
/// chain are ignored.
pub fn interface_residues(
    alignment: &AlignmentRows,
    template: &Structure,
    label: &str,
) -> Result<Vec<InterfaceResidue>, StructureError> {
    let positions = template.alpha_carbon_positions(label)?;
    Ok(alignment
        .equivalences()
        .into_iter()
        .filter_map(|(index, code)| {
            positions
                .get(index)
                .map(|&position| InterfaceResidue::new(code, position))
        })
        .collect())
}
