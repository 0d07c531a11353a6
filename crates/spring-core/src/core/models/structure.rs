use super::atom::Atom;
use super::chain::Chain;
use super::ids::AtomId;
use super::residue::to_one_letter;
use crate::core::utils::geometry::AffineTransform;
use nalgebra::Point3;
use slotmap::SlotMap;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Biomolecule id of the deposited asymmetric unit.
pub const ASYMMETRIC_UNIT: u32 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("Chain identifier not found: '{0}'")]
    ChainNotFound(String),
    #[error("Biomolecule {0} is not defined")]
    UnknownBiomolecule(u32),
    #[error("Biomolecule id 0 is reserved for the asymmetric unit")]
    ReservedBiomolecule,
}

/// One symmetry operation of a biological assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryOperator {
    /// Chain labels the operator applies to, in the order they were listed.
    pub chains: Vec<String>,
    pub transform: AffineTransform,
}

/// A parsed structure record.
///
/// Atoms are stored once in a slot map and kept in file order for serialization; chains
/// index the alpha-carbon of each residue. Biomolecule `0` always exists and denotes the
/// coordinates as deposited.
#[derive(Debug, Clone)]
pub struct Structure {
    atoms: SlotMap<AtomId, Atom>,
    atom_order: Vec<AtomId>,
    chains: BTreeMap<String, Chain>,
    biomolecules: BTreeMap<u32, Vec<SymmetryOperator>>,
}

impl Default for Structure {
    fn default() -> Self {
        Self::new()
    }
}

impl Structure {
    pub fn new() -> Self {
        let mut biomolecules = BTreeMap::new();
        biomolecules.insert(ASYMMETRIC_UNIT, Vec::new());
        Self {
            atoms: SlotMap::with_key(),
            atom_order: Vec::new(),
            chains: BTreeMap::new(),
            biomolecules,
        }
    }

    /// Adds an atom to the structure.
    ///
    /// Every atom registers its chain; only alpha-carbons populate the chain's residue
    /// index, so chains seen only through other atoms stay empty until pruned.
    pub fn add_atom(&mut self, atom: Atom) -> AtomId {
        let label = atom.chain.clone();
        let residue_number = atom.residue_number;
        let is_alpha_carbon = atom.is_alpha_carbon();

        let atom_id = self.atoms.insert(atom);
        self.atom_order.push(atom_id);

        let chain = self
            .chains
            .entry(label.clone())
            .or_insert_with(|| Chain::new(&label));
        if is_alpha_carbon {
            chain.insert(residue_number, atom_id);
        }
        atom_id
    }

    /// Removes chains without any alpha-carbon and returns how many were dropped.
    pub fn prune_empty_chains(&mut self) -> usize {
        let before = self.chains.len();
        self.chains.retain(|_, chain| !chain.is_empty());
        before - self.chains.len()
    }

    pub fn add_operator(
        &mut self,
        biomolecule: u32,
        operator: SymmetryOperator,
    ) -> Result<(), StructureError> {
        if biomolecule == ASYMMETRIC_UNIT {
            return Err(StructureError::ReservedBiomolecule);
        }
        self.biomolecules
            .entry(biomolecule)
            .or_default()
            .push(operator);
        Ok(())
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Iterates over all atoms in the order they were added.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> + '_ {
        self.atom_order.iter().filter_map(|&id| self.atoms.get(id))
    }

    pub fn atom_count(&self) -> usize {
        self.atom_order.len()
    }

    pub fn chain(&self, label: &str) -> Option<&Chain> {
        self.chains.get(label)
    }

    pub fn has_chain(&self, label: &str) -> bool {
        self.chains.contains_key(label)
    }

    pub fn chains(&self) -> impl Iterator<Item = &Chain> + '_ {
        self.chains.values()
    }

    pub fn chain_labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.chains.keys().map(String::as_str)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// The chain with the lexicographically smallest label.
    pub fn first_chain(&self) -> Option<&Chain> {
        self.chains.values().next()
    }

    pub fn biomolecule_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.biomolecules.keys().copied()
    }

    pub fn operators(&self, biomolecule: u32) -> Option<&[SymmetryOperator]> {
        self.biomolecules.get(&biomolecule).map(Vec::as_slice)
    }

    /// The alpha-carbon atoms of a chain in ascending residue-number order.
    pub fn alpha_carbons<'a>(&'a self, chain: &'a Chain) -> impl Iterator<Item = &'a Atom> + 'a {
        chain.iter().filter_map(move |(_, id)| self.atoms.get(id))
    }

    pub fn alpha_carbon_positions(&self, label: &str) -> Result<Vec<Point3<f64>>, StructureError> {
        let chain = self.require_chain(label)?;
        Ok(self.alpha_carbons(chain).map(|atom| atom.position).collect())
    }

    /// The one-letter sequence of a chain in ascending residue-number order.
    ///
    /// Removed and non-canonical residues contribute `X`.
    pub fn sequence(&self, label: &str) -> Result<String, StructureError> {
        let chain = self.require_chain(label)?;
        Ok(self
            .alpha_carbons(chain)
            .map(|atom| atom.residue_name.as_deref().map_or('X', to_one_letter))
            .collect())
    }

    /// Applies a transform to every atom of the structure in place.
    pub fn transform(&mut self, transform: &AffineTransform) {
        for atom in self.atoms.values_mut() {
            atom.position = transform.apply(&atom.position);
        }
    }

    /// Expands a biological assembly.
    ///
    /// Biomolecule `0` is the structure itself. Any other id produces a new structure
    /// holding transformed copies of the alpha-carbons of every listed chain, in operator
    /// order. The first copy of a chain keeps its label; later copies are labeled
    /// `<label>_0`, `<label>_1`, and so on. Listed chains absent from this structure are
    /// skipped.
    pub fn create_unit(&self, biomolecule: u32) -> Result<Cow<'_, Structure>, StructureError> {
        if biomolecule == ASYMMETRIC_UNIT {
            return Ok(Cow::Borrowed(self));
        }
        let operators = self
            .biomolecules
            .get(&biomolecule)
            .ok_or(StructureError::UnknownBiomolecule(biomolecule))?;

        let mut unit = Structure::new();
        let mut copies: HashMap<&str, usize> = HashMap::new();

        for operator in operators {
            for label in &operator.chains {
                let Some(source) = self.chains.get(label) else {
                    continue;
                };
                let unit_label = match copies.get_mut(label.as_str()) {
                    Some(count) => {
                        let relabeled = format!("{}_{}", label, count);
                        *count += 1;
                        relabeled
                    }
                    None => {
                        copies.insert(label.as_str(), 0);
                        label.clone()
                    }
                };

                let mut chain = Chain::new(&unit_label);
                for atom in self.alpha_carbons(source) {
                    let mut copy = atom.clone();
                    copy.position = operator.transform.apply(&atom.position);
                    let residue_number = copy.residue_number;
                    let atom_id = unit.atoms.insert(copy);
                    unit.atom_order.push(atom_id);
                    chain.insert(residue_number, atom_id);
                }
                unit.chains.insert(unit_label, chain);
            }
        }

        Ok(Cow::Owned(unit))
    }

    fn require_chain(&self, label: &str) -> Result<&Chain, StructureError> {
        self.chains
            .get(label)
            .ok_or_else(|| StructureError::ChainNotFound(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca(serial: i64, residue: &str, chain: &str, number: isize, x: f64, y: f64, z: f64) -> Atom {
        Atom::new(serial, " CA ", residue, chain, number, Point3::new(x, y, z))
    }

    fn side_chain(serial: i64, residue: &str, chain: &str, number: isize) -> Atom {
        Atom::new(serial, " CB ", residue, chain, number, Point3::new(9.0, 9.0, 9.0))
    }

    fn two_chain_structure() -> Structure {
        let mut structure = Structure::new();
        structure.add_atom(ca(1, "ALA", "A", 2, 0.0, 0.0, 0.0));
        structure.add_atom(side_chain(2, "ALA", "A", 2));
        structure.add_atom(ca(3, "GLY", "A", 1, 1.0, 0.0, 0.0));
        structure.add_atom(ca(4, "LYS", "B", 1, 0.0, 5.0, 0.0));
        structure
    }

    fn shift_x(dx: f64) -> AffineTransform {
        AffineTransform::from_rows([
            [1.0, 0.0, 0.0, dx],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ])
    }

    #[test]
    fn add_atom_indexes_only_alpha_carbons() {
        let structure = two_chain_structure();

        assert_eq!(structure.atom_count(), 4);
        assert_eq!(structure.chain_count(), 2);
        assert_eq!(structure.chain("A").unwrap().len(), 2);
        assert_eq!(structure.chain("B").unwrap().len(), 1);
    }

    #[test]
    fn atoms_iterate_in_insertion_order() {
        let structure = two_chain_structure();
        let serials: Vec<_> = structure.atoms().map(|a| a.serial).collect();
        assert_eq!(serials, vec![1, 2, 3, 4]);
    }

    #[test]
    fn prune_removes_chains_without_alpha_carbons() {
        let mut structure = two_chain_structure();
        structure.add_atom(side_chain(5, "HOH", "W", 1));
        assert_eq!(structure.chain_count(), 3);

        assert_eq!(structure.prune_empty_chains(), 1);
        assert!(!structure.has_chain("W"));
        assert_eq!(structure.atom_count(), 5);
    }

    #[test]
    fn sequence_follows_residue_number_order() {
        let mut structure = two_chain_structure();
        structure.add_atom(ca(6, "MSE", "A", 3, 2.0, 0.0, 0.0));

        assert_eq!(structure.sequence("A").unwrap(), "GAX");
        assert_eq!(structure.sequence("B").unwrap(), "K");
        assert_eq!(
            structure.sequence("Q"),
            Err(StructureError::ChainNotFound("Q".to_string()))
        );
    }

    #[test]
    fn sequence_reports_removed_residues_as_unknown() {
        let mut structure = two_chain_structure();
        let id = structure.chain("A").unwrap().get(1).unwrap();
        structure.atom_mut(id).unwrap().mark_removed();

        assert_eq!(structure.sequence("A").unwrap(), "XA");
    }

    #[test]
    fn asymmetric_unit_is_always_present_and_borrowed() {
        let structure = two_chain_structure();
        assert_eq!(structure.biomolecule_ids().collect::<Vec<_>>(), vec![0]);

        let unit = structure.create_unit(ASYMMETRIC_UNIT).unwrap();
        assert!(matches!(unit, Cow::Borrowed(_)));
        assert_eq!(
            unit.alpha_carbon_positions("A").unwrap(),
            structure.alpha_carbon_positions("A").unwrap()
        );
        assert_eq!(unit.chain_count(), structure.chain_count());
    }

    #[test]
    fn add_operator_rejects_reserved_biomolecule() {
        let mut structure = two_chain_structure();
        let operator = SymmetryOperator {
            chains: vec!["A".to_string()],
            transform: AffineTransform::identity(),
        };
        assert_eq!(
            structure.add_operator(0, operator),
            Err(StructureError::ReservedBiomolecule)
        );
    }

    #[test]
    fn create_unit_rejects_unknown_biomolecule() {
        let structure = two_chain_structure();
        assert_eq!(
            structure.create_unit(3).unwrap_err(),
            StructureError::UnknownBiomolecule(3)
        );
    }

    #[test]
    fn create_unit_transforms_and_relabels_repeated_chains() {
        let mut structure = two_chain_structure();
        structure
            .add_operator(
                1,
                SymmetryOperator {
                    chains: vec!["A".to_string(), "B".to_string()],
                    transform: AffineTransform::identity(),
                },
            )
            .unwrap();
        structure
            .add_operator(
                1,
                SymmetryOperator {
                    chains: vec!["A".to_string(), "Z".to_string()],
                    transform: shift_x(10.0),
                },
            )
            .unwrap();
        structure
            .add_operator(
                1,
                SymmetryOperator {
                    chains: vec!["A".to_string()],
                    transform: shift_x(20.0),
                },
            )
            .unwrap();

        let unit = structure.create_unit(1).unwrap();
        let labels: Vec<_> = unit.chain_labels().collect();
        assert_eq!(labels, vec!["A", "A_0", "A_1", "B"]);

        let shifted = unit.alpha_carbon_positions("A_0").unwrap();
        assert_eq!(
            shifted,
            vec![Point3::new(11.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)]
        );
        let shifted_twice = unit.alpha_carbon_positions("A_1").unwrap();
        assert_eq!(shifted_twice[0], Point3::new(21.0, 0.0, 0.0));

        // Only alpha-carbons are carried over, one per residue and copy.
        assert_eq!(unit.atom_count(), 7);
        assert!(unit.atoms().all(Atom::is_alpha_carbon));
        // Source chain labels are kept on the atoms themselves.
        assert!(unit.atoms().all(|a| a.chain == "A" || a.chain == "B"));
        // The source structure is untouched.
        assert_eq!(
            structure.alpha_carbon_positions("A").unwrap()[0],
            Point3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn transform_moves_every_atom() {
        let mut structure = two_chain_structure();
        structure.transform(&shift_x(-1.0));

        let xs: Vec<_> = structure.atoms().map(|a| a.position.x).collect();
        assert_eq!(xs, vec![-1.0, 8.0, 0.0, -1.0]);
    }
}
