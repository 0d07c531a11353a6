use super::ids::AtomId;
use std::collections::BTreeMap;

/// A chain of residues keyed by residue number.
///
/// Each residue number maps to the alpha-carbon atom of that residue. Iteration is
/// always in ascending residue-number order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chain {
    pub label: String,
    residues: BTreeMap<isize, AtomId>, // Residue number -> alpha-carbon atom
}

impl Chain {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            residues: BTreeMap::new(),
        }
    }

    /// Registers the alpha-carbon of a residue, replacing any previous one with the same number.
    pub(crate) fn insert(&mut self, residue_number: isize, atom_id: AtomId) {
        self.residues.insert(residue_number, atom_id);
    }

    pub fn get(&self, residue_number: isize) -> Option<AtomId> {
        self.residues.get(&residue_number).copied()
    }

    pub fn contains(&self, residue_number: isize) -> bool {
        self.residues.contains_key(&residue_number)
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn residue_numbers(&self) -> impl Iterator<Item = isize> + '_ {
        self.residues.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (isize, AtomId)> + '_ {
        self.residues.iter().map(|(&number, &id)| (number, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn residues_iterate_in_ascending_number_order() {
        let mut chain = Chain::new("A");
        chain.insert(30, dummy_atom_id(3));
        chain.insert(-2, dummy_atom_id(1));
        chain.insert(7, dummy_atom_id(2));

        let numbers: Vec<_> = chain.residue_numbers().collect();
        assert_eq!(numbers, vec![-2, 7, 30]);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn insert_replaces_existing_residue_number() {
        let mut chain = Chain::new("A");
        chain.insert(5, dummy_atom_id(1));
        chain.insert(5, dummy_atom_id(2));

        assert_eq!(chain.len(), 1);
        assert_eq!(chain.get(5), Some(dummy_atom_id(2)));
    }

    #[test]
    fn empty_chain_reports_empty() {
        let chain = Chain::new("Z");
        assert!(chain.is_empty());
        assert!(!chain.contains(1));
        assert_eq!(chain.get(1), None);
    }
}
