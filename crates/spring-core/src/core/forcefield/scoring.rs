use super::potential::InterfacePotential;
use crate::core::models::structure::Structure;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;

/// A residue on one side of an interface: its type and reference position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceResidue {
    /// One-letter residue code.
    pub code: char,
    pub position: Point3<f64>,
}

impl InterfaceResidue {
    pub fn new(code: char, position: Point3<f64>) -> Self {
        Self { code, position }
    }
}

/// Scores the contact between two chains with an interface potential.
pub struct InterfaceScorer<'a> {
    potential: &'a InterfacePotential,
}

impl<'a> InterfaceScorer<'a> {
    pub fn new(potential: &'a InterfacePotential) -> Self {
        Self { potential }
    }

    /// Sums the potential over every cross pair of the two residue sets.
    ///
    /// Lower values mean more favorable packing.
    pub fn energy(&self, side_a: &[InterfaceResidue], side_b: &[InterfaceResidue]) -> f64 {
        side_a
            .iter()
            .map(|a| {
                side_b
                    .iter()
                    .map(|b| {
                        let distance = (a.position - b.position).norm();
                        self.potential.value(a.code, b.code, distance)
                    })
                    .sum::<f64>()
            })
            .sum()
    }

    /// Fraction of residues of the smaller first chain that clash with the other first chain.
    ///
    /// Each structure contributes its first chain. Returns `0.0` if either side has no
    /// chain.
    pub fn clash_fraction(&self, structure_a: &Structure, structure_b: &Structure, min_distance: f64) -> f64 {
        let alpha_carbons = |structure: &Structure| -> Vec<Point3<f64>> {
            structure
                .first_chain()
                .map(|chain| structure.alpha_carbons(chain).map(|atom| atom.position).collect())
                .unwrap_or_default()
        };
        clash_fraction(&alpha_carbons(structure_a), &alpha_carbons(structure_b), min_distance)
    }
}

/// Fraction of sample positions lying strictly closer than `min_distance` to any other position.
///
/// The smaller set is the sample; ties keep `a` as the sample. An empty sample yields `0.0`.
pub fn clash_fraction(a: &[Point3<f64>], b: &[Point3<f64>], min_distance: f64) -> f64 {
    let (sample, other) = if a.len() > b.len() { (b, a) } else { (a, b) };
    if sample.is_empty() {
        return 0.0;
    }
    let threshold = min_distance * min_distance;
    let coordinates: Vec<[f64; 3]> = other.iter().map(|q| [q.x, q.y, q.z]).collect();
    let kdtree: KdTree<f64, 3> = (&coordinates).into();
    let clashes = sample
        .iter()
        .filter(|p| kdtree.nearest_one::<SquaredEuclidean>(&[p.x, p.y, p.z]).distance < threshold)
        .count();
    clashes as f64 / sample.len() as f64
}
