use nalgebra::Point3;

/// Atom name that identifies the alpha-carbon of a residue, after trimming.
pub const ALPHA_CARBON_NAME: &str = "CA";

/// A single atom record read from a structure file.
///
/// The atom carries its residue context inline (residue name, residue number and
/// chain label) because structure records are flat: every line repeats the residue
/// it belongs to. Threading rewrites the residue context of alpha-carbons in place,
/// everything else stays as read.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atom serial number from the source record.
    pub serial: i64,
    /// The raw 4-character atom name field (e.g. `" CA "`), kept unpadded-as-read.
    pub name: String,
    /// Three-letter residue code, or `None` once the residue has been removed by threading.
    pub residue_name: Option<String>,
    /// The chain label as found in the record.
    pub chain: String,
    /// Residue sequence number.
    pub residue_number: isize,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Occupancy factor.
    pub occupancy: f64,
    /// Temperature factor.
    pub temperature_factor: f64,
}

impl Atom {
    /// Creates a new atom with zero occupancy and temperature factor.
    ///
    /// # Arguments
    ///
    /// * `serial` - The atom serial number.
    /// * `name` - The atom name field, e.g. `" CA "`.
    /// * `residue_name` - The three-letter residue code.
    /// * `chain` - The chain label.
    /// * `residue_number` - The residue sequence number.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(
        serial: i64,
        name: &str,
        residue_name: &str,
        chain: &str,
        residue_number: isize,
        position: Point3<f64>,
    ) -> Self {
        Self {
            serial,
            name: name.to_string(),
            residue_name: Some(residue_name.to_string()),
            chain: chain.to_string(),
            residue_number,
            position,
            occupancy: 0.0,
            temperature_factor: 0.0,
        }
    }

    /// Returns `true` if the trimmed atom name is the alpha-carbon label.
    pub fn is_alpha_carbon(&self) -> bool {
        self.name.trim() == ALPHA_CARBON_NAME
    }

    /// Returns `true` if the residue identity of this atom has been cleared.
    pub fn is_removed(&self) -> bool {
        self.residue_name.is_none()
    }

    /// Clears the residue identity, excluding the atom from written output.
    pub fn mark_removed(&mut self) {
        self.residue_name = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new(7, " CA ", "ALA", "A", 12, Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.serial, 7);
        assert_eq!(atom.name, " CA ");
        assert_eq!(atom.residue_name.as_deref(), Some("ALA"));
        assert_eq!(atom.chain, "A");
        assert_eq!(atom.residue_number, 12);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.occupancy, 0.0);
        assert_eq!(atom.temperature_factor, 0.0);
    }

    #[test]
    fn alpha_carbon_detection_trims_the_name_field() {
        let ca = Atom::new(1, " CA ", "GLY", "A", 1, Point3::origin());
        let cb = Atom::new(2, " CB ", "GLY", "A", 1, Point3::origin());
        let calcium = Atom::new(3, "CA  ", "CA", "A", 2, Point3::origin());

        assert!(ca.is_alpha_carbon());
        assert!(!cb.is_alpha_carbon());
        assert!(calcium.is_alpha_carbon());
    }

    #[test]
    fn mark_removed_clears_residue_identity() {
        let mut atom = Atom::new(1, " CA ", "SER", "B", 4, Point3::origin());
        assert!(!atom.is_removed());

        atom.mark_removed();

        assert!(atom.is_removed());
        assert_eq!(atom.residue_name, None);
        assert_eq!(atom.residue_number, 4);
    }
}
