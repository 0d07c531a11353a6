use crate::core::io::traits::{StructureFile, WriteOptions};
use crate::core::models::atom::Atom;
use crate::core::models::structure::{Structure, StructureError, SymmetryOperator};
use crate::core::utils::geometry::AffineTransform;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

const ATOM_RECORD: &str = "ATOM";
const TERMINATOR_RECORD: &str = "TER";
const ASSEMBLY_REMARK: &str = "REMARK 350";
const BIOMOLECULE_KEY: &str = "BIOMOLECULE:";
const APPLY_KEY: &str = "APPLY THE FOLLOWING TO CHAINS:";
const CONTINUATION_KEY: &str = "AND CHAINS:";
const OPERATOR_KEY: &str = "BIOMT";

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Structure contains no chains with alpha-carbon atoms")]
    NoChains,
    #[error(transparent)]
    Structure(#[from] StructureError),
}

#[derive(Debug, Error, PartialEq)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Biomolecule id 0 is reserved for the asymmetric unit")]
    ReservedBiomolecule,
    #[error("Operator id {found} does not match operator id {expected} of the same matrix")]
    OperatorIdMismatch { expected: u32, found: u32 },
    #[error("Matrix row must carry four numeric values")]
    InvalidOperatorRow,
    #[error("Symmetry operator ended before all three matrix rows were read")]
    IncompleteOperator,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn slice_raw(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("")
}

fn parse_int<T: std::str::FromStr>(
    line: &str,
    start: usize,
    end: usize,
    line_num: usize,
) -> Result<T, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start, end),
            value: value.into(),
        },
    })
}

fn parse_float(line: &str, start: usize, end: usize, line_num: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start, end),
            value: value.into(),
        },
    })
}

/// Parses a field that defaults to zero when blank or malformed.
fn parse_optional_float(line: &str, start: usize, end: usize) -> f64 {
    slice_and_trim(line, start, end).parse().unwrap_or(0.0)
}

/// Accumulates `REMARK 350` assembly metadata into symmetry operators.
#[derive(Default)]
struct AssemblyParser {
    biomolecule: Option<u32>,
    chains: Vec<String>,
    rows: Vec<(u32, [f64; 4])>,
}

impl AssemblyParser {
    fn feed(
        &mut self,
        line: &str,
        line_num: usize,
        structure: &mut Structure,
    ) -> Result<(), PdbError> {
        let body = line.get(ASSEMBLY_REMARK.len()..).unwrap_or("");
        let content = body.trim_start();

        if content.starts_with(OPERATOR_KEY) {
            return self.feed_operator_row(line, line_num, structure);
        }
        self.ensure_no_pending_rows(line_num)?;

        if let Some(rest) = content.strip_prefix(BIOMOLECULE_KEY) {
            let id: u32 = rest.trim().parse().map_err(|_| PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::InvalidInt {
                    columns: format!("{}-", line.len() - rest.len()),
                    value: rest.trim().into(),
                },
            })?;
            if id == 0 {
                return Err(PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::ReservedBiomolecule,
                });
            }
            self.biomolecule = Some(id);
            self.chains.clear();
        } else if let Some(rest) = content.strip_prefix(APPLY_KEY) {
            self.chains = split_chain_list(rest);
        } else if let Some(rest) = content.strip_prefix(CONTINUATION_KEY) {
            self.chains.extend(split_chain_list(rest));
        }
        Ok(())
    }

    fn feed_operator_row(
        &mut self,
        line: &str,
        line_num: usize,
        structure: &mut Structure,
    ) -> Result<(), PdbError> {
        let operator_id: u32 = parse_int(line, 20, 23, line_num)?;
        let values: Vec<f64> = slice_raw(line, 23, line.len())
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::InvalidOperatorRow,
            })?;
        if values.len() < 4 {
            return Err(PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::InvalidOperatorRow,
            });
        }
        if let Some(&(expected, _)) = self.rows.first() {
            if expected != operator_id {
                return Err(PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::OperatorIdMismatch {
                        expected,
                        found: operator_id,
                    },
                });
            }
        }
        self.rows
            .push((operator_id, [values[0], values[1], values[2], values[3]]));

        if self.rows.len() == 3 {
            let rows = [self.rows[0].1, self.rows[1].1, self.rows[2].1];
            self.rows.clear();
            if let Some(biomolecule) = self.biomolecule {
                structure.add_operator(
                    biomolecule,
                    SymmetryOperator {
                        chains: self.chains.clone(),
                        transform: AffineTransform::from_rows(rows),
                    },
                )?;
            }
        }
        Ok(())
    }

    fn ensure_no_pending_rows(&self, line_num: usize) -> Result<(), PdbError> {
        if self.rows.is_empty() {
            Ok(())
        } else {
            Err(PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::IncompleteOperator,
            })
        }
    }
}

fn split_chain_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

fn format_atom_record(atom: &Atom, residue_name: &str, chain: &str) -> String {
    format!(
        "{:<6}{:>5} {:<4} {:>3} {:>1}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}",
        ATOM_RECORD,
        atom.serial,
        atom.name,
        residue_name,
        chain,
        atom.residue_number,
        atom.position.x,
        atom.position.y,
        atom.position.z,
        atom.occupancy,
        atom.temperature_factor
    )
}

/// Fixed-column PDB structure records.
///
/// Only `ATOM` records and `REMARK 350` assembly metadata are interpreted; every other
/// record is ignored on read and never written.
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut structure = Structure::new();
        let mut assembly = AssemblyParser::default();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            if line.starts_with(ASSEMBLY_REMARK) {
                assembly.feed(&line, line_num, &mut structure)?;
                continue;
            }
            assembly.ensure_no_pending_rows(line_num)?;

            if slice_and_trim(&line, 0, 6) != ATOM_RECORD {
                continue;
            }

            let serial: i64 = parse_int(&line, 6, 11, line_num)?;
            let residue_number: isize = parse_int(&line, 22, 26, line_num)?;
            let x = parse_float(&line, 30, 38, line_num)?;
            let y = parse_float(&line, 38, 46, line_num)?;
            let z = parse_float(&line, 46, 54, line_num)?;

            structure.add_atom(Atom {
                serial,
                name: slice_raw(&line, 12, 16).to_string(),
                residue_name: Some(slice_and_trim(&line, 17, 20).to_string()),
                chain: slice_raw(&line, 21, 22).to_string(),
                residue_number,
                position: Point3::new(x, y, z),
                // Both values are taken from the occupancy columns.
                occupancy: parse_optional_float(&line, 54, 60),
                temperature_factor: parse_optional_float(&line, 54, 60),
            });
        }
        assembly.ensure_no_pending_rows(usize::MAX)?;

        structure.prune_empty_chains();
        if structure.chain_count() == 0 {
            return Err(PdbError::NoChains);
        }
        Ok(structure)
    }

    fn write_to(
        structure: &Structure,
        options: &WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for atom in structure.atoms() {
            let Some(residue_name) = atom.residue_name.as_deref() else {
                continue;
            };
            let chain = options.chain_override.as_deref().unwrap_or(&atom.chain);
            writeln!(writer, "{}", format_atom_record(atom, residue_name, chain))?;
        }
        writeln!(writer, "{}", TERMINATOR_RECORD)?;
        Ok(())
    }

    fn write_chain_to(
        structure: &Structure,
        label: &str,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let chain = structure
            .chain(label)
            .ok_or_else(|| StructureError::ChainNotFound(label.to_string()))?;
        for atom in structure.alpha_carbons(chain) {
            let Some(residue_name) = atom.residue_name.as_deref() else {
                continue;
            };
            writeln!(writer, "{}", format_atom_record(atom, residue_name, &atom.chain))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const TWO_CHAIN_PDB: &str = "\
HEADER    TEST COMPLEX
REMARK 350 BIOMOLECULE: 1
REMARK 350 APPLY THE FOLLOWING TO CHAINS: A,
REMARK 350                    AND CHAINS: B
REMARK 350   BIOMT1   1  1.000000  0.000000  0.000000        0.00000
REMARK 350   BIOMT2   1  0.000000  1.000000  0.000000        0.00000
REMARK 350   BIOMT3   1  0.000000  0.000000  1.000000        0.00000
REMARK 350   BIOMT1   2 -1.000000  0.000000  0.000000       10.00000
REMARK 350   BIOMT2   2  0.000000 -1.000000  0.000000        0.00000
REMARK 350   BIOMT3   2  0.000000  0.000000  1.000000        0.00000
REMARK 350 BIOMOLECULE: 2
REMARK 350 APPLY THE FOLLOWING TO CHAINS: B
REMARK 350   BIOMT1   1  1.000000  0.000000  0.000000        5.00000
REMARK 350   BIOMT2   1  0.000000  1.000000  0.000000        0.00000
REMARK 350   BIOMT3   1  0.000000  0.000000  1.000000        0.00000
ATOM      1  N   ALA A   1      -1.000   0.000   0.000  1.00 20.00           N
ATOM      2  CA  ALA A   1       0.000   0.000   0.000  1.00 20.00           C
ATOM      3  CA  GLY A   2       3.800   0.000   0.000  0.50 30.00           C
ATOM      4  CA  LYS B   5       0.000   8.000   0.000  1.00 10.00           C
HETATM    5  O   HOH W   1       9.000   9.000   9.000  1.00 10.00           O
ATOM      6  O   HOH W   2       9.000   9.000   9.000  1.00 10.00           O
TER
END
";

    fn read(content: &str) -> Result<Structure, PdbError> {
        PdbFile::read_from(&mut Cursor::new(content))
    }

    fn parse_error_kind(result: Result<Structure, PdbError>) -> (usize, PdbParseErrorKind) {
        match result {
            Err(PdbError::Parse { line, kind }) => (line, kind),
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn reads_atoms_and_alpha_carbon_chains() {
        let structure = read(TWO_CHAIN_PDB).unwrap();

        assert_eq!(structure.atom_count(), 5);
        assert_eq!(structure.chain_labels().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(structure.sequence("A").unwrap(), "AG");
        assert_eq!(structure.sequence("B").unwrap(), "K");

        let first = structure.atoms().next().unwrap();
        assert_eq!(first.serial, 1);
        assert_eq!(first.name, " N  ");
        assert_eq!(first.residue_name.as_deref(), Some("ALA"));
        assert_eq!(first.chain, "A");
        assert_eq!(first.position, Point3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn temperature_factor_mirrors_occupancy_columns() {
        let structure = read(TWO_CHAIN_PDB).unwrap();
        let glycine = structure.atoms().find(|a| a.serial == 3).unwrap();

        // The temperature factor field (30.00) is not read; occupancy is used for both.
        assert_eq!(glycine.occupancy, 0.5);
        assert_eq!(glycine.temperature_factor, 0.5);
    }

    #[test]
    fn parses_biomolecule_operators_in_order() {
        let structure = read(TWO_CHAIN_PDB).unwrap();

        assert_eq!(structure.biomolecule_ids().collect::<Vec<_>>(), vec![0, 1, 2]);
        let operators = structure.operators(1).unwrap();
        assert_eq!(operators.len(), 2);
        assert_eq!(operators[0].chains, vec!["A", "B"]);
        assert_eq!(operators[0].transform, AffineTransform::identity());
        assert_eq!(operators[1].transform.rows()[0], [-1.0, 0.0, 0.0, 10.0]);

        let second = structure.operators(2).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].chains, vec!["B"]);
    }

    #[test]
    fn expanded_assembly_relabels_symmetry_mates() {
        let structure = read(TWO_CHAIN_PDB).unwrap();
        let unit = structure.create_unit(1).unwrap();

        assert_eq!(
            unit.chain_labels().collect::<Vec<_>>(),
            vec!["A", "A_0", "B", "B_0"]
        );
        let mate = unit.alpha_carbon_positions("A_0").unwrap();
        assert_eq!(mate.len(), 2);
        assert!((mate[0] - Point3::new(10.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((mate[1] - Point3::new(6.2, 0.0, 0.0)).norm() < 1e-9);
        assert_eq!(
            unit.alpha_carbon_positions("B_0").unwrap(),
            vec![Point3::new(10.0, -8.0, 0.0)]
        );
    }

    #[test]
    fn rejects_reserved_biomolecule_id() {
        let content = "REMARK 350 BIOMOLECULE: 0\n";
        let (line, kind) = parse_error_kind(read(content));
        assert_eq!(line, 1);
        assert_eq!(kind, PdbParseErrorKind::ReservedBiomolecule);
    }

    #[test]
    fn rejects_mismatched_operator_ids() {
        let content = "\
REMARK 350 BIOMOLECULE: 1
REMARK 350 APPLY THE FOLLOWING TO CHAINS: A
REMARK 350   BIOMT1   1  1.000000  0.000000  0.000000        0.00000
REMARK 350   BIOMT2   2  0.000000  1.000000  0.000000        0.00000
";
        let (line, kind) = parse_error_kind(read(content));
        assert_eq!(line, 4);
        assert_eq!(
            kind,
            PdbParseErrorKind::OperatorIdMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn rejects_truncated_operator() {
        let content = "\
REMARK 350 BIOMOLECULE: 1
REMARK 350 APPLY THE FOLLOWING TO CHAINS: A
REMARK 350   BIOMT1   1  1.000000  0.000000  0.000000        0.00000
REMARK 350   BIOMT2   1  0.000000  1.000000  0.000000        0.00000
ATOM      2  CA  ALA A   1       0.000   0.000   0.000  1.00 20.00           C
";
        let (line, kind) = parse_error_kind(read(content));
        assert_eq!(line, 5);
        assert_eq!(kind, PdbParseErrorKind::IncompleteOperator);
    }

    #[test]
    fn rejects_malformed_coordinates() {
        let content =
            "ATOM      2  CA  ALA A   1       0.000   abcde   0.000  1.00 20.00           C\n";
        let (line, kind) = parse_error_kind(read(content));
        assert_eq!(line, 1);
        assert!(matches!(kind, PdbParseErrorKind::InvalidFloat { .. }));
    }

    #[test]
    fn structure_without_alpha_carbons_is_an_error() {
        let content =
            "ATOM      1  N   ALA A   1      -1.000   0.000   0.000  1.00 20.00           N\n";
        assert!(matches!(read(content), Err(PdbError::NoChains)));
    }

    #[test]
    fn writes_fixed_column_records_with_terminator() {
        let structure = read(TWO_CHAIN_PDB).unwrap();
        let mut buffer = Vec::new();
        PdbFile::write_to(&structure, &WriteOptions::default(), &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(
            lines[1],
            "ATOM      2  CA  ALA A   1       0.000   0.000   0.000  1.00  1.00"
        );
        assert_eq!(lines[5], "TER");
    }

    #[test]
    fn chain_override_relabels_every_atom() {
        let structure = read(TWO_CHAIN_PDB).unwrap();
        let mut buffer = Vec::new();
        let options = WriteOptions::default().with_chain("0");
        PdbFile::write_to(&structure, &options, &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(
            output
                .lines()
                .filter(|l| l.starts_with("ATOM"))
                .all(|l| &l[21..22] == "0")
        );
    }

    #[test]
    fn write_chain_emits_alpha_carbons_and_skips_removed_residues() {
        let mut structure = read(TWO_CHAIN_PDB).unwrap();
        let mut buffer = Vec::new();
        PdbFile::write_chain_to(&structure, "A", &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(!output.contains("TER"));

        let id = structure.chain("A").unwrap().get(2).unwrap();
        structure.atom_mut(id).unwrap().mark_removed();
        let mut buffer = Vec::new();
        PdbFile::write_chain_to(&structure, "A", &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("ALA"));

        let missing = PdbFile::write_chain_to(&structure, "Q", &mut Vec::new());
        assert!(matches!(
            missing,
            Err(PdbError::Structure(StructureError::ChainNotFound(_)))
        ));
    }

    #[test]
    fn appended_writes_concatenate_models() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.pdb");
        let structure = read(TWO_CHAIN_PDB).unwrap();

        PdbFile::write_to_path(&structure, &WriteOptions::default().with_chain("0"), &path)
            .unwrap();
        PdbFile::write_to_path(
            &structure,
            &WriteOptions::default().with_chain("1").appending(),
            &path,
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("TER").count(), 2);
        assert_eq!(content.lines().count(), 12);

        let reread = PdbFile::read_from_path(&path).unwrap();
        assert_eq!(reread.chain_labels().collect::<Vec<_>>(), vec!["0", "1"]);
    }
}
