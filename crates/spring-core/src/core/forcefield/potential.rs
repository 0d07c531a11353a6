use phf::{Map, phf_map};
use std::path::Path;
use thiserror::Error;

/// Residue types in the table: 20 canonical amino acids plus one catch-all.
pub const RESIDUE_TYPES: usize = 21;
/// Distance bins per residue pair.
pub const DISTANCE_BINS: usize = 20;
/// Bins per Angstrom.
pub const DISTANCE_SCALE: f64 = 2.0;
/// Total number of values in a potential table.
pub const TABLE_SIZE: usize = RESIDUE_TYPES * RESIDUE_TYPES * DISTANCE_BINS;

const UNKNOWN_RESIDUE_TYPE: usize = 20;

static RESIDUE_TYPE_INDEX: Map<char, usize> = phf_map! {
    'A' => 0, 'C' => 1, 'D' => 2, 'E' => 3, 'F' => 4, 'G' => 5, 'H' => 6,
    'I' => 7, 'K' => 8, 'L' => 9, 'M' => 10, 'N' => 11, 'P' => 12, 'Q' => 13,
    'R' => 14, 'S' => 15, 'T' => 16, 'V' => 17, 'W' => 18, 'Y' => 19,
};

/// Table index of a one-letter residue code; anything non-canonical maps to 20.
pub fn residue_type_index(code: char) -> usize {
    RESIDUE_TYPE_INDEX
        .get(&code)
        .copied()
        .unwrap_or(UNKNOWN_RESIDUE_TYPE)
}

#[derive(Debug, Error)]
pub enum PotentialLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid potential value on line {line} of '{path}': '{value}'")]
    InvalidValue {
        path: String,
        line: usize,
        value: String,
    },
    #[error("Potential table has {found} values, expected {expected}")]
    Size { expected: usize, found: usize },
}

/// A distance-binned, residue-pair statistical potential.
///
/// Values are laid out as `[type_a][type_b][bin]`. The table is read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfacePotential {
    values: Vec<f64>,
}

impl InterfacePotential {
    /// Loads a table holding one value per line.
    pub fn load(path: &Path) -> Result<Self, PotentialLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| PotentialLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let values = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(line_num, line)| {
                line.trim()
                    .parse::<f64>()
                    .map_err(|_| PotentialLoadError::InvalidValue {
                        path: path.to_string_lossy().to_string(),
                        line: line_num + 1,
                        value: line.trim().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_values(values)
    }

    pub fn from_values(values: Vec<f64>) -> Result<Self, PotentialLoadError> {
        if values.len() != TABLE_SIZE {
            return Err(PotentialLoadError::Size {
                expected: TABLE_SIZE,
                found: values.len(),
            });
        }
        Ok(Self { values })
    }

    /// A table with the same value everywhere.
    pub fn uniform(value: f64) -> Self {
        Self {
            values: vec![value; TABLE_SIZE],
        }
    }

    /// Potential between two residues at `distance`, zero beyond the last bin.
    pub fn value(&self, code_a: char, code_b: char, distance: f64) -> f64 {
        let bin = (distance * DISTANCE_SCALE).floor();
        if !(0.0..DISTANCE_BINS as f64).contains(&bin) {
            return 0.0;
        }
        let index = residue_type_index(code_a) * RESIDUE_TYPES * DISTANCE_BINS
            + residue_type_index(code_b) * DISTANCE_BINS
            + bin as usize;
        self.values[index]
    }
}
