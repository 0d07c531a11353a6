use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CrossReferenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid cross-reference entry on line {line}: '{content}'")]
    InvalidEntry { line: usize, content: String },
}

/// The known interaction partners of one core chain.
///
/// `partners[i]` is evidenced by the co-crystallized template pair `templates[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossReferenceEntry {
    pub partners: Vec<String>,
    pub templates: Vec<[String; 2]>,
}

impl CrossReferenceEntry {
    /// Iterates over `(partner, [core_template, partner_template])` in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String; 2])> + '_ {
        self.partners
            .iter()
            .map(String::as_str)
            .zip(self.templates.iter())
    }
}

/// Core chain identifier to interaction partners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossReference {
    entries: HashMap<String, CrossReferenceEntry>,
    interactions: usize,
}

impl CrossReference {
    /// Parses `core partner [core_template partner_template]` lines.
    ///
    /// Lines with only two columns use the identifiers themselves as templates. Unless
    /// `all_partners` is set, a partner already registered for a core is skipped.
    pub fn read_from(reader: &mut impl BufRead, all_partners: bool) -> Result<Self, CrossReferenceError> {
        let mut cross_reference = Self::default();
        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 2 {
                return Err(CrossReferenceError::InvalidEntry {
                    line: line_num + 1,
                    content: line.clone(),
                });
            }
            let (core, partner) = (cols[0], cols[1]);
            let templates = if cols.len() < 4 {
                [core.to_string(), partner.to_string()]
            } else {
                [cols[2].to_string(), cols[3].to_string()]
            };
            cross_reference.insert(core, partner, templates, all_partners);
        }
        info!(
            interactions = cross_reference.interactions,
            cores = cross_reference.entries.len(),
            "Loaded cross-reference interactions"
        );
        Ok(cross_reference)
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P, all_partners: bool) -> Result<Self, CrossReferenceError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader, all_partners)
    }

    /// Registers one interaction, returning whether it was recorded.
    pub fn insert(&mut self, core: &str, partner: &str, templates: [String; 2], all_partners: bool) -> bool {
        let entry = self.entries.entry(core.to_string()).or_default();
        if !all_partners && entry.partners.iter().any(|p| p == partner) {
            return false;
        }
        entry.partners.push(partner.to_string());
        entry.templates.push(templates);
        self.interactions += 1;
        true
    }

    pub fn get(&self, core: &str) -> Option<&CrossReferenceEntry> {
        self.entries.get(core)
    }

    pub fn contains(&self, core: &str) -> bool {
        self.entries.contains_key(core)
    }

    /// Total number of recorded interactions across all cores.
    pub fn interaction_count(&self) -> usize {
        self.interactions
    }
}
