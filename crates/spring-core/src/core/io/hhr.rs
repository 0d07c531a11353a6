use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Number of header lines preceding the hit table.
const HEADER_LINES: usize = 9;
const QUERY_NAME_LEN: usize = 14;

#[derive(Debug, Error)]
pub enum HhrError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: HhrParseErrorKind },
    #[error("No query/template alignment found")]
    MissingAlignment,
    #[error("Alignment has {query} query blocks but {template} template blocks")]
    UnpairedBlocks { query: usize, template: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum HhrParseErrorKind {
    #[error("Invalid score in columns {columns} (value: '{value}')")]
    InvalidScore { columns: String, value: String },
    #[error("Invalid start index in alignment (value: '{value}')")]
    InvalidStart { value: String },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

/// Homology-search hits of one query, filtered by score.
///
/// Identifiers keep the order in which they appear in the hit table; `top` holds the
/// first few of them, which are the best-ranked hits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateHits {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
    top: Vec<String>,
}

impl TemplateHits {
    /// Parses the hit table of a result file.
    ///
    /// Hits scoring at or below `min_score` are dropped; the first `top_hits` retained
    /// identifiers form the top list.
    pub fn read_from(
        reader: &mut impl BufRead,
        min_score: f64,
        top_hits: usize,
    ) -> Result<Self, HhrError> {
        let mut hits = Self::default();
        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            if line_num < HEADER_LINES {
                continue;
            }
            if line.trim().is_empty() {
                break;
            }

            let identifier = slice_and_trim(&line, 4, 10);
            let score_str = slice_and_trim(&line, 57, 63);
            let score: f64 = score_str.parse().map_err(|_| HhrError::Parse {
                line: line_num + 1,
                kind: HhrParseErrorKind::InvalidScore {
                    columns: "57-63".into(),
                    value: score_str.into(),
                },
            })?;
            if score > min_score {
                if hits.top.len() < top_hits {
                    hits.top.push(identifier.to_string());
                }
                hits.insert(identifier, score);
            }
        }
        Ok(hits)
    }

    /// Reads hits from a file; a missing file yields no hits.
    pub fn read_from_path<P: AsRef<Path>>(
        path: P,
        min_score: f64,
        top_hits: usize,
    ) -> Result<Self, HhrError> {
        let path = path.as_ref();
        if !path.is_file() {
            debug!(path = %path.display(), "Homology result file not found; no hits");
            return Ok(Self::default());
        }
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader, min_score, top_hits)
    }

    /// Builds hits directly from `(identifier, score)` pairs; the first `top_hits` form the top list.
    pub fn from_scores<'a>(scores: impl IntoIterator<Item = (&'a str, f64)>, top_hits: usize) -> Self {
        let mut hits = Self::default();
        for (identifier, score) in scores {
            if hits.top.len() < top_hits {
                hits.top.push(identifier.to_string());
            }
            hits.insert(identifier, score);
        }
        hits
    }

    fn insert(&mut self, identifier: &str, score: f64) {
        match self.index.get(identifier) {
            Some(&position) => self.entries[position].1 = score,
            None => {
                self.index.insert(identifier.to_string(), self.entries.len());
                self.entries.push((identifier.to_string(), score));
            }
        }
    }

    pub fn score(&self, identifier: &str) -> Option<f64> {
        self.index
            .get(identifier)
            .map(|&position| self.entries[position].1)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn top(&self) -> &[String] {
        &self.top
    }

    /// Iterates over `(identifier, score)` in hit-table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(id, score)| (id.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A fragment of an aligned sequence and the position of its first residue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceBlock {
    pub start: isize,
    pub sequence: String,
}

/// A pair of aligned fragments, query above template, sharing their columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedBlock {
    pub query: SequenceBlock,
    pub template: SequenceBlock,
}

/// The pairwise alignment of the query against its first reported hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HhrAlignment {
    pub query_name: String,
    pub template_name: String,
    pub blocks: Vec<AlignedBlock>,
}

impl HhrAlignment {
    pub fn read_from(reader: &mut impl BufRead) -> Result<Self, HhrError> {
        let mut query_name: Option<String> = None;
        let mut template_name: Option<String> = None;
        let mut query_blocks = Vec::new();
        let mut template_blocks = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() > 1 && cols[0] == "No" && cols[1] == "2" {
                break;
            }
            if cols.len() > 1 && cols[0] == "Query" {
                query_name = Some(cols[1].chars().take(QUERY_NAME_LEN).collect());
            }
            if let Some(name) = cols.first().and_then(|c| c.strip_prefix('>')) {
                template_name = Some(name.to_string());
            }

            let (Some(query), Some(template)) = (&query_name, &template_name) else {
                continue;
            };
            if cols.len() < 4 {
                continue;
            }
            let target = match cols[0] {
                "Q" if cols[1] == query => &mut query_blocks,
                "T" if cols[1] == template => &mut template_blocks,
                _ => continue,
            };
            let start = cols[2].parse().map_err(|_| HhrError::Parse {
                line: line_num + 1,
                kind: HhrParseErrorKind::InvalidStart {
                    value: cols[2].into(),
                },
            })?;
            target.push(SequenceBlock {
                start,
                sequence: cols[3].to_string(),
            });
        }

        let (Some(query_name), Some(template_name)) = (query_name, template_name) else {
            return Err(HhrError::MissingAlignment);
        };
        if query_blocks.len() != template_blocks.len() {
            return Err(HhrError::UnpairedBlocks {
                query: query_blocks.len(),
                template: template_blocks.len(),
            });
        }
        let blocks = query_blocks
            .into_iter()
            .zip(template_blocks)
            .map(|(query, template)| AlignedBlock { query, template })
            .collect();

        Ok(Self {
            query_name,
            template_name,
            blocks,
        })
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, HhrError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }

    /// The template side of all blocks concatenated, without gaps.
    pub fn ungapped_template(&self) -> String {
        self.blocks
            .iter()
            .flat_map(|block| block.template.sequence.chars())
            .filter(|&c| c != '-')
            .collect()
    }
}
