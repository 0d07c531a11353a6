use super::config::ToolConfig;
use super::scratch::ScratchSpace;
use crate::core::utils::geometry::AffineTransform;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

const MATRIX_HEADER_LINES: usize = 2;
const SCORE_LINES: [usize; 2] = [17, 18];
const SCORE_COLUMNS: (usize, usize) = (9, 17);
const ALIGNMENT_FIRST_LINE: usize = 22;
const ALIGNED_MARKERS: [char; 2] = [':', '.'];
const GAP: char = '-';

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Executable '{tool}' not found: {source}")]
    NotFound {
        tool: String,
        #[source]
        source: which::Error,
    },
    #[error("Failed to launch '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("'{tool}' exited unsuccessfully ({status})")]
    Failed { tool: String, status: String },
    #[error("'{tool}' did not finish within {timeout:?}")]
    Timeout { tool: String, timeout: Duration },
    #[error("'{tool}' did not produce '{path}'")]
    MissingOutput { tool: String, path: PathBuf },
    #[error("Malformed output of '{tool}': {reason}")]
    MalformedOutput { tool: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The three alignment rows printed by the superposition tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentRows {
    /// Aligned one-letter sequence of the mobile structure.
    pub mobile: String,
    /// `:` and `.` mark structurally equivalent columns.
    pub markers: String,
    /// Aligned one-letter sequence of the target structure.
    pub target: String,
}

impl AlignmentRows {
    /// Pairs of `(target residue index, mobile residue code)` for every equivalent column.
    ///
    /// Target indices count the non-gap target columns preceding the column.
    pub fn equivalences(&self) -> Vec<(usize, char)> {
        let mut pairs = Vec::new();
        let mut target_index = 0usize;
        for ((marker, mobile), target) in self
            .markers
            .chars()
            .zip(self.mobile.chars())
            .zip(self.target.chars())
        {
            if ALIGNED_MARKERS.contains(&marker) {
                pairs.push((target_index, mobile));
            }
            if target != GAP {
                target_index += 1;
            }
        }
        pairs
    }
}

/// Result of superposing a mobile structure onto a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposition {
    /// Similarity score in `[0, 1]`.
    pub score: f64,
    /// Moves the mobile structure onto the target.
    pub transform: AffineTransform,
    pub alignment: AlignmentRows,
}

/// Rigid-body structural superposition of two coordinate files.
pub trait Superposer {
    fn superpose(
        &self,
        mobile: &Path,
        target: &Path,
        scratch: &ScratchSpace,
    ) -> Result<Superposition, CollaboratorError>;
}

/// Full-atom reconstruction of an alpha-carbon model.
pub trait BackboneBuilder {
    /// Rebuilds `model` and returns the path of the reconstructed file.
    fn rebuild(&self, model: &Path) -> Result<PathBuf, CollaboratorError>;

    /// Name used when reporting failures of this tool.
    fn name(&self) -> String {
        "backbone builder".to_string()
    }
}

/// The TM-align executable.
#[derive(Debug, Clone)]
pub struct TmAlign {
    program: PathBuf,
    timeout: Duration,
}

impl TmAlign {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Superposer for TmAlign {
    fn superpose(
        &self,
        mobile: &Path,
        target: &Path,
        scratch: &ScratchSpace,
    ) -> Result<Superposition, CollaboratorError> {
        let matrix_path = scratch.superposition_matrix();
        let output_path = scratch.superposition_output();
        remove_stale(&matrix_path)?;

        let stdout = File::create(&output_path)?;
        run_with_timeout(
            &self.program,
            &[
                mobile.as_os_str(),
                target.as_os_str(),
                OsStr::new("-m"),
                matrix_path.as_os_str(),
            ],
            Some(stdout),
            self.timeout,
        )?;

        let tool = tool_name(&self.program);
        let matrix = open_output(&tool, &matrix_path)?;
        let transform = parse_matrix(&tool, matrix)?;
        let output = fs::read_to_string(&output_path)?;
        let score = parse_score(&tool, &output)?;
        let alignment = parse_alignment(&tool, &output)?;

        debug!(tool = %tool, score, "Superposition finished");
        Ok(Superposition {
            score,
            transform,
            alignment,
        })
    }
}

/// The PULCHRA executable.
#[derive(Debug, Clone)]
pub struct Pulchra {
    program: PathBuf,
    timeout: Duration,
}

impl Pulchra {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// `model.pdb` is rebuilt into `model.rebuilt.pdb`.
    pub fn output_path(model: &Path) -> PathBuf {
        model.with_extension("rebuilt.pdb")
    }
}

impl BackboneBuilder for Pulchra {
    fn rebuild(&self, model: &Path) -> Result<PathBuf, CollaboratorError> {
        let output = Self::output_path(model);
        remove_stale(&output)?;
        run_with_timeout(&self.program, &[model.as_os_str()], None, self.timeout)?;
        if !output.is_file() {
            return Err(CollaboratorError::MissingOutput {
                tool: tool_name(&self.program),
                path: output,
            });
        }
        Ok(output)
    }

    fn name(&self) -> String {
        tool_name(&self.program)
    }
}

/// The external tools named in the configuration.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    pub superposer: TmAlign,
    pub builder: Pulchra,
}

impl ExternalTools {
    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            superposer: TmAlign::new(&config.superposition, config.timeout),
            builder: Pulchra::new(&config.backbone, config.timeout),
        }
    }
}

/// Runs an executable to completion, killing it once `timeout` has elapsed.
///
/// The program is resolved through `PATH` unless it is a path itself. Standard output
/// goes to `stdout` when given and is discarded otherwise.
pub fn run_with_timeout(
    program: &Path,
    args: &[&OsStr],
    stdout: Option<File>,
    timeout: Duration,
) -> Result<(), CollaboratorError> {
    let tool = tool_name(program);
    let executable = which::which(program).map_err(|source| CollaboratorError::NotFound {
        tool: tool.clone(),
        source,
    })?;

    let stdout = stdout.map_or_else(Stdio::null, Stdio::from);
    let mut child = Command::new(&executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| CollaboratorError::Spawn {
            tool: tool.clone(),
            source,
        })?;

    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            if status.success() {
                return Ok(());
            }
            return Err(CollaboratorError::Failed {
                tool,
                status: status.to_string(),
            });
        }
        if started.elapsed() >= timeout {
            warn!(tool = %tool, ?timeout, "Killing external tool after timeout");
            // The process may exit between the poll and the kill.
            let _ = child.kill();
            child.wait()?;
            return Err(CollaboratorError::Timeout { tool, timeout });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Reads the 3x4 transform from a TM-align matrix file.
///
/// After two header lines, each row reads `m t u1 u2 u3` and becomes `[u1, u2, u3, t]`.
pub fn parse_matrix(tool: &str, reader: impl BufRead) -> Result<AffineTransform, CollaboratorError> {
    let malformed = |reason: String| CollaboratorError::MalformedOutput {
        tool: tool.to_string(),
        reason,
    };

    let mut rows = [[0.0; 4]; 3];
    let mut lines = reader.lines().skip(MATRIX_HEADER_LINES);
    for (index, row) in rows.iter_mut().enumerate() {
        let line = lines
            .next()
            .ok_or_else(|| malformed(format!("matrix row {} is missing", index + 1)))??;
        let values = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed(format!("matrix row '{}' is not numeric", line.trim())))?;
        if values.len() < 5 {
            return Err(malformed(format!(
                "matrix row '{}' has {} columns",
                line.trim(),
                values.len()
            )));
        }
        *row = [values[2], values[3], values[4], values[1]];
    }
    Ok(AffineTransform::from_rows(rows))
}

/// Reads the similarity score from TM-align's report, the larger of its two normalizations.
pub fn parse_score(tool: &str, output: &str) -> Result<f64, CollaboratorError> {
    let lines: Vec<&str> = output.lines().collect();
    let mut best = f64::NEG_INFINITY;
    for index in SCORE_LINES {
        let value = lines
            .get(index)
            .and_then(|line| line.get(SCORE_COLUMNS.0..SCORE_COLUMNS.1))
            .and_then(|field| field.trim().parse::<f64>().ok())
            .ok_or_else(|| CollaboratorError::MalformedOutput {
                tool: tool.to_string(),
                reason: format!("no score on line {}", index + 1),
            })?;
        best = best.max(value);
    }
    Ok(best)
}

/// Reads the three alignment rows from TM-align's report.
pub fn parse_alignment(tool: &str, output: &str) -> Result<AlignmentRows, CollaboratorError> {
    let mut lines = output.lines().skip(ALIGNMENT_FIRST_LINE);
    let mut next_row = |name: &str| {
        lines
            .next()
            .map(str::to_string)
            .ok_or_else(|| CollaboratorError::MalformedOutput {
                tool: tool.to_string(),
                reason: format!("alignment {name} row is missing"),
            })
    };
    let mobile = next_row("mobile")?;
    let markers = next_row("marker")?;
    let target = next_row("target")?;
    Ok(AlignmentRows {
        mobile,
        markers,
        target,
    })
}

fn open_output(tool: &str, path: &Path) -> Result<BufReader<File>, CollaboratorError> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CollaboratorError::MissingOutput {
            tool: tool.to_string(),
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn remove_stale(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .unwrap_or(program.as_os_str())
        .to_string_lossy()
        .into_owned()
}
