use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A private directory for the files exchanged with external tools.
///
/// Each assembly run owns one scratch space, so concurrent runs never share files. The
/// directory is removed when the scratch space is dropped.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::Builder::new().prefix("spring-").tempdir()?,
        })
    }

    /// Creates the scratch directory below `parent`.
    pub fn in_dir<P: AsRef<Path>>(parent: P) -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::Builder::new().prefix("spring-").tempdir_in(parent)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Threaded alpha-carbon model of a monomer, `0` for chain A and `1` for chain B.
    pub fn monomer(&self, side: usize) -> PathBuf {
        let name = if side == 0 { "monomerA.pdb" } else { "monomerB.pdb" };
        self.dir.path().join(name)
    }

    /// The complex template as retrieved from the content store.
    pub fn template(&self) -> PathBuf {
        self.dir.path().join("template.pdb")
    }

    /// A single template chain, `0` for the core and `1` for the partner.
    pub fn template_chain(&self, side: usize) -> PathBuf {
        self.dir.path().join(format!("template_{side}.pdb"))
    }

    pub fn superposition_matrix(&self) -> PathBuf {
        self.dir.path().join("superposition.mat")
    }

    pub fn superposition_output(&self) -> PathBuf {
        self.dir.path().join("superposition.out")
    }

    /// Any other file of the run, such as retrieved search results.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
