use crate::core::models::structure::Structure;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Options controlling how a structure is serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Append to an existing file instead of truncating it (path helpers only).
    pub append: bool,
    /// Chain label written for every atom instead of the label it was read with.
    pub chain_override: Option<String>,
}

impl WriteOptions {
    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }

    pub fn with_chain(mut self, label: &str) -> Self {
        self.chain_override = Some(label.to_string());
        self
    }
}

/// Defines the interface for reading and writing structure record formats.
///
/// Implementors handle format-specific parsing and serialization; the path helpers
/// take care of opening files and buffering.
pub trait StructureFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error>;

    /// Writes every atom of a structure, followed by a chain terminator.
    ///
    /// Atoms whose residue has been removed are skipped.
    fn write_to(
        structure: &Structure,
        options: &WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes the alpha-carbons of one chain in ascending residue-number order.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain does not exist or writing fails.
    fn write_chain_to(
        structure: &Structure,
        label: &str,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Reads a structure from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Structure, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a structure to a file path, appending when `options.append` is set.
    fn write_to_path<P: AsRef<Path>>(
        structure: &Structure,
        options: &WriteOptions,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = if options.append {
            OpenOptions::new().create(true).append(true).open(path)?
        } else {
            File::create(path)?
        };
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, options, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes one chain's alpha-carbons to a new file.
    fn write_chain_to_path<P: AsRef<Path>>(
        structure: &Structure,
        label: &str,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_chain_to(structure, label, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
