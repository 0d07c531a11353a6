use thiserror::Error;

use super::collaborators::CollaboratorError;
use super::config::ConfigError;
use crate::core::forcefield::potential::PotentialLoadError;
use crate::core::io::crossref::CrossReferenceError;
use crate::core::io::hhr::HhrError;
use crate::core::io::pdb::PdbError;
use crate::core::models::structure::StructureError;
use crate::core::store::StoreError;
use crate::core::utils::identifiers::InvalidIdentifier;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Content store error: {source}")]
    Store {
        #[from]
        source: StoreError,
    },

    #[error("Structure record error: {source}")]
    Pdb {
        #[from]
        source: PdbError,
    },

    #[error("Structure error: {source}")]
    Structure {
        #[from]
        source: StructureError,
    },

    #[error("Homology search result error: {source}")]
    Hhr {
        #[from]
        source: HhrError,
    },

    #[error("Cross-reference error: {source}")]
    CrossReference {
        #[from]
        source: CrossReferenceError,
    },

    #[error("Interface potential error: {source}")]
    Potential {
        #[from]
        source: PotentialLoadError,
    },

    #[error("Invalid identifier: {source}")]
    Identifier {
        #[from]
        source: InvalidIdentifier,
    },

    #[error("External tool failed: {source}")]
    Collaborator {
        #[from]
        source: CollaboratorError,
    },

    #[error("Failed to build a monomer model for {query}")]
    MonomerFailed { query: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the error is confined to one template or input entry.
    ///
    /// Malformed records and corrupt store entries abort only the entry being processed;
    /// the search skips it and continues. I/O failures and invalid resources stay fatal.
    pub fn is_entry_fault(&self) -> bool {
        match self {
            EngineError::Pdb { source } => !matches!(source, PdbError::Io(_)),
            EngineError::Store { source } => matches!(
                source,
                StoreError::CorruptEntry { .. } | StoreError::Decompress { .. }
            ),
            EngineError::Structure { .. }
            | EngineError::Hhr { .. }
            | EngineError::Identifier { .. }
            | EngineError::Collaborator { .. }
            | EngineError::MonomerFailed { .. } => true,
            EngineError::Config { .. }
            | EngineError::CrossReference { .. }
            | EngineError::Potential { .. }
            | EngineError::Io(_) => false,
        }
    }
}
