//! Provides input/output functionality for the file formats the assembler consumes.
//!
//! Structure records are read and written through the [`traits::StructureFile`]
//! interface; homology-search results and cross-reference tables are read-only inputs
//! with their own small parsers.

pub mod crossref;
pub mod hhr;
pub mod pdb;
pub mod traits;
