//! # Core Models Module
//!
//! Data structures describing a parsed macromolecular structure record.
//!
//! ## Overview
//!
//! A [`structure::Structure`] owns every atom read from a record in file order, indexes
//! the alpha-carbon of each residue per chain, and carries the symmetry operators that
//! expand the deposited coordinates into biological assemblies.
//!
//! ## Key Components
//!
//! - [`atom`] - A single atom record with its residue context
//! - [`chain`] - Residue-number ordered index of alpha-carbons
//! - [`residue`] - Amino-acid code tables
//! - [`structure`] - The complete structure with assembly expansion
//! - [`ids`] - Stable atom identifiers
//!
//! ## Usage
//!
//! ```ignore
//! use springpp::core::io::{pdb::PdbFile, traits::StructureFile};
//!
//! let structure = PdbFile::read_from_path("template.pdb")?;
//! let assembly = structure.create_unit(1)?;
//! let sequence = assembly.sequence("A")?;
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod structure;
