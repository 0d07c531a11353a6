//! # Core Module
//!
//! This module provides the stateless building blocks of complex-model assembly: data
//! models, file formats, the content store, sequence threading and interface scoring.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Atoms, alpha-carbon chains and assemblies
//! - **File I/O** ([`io`]) - Structure records, homology-search results, cross-references
//! - **Template Storage** ([`store`]) - Indexed flat-file store of raw template records
//! - **Threading** ([`alignment`]) - Grafting a query sequence onto a template backbone
//! - **Interface Scoring** ([`forcefield`]) - Statistical interface energy and clashes
//! - **Utilities** ([`utils`]) - Affine transforms and template identifiers
//!
//! Nothing in this layer spawns processes or keeps state between calls; orchestration
//! lives in [`crate::engine`] and [`crate::workflows`].

pub mod alignment;
pub mod forcefield;
pub mod io;
pub mod models;
pub mod store;
pub mod utils;
