//! # SPRING++ Core Library
//!
//! Template-based modeling of protein-protein complexes. Two query sequences, each with
//! the results of a homology search, are threaded onto their best template chains,
//! superposed onto co-crystallized complex templates known to interact, and ranked by a
//! combination of structural similarity and a statistical interface potential.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Chain`, `Atom`), the
//!   file formats they are read from and written to, the indexed content store, sequence
//!   threading and the interface potential with its clash detector.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the external superposition and
//!   reconstruction tools, the ranked template-pair search and the running best of the
//!   candidate evaluation.
//!
//! - **[`workflows`]: The Public API.** The complete assembly procedure, from homology
//!   search results to a written complex model and a report of every evaluated candidate.

pub mod core;
pub mod engine;
pub mod workflows;
