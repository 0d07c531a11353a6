//! # Engine Module
//!
//! Stateful machinery of complex assembly: configuration, error types, progress
//! reporting, the per-run scratch space, the external tools, the template-pair search,
//! monomer building and the running best of the candidate search.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Data paths, search cutoffs, score weights and tool settings
//! - **Collaborators** ([`collaborators`]) - Structural superposition and backbone reconstruction
//!   behind the [`collaborators::Superposer`] and [`collaborators::BackboneBuilder`] traits
//! - **Search** ([`search`]) - Ranked, bounded enumeration of cross-referenced template pairs
//! - **Monomers** ([`monomer`]) - Threading and rebuilding of single-chain models
//! - **State** ([`state`]) - Scored candidates and acceptance of the best one
//! - **Error Handling** ([`error`]) - The umbrella error of the assembly workflow
//!
//! Every run owns its [`scratch::ScratchSpace`], so independent runs may execute
//! concurrently; candidates within one run are evaluated sequentially.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod interface;
pub mod monomer;
pub mod progress;
pub mod scratch;
pub mod search;
pub mod state;
