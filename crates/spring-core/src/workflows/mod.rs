//! # Workflows Module
//!
//! Top-level entry points of the library.
//!
//! - **Assembly Workflow** ([`assemble`]) - Builds both monomer models, scans the ranked
//!   template pairs, scores every qualifying assembly and writes the best complex model.

pub mod assemble;
