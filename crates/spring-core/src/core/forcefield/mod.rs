//! # Interface Scoring Module
//!
//! Statistical scoring of protein-protein interfaces.
//!
//! ## Overview
//!
//! Two measures decide whether a superposed pair of chains forms a plausible complex:
//!
//! - **Interface energy** from a residue-pair, distance-binned statistical potential
//!   ([`potential::InterfacePotential`]), summed over the residues the superposition
//!   aligned to the template interface.
//! - **Clash fraction**, the share of alpha-carbons of the smaller chain that come
//!   closer than a minimum distance to the other chain.
//!
//! ## Key Components
//!
//! - [`potential`] - Potential table loading and residue type indexing
//! - [`scoring`] - Energy and clash evaluation between two chains
//!
//! ## Usage
//!
//! ```ignore
//! use springpp::core::forcefield::{potential::InterfacePotential, scoring::InterfaceScorer};
//!
//! let potential = InterfacePotential::load(path)?;
//! let scorer = InterfaceScorer::new(&potential);
//! let energy = -scorer.energy(&core_interface, &partner_interface);
//! let clashes = scorer.clash_fraction(&core, &partner, 5.0);
//! ```

pub mod potential;
pub mod scoring;
