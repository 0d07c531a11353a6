//! Sequence-to-structure threading.
//!
//! [`threading::create_model`] grafts the residue identities of a homology-search query
//! onto the backbone of a template chain, using [`global::align_identity`] to reconcile
//! the alignment's contiguous template numbering with the structure's residue numbers.

pub mod global;
pub mod threading;
