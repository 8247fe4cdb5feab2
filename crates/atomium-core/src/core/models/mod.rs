//! # Core Models Module
//!
//! The data structures used to represent molecular structures in atomium.
//!
//! ## Overview
//!
//! Every atom and every structure lives in a single [`system::MolecularSystem`] arena
//! and is addressed through a stable handle ([`ids::AtomId`], [`ids::StructureId`]).
//! Ownership runs strictly downward (a chain owns its residues, a residue owns its
//! atoms); the upward links (atom → structure, structure → parent) are plain handles
//! that are only ever queried.
//!
//! ## Key Components
//!
//! - [`atom`] - Atoms (PDB and ghost variants) and atom filters
//! - [`structure`] - Structure nodes, their kinds and members
//! - [`system`] - The arena and every structure-level operation
//! - [`ids`] - Handle types for atoms and structures
//! - [`error`] - Validation and lookup errors
//!
//! ## Usage
//!
//! ```ignore
//! use atomium::core::models::{atom::Atom, system::MolecularSystem};
//! use nalgebra::Point3;
//!
//! let mut system = MolecularSystem::new();
//! let ca = system.create_atom(Atom::new("C", 1, "CA", Point3::new(0.0, 0.0, 0.0))?);
//! let residue = system.new_residue("A1", "GLY", &[ca.into()])?;
//! let chain = system.new_chain("A", &[residue.into()])?;
//! let model = system.new_model(&[chain.into()])?;
//! assert_eq!(system.model_of_atom(ca), Some(model));
//! ```

pub mod atom;
pub mod error;
pub mod ids;
pub mod structure;
pub mod system;
