//! # Core Module
//!
//! The fundamental building blocks of atomium.
//!
//! - **Molecular Representation** ([`models`]) - Atoms and the structures that contain them
//! - **File I/O** ([`io`]) - PDB records, the intermediate data file and conversions
//! - **Utilities** ([`utils`]) - Element data and batch rigid-body geometry

pub mod io;
pub mod models;
pub mod utils;
