//! # atomium Core Library
//!
//! A molecular structure model and a fixed-column reader/writer for the Protein
//! Data Bank (PDB) flat-file format.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers:
//!
//! - **[`core`]: The Foundation.** The atomic structure data model (atoms, residues,
//!   small molecules, chains, binding sites and models, all living in one
//!   [`MolecularSystem`](core::models::system::MolecularSystem) arena), element data and
//!   geometry helpers, and the record-level PDB machinery (records, the intermediate
//!   data file and the converters between them).
//!
//! - **[`files`]: The Public API.** File-level containers such as [`Pdb`](files::pdb::Pdb)
//!   that tie the model and the record layer together into `from_file_string` /
//!   `to_file_string` round trips.
//!
//! The core performs no network I/O. Text is handed to it (read from disk, fetched
//! over HTTP, ...) and text is returned from it for someone else to persist.

pub mod core;
pub mod files;
