use crate::core::models::error::ModelError;
use std::io;
use thiserror::Error;

/// Failure to coerce a fixed-column field into a typed value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingField { columns: String },
    #[error("Invalid element symbol '{value}' in columns 77-78")]
    InvalidElement { value: String },
}

/// A recoverable problem found while reading a file.
///
/// Warnings are collected on the data file and logged; the offending record is
/// skipped. In strict mode the first warning aborts the read instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    #[error("Line {line} is longer than 80 characters and was truncated")]
    LineTooLong { line: usize },
    #[error("Line {line}: unknown record type '{name}'")]
    UnknownRecord { line: usize, name: String },
    #[error("Line {line}: {kind}")]
    InvalidRecord { line: usize, kind: RecordError },
    #[error("Line {line}: invalid deposition date '{value}'")]
    InvalidDate { line: usize, value: String },
    #[error("Invalid file code '{value}' in HEADER")]
    InvalidCode { value: String },
    #[error("Site {site} refers to residue {residue}, which is not in the model")]
    UnresolvedSite { site: String, residue: String },
    #[error("Site {site} names ligand {ligand}, which is not in the model")]
    UnresolvedLigand { site: String, ligand: String },
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("File contains no models")]
    NoModels,
    #[error("Strict parsing rejected the file: {0}")]
    Strict(ParseWarning),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("{record} record: {field} '{value}' does not fit its columns")]
    FieldOverflow {
        record: String,
        field: &'static str,
        value: String,
    },
}
