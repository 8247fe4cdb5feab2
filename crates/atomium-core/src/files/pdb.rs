use crate::core::io::config::{ReadConfig, WriteConfig};
use crate::core::io::convert;
use crate::core::io::data_file::PdbDataFile;
use crate::core::io::error::{ParseWarning, PdbError};
use crate::core::io::traits::StructureFile;
use crate::core::models::error::ModelError;
use crate::core::models::ids::StructureId;
use crate::core::models::structure::StructureKind;
use crate::core::models::system::MolecularSystem;
use chrono::NaiveDate;
use std::fmt;
use std::path::Path;
use tracing::{debug, instrument};

/// A PDB structure file: its models plus file-level metadata.
///
/// The first model is the primary one; most files only have one. Every model, and
/// everything in it, is stored in the file's own [`MolecularSystem`].
#[derive(Debug, Clone, Default)]
pub struct Pdb {
    pub(crate) system: MolecularSystem,
    pub(crate) models: Vec<StructureId>,
    pub(crate) code: Option<String>,
    pub(crate) classification: Option<String>,
    pub(crate) deposition_date: Option<NaiveDate>,
    pub(crate) title: Option<String>,
    pub(crate) warnings: Vec<ParseWarning>,
}

fn validate_code(code: &str) -> Result<(), ModelError> {
    if code.chars().count() != 4 {
        return Err(ModelError::invalid_value(
            "code",
            code,
            "must be exactly 4 characters",
        ));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ModelError::invalid_value(
            "code",
            code,
            "may only contain letters and digits",
        ));
    }
    if !code.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ModelError::invalid_value(
            "code",
            code,
            "must start with a digit",
        ));
    }
    Ok(())
}

impl Pdb {
    /// Creates an empty file with no models and no metadata.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system(&self) -> &MolecularSystem {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut MolecularSystem {
        &mut self.system
    }

    pub fn models(&self) -> &[StructureId] {
        &self.models
    }

    /// The primary (first) model, if there is one.
    pub fn model(&self) -> Option<StructureId> {
        self.models.first().copied()
    }

    /// Appends a model built in this file's system.
    ///
    /// # Errors
    ///
    /// A type error if `model` is not a model, a lookup error if it does not exist,
    /// and a value error if it was already added.
    pub fn add_model(&mut self, model: StructureId) -> Result<(), ModelError> {
        let structure = self
            .system
            .structure(model)
            .ok_or(ModelError::StructureNotFound(model))?;
        if structure.kind() != StructureKind::Model {
            return Err(ModelError::invalid_type("a model", structure.to_string()));
        }
        if self.models.contains(&model) {
            return Err(ModelError::invalid_value(
                "model",
                format!("{:?}", model),
                "is already part of this file",
            ));
        }
        self.models.push(model);
        Ok(())
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Sets the four-character file code, such as `"1ABC"`.
    ///
    /// # Errors
    ///
    /// A value error unless `code` is four letters or digits starting with a digit.
    /// The previous code is kept on failure.
    pub fn set_code(&mut self, code: &str) -> Result<(), ModelError> {
        validate_code(code)?;
        self.code = Some(code.to_string());
        Ok(())
    }

    pub fn classification(&self) -> Option<&str> {
        self.classification.as_deref()
    }

    pub fn set_classification(&mut self, classification: impl Into<String>) {
        self.classification = Some(classification.into());
    }

    pub fn deposition_date(&self) -> Option<NaiveDate> {
        self.deposition_date
    }

    pub fn set_deposition_date(&mut self, date: NaiveDate) {
        self.deposition_date = Some(date);
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Problems that were tolerated while this file was read.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn to_file_string(&self) -> Result<String, PdbError> {
        self.to_file_string_with(&WriteConfig::default())
    }

    /// Serialises the file to PDB text.
    #[instrument(skip_all, name = "pdb_to_file_string")]
    pub fn to_file_string_with(&self, config: &WriteConfig) -> Result<String, PdbError> {
        let data = convert::pdb_to_data_file(self)?;
        data.to_text(config)
    }

    pub fn from_file_string(text: &str) -> Result<Self, PdbError> {
        Self::from_file_string_with(text, &ReadConfig::default())
    }

    /// Parses PDB text into a file: text to records, records to a data file, data file
    /// to the object model.
    #[instrument(skip_all, name = "pdb_from_file_string")]
    pub fn from_file_string_with(text: &str, config: &ReadConfig) -> Result<Self, PdbError> {
        let data = PdbDataFile::from_text(text, config)?;
        let pdb = convert::data_file_to_pdb(&data, config)?;
        debug!(
            models = pdb.models.len(),
            warnings = pdb.warnings.len(),
            "Parsed PDB file"
        );
        Ok(pdb)
    }

    /// Writes the file to `path` with the default write options.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PdbError> {
        self.write_to_path(path, &WriteConfig::default())
    }

    /// Reads a file from `path` with the default read options.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PdbError> {
        Self::read_from_path(path, &ReadConfig::default())
    }
}

impl StructureFile for Pdb {
    type Error = PdbError;

    fn from_text(text: &str, config: &ReadConfig) -> Result<Self, Self::Error> {
        Self::from_file_string_with(text, config)
    }

    fn to_text(&self, config: &WriteConfig) -> Result<String, Self::Error> {
        self.to_file_string_with(config)
    }
}

impl fmt::Display for Pdb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.models.len();
        let noun = if count == 1 { "model" } else { "models" };
        match &self.code {
            Some(code) => write!(f, "<Pdb {} ({} {})>", code, count, noun),
            None => write!(f, "<Pdb ({} {})>", count, noun),
        }
    }
}
