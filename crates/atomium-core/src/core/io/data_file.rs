use super::config::{ReadConfig, WriteConfig};
use super::error::{ParseWarning, PdbError, RecordError};
use super::record::{self, PdbRecord};
use crate::core::utils::elements::infer_element;
use chrono::NaiveDate;
use phf::{Set, phf_set};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Record names the reader understands or knowingly ignores.
static KNOWN_RECORDS: Set<&'static str> = phf_set! {
    "HEADER", "OBSLTE", "TITLE", "SPLIT", "CAVEAT", "COMPND", "SOURCE", "KEYWDS",
    "EXPDTA", "NUMMDL", "MDLTYP", "AUTHOR", "REVDAT", "SPRSDE", "JRNL", "REMARK",
    "DBREF", "DBREF1", "DBREF2", "SEQADV", "SEQRES", "MODRES", "HET", "HETNAM",
    "HETSYN", "FORMUL", "HELIX", "SHEET", "SSBOND", "LINK", "CISPEP", "SITE",
    "CRYST1", "ORIGX1", "ORIGX2", "ORIGX3", "SCALE1", "SCALE2", "SCALE3", "MTRIX1",
    "MTRIX2", "MTRIX3", "MODEL", "ATOM", "ANISOU", "TER", "HETATM", "ENDMDL",
    "CONECT", "MASTER", "END",
};

/// Start columns of the four residue blocks on a SITE record.
const SITE_RESIDUE_COLUMNS: [usize; 4] = [19, 30, 41, 52];
const TITLE_WIDTH: usize = 70;
const BINDING_SITE_PREFIX: &str = "BINDING SITE FOR RESIDUE";

/// One ATOM or HETATM record.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub hetero: bool,
    pub serial: i64,
    pub name: String,
    pub alt_loc: Option<char>,
    pub residue_name: String,
    pub chain_id: String,
    pub residue_number: Option<i64>,
    pub insertion_code: Option<char>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub occupancy: Option<f64>,
    pub temperature_factor: Option<f64>,
    pub element: String,
    pub charge: i32,
}

/// Identifies a residue the way SITE and REMARK 800 records refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueKey {
    pub name: String,
    pub chain_id: String,
    pub number: i64,
    pub insertion_code: Option<char>,
}

impl ResidueKey {
    /// The residue identity used by the object model: chain, number and insertion
    /// code run together, e.g. `"A23"` or `"B104C"`.
    pub fn residue_id(&self) -> String {
        residue_id(&self.chain_id, self.number, self.insertion_code)
    }
}

pub(crate) fn residue_id(chain_id: &str, number: i64, insertion_code: Option<char>) -> String {
    match insertion_code {
        Some(code) => format!("{}{}{}", chain_id, number, code),
        None => format!("{}{}", chain_id, number),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRecords {
    /// Serial from the MODEL record; `None` for atoms outside any MODEL block.
    pub number: Option<i64>,
    pub atoms: Vec<AtomRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecords {
    pub site_id: String,
    pub residues: Vec<ResidueKey>,
}

/// The typed content of a PDB file, between raw records and the object model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbDataFile {
    pub code: Option<String>,
    pub classification: Option<String>,
    pub deposition_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub models: Vec<ModelRecords>,
    pub sites: Vec<SiteRecords>,
    /// Ligand of each site, keyed by site id, from REMARK 800.
    pub site_ligands: BTreeMap<String, ResidueKey>,
    pub warnings: Vec<ParseWarning>,
}

/// Mutable state threaded through a single read.
struct Reader<'a> {
    config: &'a ReadConfig,
    file: PdbDataFile,
    title_parts: Vec<String>,
    open_model: Option<ModelRecords>,
    implicit_model: Option<usize>,
    pending_site_id: Option<String>,
}

impl<'a> Reader<'a> {
    fn new(config: &'a ReadConfig) -> Self {
        Self {
            config,
            file: PdbDataFile::default(),
            title_parts: Vec::new(),
            open_model: None,
            implicit_model: None,
            pending_site_id: None,
        }
    }

    fn warn(&mut self, warning: ParseWarning) -> Result<(), PdbError> {
        if self.config.strict {
            return Err(PdbError::Strict(warning));
        }
        warn!("{}", warning);
        self.file.warnings.push(warning);
        Ok(())
    }

    fn read(&mut self, record: &PdbRecord) -> Result<(), PdbError> {
        if record.was_truncated() {
            self.warn(ParseWarning::LineTooLong {
                line: record.number(),
            })?;
        }
        match record.name() {
            "HEADER" => self.read_header(record)?,
            "TITLE" => {
                let part = record.string(11, 80);
                if !part.is_empty() {
                    self.title_parts.push(part.to_string());
                }
            }
            "REMARK" => self.read_remark(record)?,
            "SITE" => self.read_site(record)?,
            "MODEL" => {
                self.close_model();
                let number = match record.integer(11, 14) {
                    Ok(number) => number,
                    Err(kind) => {
                        self.warn(ParseWarning::InvalidRecord {
                            line: record.number(),
                            kind,
                        })?;
                        None
                    }
                };
                self.open_model = Some(ModelRecords {
                    number,
                    atoms: Vec::new(),
                });
            }
            "ENDMDL" => self.close_model(),
            "ATOM" | "HETATM" => match parse_atom(record) {
                Ok(atom) => self.push_atom(atom),
                Err(kind) => self.warn(ParseWarning::InvalidRecord {
                    line: record.number(),
                    kind,
                })?,
            },
            name if KNOWN_RECORDS.contains(name) => {}
            name => {
                let name = name.to_string();
                self.warn(ParseWarning::UnknownRecord {
                    line: record.number(),
                    name,
                })?
            }
        }
        Ok(())
    }

    fn read_header(&mut self, record: &PdbRecord) -> Result<(), PdbError> {
        let classification = record.string(11, 50);
        if !classification.is_empty() {
            self.file.classification = Some(classification.to_string());
        }
        let code = record.string(63, 66);
        if !code.is_empty() {
            self.file.code = Some(code.to_string());
        }
        let date = record.string(51, 59);
        if !date.is_empty() {
            match parse_date(date) {
                Some(date) => self.file.deposition_date = Some(date),
                None => {
                    let value = date.to_string();
                    self.warn(ParseWarning::InvalidDate {
                        line: record.number(),
                        value,
                    })?;
                }
            }
        }
        Ok(())
    }

    fn read_remark(&mut self, record: &PdbRecord) -> Result<(), PdbError> {
        if record.string(8, 10) != "800" {
            return Ok(());
        }
        let text = record.string(12, 80);
        if let Some(site_id) = text.strip_prefix("SITE_IDENTIFIER:") {
            self.pending_site_id = Some(site_id.trim().to_string());
        } else if let Some(description) = text.strip_prefix("SITE_DESCRIPTION:") {
            let Some(site_id) = self.pending_site_id.take() else {
                return Ok(());
            };
            match parse_site_description(description.trim()) {
                Some(ligand) => {
                    self.file.site_ligands.insert(site_id, ligand);
                }
                None => debug!(site = %site_id, "site description does not name a ligand"),
            }
        }
        Ok(())
    }

    fn read_site(&mut self, record: &PdbRecord) -> Result<(), PdbError> {
        let site_id = record.string(12, 14).to_string();
        let mut residues = Vec::new();
        for base in SITE_RESIDUE_COLUMNS {
            let name = record.string(base, base + 2);
            if name.is_empty() {
                continue;
            }
            let number = match record.integer(base + 5, base + 8) {
                Ok(Some(number)) => number,
                Ok(None) => {
                    return self.warn(ParseWarning::InvalidRecord {
                        line: record.number(),
                        kind: RecordError::MissingField {
                            columns: format!("{}-{}", base + 5, base + 8),
                        },
                    });
                }
                Err(kind) => {
                    return self.warn(ParseWarning::InvalidRecord {
                        line: record.number(),
                        kind,
                    });
                }
            };
            residues.push(ResidueKey {
                name: name.to_string(),
                chain_id: record.string(base + 4, base + 4).to_string(),
                number,
                insertion_code: record.character(base + 9),
            });
        }
        match self.file.sites.iter_mut().find(|s| s.site_id == site_id) {
            Some(site) => site.residues.extend(residues),
            None => self.file.sites.push(SiteRecords { site_id, residues }),
        }
        Ok(())
    }

    fn push_atom(&mut self, atom: AtomRecord) {
        if let Some(model) = self.open_model.as_mut() {
            model.atoms.push(atom);
            return;
        }
        let index = match self.implicit_model {
            Some(index) => index,
            None => {
                self.file.models.push(ModelRecords::default());
                let index = self.file.models.len() - 1;
                self.implicit_model = Some(index);
                index
            }
        };
        self.file.models[index].atoms.push(atom);
    }

    fn close_model(&mut self) {
        if let Some(model) = self.open_model.take() {
            self.file.models.push(model);
        }
    }

    fn finish(mut self) -> Result<PdbDataFile, PdbError> {
        self.close_model();
        if !self.title_parts.is_empty() {
            self.file.title = Some(self.title_parts.join(" "));
        }
        self.file.models.retain(|m| !m.atoms.is_empty());
        if self.config.first_model_only {
            self.file.models.truncate(1);
        }
        if self.file.models.is_empty() {
            return Err(PdbError::NoModels);
        }
        Ok(self.file)
    }
}

fn parse_atom(record: &PdbRecord) -> Result<AtomRecord, RecordError> {
    let required_float = |start: usize, end: usize| -> Result<f64, RecordError> {
        record.float(start, end)?.ok_or(RecordError::MissingField {
            columns: format!("{}-{}", start, end),
        })
    };
    let serial = record.integer(7, 11)?.ok_or(RecordError::MissingField {
        columns: "7-11".into(),
    })?;
    let x = required_float(31, 38)?;
    let y = required_float(39, 46)?;
    let z = required_float(47, 54)?;
    let element = match record.string(77, 78) {
        "" => infer_element(record.columns(13, 16)).ok_or(RecordError::MissingField {
            columns: "77-78".into(),
        })?,
        element if element.len() <= 2 && element.chars().all(|c| c.is_ascii_alphabetic()) => {
            element.to_ascii_uppercase()
        }
        element => {
            return Err(RecordError::InvalidElement {
                value: element.to_string(),
            });
        }
    };
    Ok(AtomRecord {
        hetero: record.name() == "HETATM",
        serial,
        name: record.string(13, 16).to_string(),
        alt_loc: record.character(17),
        residue_name: record.string(18, 20).to_string(),
        chain_id: record.string(22, 22).to_string(),
        residue_number: record.integer(23, 26)?,
        insertion_code: record.character(27),
        x,
        y,
        z,
        occupancy: record.float(55, 60)?,
        temperature_factor: record.float(61, 66)?,
        element,
        charge: parse_charge(record.string(79, 80))?,
    })
}

/// Charges are written as a digit followed by a sign, e.g. `"2+"` or `"1-"`.
fn parse_charge(text: &str) -> Result<i32, RecordError> {
    if text.is_empty() {
        return Ok(0);
    }
    let invalid = || RecordError::InvalidInt {
        columns: "79-80".into(),
        value: text.to_string(),
    };
    let (magnitude, sign) = match text.chars().last() {
        Some('+') => (&text[..text.len() - 1], 1),
        Some('-') => (&text[..text.len() - 1], -1),
        _ => (text, 1),
    };
    let magnitude: i32 = magnitude.trim().parse().map_err(|_| invalid())?;
    Ok(sign * magnitude)
}

fn format_charge(charge: i32) -> String {
    match charge {
        0 => String::new(),
        c if c > 0 => format!("{}+", c),
        c => format!("{}-", -c),
    }
}

/// Parses a `DD-MON-YY` date; the month may be in any case.
fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%d-%b-%y").ok()
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%d-%b-%y").to_string().to_ascii_uppercase()
}

/// Splits a residue number with an optional trailing insertion code, e.g. `"154A"`.
pub(crate) fn split_number(text: &str) -> Option<(i64, Option<char>)> {
    let text = text.trim();
    let last = text.chars().last()?;
    if last.is_ascii_alphabetic() {
        let number = text[..text.len() - 1].parse().ok()?;
        Some((number, Some(last)))
    } else {
        Some((text.parse().ok()?, None))
    }
}

/// Reads `BINDING SITE FOR RESIDUE HEM A 154` (the chain may be absent).
fn parse_site_description(description: &str) -> Option<ResidueKey> {
    let rest = description.strip_prefix(BINDING_SITE_PREFIX)?;
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let (name, chain_id, number) = match tokens.as_slice() {
        [name, chain, number] => (*name, *chain, *number),
        [name, number] => (*name, "", *number),
        _ => return None,
    };
    let (number, insertion_code) = split_number(number)?;
    Some(ResidueKey {
        name: name.to_string(),
        chain_id: chain_id.to_string(),
        number,
        insertion_code,
    })
}

/// Greedily wraps text into lines of at most `width` characters, breaking words
/// that are longer than a whole line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word[..width].to_string());
            word = &word[width..];
        }
        if word.is_empty() {
            continue;
        }
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Returns `value` if it fits in `width` columns.
fn fit(
    record: &str,
    field: &'static str,
    value: String,
    width: usize,
) -> Result<String, PdbError> {
    if value.chars().count() > width {
        return Err(PdbError::FieldOverflow {
            record: record.to_string(),
            field,
            value,
        });
    }
    Ok(value)
}

fn format_atom_name(record: &str, name: &str, element: &str) -> Result<String, PdbError> {
    let name = fit(record, "atom name", name.to_string(), 4)?;
    if name.len() < 4 && element.len() == 1 {
        Ok(format!(" {:<3}", name))
    } else {
        Ok(format!("{:<4}", name))
    }
}

fn format_atom(atom: &AtomRecord) -> Result<String, PdbError> {
    let record = if atom.hetero { "HETATM" } else { "ATOM" };
    let residue_number = atom
        .residue_number
        .map(|n| n.to_string())
        .unwrap_or_default();
    let coordinate = |field, value: f64| fit(record, field, format!("{:.3}", value), 8);
    Ok(format!(
        "{:<6}{:>5} {}{}{:>3} {:1}{:>4}{}   {:>8}{:>8}{:>8}{:>6}{:>6}          {:>2}{:>2}",
        record,
        fit(record, "serial", atom.serial.to_string(), 5)?,
        format_atom_name(record, &atom.name, &atom.element)?,
        atom.alt_loc.unwrap_or(' '),
        fit(record, "residue name", atom.residue_name.clone(), 3)?,
        fit(record, "chain id", atom.chain_id.clone(), 1)?,
        fit(record, "residue number", residue_number, 4)?,
        atom.insertion_code.unwrap_or(' '),
        coordinate("x", atom.x)?,
        coordinate("y", atom.y)?,
        coordinate("z", atom.z)?,
        fit(
            record,
            "occupancy",
            format!("{:.2}", atom.occupancy.unwrap_or(1.0)),
            6
        )?,
        fit(
            record,
            "temperature factor",
            format!("{:.2}", atom.temperature_factor.unwrap_or(0.0)),
            6
        )?,
        fit(record, "element", atom.element.clone(), 2)?,
        fit(record, "charge", format_charge(atom.charge), 2)?,
    ))
}

fn format_site_residue(residue: &ResidueKey) -> Result<String, PdbError> {
    Ok(format!(
        " {:>3} {:1}{:>4}{}",
        fit("SITE", "residue name", residue.name.clone(), 3)?,
        fit("SITE", "chain id", residue.chain_id.clone(), 1)?,
        fit("SITE", "residue number", residue.number.to_string(), 4)?,
        residue.insertion_code.unwrap_or(' ')
    ))
}

impl PdbDataFile {
    /// Builds a data file from records, accumulating recoverable problems as warnings.
    ///
    /// # Errors
    ///
    /// * [`PdbError::NoModels`] if no ATOM or HETATM record could be read.
    /// * [`PdbError::Strict`] with the first warning, if `config.strict` is set.
    #[instrument(skip_all, name = "pdb_data_file_from_records")]
    pub fn from_records(records: &[PdbRecord], config: &ReadConfig) -> Result<Self, PdbError> {
        let mut reader = Reader::new(config);
        for record in records {
            reader.read(record)?;
        }
        let file = reader.finish()?;
        debug!(
            records = records.len(),
            models = file.models.len(),
            sites = file.sites.len(),
            warnings = file.warnings.len(),
            "Read PDB data file"
        );
        Ok(file)
    }

    pub fn from_text(text: &str, config: &ReadConfig) -> Result<Self, PdbError> {
        Self::from_records(&record::parse_records(text), config)
    }

    /// Serialises the data file into records, ending with `END`.
    ///
    /// # Errors
    ///
    /// [`PdbError::FieldOverflow`] if a value is too wide for its columns.
    #[instrument(skip_all, name = "pdb_data_file_to_records")]
    pub fn to_records(&self, config: &WriteConfig) -> Result<Vec<PdbRecord>, PdbError> {
        let mut lines: Vec<String> = Vec::new();

        if config.write_header
            && (self.code.is_some()
                || self.deposition_date.is_some()
                || self.classification.is_some())
        {
            let classification = self.classification.clone().unwrap_or_default();
            let date = self
                .deposition_date
                .as_ref()
                .map(format_date)
                .unwrap_or_default();
            let code = self.code.clone().unwrap_or_default();
            lines.push(format!(
                "HEADER    {:<40}{:<9}   {:<4}",
                fit("HEADER", "classification", classification, 40)?,
                fit("HEADER", "deposition date", date, 9)?,
                fit("HEADER", "code", code, 4)?,
            ));
        }

        if let Some(title) = &self.title {
            for (index, part) in wrap(title, TITLE_WIDTH).iter().enumerate() {
                if index == 0 {
                    lines.push(format!("TITLE     {}", part));
                } else {
                    let continuation = fit("TITLE", "continuation", (index + 1).to_string(), 2)?;
                    lines.push(format!("TITLE   {:>2}{}", continuation, part));
                }
            }
        }

        for (site_id, ligand) in &self.site_ligands {
            let number = match ligand.insertion_code {
                Some(code) => format!("{}{}", ligand.number, code),
                None => ligand.number.to_string(),
            };
            lines.push(format!("REMARK 800 SITE_IDENTIFIER: {}", site_id));
            lines.push(format!(
                "REMARK 800 SITE_DESCRIPTION: {} {} {} {}",
                BINDING_SITE_PREFIX, ligand.name, ligand.chain_id, number
            ));
        }

        for site in &self.sites {
            for (index, chunk) in site.residues.chunks(SITE_RESIDUE_COLUMNS.len()).enumerate() {
                let mut line = format!(
                    "SITE   {:>3} {:>3} {:>2}",
                    fit("SITE", "sequence number", (index + 1).to_string(), 3)?,
                    fit("SITE", "site id", site.site_id.clone(), 3)?,
                    fit("SITE", "residue count", site.residues.len().to_string(), 2)?,
                );
                for residue in chunk {
                    line.push_str(&format_site_residue(residue)?);
                }
                lines.push(line);
            }
        }

        let multiple = self.models.len() > 1;
        for (index, model) in self.models.iter().enumerate() {
            if multiple {
                let number = model.number.unwrap_or(index as i64 + 1);
                let number = fit("MODEL", "serial", number.to_string(), 4)?;
                lines.push(format!("MODEL     {:>4}", number));
            }
            let mut open_chain: Option<&str> = None;
            for atom in &model.atoms {
                if let Some(chain) = open_chain {
                    if atom.hetero || atom.chain_id != chain {
                        lines.push("TER".to_string());
                        open_chain = None;
                    }
                }
                if !atom.hetero {
                    open_chain = Some(&atom.chain_id);
                }
                lines.push(format_atom(atom)?);
            }
            if open_chain.is_some() {
                lines.push("TER".to_string());
            }
            if multiple {
                lines.push("ENDMDL".to_string());
            }
        }
        lines.push("END".to_string());

        if let Some(line) = lines.iter().find(|line| line.len() > record::RECORD_WIDTH) {
            let name = line.get(..record::NAME_WIDTH).unwrap_or(line.as_str()).trim_end();
            return Err(PdbError::FieldOverflow {
                record: name.to_string(),
                field: "record",
                value: line.clone(),
            });
        }

        debug!(lines = lines.len(), "Wrote PDB data file");
        Ok(lines
            .iter()
            .enumerate()
            .map(|(index, line)| PdbRecord::new(line, index + 1))
            .collect())
    }

    pub fn to_text(&self, config: &WriteConfig) -> Result<String, PdbError> {
        Ok(record::records_to_string(
            &self.to_records(config)?,
            config.line_ending,
        ))
    }
}
