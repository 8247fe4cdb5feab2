//! Conversion between [`PdbDataFile`] and the [`Pdb`] object model.

use super::config::ReadConfig;
use super::data_file::{self, AtomRecord, ModelRecords, PdbDataFile, ResidueKey, SiteRecords};
use super::error::{ParseWarning, PdbError};
use crate::core::models::atom::Atom;
use crate::core::models::error::ModelError;
use crate::core::models::ids::{AtomId, StructureId};
use crate::core::models::structure::{Member, StructureKind};
use crate::core::models::system::MolecularSystem;
use crate::files::pdb::Pdb;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument, warn};

/// Atoms of one residue or small molecule, in file order.
struct Group {
    residue_id: String,
    chain_id: String,
    name: String,
    atoms: Vec<AtomId>,
}

/// Index of `groups` by residue id, preserving first-seen order.
#[derive(Default)]
struct Groups {
    order: Vec<Group>,
    index: HashMap<String, usize>,
}

impl Groups {
    fn push(&mut self, record: &AtomRecord, number: i64, atom: AtomId) {
        let residue_id = data_file::residue_id(&record.chain_id, number, record.insertion_code);
        let slot = match self.index.get(&residue_id) {
            Some(&slot) => slot,
            None => {
                self.order.push(Group {
                    residue_id: residue_id.clone(),
                    chain_id: record.chain_id.clone(),
                    name: record.residue_name.clone(),
                    atoms: Vec::new(),
                });
                self.index.insert(residue_id, self.order.len() - 1);
                self.order.len() - 1
            }
        };
        self.order[slot].atoms.push(atom);
    }
}

fn members(atoms: &[AtomId]) -> Vec<Member> {
    atoms.iter().copied().map(Member::from).collect()
}

struct ModelBuilder<'a> {
    system: &'a mut MolecularSystem,
    config: &'a ReadConfig,
    warnings: &'a mut Vec<ParseWarning>,
}

impl ModelBuilder<'_> {
    fn warn(&mut self, warning: ParseWarning) -> Result<(), PdbError> {
        if self.config.strict {
            return Err(PdbError::Strict(warning));
        }
        warn!("{}", warning);
        self.warnings.push(warning);
        Ok(())
    }

    fn build(
        &mut self,
        records: &ModelRecords,
        sites: &[SiteRecords],
        site_ligands: &BTreeMap<String, ResidueKey>,
    ) -> Result<StructureId, PdbError> {
        let mut residues = Groups::default();
        let mut molecules = Groups::default();
        let mut loose = Vec::new();

        for record in &records.atoms {
            let atom = Atom::new(
                &record.element,
                record.serial,
                &record.name,
                Point3::new(record.x, record.y, record.z),
            )?;
            let atom_id = self.system.create_atom(atom);
            match (record.residue_number, record.hetero) {
                (Some(number), false) => residues.push(record, number, atom_id),
                (Some(number), true) => molecules.push(record, number, atom_id),
                (None, _) => loose.push(atom_id),
            }
        }

        let mut residue_ids: HashMap<String, StructureId> = HashMap::new();
        let mut chains: Vec<(String, Vec<Member>)> = Vec::new();
        for group in &residues.order {
            let residue =
                self.system
                    .new_residue(&group.residue_id, &group.name, &members(&group.atoms))?;
            residue_ids.insert(group.residue_id.clone(), residue);
            match chains.iter_mut().find(|(id, _)| *id == group.chain_id) {
                Some((_, chain)) => chain.push(residue.into()),
                None => chains.push((group.chain_id.clone(), vec![residue.into()])),
            }
        }

        let mut model_members: Vec<Member> = Vec::new();
        for (chain_id, chain_residues) in &chains {
            model_members.push(self.system.new_chain(chain_id, chain_residues)?.into());
        }

        let mut molecule_ids: HashMap<String, StructureId> = HashMap::new();
        for group in &molecules.order {
            let molecule = self.system.new_molecule(
                &group.residue_id,
                Some(&group.name),
                &members(&group.atoms),
            )?;
            molecule_ids.insert(group.residue_id.clone(), molecule);
            model_members.push(molecule.into());
        }

        for site in sites {
            let mut site_residues = Vec::new();
            for key in &site.residues {
                match residue_ids.get(&key.residue_id()) {
                    Some(&residue) => site_residues.push(Member::from(residue)),
                    None => self.warn(ParseWarning::UnresolvedSite {
                        site: site.site_id.clone(),
                        residue: key.residue_id(),
                    })?,
                }
            }
            if site_residues.is_empty() {
                continue;
            }
            let site_id = self.system.new_site(&site.site_id, &site_residues)?;
            if let Some(ligand) = site_ligands.get(&site.site_id) {
                match molecule_ids.get(&ligand.residue_id()) {
                    Some(&molecule) => self.system.set_ligand(site_id, Some(molecule))?,
                    None => self.warn(ParseWarning::UnresolvedLigand {
                        site: site.site_id.clone(),
                        ligand: format!("{} {}", ligand.name, ligand.residue_id()),
                    })?,
                }
            }
            model_members.push(site_id.into());
        }

        model_members.extend(loose.into_iter().map(Member::from));
        debug!(
            chains = chains.len(),
            molecules = molecules.order.len(),
            atoms = records.atoms.len(),
            "Built model"
        );
        Ok(self.system.new_model(&model_members)?)
    }
}

/// Builds the object model from a data file.
///
/// Warnings already recorded on the data file are carried over to the result, and
/// problems found while resolving sites and ligands are added to them.
#[instrument(skip_all, name = "data_file_to_pdb")]
pub fn data_file_to_pdb(data: &PdbDataFile, config: &ReadConfig) -> Result<Pdb, PdbError> {
    if data.models.is_empty() {
        return Err(PdbError::NoModels);
    }
    let mut pdb = Pdb::new();
    let mut warnings = data.warnings.clone();

    if let Some(code) = &data.code {
        if let Err(err) = pdb.set_code(code) {
            debug!("Rejected file code: {}", err);
            let warning = ParseWarning::InvalidCode {
                value: code.clone(),
            };
            if config.strict {
                return Err(PdbError::Strict(warning));
            }
            warn!("{}", warning);
            warnings.push(warning);
        }
    }
    pdb.classification = data.classification.clone();
    pdb.deposition_date = data.deposition_date;
    pdb.title = data.title.clone();

    let mut models = Vec::with_capacity(data.models.len());
    {
        let mut builder = ModelBuilder {
            system: &mut pdb.system,
            config,
            warnings: &mut warnings,
        };
        for records in &data.models {
            models.push(builder.build(records, &data.sites, &data.site_ligands)?);
        }
    }
    pdb.models = models;
    pdb.warnings = warnings;
    Ok(pdb)
}

/// Splits a residue or molecule id such as `"A23"` or `"B104C"` into chain, number
/// and insertion code.
///
/// When the chain is known it is stripped as a prefix; otherwise a leading letter is
/// taken as the chain. Returns `None` if no residue number can be found.
pub fn split_residue_id(id: &str, chain_id: Option<&str>) -> Option<(String, i64, Option<char>)> {
    let (chain, rest) = match chain_id {
        Some(chain) => (chain.to_string(), id.strip_prefix(chain)?),
        None => match id.chars().next() {
            Some(c) if c.is_ascii_alphabetic() => (c.to_string(), &id[1..]),
            _ => (String::new(), id),
        },
    };
    let (number, insertion_code) = data_file::split_number(rest)?;
    Some((chain, number, insertion_code))
}

struct RecordWriter<'a> {
    system: &'a MolecularSystem,
}

impl RecordWriter<'_> {
    /// Atom records for the atoms held directly by `structure`, sorted by atom id.
    fn atom_records(
        &self,
        structure: StructureId,
        hetero: bool,
        chain_id: Option<&str>,
    ) -> Result<Vec<AtomRecord>, PdbError> {
        let node = self
            .system
            .structure(structure)
            .ok_or(ModelError::StructureNotFound(structure))?;
        let location = match (node.kind(), node.id()) {
            (StructureKind::Model, _) | (_, None) => None,
            (_, Some(id)) => split_residue_id(id, chain_id),
        };
        let (chain, number, insertion_code) = match location {
            Some((chain, number, code)) => (chain, Some(number), code),
            None => (chain_id.unwrap_or("").to_string(), None, None),
        };
        let residue_name = match node.kind() {
            StructureKind::Model => String::new(),
            _ => node.name().unwrap_or("").to_string(),
        };

        let mut atoms: Vec<&Atom> = node
            .own_atoms()
            .iter()
            .filter_map(|&a| self.system.atom(a))
            .collect();
        atoms.sort_by_key(|a| a.id());

        Ok(atoms
            .into_iter()
            .filter_map(|atom| {
                let position = atom.position()?;
                Some(AtomRecord {
                    hetero,
                    serial: atom.id(),
                    name: atom.name().to_string(),
                    alt_loc: None,
                    residue_name: residue_name.clone(),
                    chain_id: chain.clone(),
                    residue_number: number,
                    insertion_code,
                    x: position.x,
                    y: position.y,
                    z: position.z,
                    occupancy: None,
                    temperature_factor: None,
                    element: atom.element().to_string(),
                    charge: 0,
                })
            })
            .collect())
    }

    fn residue_key(&self, structure: StructureId) -> Option<ResidueKey> {
        let node = self.system.structure(structure)?;
        let chain_hint = node
            .parent()
            .and_then(|p| self.system.structure(p))
            .filter(|p| p.kind() == StructureKind::Chain)
            .and_then(|p| p.id());
        let (chain_id, number, insertion_code) = split_residue_id(node.id()?, chain_hint)?;
        Some(ResidueKey {
            name: node.name().unwrap_or("").to_string(),
            chain_id,
            number,
            insertion_code,
        })
    }

    fn model(&self, model: StructureId) -> Result<ModelRecords, PdbError> {
        let mut atoms = Vec::new();
        for chain in self
            .system
            .children_of_kind(model, StructureKind::Chain)?
        {
            let chain_id = self
                .system
                .structure(chain)
                .and_then(|c| c.id())
                .map(str::to_string);
            for residue in self
                .system
                .children_of_kind(chain, StructureKind::Residue)?
            {
                atoms.extend(self.atom_records(residue, false, chain_id.as_deref())?);
            }
        }
        for molecule in self
            .system
            .children_of_kind(model, StructureKind::SmallMolecule)?
        {
            atoms.extend(self.atom_records(molecule, true, None)?);
        }
        atoms.extend(self.atom_records(model, true, None)?);
        Ok(ModelRecords {
            number: None,
            atoms,
        })
    }

    fn sites(
        &self,
        model: StructureId,
    ) -> Result<(Vec<SiteRecords>, BTreeMap<String, ResidueKey>), PdbError> {
        let mut sites = Vec::new();
        let mut ligands = BTreeMap::new();
        for site in self
            .system
            .children_of_kind(model, StructureKind::BindSite)?
        {
            let Some(node) = self.system.structure(site) else {
                continue;
            };
            let site_id = node.id().unwrap_or("").to_string();
            let residues = node
                .children()
                .iter()
                .filter_map(|&r| self.residue_key(r))
                .collect();
            if let Some(ligand) = self.system.ligand(site)? {
                if let Some(key) = self
                    .system
                    .structure(ligand)
                    .and_then(|l| l.id())
                    .and_then(|id| split_residue_id(id, None))
                    .map(|(chain_id, number, insertion_code)| ResidueKey {
                        name: self
                            .system
                            .structure(ligand)
                            .and_then(|l| l.name())
                            .unwrap_or("")
                            .to_string(),
                        chain_id,
                        number,
                        insertion_code,
                    })
                {
                    ligands.insert(site_id.clone(), key);
                }
            }
            sites.push(SiteRecords { site_id, residues });
        }
        Ok((sites, ligands))
    }
}

/// Flattens the object model into a data file ready for writing.
///
/// Residues are written chain by chain, then small molecules, then the model's loose
/// atoms; within each, atoms are in ascending atom id order. Ghost atoms have no
/// coordinates and are left out. Binding sites are taken from the first model.
#[instrument(skip_all, name = "pdb_to_data_file")]
pub fn pdb_to_data_file(pdb: &Pdb) -> Result<PdbDataFile, PdbError> {
    let writer = RecordWriter {
        system: pdb.system(),
    };
    let mut models = Vec::with_capacity(pdb.models().len());
    for &model in pdb.models() {
        models.push(writer.model(model)?);
    }
    let (sites, site_ligands) = match pdb.model() {
        Some(first) => writer.sites(first)?,
        None => Default::default(),
    };
    Ok(PdbDataFile {
        code: pdb.code().map(str::to_string),
        classification: pdb.classification().map(str::to_string),
        deposition_date: pdb.deposition_date(),
        title: pdb.title().map(str::to_string),
        models,
        sites,
        site_ligands,
        warnings: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::AtomFilter;

    const SAMPLE: &str = "\
HEADER    OXYGEN TRANSPORT                        21-SEP-17   1ABC
REMARK 800 SITE_IDENTIFIER: AC1
REMARK 800 SITE_DESCRIPTION: BINDING SITE FOR RESIDUE HEM A 154
SITE     1 AC1  2 GLY A   2  ALA B   1
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  CA  GLY A   2      12.000   7.000  -4.000  1.00  0.00           C
TER
ATOM      4  CA  ALA B   1       2.000   7.000  -4.000  1.00  0.00           C
TER
HETATM    5 FE   HEM A 154       0.000   1.000   2.000  1.00 10.50          FE
HETATM    6  O   HOH A 200      -1.000  -1.000  -1.000  0.50  0.00           O
HETATM    7 NA    NA            -3.000  -3.000  -3.000  1.00  0.00          NA
END
";

    fn sample_pdb() -> Pdb {
        let data = PdbDataFile::from_text(SAMPLE, &ReadConfig::default()).unwrap();
        data_file_to_pdb(&data, &ReadConfig::default()).unwrap()
    }

    fn ids(system: &MolecularSystem, structures: &[StructureId]) -> Vec<String> {
        structures
            .iter()
            .map(|&s| system.structure(s).unwrap().id().unwrap().to_string())
            .collect()
    }

    #[test]
    fn atoms_are_grouped_into_chains_residues_and_molecules() {
        let pdb = sample_pdb();
        let system = pdb.system();
        let model = pdb.model().unwrap();

        let chains = system.children_of_kind(model, StructureKind::Chain).unwrap();
        assert_eq!(ids(system, &chains), vec!["A", "B"]);
        let residues = system.children_of_kind(chains[0], StructureKind::Residue).unwrap();
        assert_eq!(ids(system, &residues), vec!["A1", "A2"]);
        assert_eq!(system.structure(residues[0]).unwrap().name(), Some("ALA"));

        let molecules = system
            .children_of_kind(model, StructureKind::SmallMolecule)
            .unwrap();
        assert_eq!(ids(system, &molecules), vec!["A154", "A200"]);

        let all = system.atoms(model, &AtomFilter::all()).unwrap();
        assert_eq!(all.len(), 7);
        let own = system.structure(model).unwrap().own_atoms();
        assert_eq!(own.len(), 1);
    }

    #[test]
    fn sites_resolve_residues_and_ligand() {
        let pdb = sample_pdb();
        let system = pdb.system();
        let model = pdb.model().unwrap();
        let sites = system.children_of_kind(model, StructureKind::BindSite).unwrap();
        assert_eq!(sites.len(), 1);
        let site = system.structure(sites[0]).unwrap();
        assert_eq!(site.to_string(), "<BindSite AC1 (2 residues)>");
        let ligand = system.ligand(sites[0]).unwrap().unwrap();
        assert_eq!(system.structure(ligand).unwrap().name(), Some("HEM"));
        for &residue in site.children() {
            assert_ne!(system.parent(residue), Some(sites[0]));
        }
        assert!(pdb.warnings().is_empty());
    }

    #[test]
    fn unresolvable_site_residue_is_a_warning() {
        let text = SAMPLE.replace("ALA B   1\n", "ALA C   9\n");
        let data = PdbDataFile::from_text(&text, &ReadConfig::default()).unwrap();
        let pdb = data_file_to_pdb(&data, &ReadConfig::default()).unwrap();
        assert_eq!(
            pdb.warnings(),
            &[ParseWarning::UnresolvedSite {
                site: "AC1".into(),
                residue: "C9".into()
            }]
        );

        let err = data_file_to_pdb(&data, &ReadConfig::default().strict(true)).unwrap_err();
        assert!(matches!(err, PdbError::Strict(ParseWarning::UnresolvedSite { .. })));
    }

    #[test]
    fn missing_ligand_is_a_warning() {
        let text = SAMPLE.replace("HEM A 154\n", "HEM A 999\n");
        let data = PdbDataFile::from_text(&text, &ReadConfig::default()).unwrap();
        let pdb = data_file_to_pdb(&data, &ReadConfig::default()).unwrap();
        assert!(matches!(
            pdb.warnings(),
            [ParseWarning::UnresolvedLigand { .. }]
        ));
    }

    #[test]
    fn invalid_header_code_is_a_warning() {
        let text = SAMPLE.replace("21-SEP-17   1ABC", "21-SEP-17   ABCD");
        let data = PdbDataFile::from_text(&text, &ReadConfig::default()).unwrap();
        let pdb = data_file_to_pdb(&data, &ReadConfig::default()).unwrap();
        assert_eq!(pdb.code(), None);
        assert_eq!(
            pdb.warnings(),
            &[ParseWarning::InvalidCode {
                value: "ABCD".into()
            }]
        );

        let err = data_file_to_pdb(&data, &ReadConfig::default().strict(true)).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Strict(ParseWarning::InvalidCode { ref value }) if value == "ABCD"
        ));
    }

    #[test]
    fn header_metadata_is_carried_over() {
        let pdb = sample_pdb();
        assert_eq!(pdb.code(), Some("1ABC"));
        assert_eq!(pdb.classification(), Some("OXYGEN TRANSPORT"));
        assert_eq!(
            pdb.deposition_date(),
            chrono::NaiveDate::from_ymd_opt(2017, 9, 21)
        );
    }

    #[test]
    fn object_model_flattens_back_to_the_same_atoms() {
        let data = PdbDataFile::from_text(SAMPLE, &ReadConfig::default()).unwrap();
        let pdb = data_file_to_pdb(&data, &ReadConfig::default()).unwrap();
        let back = pdb_to_data_file(&pdb).unwrap();

        let serials: Vec<i64> = back.models[0].atoms.iter().map(|a| a.serial).collect();
        assert_eq!(serials, vec![1, 2, 3, 4, 5, 6, 7]);
        let original = &data.models[0].atoms;
        for (a, b) in original.iter().zip(&back.models[0].atoms) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.element, b.element);
            assert_eq!(a.chain_id, b.chain_id);
            assert_eq!(a.residue_number, b.residue_number);
            assert_eq!((a.x, a.y, a.z), (b.x, b.y, b.z));
        }
        assert_eq!(back.sites, data.sites);
        assert_eq!(back.site_ligands, data.site_ligands);
    }

    #[test]
    fn split_residue_id_handles_chains_and_insertion_codes() {
        assert_eq!(
            split_residue_id("A23", None),
            Some(("A".to_string(), 23, None))
        );
        assert_eq!(
            split_residue_id("B104C", Some("B")),
            Some(("B".to_string(), 104, Some('C')))
        );
        assert_eq!(split_residue_id("12", None), Some((String::new(), 12, None)));
        assert_eq!(split_residue_id("1-5", Some("1")), Some(("1".to_string(), -5, None)));
        assert_eq!(split_residue_id("A", None), None);
    }

    #[test]
    fn empty_data_file_has_no_models() {
        let err = data_file_to_pdb(&PdbDataFile::default(), &ReadConfig::default()).unwrap_err();
        assert!(matches!(err, PdbError::NoModels));
    }
}
