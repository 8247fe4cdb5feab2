use super::atom::{Atom, AtomFilter};
use super::error::ModelError;
use super::ids::{AtomId, StructureId};
use super::structure::{Member, Structure, StructureKind};
use crate::core::utils::geometry::{self, Axis};
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashSet};

/// Owns every atom and structure of a molecular model.
///
/// Atoms and structures are stored in slot maps and addressed by [`AtomId`] and
/// [`StructureId`] handles. Ownership only flows downwards (model → chain → residue →
/// atom); the upward links held by atoms and structures are plain handles that are
/// queried, never followed for ownership, so a dangling link is harmless.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for structure nodes of every kind.
    structures: SlotMap<StructureId, Structure>,
}

impl MolecularSystem {
    /// Creates a new, empty molecular system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a standalone atom and returns its handle.
    pub fn create_atom(&mut self, atom: Atom) -> AtomId {
        self.atoms.insert(atom)
    }

    /// Retrieves an immutable reference to an atom by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The atom ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&Atom)` if the atom exists, otherwise `None`.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Returns an iterator over all atoms in the system.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(id)
    }

    pub fn structure_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.get_mut(id)
    }

    /// Returns an iterator over all structure nodes in the system.
    pub fn structures_iter(&self) -> impl Iterator<Item = (StructureId, &Structure)> {
        self.structures.iter()
    }

    fn get_atom(&self, id: AtomId) -> Result<&Atom, ModelError> {
        self.atoms.get(id).ok_or(ModelError::AtomNotFound(id))
    }

    fn get_structure(&self, id: StructureId) -> Result<&Structure, ModelError> {
        self.structures
            .get(id)
            .ok_or(ModelError::StructureNotFound(id))
    }

    /// Checks that `member` exists and may be held by a structure of `kind`.
    fn check_member(&self, kind: StructureKind, member: Member) -> Result<(), ModelError> {
        match member {
            Member::Atom(atom_id) => {
                let atom = self.get_atom(atom_id)?;
                if !kind.holds_atoms() {
                    return Err(ModelError::invalid_type(
                        kind.member_description(),
                        format!("{} in a {}", atom, kind),
                    ));
                }
            }
            Member::Structure(child_id) => {
                let child = self.get_structure(child_id)?;
                if !kind.holds(child.kind()) {
                    return Err(ModelError::invalid_type(
                        kind.member_description(),
                        format!("{} in a {}", child, kind),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Adds an already validated member and, unless `id` is a binding site, points the
    /// member's upward link at `id`.
    fn admit(&mut self, id: StructureId, member: Member) -> Result<(), ModelError> {
        let structure = self
            .structures
            .get_mut(id)
            .ok_or(ModelError::StructureNotFound(id))?;
        let adopts = structure.kind().adopts_members();
        match member {
            Member::Atom(atom_id) => {
                structure.atoms.insert(atom_id);
                if adopts {
                    if let Some(atom) = self.atoms.get_mut(atom_id) {
                        atom.structure = Some(id);
                    }
                }
            }
            Member::Structure(child_id) => {
                if !structure.children.contains(&child_id) {
                    structure.children.push(child_id);
                }
                if adopts {
                    if let Some(child) = self.structures.get_mut(child_id) {
                        child.parent = Some(id);
                    }
                }
            }
        }
        Ok(())
    }

    /// Creates a structure node of any kind from its initial members.
    ///
    /// Every member is validated before any is admitted, so a failed construction
    /// leaves the system (including atom back-references) untouched.
    ///
    /// # Errors
    ///
    /// * [`ModelError::NoAtoms`] if `members` is empty.
    /// * A type error if any member is of a kind `kind` cannot hold.
    /// * A lookup error if any member handle does not exist.
    pub fn create_structure(
        &mut self,
        kind: StructureKind,
        id: Option<String>,
        name: Option<String>,
        members: &[Member],
    ) -> Result<StructureId, ModelError> {
        if members.is_empty() {
            return Err(ModelError::NoAtoms { kind });
        }
        for &member in members {
            self.check_member(kind, member)?;
        }
        let structure_id = self.structures.insert(Structure::new(kind, id, name));
        for &member in members {
            self.admit(structure_id, member)?;
        }
        Ok(structure_id)
    }

    /// Creates a plain atomic structure from atoms.
    pub fn new_structure(&mut self, members: &[Member]) -> Result<StructureId, ModelError> {
        self.create_structure(StructureKind::Structure, None, None, members)
    }

    /// Creates a residue such as `new_residue("A23", "ALA", ..)`.
    pub fn new_residue(
        &mut self,
        residue_id: &str,
        name: &str,
        members: &[Member],
    ) -> Result<StructureId, ModelError> {
        self.create_structure(
            StructureKind::Residue,
            Some(residue_id.to_string()),
            Some(name.to_string()),
            members,
        )
    }

    pub fn new_molecule(
        &mut self,
        molecule_id: &str,
        name: Option<&str>,
        members: &[Member],
    ) -> Result<StructureId, ModelError> {
        self.create_structure(
            StructureKind::SmallMolecule,
            Some(molecule_id.to_string()),
            name.map(str::to_string),
            members,
        )
    }

    /// Creates a chain from residues, kept in the order given.
    pub fn new_chain(
        &mut self,
        chain_id: &str,
        members: &[Member],
    ) -> Result<StructureId, ModelError> {
        self.create_structure(
            StructureKind::Chain,
            Some(chain_id.to_string()),
            None,
            members,
        )
    }

    /// Creates a binding site from residues. The residues keep their current parent.
    pub fn new_site(
        &mut self,
        site_id: &str,
        members: &[Member],
    ) -> Result<StructureId, ModelError> {
        self.create_structure(
            StructureKind::BindSite,
            Some(site_id.to_string()),
            None,
            members,
        )
    }

    /// Creates a model from chains, small molecules, binding sites and loose atoms.
    pub fn new_model(&mut self, members: &[Member]) -> Result<StructureId, ModelError> {
        self.create_structure(StructureKind::Model, None, None, members)
    }

    fn collect_atoms(&self, id: StructureId, out: &mut HashSet<AtomId>) -> Result<(), ModelError> {
        let structure = self.get_structure(id)?;
        out.extend(structure.atoms.iter().copied());
        for &child in &structure.children {
            self.collect_atoms(child, out)?;
        }
        Ok(())
    }

    /// Returns every atom in the structure, including those of nested structures,
    /// that matches `filter`.
    pub fn atoms(
        &self,
        id: StructureId,
        filter: &AtomFilter,
    ) -> Result<HashSet<AtomId>, ModelError> {
        let mut all = HashSet::new();
        self.collect_atoms(id, &mut all)?;
        Ok(all
            .into_iter()
            .filter(|&atom_id| self.atoms.get(atom_id).is_some_and(|a| filter.matches(a)))
            .collect())
    }

    /// Returns the matching atom with the lowest atom id, if any atom matches.
    pub fn first_atom(
        &self,
        id: StructureId,
        filter: &AtomFilter,
    ) -> Result<Option<AtomId>, ModelError> {
        let atoms = self.atoms(id, filter)?;
        Ok(atoms
            .into_iter()
            .filter_map(|atom_id| self.atoms.get(atom_id).map(|a| (a.id(), atom_id)))
            .min()
            .map(|(_, atom_id)| atom_id))
    }

    /// Whether `atom` is held by the structure or any structure nested in it.
    pub fn contains(&self, id: StructureId, atom: AtomId) -> Result<bool, ModelError> {
        let structure = self.get_structure(id)?;
        if structure.atoms.contains(&atom) {
            return Ok(true);
        }
        for &child in &structure.children {
            if self.contains(child, atom)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Adds an atom to a structure and makes the structure the atom's owner.
    ///
    /// # Errors
    ///
    /// A type error if the structure cannot hold atoms directly (chains and binding
    /// sites), or a lookup error if either handle is unknown.
    pub fn add_atom(&mut self, id: StructureId, atom: AtomId) -> Result<(), ModelError> {
        self.add_member(id, Member::Atom(atom))
    }

    /// Removes an atom held directly by the structure.
    ///
    /// The atom's back-reference is left as it was; clearing it is up to the caller.
    pub fn remove_atom(&mut self, id: StructureId, atom: AtomId) -> Result<(), ModelError> {
        let structure = self
            .structures
            .get_mut(id)
            .ok_or(ModelError::StructureNotFound(id))?;
        if structure.atoms.remove(&atom) {
            Ok(())
        } else {
            Err(ModelError::NotAMember {
                structure: id,
                member: format!("atom {:?}", atom),
            })
        }
    }

    /// Adds an atom or child structure, with the same kind rules as construction.
    pub fn add_member(&mut self, id: StructureId, member: Member) -> Result<(), ModelError> {
        let kind = self.get_structure(id)?.kind();
        self.check_member(kind, member)?;
        self.admit(id, member)
    }

    pub fn remove_member(&mut self, id: StructureId, member: Member) -> Result<(), ModelError> {
        match member {
            Member::Atom(atom) => self.remove_atom(id, atom),
            Member::Structure(child) => {
                let structure = self
                    .structures
                    .get_mut(id)
                    .ok_or(ModelError::StructureNotFound(id))?;
                let before = structure.children.len();
                structure.children.retain(|&c| c != child);
                if structure.children.len() == before {
                    return Err(ModelError::NotAMember {
                        structure: id,
                        member: format!("structure {:?}", child),
                    });
                }
                Ok(())
            }
        }
    }

    /// Direct children of a structure that are of the given kind, in order.
    pub fn children_of_kind(
        &self,
        id: StructureId,
        kind: StructureKind,
    ) -> Result<Vec<StructureId>, ModelError> {
        let structure = self.get_structure(id)?;
        Ok(structure
            .children
            .iter()
            .copied()
            .filter(|&c| self.structures.get(c).is_some_and(|s| s.kind() == kind))
            .collect())
    }

    /// Sum of the masses of all atoms in the structure.
    pub fn mass(&self, id: StructureId) -> Result<f64, ModelError> {
        let atoms = self.atoms(id, &AtomFilter::all())?;
        Ok(atoms
            .iter()
            .filter_map(|&a| self.atoms.get(a))
            .map(Atom::mass)
            .sum())
    }

    /// Counts the atoms of each element in the structure.
    pub fn formula(&self, id: StructureId) -> Result<BTreeMap<String, usize>, ModelError> {
        let atoms = self.atoms(id, &AtomFilter::all())?;
        let mut formula = BTreeMap::new();
        for atom in atoms.iter().filter_map(|&a| self.atoms.get(a)) {
            *formula.entry(atom.element().to_string()).or_insert(0) += 1;
        }
        Ok(formula)
    }

    fn located_atoms(&self, id: StructureId) -> Result<(Vec<AtomId>, Vec<Point3<f64>>), ModelError> {
        let atoms = self.atoms(id, &AtomFilter::all())?;
        Ok(atoms
            .into_iter()
            .filter_map(|a| self.atoms.get(a).and_then(|atom| atom.position()).map(|p| (a, p)))
            .unzip())
    }

    fn write_back(&mut self, ids: &[AtomId], points: Vec<Point3<f64>>) {
        for (&atom_id, point) in ids.iter().zip(points) {
            if let Some(atom) = self.atoms.get_mut(atom_id) {
                atom.set_position(point);
            }
        }
    }

    /// Moves every located atom of the structure by `(dx, dy, dz)`.
    pub fn translate(
        &mut self,
        id: StructureId,
        dx: f64,
        dy: f64,
        dz: f64,
    ) -> Result<(), ModelError> {
        let (ids, points) = self.located_atoms(id)?;
        let moved = geometry::translate_points(&points, dx, dy, dz);
        self.write_back(&ids, moved);
        Ok(())
    }

    /// Rotates every located atom of the structure about `axis` through the origin.
    /// The rotation is right-handed and `angle` is in degrees.
    pub fn rotate(&mut self, id: StructureId, axis: Axis, angle: f64) -> Result<(), ModelError> {
        let (ids, points) = self.located_atoms(id)?;
        let moved = geometry::rotate_points(&points, axis, angle);
        self.write_back(&ids, moved);
        Ok(())
    }

    fn get_site(&self, site: StructureId) -> Result<&Structure, ModelError> {
        let structure = self.get_structure(site)?;
        if structure.kind() != StructureKind::BindSite {
            return Err(ModelError::invalid_type(
                "a binding site",
                structure.to_string(),
            ));
        }
        Ok(structure)
    }

    /// The small molecule a binding site binds, if one has been assigned.
    pub fn ligand(&self, site: StructureId) -> Result<Option<StructureId>, ModelError> {
        Ok(self.get_site(site)?.ligand)
    }

    /// Assigns or clears the ligand of a binding site.
    ///
    /// # Errors
    ///
    /// A type error if `site` is not a binding site or `ligand` is not a small molecule.
    /// The previous ligand is kept on failure.
    pub fn set_ligand(
        &mut self,
        site: StructureId,
        ligand: Option<StructureId>,
    ) -> Result<(), ModelError> {
        self.get_site(site)?;
        if let Some(ligand_id) = ligand {
            let candidate = self.get_structure(ligand_id)?;
            if candidate.kind() != StructureKind::SmallMolecule {
                return Err(ModelError::invalid_type(
                    "a small molecule ligand",
                    candidate.to_string(),
                ));
            }
        }
        if let Some(structure) = self.structures.get_mut(site) {
            structure.ligand = ligand;
        }
        Ok(())
    }

    pub fn parent(&self, id: StructureId) -> Option<StructureId> {
        self.structures.get(id).and_then(Structure::parent)
    }

    /// Walks upward from a structure (starting with the structure itself) and returns
    /// the first model found. An exhausted or dangling chain gives `None`.
    pub fn model_of(&self, id: StructureId) -> Option<StructureId> {
        let mut current = id;
        loop {
            let structure = self.structures.get(current)?;
            if structure.kind() == StructureKind::Model {
                return Some(current);
            }
            current = structure.parent?;
        }
    }

    /// The model an atom belongs to, found through its owning structure.
    pub fn model_of_atom(&self, atom: AtomId) -> Option<StructureId> {
        let owner = self.atoms.get(atom)?.structure()?;
        self.model_of(owner)
    }
}
