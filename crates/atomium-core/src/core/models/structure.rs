use super::ids::{AtomId, StructureId};
use std::collections::HashSet;
use std::fmt;

/// The closed set of structure kinds a [`Structure`] node can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    /// A plain atomic structure: nothing but a set of atoms.
    Structure,
    Residue,
    SmallMolecule,
    Chain,
    BindSite,
    Model,
}

impl StructureKind {
    /// Whether atoms may be held directly by this kind.
    pub fn holds_atoms(&self) -> bool {
        matches!(
            self,
            StructureKind::Structure
                | StructureKind::Residue
                | StructureKind::SmallMolecule
                | StructureKind::Model
        )
    }

    /// Whether a structure of kind `child` may be a member of this kind.
    pub fn holds(&self, child: StructureKind) -> bool {
        match self {
            StructureKind::Chain | StructureKind::BindSite => child == StructureKind::Residue,
            StructureKind::Model => matches!(
                child,
                StructureKind::Chain | StructureKind::SmallMolecule | StructureKind::BindSite
            ),
            _ => false,
        }
    }

    /// Binding sites group residues owned elsewhere and do not become their parent.
    pub fn adopts_members(&self) -> bool {
        *self != StructureKind::BindSite
    }

    pub(crate) fn member_description(&self) -> &'static str {
        match self {
            StructureKind::Structure | StructureKind::Residue | StructureKind::SmallMolecule => {
                "atoms"
            }
            StructureKind::Chain | StructureKind::BindSite => "residues",
            StructureKind::Model => "atoms, chains, small molecules or binding sites",
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                StructureKind::Structure => "AtomicStructure",
                StructureKind::Residue => "Residue",
                StructureKind::SmallMolecule => "SmallMolecule",
                StructureKind::Chain => "Chain",
                StructureKind::BindSite => "BindSite",
                StructureKind::Model => "Model",
            }
        )
    }
}

/// Anything a structure can be built from or extended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    Atom(AtomId),
    Structure(StructureId),
}

impl From<AtomId> for Member {
    fn from(id: AtomId) -> Self {
        Member::Atom(id)
    }
}

impl From<StructureId> for Member {
    fn from(id: StructureId) -> Self {
        Member::Structure(id)
    }
}

/// A node in the structure tree.
///
/// Nodes are stored in a [`MolecularSystem`](super::system::MolecularSystem) and refer to
/// atoms and child structures by handle. `parent` is the non-owning upward link that
/// lets an atom or residue find its model; it is never followed for ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    kind: StructureKind,
    id: Option<String>,
    name: Option<String>,
    pub(crate) atoms: HashSet<AtomId>,
    pub(crate) children: Vec<StructureId>,
    pub(crate) parent: Option<StructureId>,
    pub(crate) ligand: Option<StructureId>,
}

impl Structure {
    pub(crate) fn new(kind: StructureKind, id: Option<String>, name: Option<String>) -> Self {
        Self {
            kind,
            id,
            name,
            atoms: HashSet::new(),
            children: Vec::new(),
            parent: None,
            ligand: None,
        }
    }

    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    /// The identity string: residue id (`"A23"`), molecule id, chain id or site id.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Atoms held directly by this node, not including those of child structures.
    pub fn own_atoms(&self) -> &HashSet<AtomId> {
        &self.atoms
    }

    pub fn children(&self) -> &[StructureId] {
        &self.children
    }

    pub fn parent(&self) -> Option<StructureId> {
        self.parent
    }

    pub fn ligand(&self) -> Option<StructureId> {
        self.ligand
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.as_deref().unwrap_or("");
        match self.kind {
            StructureKind::Structure => {
                write!(f, "<AtomicStructure ({} atoms)>", self.atoms.len())
            }
            StructureKind::Residue | StructureKind::SmallMolecule => match &self.name {
                Some(name) => write!(f, "<{} {} ({})>", self.kind, id, name),
                None => write!(f, "<{} {}>", self.kind, id),
            },
            StructureKind::Chain | StructureKind::BindSite => {
                write!(f, "<{} {} ({} residues)>", self.kind, id, self.children.len())
            }
            StructureKind::Model => write!(f, "<Model ({} structures)>", self.children.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_structure_id(n: u64) -> StructureId {
        StructureId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn kind_membership_rules() {
        assert!(StructureKind::Residue.holds_atoms());
        assert!(StructureKind::Model.holds_atoms());
        assert!(!StructureKind::Chain.holds_atoms());
        assert!(!StructureKind::BindSite.holds_atoms());

        assert!(StructureKind::Chain.holds(StructureKind::Residue));
        assert!(!StructureKind::Chain.holds(StructureKind::SmallMolecule));
        assert!(StructureKind::Model.holds(StructureKind::BindSite));
        assert!(!StructureKind::Model.holds(StructureKind::Residue));
        assert!(!StructureKind::Residue.holds(StructureKind::Residue));

        assert!(!StructureKind::BindSite.adopts_members());
        assert!(StructureKind::Chain.adopts_members());
    }

    #[test]
    fn display_of_plain_structure_counts_atoms() {
        let mut s = Structure::new(StructureKind::Structure, None, None);
        for n in 1..=10 {
            s.atoms.insert(dummy_atom_id(n));
        }
        assert_eq!(s.to_string(), "<AtomicStructure (10 atoms)>");
    }

    #[test]
    fn display_of_named_structures() {
        let residue = Structure::new(
            StructureKind::Residue,
            Some("A1".into()),
            Some("ALA".into()),
        );
        assert_eq!(residue.to_string(), "<Residue A1 (ALA)>");

        let molecule = Structure::new(
            StructureKind::SmallMolecule,
            Some("A100".into()),
            Some("HEM".into()),
        );
        assert_eq!(molecule.to_string(), "<SmallMolecule A100 (HEM)>");

        let unnamed = Structure::new(StructureKind::SmallMolecule, Some("A100".into()), None);
        assert_eq!(unnamed.to_string(), "<SmallMolecule A100>");
    }

    #[test]
    fn display_of_composites_counts_children() {
        let mut chain = Structure::new(StructureKind::Chain, Some("A".into()), None);
        chain.children = (1..=3).map(dummy_structure_id).collect();
        assert_eq!(chain.to_string(), "<Chain A (3 residues)>");

        let mut site = Structure::new(StructureKind::BindSite, Some("A1".into()), None);
        site.children = (1..=10).map(dummy_structure_id).collect();
        assert_eq!(site.to_string(), "<BindSite A1 (10 residues)>");

        let mut model = Structure::new(StructureKind::Model, None, None);
        model.children = (1..=4).map(dummy_structure_id).collect();
        assert_eq!(model.to_string(), "<Model (4 structures)>");
    }

    #[test]
    fn setters_update_identity() {
        let mut residue = Structure::new(
            StructureKind::Residue,
            Some("A1".into()),
            Some("ALA".into()),
        );
        residue.set_id("B2");
        residue.set_name("GLY");
        assert_eq!(residue.id(), Some("B2"));
        assert_eq!(residue.name(), Some("GLY"));
    }

    #[test]
    fn members_convert_from_handles() {
        assert_eq!(Member::from(dummy_atom_id(1)), Member::Atom(dummy_atom_id(1)));
        assert_eq!(
            Member::from(dummy_structure_id(2)),
            Member::Structure(dummy_structure_id(2))
        );
    }
}
