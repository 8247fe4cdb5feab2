use super::error::ModelError;
use super::ids::StructureId;
use crate::core::utils::elements;
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

/// Where an atom comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AtomKind {
    /// A located atom, read from (or destined for) an ATOM/HETATM record.
    #[default]
    Pdb,
    /// A generic atom known only by identity: it has no coordinates, typically because
    /// it is missing from the deposited coordinate set.
    Ghost,
}

/// Selects atoms by [`AtomKind`].
///
/// The textual forms are `"pdb"`, `"generic"` and `"all"`. `Generic` selects every atom
/// that is not file-sourced, i.e. ghost atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AtomKindFilter {
    Pdb,
    Generic,
    #[default]
    All,
}

impl AtomKindFilter {
    pub fn matches(&self, kind: AtomKind) -> bool {
        match self {
            AtomKindFilter::Pdb => kind == AtomKind::Pdb,
            AtomKindFilter::Generic => kind == AtomKind::Ghost,
            AtomKindFilter::All => true,
        }
    }
}

impl FromStr for AtomKindFilter {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdb" => Ok(AtomKindFilter::Pdb),
            "generic" => Ok(AtomKindFilter::Generic),
            "all" => Ok(AtomKindFilter::All),
            _ => Err(ModelError::invalid_value(
                "atom kind",
                s,
                "must be one of 'pdb', 'generic' or 'all'",
            )),
        }
    }
}

impl TryFrom<&toml::Value> for AtomKindFilter {
    type Error = ModelError;

    /// Converts a dynamically typed configuration value into a selector.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value is not a string, and a value error if it is a
    /// string outside the accepted vocabulary.
    fn try_from(value: &toml::Value) -> Result<Self, Self::Error> {
        match value {
            toml::Value::String(s) => s.parse(),
            other => Err(ModelError::invalid_type(
                "a string atom kind",
                format!("{} ({})", other.type_str(), other),
            )),
        }
    }
}

/// Criteria for selecting atoms out of a structure. The default selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomFilter {
    /// Only atoms whose element equals this symbol (case-insensitive).
    pub element: Option<String>,
    pub kind: AtomKindFilter,
}

impl AtomFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn element(element: &str) -> Self {
        Self {
            element: Some(element.to_string()),
            kind: AtomKindFilter::All,
        }
    }

    pub fn kind(kind: AtomKindFilter) -> Self {
        Self {
            element: None,
            kind,
        }
    }

    pub fn matches(&self, atom: &Atom) -> bool {
        let element_ok = self
            .element
            .as_deref()
            .is_none_or(|e| atom.element.eq_ignore_ascii_case(e.trim()));
        element_ok && self.kind.matches(atom.kind)
    }
}

/// A single atom.
///
/// Atoms are created standalone and handed to a
/// [`MolecularSystem`](super::system::MolecularSystem), which stores them and returns an
/// [`AtomId`](super::ids::AtomId). When an atom is added to a structure it records that
/// structure as a non-owning back-reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    element: String,
    id: i64,
    name: String,
    position: Option<Point3<f64>>,
    kind: AtomKind,
    pub(crate) structure: Option<StructureId>,
}

fn validate_element(element: &str) -> Result<String, ModelError> {
    let element = element.trim();
    if element.is_empty() || element.chars().count() > 2 {
        return Err(ModelError::invalid_value(
            "element",
            element,
            "element symbols are one or two letters",
        ));
    }
    if !element.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ModelError::invalid_value(
            "element",
            element,
            "element symbols may only contain letters",
        ));
    }
    Ok(element.to_ascii_uppercase())
}

impl Atom {
    /// Creates a located (PDB) atom.
    ///
    /// # Errors
    ///
    /// Returns a value error if `element` is not one or two letters.
    pub fn new(
        element: &str,
        id: i64,
        name: &str,
        position: Point3<f64>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            element: validate_element(element)?,
            id,
            name: name.to_string(),
            position: Some(position),
            kind: AtomKind::Pdb,
            structure: None,
        })
    }

    /// Creates a ghost atom, which has an identity but no coordinates.
    ///
    /// # Errors
    ///
    /// Returns a value error if `element` is not one or two letters.
    pub fn ghost(element: &str, id: i64, name: &str) -> Result<Self, ModelError> {
        Ok(Self {
            element: validate_element(element)?,
            id,
            name: name.to_string(),
            position: None,
            kind: AtomKind::Ghost,
            structure: None,
        })
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn set_element(&mut self, element: &str) -> Result<(), ModelError> {
        self.element = validate_element(element)?;
        Ok(())
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> AtomKind {
        self.kind
    }

    pub fn position(&self) -> Option<Point3<f64>> {
        self.position
    }

    pub fn set_position(&mut self, position: Point3<f64>) {
        self.position = Some(position);
    }

    /// The structure this atom was last added to, if any.
    pub fn structure(&self) -> Option<StructureId> {
        self.structure
    }

    /// Relative atomic mass of the atom's element; `0.0` for unknown elements.
    pub fn mass(&self) -> f64 {
        elements::relative_mass(&self.element)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            AtomKind::Pdb => "PdbAtom",
            AtomKind::Ghost => "GhostAtom",
        };
        write!(f, "<{} {} ({})>", label, self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_fields() {
        let atom = Atom::new("C", 100, "CA", Point3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(atom.element(), "C");
        assert_eq!(atom.id(), 100);
        assert_eq!(atom.name(), "CA");
        assert_eq!(atom.position(), Some(Point3::new(1.0, 2.0, 3.0)));
        assert_eq!(atom.kind(), AtomKind::Pdb);
        assert_eq!(atom.structure(), None);
    }

    #[test]
    fn ghost_atom_has_no_position() {
        let atom = Atom::ghost("C", 100, "CA").unwrap();
        assert_eq!(atom.kind(), AtomKind::Ghost);
        assert_eq!(atom.position(), None);
        assert_eq!(atom.structure(), None);
    }

    #[test]
    fn display_names_the_atom_kind() {
        let atom = Atom::new("C", 100, "CA", Point3::origin()).unwrap();
        assert_eq!(atom.to_string(), "<PdbAtom 100 (CA)>");
        let ghost = Atom::ghost("C", 100, "CA").unwrap();
        assert_eq!(ghost.to_string(), "<GhostAtom 100 (CA)>");
    }

    #[test]
    fn element_must_be_one_or_two_letters() {
        assert!(Atom::ghost("", 1, "CA").unwrap_err().is_value_error());
        assert!(Atom::ghost("CAC", 1, "CA").unwrap_err().is_value_error());
        assert!(Atom::ghost("C1", 1, "CA").unwrap_err().is_value_error());
        assert!(Atom::ghost("MG", 1, "CA").is_ok());
        assert!(Atom::ghost("M", 1, "CA").is_ok());
    }

    #[test]
    fn element_is_stored_upper_case() {
        let mut atom = Atom::ghost("Mg", 1, "MG").unwrap();
        assert_eq!(atom.element(), "MG");
        atom.set_element("h").unwrap();
        assert_eq!(atom.element(), "H");
    }

    #[test]
    fn failed_element_update_keeps_previous_value() {
        let mut atom = Atom::ghost("C", 1, "CA").unwrap();
        assert!(atom.set_element("").unwrap_err().is_value_error());
        assert!(atom.set_element("CAC").unwrap_err().is_value_error());
        assert_eq!(atom.element(), "C");
    }

    #[test]
    fn name_and_position_can_be_updated() {
        let mut atom = Atom::new("C", 1, "CA", Point3::origin()).unwrap();
        atom.set_name("CB");
        atom.set_position(Point3::new(4.0, 5.0, 6.0));
        assert_eq!(atom.name(), "CB");
        assert_eq!(atom.position(), Some(Point3::new(4.0, 5.0, 6.0)));
    }

    #[test]
    fn mass_comes_from_the_element_table() {
        let lithium = Atom::ghost("Li", 1, "Li").unwrap();
        let iron = Atom::ghost("Fe", 1, "Fe").unwrap();
        let uranium = Atom::ghost("U", 1, "U").unwrap();
        assert!((lithium.mass() - 7.0).abs() < 0.5);
        assert!((iron.mass() - 56.0).abs() < 0.5);
        assert!((uranium.mass() - 238.0).abs() < 0.5);
    }

    #[test]
    fn strange_elements_have_zero_mass() {
        let mysterium = Atom::ghost("My", 1, "My").unwrap();
        assert_eq!(mysterium.mass(), 0.0);
    }

    #[test]
    fn kind_filter_parses_known_values() {
        assert_eq!("pdb".parse::<AtomKindFilter>(), Ok(AtomKindFilter::Pdb));
        assert_eq!("generic".parse::<AtomKindFilter>(), Ok(AtomKindFilter::Generic));
        assert_eq!("all".parse::<AtomKindFilter>(), Ok(AtomKindFilter::All));
    }

    #[test]
    fn kind_filter_rejects_unknown_strings_with_value_error() {
        let err = "xyz".parse::<AtomKindFilter>().unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn kind_filter_from_dynamic_value_distinguishes_type_and_value_errors() {
        let err = AtomKindFilter::try_from(&toml::Value::Integer(1)).unwrap_err();
        assert!(err.is_type_error());

        let err = AtomKindFilter::try_from(&toml::Value::String("xyz".into())).unwrap_err();
        assert!(err.is_value_error());

        let ok = AtomKindFilter::try_from(&toml::Value::String("pdb".into())).unwrap();
        assert_eq!(ok, AtomKindFilter::Pdb);
    }

    #[test]
    fn atom_filter_matches_element_and_kind() {
        let carbon = Atom::new("C", 1, "CA", Point3::origin()).unwrap();
        let ghost = Atom::ghost("N", 2, "N").unwrap();

        assert!(AtomFilter::all().matches(&carbon));
        assert!(AtomFilter::element("c").matches(&carbon));
        assert!(!AtomFilter::element("N").matches(&carbon));
        assert!(AtomFilter::kind(AtomKindFilter::Pdb).matches(&carbon));
        assert!(!AtomFilter::kind(AtomKindFilter::Pdb).matches(&ghost));
        assert!(AtomFilter::kind(AtomKindFilter::Generic).matches(&ghost));
    }
}
