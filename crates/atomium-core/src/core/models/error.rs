use super::ids::{AtomId, StructureId};
use super::structure::StructureKind;
use thiserror::Error;

/// Errors raised by the data model.
///
/// The variants fall into three classes that callers can tell apart:
///
/// - **type errors** ([`ModelError::InvalidType`]): the wrong kind of thing was supplied,
///   e.g. an atom where a chain needs residues, or a chain where a site needs a ligand;
/// - **value errors** ([`ModelError::InvalidValue`]): the right kind of thing, but its
///   value breaks a format or range rule (element length, file code shape, axis name);
/// - **structural and lookup errors**: an empty construction ([`ModelError::NoAtoms`]),
///   or a handle/member that does not exist.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Type error: expected {expected}, found {found}")]
    InvalidType {
        expected: &'static str,
        found: String,
    },

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Cannot create {kind} with no atoms")]
    NoAtoms { kind: StructureKind },

    #[error("Atom {0:?} does not exist in this system")]
    AtomNotFound(AtomId),

    #[error("Structure {0:?} does not exist in this system")]
    StructureNotFound(StructureId),

    #[error("{member} is not a member of structure {structure:?}")]
    NotAMember {
        structure: StructureId,
        member: String,
    },
}

impl ModelError {
    pub(crate) fn invalid_type(expected: &'static str, found: impl Into<String>) -> Self {
        Self::InvalidType {
            expected,
            found: found.into(),
        }
    }

    pub(crate) fn invalid_value(
        field: &'static str,
        value: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
            reason,
        }
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::InvalidType { .. })
    }

    pub fn is_value_error(&self) -> bool {
        matches!(self, Self::InvalidValue { .. })
    }

    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::AtomNotFound(_) | Self::StructureNotFound(_) | Self::NotAMember { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes_are_never_conflated() {
        let type_err = ModelError::invalid_type("a residue", "an atom");
        let value_err = ModelError::invalid_value("axis", "w", "must be x, y or z");
        let empty = ModelError::NoAtoms {
            kind: StructureKind::Chain,
        };

        assert!(type_err.is_type_error());
        assert!(!type_err.is_value_error());
        assert!(value_err.is_value_error());
        assert!(!value_err.is_type_error());
        assert!(!empty.is_type_error() && !empty.is_value_error() && !empty.is_lookup_error());
        assert!(ModelError::AtomNotFound(AtomId::default()).is_lookup_error());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = ModelError::invalid_value("code", "1ab", "must be exactly 4 characters");
        assert_eq!(
            err.to_string(),
            "Invalid code '1ab': must be exactly 4 characters"
        );
        let err = ModelError::NoAtoms {
            kind: StructureKind::Structure,
        };
        assert_eq!(err.to_string(), "Cannot create AtomicStructure with no atoms");
    }
}
