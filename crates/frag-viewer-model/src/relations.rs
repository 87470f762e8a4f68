// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relation kinds understood by the relation indexer

use crate::ElementId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Directed relation between two elements of the same model
///
/// Elements declare the forward kinds; the indexer derives the inverse
/// of every declared relation so either direction can be queried.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    /// Element → property sets defining it (IsDefinedBy)
    HasPropertySet,
    /// Property set → elements it defines
    PropertySetOf,
    /// Element → spatial structure containing it (ContainedInStructure)
    IsContainedIn,
    /// Spatial structure → contained elements (ContainsElements)
    Contains,
    /// Spatial part → aggregate it belongs to (Decomposes)
    Decomposes,
    /// Aggregate → its parts (IsDecomposedBy)
    IsDecomposedBy,
}

impl RelationKind {
    /// All recognized kinds
    pub const ALL: [RelationKind; 6] = [
        RelationKind::HasPropertySet,
        RelationKind::PropertySetOf,
        RelationKind::IsContainedIn,
        RelationKind::Contains,
        RelationKind::Decomposes,
        RelationKind::IsDecomposedBy,
    ];

    /// Stable string key
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::HasPropertySet => "has-property-set",
            RelationKind::PropertySetOf => "property-set-of",
            RelationKind::IsContainedIn => "is-contained-in",
            RelationKind::Contains => "contains",
            RelationKind::Decomposes => "decomposes",
            RelationKind::IsDecomposedBy => "is-decomposed-by",
        }
    }

    /// The relation read in the opposite direction
    pub fn inverse(&self) -> RelationKind {
        match self {
            RelationKind::HasPropertySet => RelationKind::PropertySetOf,
            RelationKind::PropertySetOf => RelationKind::HasPropertySet,
            RelationKind::IsContainedIn => RelationKind::Contains,
            RelationKind::Contains => RelationKind::IsContainedIn,
            RelationKind::Decomposes => RelationKind::IsDecomposedBy,
            RelationKind::IsDecomposedBy => RelationKind::Decomposes,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized relation name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRelationKind(pub String);

impl fmt::Display for UnknownRelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown relation kind: {}", self.0)
    }
}

impl std::error::Error for UnknownRelationKind {}

impl FromStr for RelationKind {
    type Err = UnknownRelationKind;

    /// Accepts the kebab-case keys as well as the IFC inverse attribute names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "has-property-set" | "IsDefinedBy" => RelationKind::HasPropertySet,
            "property-set-of" | "DefinesOccurrence" => RelationKind::PropertySetOf,
            "is-contained-in" | "ContainedInStructure" => RelationKind::IsContainedIn,
            "contains" | "ContainsElements" => RelationKind::Contains,
            "decomposes" | "Decomposes" => RelationKind::Decomposes,
            "is-decomposed-by" | "IsDecomposedBy" => RelationKind::IsDecomposedBy,
            other => return Err(UnknownRelationKind(other.to_string())),
        };
        Ok(kind)
    }
}

/// Outgoing relation declared on an element
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredRelation {
    pub kind: RelationKind,
    pub targets: Vec<ElementId>,
}

impl DeclaredRelation {
    pub fn new(kind: RelationKind, targets: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            kind,
            targets: targets.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_is_involution() {
        for kind in RelationKind::ALL {
            assert_eq!(kind.inverse().inverse(), kind);
            assert_ne!(kind.inverse(), kind);
        }
    }

    #[test]
    fn test_parse_accepts_ifc_names() {
        assert_eq!(
            "IsDefinedBy".parse::<RelationKind>(),
            Ok(RelationKind::HasPropertySet)
        );
        assert_eq!(
            "is-contained-in".parse::<RelationKind>(),
            Ok(RelationKind::IsContainedIn)
        );
        assert!("HasAssociations".parse::<RelationKind>().is_err());
    }

    #[test]
    fn test_string_keys_round_trip() {
        for kind in RelationKind::ALL {
            assert_eq!(kind.as_str().parse::<RelationKind>(), Ok(kind));
        }
    }
}
