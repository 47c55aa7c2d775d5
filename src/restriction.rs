//! Spatial restriction of physics objects and property declarations to mesh blocks and boundaries.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type SubdomainId = u16;
pub type BoundaryId = u16;

/// The set of mesh blocks (subdomains) an object applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockRestriction {
    /// The object applies to every block of the mesh.
    AnyBlock,
    Blocks(BTreeSet<SubdomainId>),
}

impl BlockRestriction {
    pub fn blocks(ids: impl IntoIterator<Item = SubdomainId>) -> Self {
        Self::Blocks(ids.into_iter().collect())
    }

    /// Whether the object is limited to a subset of blocks.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Blocks(_))
    }

    pub fn contains(&self, id: SubdomainId) -> bool {
        match self {
            Self::AnyBlock => true,
            Self::Blocks(ids) => ids.contains(&id),
        }
    }
}

impl Default for BlockRestriction {
    fn default() -> Self {
        Self::AnyBlock
    }
}

/// The set of mesh boundaries an object applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryRestriction {
    AnyBoundary,
    Boundaries(BTreeSet<BoundaryId>),
}

impl BoundaryRestriction {
    pub fn boundaries(ids: impl IntoIterator<Item = BoundaryId>) -> Self {
        Self::Boundaries(ids.into_iter().collect())
    }

    /// Whether the object is limited to a subset of boundaries.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Boundaries(_))
    }

    pub fn contains(&self, id: BoundaryId) -> bool {
        match self {
            Self::AnyBoundary => true,
            Self::Boundaries(ids) => ids.contains(&id),
        }
    }
}

impl Default for BoundaryRestriction {
    fn default() -> Self {
        Self::AnyBoundary
    }
}

/// Where a property is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationDomain {
    Blocks(BlockRestriction),
    Boundaries(BoundaryRestriction),
}

impl Default for DeclarationDomain {
    fn default() -> Self {
        Self::Blocks(BlockRestriction::AnyBlock)
    }
}

/// Checks whether the union of `declared` covers every id requested.
///
/// A request for "any" id is covered by a declaration on "any" id, or by declarations covering
/// every id in `all_ids` if the full set is known.
pub(crate) fn covers<'a, Id: Ord + Copy + 'a>(
    declared: impl IntoIterator<Item = Option<&'a BTreeSet<Id>>>,
    requested: Option<&BTreeSet<Id>>,
    all_ids: &BTreeSet<Id>,
) -> bool {
    // `None` means "any id"
    let mut union = BTreeSet::new();
    for ids in declared {
        match ids {
            None => return true,
            Some(ids) => union.extend(ids.iter().copied()),
        }
    }

    match requested {
        Some(requested) => requested.is_subset(&union),
        None => !all_ids.is_empty() && all_ids.is_subset(&union),
    }
}
