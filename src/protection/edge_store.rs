//! HAS_A edges and the stores that hold them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::ProtectionError;

/// One persisted object, identified by its table and id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProtectionEntry {
    pub table: String,
    pub id: i64,
}

impl ProtectionEntry {
    pub fn new(table: impl Into<String>, id: i64) -> Self {
        Self {
            table: table.into(),
            id,
        }
    }
}

impl fmt::Display for ProtectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.table, self.id)
    }
}

/// A reference from `owner` to `property`. Without an owner the edge is an
/// external pin: something outside the object graph holds the property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub owner: Option<ProtectionEntry>,
    pub property: ProtectionEntry,
    pub property_class: Option<String>,
    pub relation: Option<String>,
}

impl Edge {
    pub fn new(owner: ProtectionEntry, property: ProtectionEntry) -> Self {
        Self {
            owner: Some(owner),
            property,
            property_class: None,
            relation: None,
        }
    }

    pub fn pin(property: ProtectionEntry) -> Self {
        Self {
            owner: None,
            property,
            property_class: None,
            relation: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.property_class = Some(class.into());
        self
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn is_pin(&self) -> bool {
        self.owner.is_none()
    }

    pub fn is_self_loop(&self) -> bool {
        self.owner.as_ref() == Some(&self.property)
    }

    /// Edges are the same row when endpoints and relation match; the
    /// property class is informational.
    pub fn same_row(&self, other: &Edge) -> bool {
        self.owner == other.owner && self.property == other.property && self.relation == other.relation
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{} -> {}", owner, self.property)?,
            None => write!(f, "(pin) -> {}", self.property)?,
        }
        if let Some(relation) = &self.relation {
            write!(f, " [{}]", relation)?;
        }
        Ok(())
    }
}

/// Access to the edge table through one caller-owned connection or transaction.
///
/// Implementations never commit or roll back.
pub trait EdgeStore {
    /// Edges whose owner is `owner`
    fn outgoing(&self, owner: &ProtectionEntry) -> Result<Vec<Edge>, ProtectionError>;

    /// Edges pointing at `property`, pins included
    fn incoming(&self, property: &ProtectionEntry) -> Result<Vec<Edge>, ProtectionError>;

    fn contains(&self, edge: &Edge) -> Result<bool, ProtectionError>;

    /// Insert every edge; returns how many rows were written
    fn insert_batch(&mut self, edges: &[Edge]) -> Result<usize, ProtectionError>;

    fn remove_owner_edges(&mut self, owner: &ProtectionEntry) -> Result<usize, ProtectionError>;

    /// Drop the external pins of `property`
    fn remove_pin(&mut self, property: &ProtectionEntry) -> Result<usize, ProtectionError>;
}

/// Edge store kept in memory, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryEdgeStore {
    edges: BTreeSet<Edge>,
}

impl MemoryEdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }
}

impl FromIterator<Edge> for MemoryEdgeStore {
    fn from_iter<T: IntoIterator<Item = Edge>>(iter: T) -> Self {
        Self {
            edges: iter.into_iter().collect(),
        }
    }
}

impl EdgeStore for MemoryEdgeStore {
    fn outgoing(&self, owner: &ProtectionEntry) -> Result<Vec<Edge>, ProtectionError> {
        Ok(self
            .edges
            .iter()
            .filter(|e| e.owner.as_ref() == Some(owner))
            .cloned()
            .collect())
    }

    fn incoming(&self, property: &ProtectionEntry) -> Result<Vec<Edge>, ProtectionError> {
        Ok(self
            .edges
            .iter()
            .filter(|e| &e.property == property)
            .cloned()
            .collect())
    }

    fn contains(&self, edge: &Edge) -> Result<bool, ProtectionError> {
        Ok(self.edges.iter().any(|e| e.same_row(edge)))
    }

    fn insert_batch(&mut self, edges: &[Edge]) -> Result<usize, ProtectionError> {
        let before = self.edges.len();
        self.edges.extend(edges.iter().cloned());
        Ok(self.edges.len() - before)
    }

    fn remove_owner_edges(&mut self, owner: &ProtectionEntry) -> Result<usize, ProtectionError> {
        let before = self.edges.len();
        self.edges.retain(|e| e.owner.as_ref() != Some(owner));
        Ok(before - self.edges.len())
    }

    fn remove_pin(&mut self, property: &ProtectionEntry) -> Result<usize, ProtectionError> {
        let before = self.edges.len();
        self.edges.retain(|e| !(e.is_pin() && &e.property == property));
        Ok(before - self.edges.len())
    }
}
