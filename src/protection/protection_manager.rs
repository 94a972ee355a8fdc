//! Write side of the edge table: recording references on save, pins, and
//! guarded deletes.

use std::collections::HashSet;

use super::deletion_guard::DependentSet;
use super::edge_store::{Edge, EdgeStore, ProtectionEntry};
use super::errors::ProtectionError;

/// Edges one object's save has to add, persisted together by
/// [`ProtectionManager::flush`].
#[derive(Debug, Clone)]
pub struct ProtectionStack {
    owner: ProtectionEntry,
    edges: Vec<Edge>,
}

impl ProtectionStack {
    pub fn new(owner: ProtectionEntry) -> Self {
        Self {
            owner,
            edges: Vec::new(),
        }
    }

    pub fn owner(&self) -> &ProtectionEntry {
        &self.owner
    }

    /// Record that the owner holds `property` through `relation`
    pub fn push(
        &mut self,
        property: ProtectionEntry,
        class: Option<&str>,
        relation: Option<&str>,
    ) -> &mut Self {
        let mut edge = Edge::new(self.owner.clone(), property);
        edge.property_class = class.map(str::to_string);
        edge.relation = relation.map(str::to_string);
        self.edges.push(edge);
        self
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

pub struct ProtectionManager<S: EdgeStore> {
    store: S,
}

impl<S: EdgeStore> ProtectionManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Persist a stack's edges as one batch.
    ///
    /// Repeats inside the stack are written once. When the owner was saved
    /// before, edges already in the table are skipped too.
    pub fn flush(
        &mut self,
        stack: ProtectionStack,
        already_persisted: bool,
    ) -> Result<usize, ProtectionError> {
        let mut batch: Vec<Edge> = Vec::with_capacity(stack.len());
        let mut keys = HashSet::new();
        for edge in stack.edges {
            let key = (edge.property.clone(), edge.relation.clone());
            if !keys.insert(key) {
                continue;
            }
            if already_persisted && self.store.contains(&edge)? {
                continue;
            }
            batch.push(edge);
        }
        if batch.is_empty() {
            return Ok(0);
        }
        let written = self.store.insert_batch(&batch)?;
        log::debug!("flushed {} edges for {}", written, stack.owner);
        Ok(written)
    }

    /// Mark `entry` as held from outside the object graph. No-op when pinned already.
    pub fn pin(&mut self, entry: ProtectionEntry) -> Result<bool, ProtectionError> {
        let pin = Edge::pin(entry);
        if self.store.contains(&pin)? {
            return Ok(false);
        }
        self.store.insert_batch(std::slice::from_ref(&pin))?;
        Ok(true)
    }

    pub fn unpin(&mut self, entry: &ProtectionEntry) -> Result<usize, ProtectionError> {
        self.store.remove_pin(entry)
    }

    /// Forget the references an owner holds, as when the owner row is deleted
    pub fn release_owner(&mut self, owner: &ProtectionEntry) -> Result<usize, ProtectionError> {
        self.store.remove_owner_edges(owner)
    }

    pub fn check(&self, candidate: ProtectionEntry) -> Result<DependentSet, ProtectionError> {
        DependentSet::compute(&self.store, candidate)
    }

    /// Run the guard and, when the candidate is deletable, release the edges
    /// of every surviving entry. The caller deletes the rows of
    /// [`DependentSet::survivors`] in the same transaction.
    pub fn delete_if_safe(
        &mut self,
        candidate: ProtectionEntry,
    ) -> Result<DependentSet, ProtectionError> {
        let set = self.check(candidate)?;
        if !set.is_deletable() {
            log::info!("{} is still referenced, not deleted", set.candidate());
            return Ok(set);
        }
        for entry in set.survivors() {
            self.store.remove_owner_edges(entry)?;
        }
        log::info!(
            "{} deletable with {} dependents",
            set.candidate(),
            set.survivors().len().saturating_sub(1)
        );
        Ok(set)
    }
}
