//! Safe-delete check over the HAS_A edge table.
//!
//! Deleting an object is safe when nothing outside the objects it
//! (transitively) owns still refers to it. The check runs in two phases:
//!
//! 1. **Expand**: collect the candidate's downstream closure by following
//!    outgoing edges until no new entry turns up.
//! 2. **Cull**: repeatedly remove the first entry that has an incoming edge
//!    from an external pin or from an owner outside the current set
//!    (self-loops don't count), restarting the scan after each removal.
//!
//! The candidate is deletable iff it survives culling. Whatever else
//! survives is owned exclusively by the candidate and goes with it.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::edge_store::{Edge, EdgeStore, ProtectionEntry};
use super::errors::ProtectionError;

/// Closure and verdict for one candidate, computed inside one transaction
#[derive(Debug, Clone, Serialize)]
pub struct DependentSet {
    candidate: ProtectionEntry,
    closure: Vec<ProtectionEntry>,
    survivors: Vec<ProtectionEntry>,
    deletable: bool,
}

impl DependentSet {
    pub fn compute<S: EdgeStore + ?Sized>(
        store: &S,
        candidate: ProtectionEntry,
    ) -> Result<Self, ProtectionError> {
        let closure = expand(store, &candidate)?;
        let mut survivors = cull(store, closure.clone())?;
        let deletable = survivors.contains(&candidate);
        log::debug!(
            "delete check for {}: closure {}, survivors {}, {}",
            candidate,
            closure.len(),
            survivors.len(),
            if deletable { "deletable" } else { "protected" }
        );
        if !deletable {
            // Nothing goes when the candidate stays
            survivors.clear();
        }
        Ok(Self {
            candidate,
            closure,
            survivors,
            deletable,
        })
    }

    pub fn candidate(&self) -> &ProtectionEntry {
        &self.candidate
    }

    pub fn is_deletable(&self) -> bool {
        self.deletable
    }

    /// Everything reachable from the candidate, candidate first
    pub fn closure(&self) -> &[ProtectionEntry] {
        &self.closure
    }

    /// Entries only reachable through the candidate. Empty when protected.
    pub fn survivors(&self) -> &[ProtectionEntry] {
        &self.survivors
    }
}

fn expand<S: EdgeStore + ?Sized>(
    store: &S,
    candidate: &ProtectionEntry,
) -> Result<Vec<ProtectionEntry>, ProtectionError> {
    let mut entries = vec![candidate.clone()];
    let mut seen = HashSet::from([candidate.clone()]);
    let mut queue = VecDeque::from([candidate.clone()]);
    while let Some(current) = queue.pop_front() {
        for edge in store.outgoing(&current)? {
            if seen.insert(edge.property.clone()) {
                entries.push(edge.property.clone());
                queue.push_back(edge.property);
            }
        }
    }
    Ok(entries)
}

fn cull<S: EdgeStore + ?Sized>(
    store: &S,
    mut entries: Vec<ProtectionEntry>,
) -> Result<Vec<ProtectionEntry>, ProtectionError> {
    let mut incoming: HashMap<ProtectionEntry, Vec<Edge>> = HashMap::new();
    let mut members: HashSet<ProtectionEntry> = entries.iter().cloned().collect();

    'scan: loop {
        for idx in 0..entries.len() {
            let entry = &entries[idx];
            if !incoming.contains_key(entry) {
                incoming.insert(entry.clone(), store.incoming(entry)?);
            }
            let held_outside = incoming[entry].iter().any(|edge| match &edge.owner {
                None => true,
                Some(owner) => !edge.is_self_loop() && !members.contains(owner),
            });
            if held_outside {
                let removed = entries.remove(idx);
                log::trace!("{} is referenced from outside, culled", removed);
                members.remove(&removed);
                continue 'scan;
            }
        }
        break;
    }
    Ok(entries)
}
