use std::collections::HashMap;

use super::ObjectId;

/// Identity-keyed set of objects already reached in one traversal.
///
/// Each entry remembers the alias of the table row that stands for the
/// object, so a second reference to it can be joined back instead of being
/// expanded again. Insertions are staged while the caller is still walking
/// a node's properties and become part of the set on [`VisitedSet::flush`];
/// lookups see staged entries too.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    visible: HashMap<ObjectId, String>,
    staged: Vec<(ObjectId, String)>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `id`. Returns false when it was already known (visible or staged).
    pub fn stage(&mut self, id: ObjectId, alias: impl Into<String>) -> bool {
        if self.contains(id) {
            return false;
        }
        self.staged.push((id, alias.into()));
        true
    }

    /// Move every staged entry into the set
    pub fn flush(&mut self) {
        for (id, alias) in self.staged.drain(..) {
            self.visible.entry(id).or_insert(alias);
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.visible.contains_key(&id) || self.staged.iter().any(|(s, _)| *s == id)
    }

    pub fn alias_of(&self, id: ObjectId) -> Option<&str> {
        self.visible
            .get(&id)
            .map(String::as_str)
            .or_else(|| {
                self.staged
                    .iter()
                    .find(|(s, _)| *s == id)
                    .map(|(_, a)| a.as_str())
            })
    }

    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    pub fn len(&self) -> usize {
        self.visible.len() + self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
