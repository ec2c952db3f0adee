use std::collections::BTreeSet;

use crate::domain::RecordId;

/// Ids marked for bulk deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RecordId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: &RecordId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    pub fn union<'a>(&mut self, ids: impl IntoIterator<Item = &'a RecordId>) {
        self.ids.extend(ids.into_iter().cloned());
    }

    pub fn difference<'a>(&mut self, ids: impl IntoIterator<Item = &'a RecordId>) {
        for id in ids {
            self.ids.remove(id);
        }
    }

    pub fn contains_all<'a>(&self, ids: impl IntoIterator<Item = &'a RecordId>) -> bool {
        ids.into_iter().all(|id| self.ids.contains(id))
    }

    /// Drops ids that are no longer in `known`.
    pub fn retain_known<'a>(&mut self, known: impl IntoIterator<Item = &'a RecordId>) {
        let known = known.into_iter().collect::<BTreeSet<_>>();
        self.ids.retain(|id| known.contains(id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }

    pub fn to_vec(&self) -> Vec<RecordId> {
        self.ids.iter().cloned().collect()
    }
}
