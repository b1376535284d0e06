use std::collections::BTreeMap;

use crate::selection::SliceSelection;
use crate::SliceIndex;

/// Archived selections grouped by slice. Within a slice entries keep the
/// order they were archived in, which is also their draw order.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionArchive<S> {
    by_slice: BTreeMap<SliceIndex, Vec<S>>,
}

impl<S> Default for SelectionArchive<S> {
    fn default() -> Self {
        Self {
            by_slice: BTreeMap::new(),
        }
    }
}

impl<S: SliceSelection> SelectionArchive<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, selection: S) {
        self.by_slice
            .entry(selection.slice_index())
            .or_default()
            .push(selection);
    }

    pub fn extend(&mut self, selections: impl IntoIterator<Item = S>) {
        for selection in selections {
            self.push(selection);
        }
    }

    pub fn for_slice(&self, slice_index: SliceIndex) -> &[S] {
        self.by_slice
            .get(&slice_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn remove(&mut self, slice_index: SliceIndex, index: usize) -> Option<S> {
        let entries = self.by_slice.get_mut(&slice_index)?;
        if index >= entries.len() {
            return None;
        }
        let removed = entries.remove(index);
        if entries.is_empty() {
            self.by_slice.remove(&slice_index);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.by_slice.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.by_slice.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_slice.values().map(Vec::len).sum()
    }

    /// Non-empty slices in ascending index order, each with its entries.
    pub fn groups(&self) -> impl Iterator<Item = (SliceIndex, &[S])> {
        self.by_slice
            .iter()
            .map(|(slice_index, entries)| (*slice_index, entries.as_slice()))
    }

    /// Every entry, slice by slice in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.by_slice.values().flatten()
    }

    pub fn to_vec(&self) -> Vec<S> {
        self.iter().cloned().collect()
    }
}
