//! In-memory box collection for the image currently open in a canvas
//!
//! Boxes live in an append-only arena: a `BoxHandle` stays valid for the whole
//! lifetime of the store, including after the box is tombstoned. Tombstoned
//! boxes are only dropped physically when the store is replaced.

use super::data::PersonBox;

/// Stable handle of a box inside one `AnnotationStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxHandle(pub(crate) usize);

#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    boxes: Vec<PersonBox>,
    /// `removed[i]` queues `boxes[i]` for deletion on the next sync.
    /// Always the same length as `boxes`.
    removed: Vec<bool>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_boxes(boxes: Vec<PersonBox>) -> Self {
        let removed = vec![false; boxes.len()];
        Self { boxes, removed }
    }

    /// Replace every box and clear all tombstones
    pub fn replace(&mut self, boxes: Vec<PersonBox>) {
        *self = Self::from_boxes(boxes);
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
        self.removed.clear();
    }

    pub fn push(&mut self, person_box: PersonBox) -> BoxHandle {
        self.boxes.push(person_box);
        self.removed.push(false);
        BoxHandle(self.boxes.len() - 1)
    }

    pub fn get(&self, handle: BoxHandle) -> Option<&PersonBox> {
        self.boxes.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: BoxHandle) -> Option<&mut PersonBox> {
        self.boxes.get_mut(handle.0)
    }

    /// Tombstone a box. Returns false if the handle is unknown or already removed.
    pub fn mark_removed(&mut self, handle: BoxHandle) -> bool {
        match self.removed.get_mut(handle.0) {
            Some(mark) if !*mark => {
                *mark = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_removed(&self, handle: BoxHandle) -> bool {
        self.removed.get(handle.0).copied().unwrap_or(true)
    }

    /// Every box including tombstoned ones, in insertion order
    pub fn boxes(&self) -> &[PersonBox] {
        &self.boxes
    }

    pub fn removed_marks(&self) -> &[bool] {
        &self.removed
    }

    /// Boxes paired with their tombstone mark, in store order
    pub fn entries(&self) -> impl Iterator<Item = (&PersonBox, bool)> + '_ {
        self.boxes.iter().zip(self.removed.iter().copied())
    }

    /// Handles of boxes that are not tombstoned
    pub fn live_handles(&self) -> impl Iterator<Item = BoxHandle> + '_ {
        self.removed
            .iter()
            .enumerate()
            .filter(|(_, removed)| !**removed)
            .map(|(index, _)| BoxHandle(index))
    }
}
