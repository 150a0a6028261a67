//! Reconciles an edited `AnnotationStore` against the database
//!
//! Every store index is handled on its own: tombstoned boxes are deleted,
//! new boxes are inserted and existing boxes are rewritten as a
//! delete-then-reinsert under their original ID. Rewriting re-runs the person
//! existence check, so the person table never keeps unreferenced rows.
//! Each index runs inside one transaction.

use rusqlite::Result as SqlResult;

use super::annotations::AnnotationStore;
use super::data::PersonBox;
use super::library::Library;

/// What one sync pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
}

impl Library {
    /// Write every box of `store` to the database, honouring tombstones.
    pub fn sync_boxes(&self, store: &AnnotationStore) -> SqlResult<SyncSummary> {
        let mut summary = SyncSummary::default();

        for (person_box, removed) in store.entries() {
            let tx = self.connection().unchecked_transaction()?;
            self.sync_one(person_box, removed, &mut summary)?;
            tx.commit()?;
        }

        log::info!(
            "💾 Synced boxes: {} inserted, {} updated, {} removed",
            summary.inserted,
            summary.updated,
            summary.removed
        );

        Ok(summary)
    }

    fn sync_one(&self, person_box: &PersonBox, removed: bool, summary: &mut SyncSummary) -> SqlResult<()> {
        if removed {
            // Never persisted, nothing to delete
            if person_box.is_persisted() && self.remove_person_box(person_box.id)? {
                summary.removed += 1;
            }
        } else if !person_box.is_persisted() {
            self.add_person_box(person_box)?;
            summary.inserted += 1;
        } else {
            self.remove_person_box(person_box.id)?;
            self.add_person_box(person_box)?;
            summary.updated += 1;
        }
        Ok(())
    }
}
