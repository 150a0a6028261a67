//! Cross-view identity linking
//!
//! Selecting a box on the reference canvas while a box is selected on the
//! working canvas copies the reference box's person ID onto the working box.

use crate::canvas::BoxCanvas;

/// Which canvas raised the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Reference,
    Working,
}

/// Copy the identity of the reference selection onto the working selection.
///
/// Does nothing unless both canvases have a selection and the reference box
/// carries an assigned person. On success both selections are cleared; if the
/// canvas that raised the event still has its pointer button down it is
/// cleared on release, so the click that triggered the link does not start a drag.
pub fn propagate_identity(reference: &mut BoxCanvas, working: &mut BoxCanvas, raised_by: Side) -> bool {
    let source = reference.selected_box();
    let target = working.selected_box();
    if source.is_null() || target.is_null() || !source.has_person() {
        return false;
    }

    working.set_person_id_of_selection(source.person_id);
    log::info!(
        "🔗 Linked box {} to person {} from box {}",
        target.id,
        source.person_id,
        source.id
    );

    match raised_by {
        Side::Reference => {
            reference.clear_selection_after_release();
            working.clear_selection();
        }
        Side::Working => {
            working.clear_selection_after_release();
            reference.clear_selection();
        }
    }
    true
}
