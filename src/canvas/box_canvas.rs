use crate::geometry::{Point, Rect};
use crate::state::annotations::{AnnotationStore, BoxHandle};
use crate::state::data::{PersonBox, NULL_ID};

use super::gesture::{
    Context, DragDropGesture, Edit, Gesture, HeadFootGesture, Input, Mode, SelectionGesture, State,
};
use super::permissions::Permissions;
use super::scene::{BoxVisual, Scene};
use super::viewport::{zoom_step, Viewport};

/// Notification raised by a canvas for its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEvent {
    /// Exactly one box is selected now, and it was not selected before
    BoxSelected,
}

/// Transient drawing on top of the boxes, in scene space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlay {
    /// Head point of a half-finished head/foot annotation
    HeadMarker(Point),
    /// Box being dragged out in drag-drop mode
    DraftBox(Rect),
    RubberBand(Rect),
    /// Crosshair through the pointer while annotating by drag-drop
    Rulers(Point),
}

/// One view of an image with its editable person boxes.
///
/// Turns pointer and keyboard input into edits of its own `AnnotationStore`,
/// restricted by the canvas `Permissions`. Never talks to the database.
#[derive(Debug, Clone)]
pub struct BoxCanvas {
    permissions: Permissions,
    gesture: Gesture,
    image_id: i64,
    viewport: Viewport,
    store: AnnotationStore,
    scene: Scene,
    /// Last pointer position in scene space
    pointer: Option<Point>,
    /// Pointer button is held
    pointer_down: bool,
    clear_on_release: bool,
    user_zoomed: bool,
}

impl BoxCanvas {
    pub fn new(permissions: Permissions) -> Self {
        Self {
            permissions,
            gesture: Gesture::default(),
            image_id: NULL_ID,
            viewport: Viewport::default(),
            store: AnnotationStore::new(),
            scene: Scene::default(),
            pointer: None,
            pointer_down: false,
            clear_on_release: false,
            user_zoomed: false,
        }
    }

    /// Drop the image, boxes and gesture; keeps permissions
    pub fn reset(&mut self) {
        *self = Self::new(self.permissions);
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn mode(&self) -> Mode {
        self.gesture.mode()
    }

    pub fn state(&self) -> State {
        self.gesture.state()
    }

    /// Switch modes, abandoning any gesture in progress.
    /// Returns false if the mode is already active or not permitted.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode() || !self.permissions.allows(mode.required_permission()) {
            return false;
        }
        self.gesture = Gesture::idle(mode);
        true
    }

    // ========== Image & boxes ==========

    /// Show a new image of `width` x `height` pixels, fitted to the view. Clears all boxes.
    pub fn set_image(&mut self, width: u32, height: u32, image_id: i64) {
        self.image_id = image_id;
        self.viewport.set_image_size(width as f64, height as f64);
        self.user_zoomed = false;
        self.store.clear();
        self.scene.clear();
        self.gesture = Gesture::idle(self.mode());
        self.pointer = None;
        self.pointer_down = false;
        self.clear_on_release = false;
    }

    pub fn image_id(&self) -> i64 {
        self.image_id
    }

    /// Replace every box; tombstones start out cleared
    pub fn set_boxes(&mut self, boxes: Vec<PersonBox>) {
        self.store.replace(boxes);
        self.scene.clear();
        for handle in self.store.live_handles() {
            if let Some(person_box) = self.store.get(handle) {
                let rect = self.viewport.image_rect_to_scene(&person_box.rect);
                self.scene.insert(handle, BoxVisual::new(person_box, rect));
            }
        }
        self.gesture = Gesture::idle(self.mode());
    }

    /// Every box including tombstoned ones
    pub fn boxes(&self) -> &[PersonBox] {
        self.store.boxes()
    }

    pub fn removed_marks(&self) -> &[bool] {
        self.store.removed_marks()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    // ========== Selection ==========

    pub fn selected_handle(&self) -> Option<BoxHandle> {
        self.gesture.selected()
    }

    /// The selected box, or `PersonBox::null()` when nothing is selected
    pub fn selected_box(&self) -> PersonBox {
        self.selected_handle()
            .and_then(|handle| self.store.get(handle))
            .copied()
            .unwrap_or_else(PersonBox::null)
    }

    /// Select boxes programmatically. Only the first live box is kept.
    pub fn select(&mut self, handles: &[BoxHandle]) -> Option<CanvasEvent> {
        if self.mode() != Mode::Selection || !self.permissions.allows(Permissions::SELECTION) {
            return None;
        }
        let before = self.selected_handle();
        if handles.len() > 1 {
            log::debug!("Collapsing a selection of {} boxes to one", handles.len());
        }
        self.gesture = match handles.iter().copied().find(|h| self.scene.get(*h).is_some()) {
            Some(handle) => Gesture::Selection(SelectionGesture::Selected { handle, grab: None }),
            None => Gesture::idle(Mode::Selection),
        };
        self.selection_event(before)
    }

    pub fn clear_selection(&mut self) {
        if self.selected_handle().is_some() {
            self.gesture = Gesture::idle(Mode::Selection);
        }
    }

    /// Clear the selection once the pointer button currently held goes up,
    /// or right away when no button is held
    pub fn clear_selection_after_release(&mut self) {
        if self.pointer_down {
            self.clear_on_release = true;
        } else {
            self.clear_selection();
        }
    }

    pub fn set_person_id_of_selection(&mut self, person_id: i64) {
        self.update_selected(|person_box| person_box.person_id = person_id);
    }

    pub fn toggle_hard_on_selection(&mut self) {
        self.update_selected(|person_box| person_box.hard = !person_box.hard);
    }

    fn update_selected(&mut self, update: impl Fn(&mut PersonBox)) {
        let Some(handle) = self.selected_handle() else {
            return;
        };
        if let Some(person_box) = self.store.get_mut(handle) {
            update(person_box);
            if let Some(visual) = self.scene.get_mut(handle) {
                visual.refresh(person_box);
            }
        }
    }

    fn selection_event(&self, before: Option<BoxHandle>) -> Option<CanvasEvent> {
        let after = self.selected_handle();
        (after.is_some() && after != before).then_some(CanvasEvent::BoxSelected)
    }

    // ========== Input ==========

    /// Feed one input event through the state machine
    pub fn handle_input(&mut self, input: Input) -> Option<CanvasEvent> {
        match input {
            Input::Wheel { notches, at } => {
                if self.viewport.zoom_by(zoom_step(notches), at) {
                    self.user_zoomed = true;
                }
                return None;
            }
            Input::PointerMoved(view) => self.pointer = Some(self.viewport.to_scene(view)),
            Input::PointerPressed(_) => self.pointer_down = true,
            Input::PointerReleased(_) => self.pointer_down = false,
            Input::Key(_) => {}
        }

        let before = self.selected_handle();
        let ctx = Context {
            viewport: &self.viewport,
            scene: &self.scene,
            permissions: self.permissions,
        };
        let transition = self.gesture.transition(input, &ctx);
        self.gesture = transition.next;
        for edit in transition.edits {
            self.apply(edit);
        }

        let event = self.selection_event(before);
        if !self.pointer_down && self.clear_on_release {
            self.clear_on_release = false;
            self.clear_selection();
            return None;
        }
        event
    }

    fn apply(&mut self, edit: Edit) {
        match edit {
            Edit::Create { rect } => {
                let person_box = PersonBox::new(self.image_id, self.viewport.scene_rect_to_image(&rect));
                let handle = self.store.push(person_box);
                self.scene.insert(handle, BoxVisual::new(&person_box, rect));
                log::debug!("Created box {:?} at {:?}", handle, person_box.rect);
            }
            Edit::Reshape { handle, rect } => self.set_box_rect(handle, rect),
            Edit::Translate { handle, dx, dy } => {
                if let Some(rect) = self.scene.get(handle).map(|v| v.rect.translate(dx, dy)) {
                    self.set_box_rect(handle, rect);
                }
            }
            Edit::Remove { handle } => {
                self.store.mark_removed(handle);
                self.scene.remove(handle);
            }
        }
    }

    fn set_box_rect(&mut self, handle: BoxHandle, rect: Rect) {
        let Some(visual) = self.scene.get_mut(handle) else {
            return;
        };
        visual.rect = rect;
        if let Some(person_box) = self.store.get_mut(handle) {
            person_box.rect = self.viewport.scene_rect_to_image(&rect);
        }
    }

    // ========== View ==========

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Track the widget size; refits the image until the user zooms
    pub fn set_view_size(&mut self, width: f64, height: f64) {
        if self.viewport.view_size() == (width, height) {
            return;
        }
        self.viewport.set_view_size(width, height);
        if !self.user_zoomed {
            self.viewport.fit();
        }
    }

    /// Visible boxes bottom to top
    pub fn visuals(&self) -> impl Iterator<Item = (BoxHandle, &BoxVisual)> + '_ {
        self.scene.iter()
    }

    pub fn overlays(&self) -> Vec<Overlay> {
        let mut overlays = Vec::new();
        match self.gesture {
            Gesture::Selection(SelectionGesture::Idle { rubber_band: Some((origin, current)) }) => {
                overlays.push(Overlay::RubberBand(Rect::from_corners(origin, current)));
            }
            Gesture::HeadFoot(HeadFootGesture::HeadMarked { head }) => {
                overlays.push(Overlay::HeadMarker(head));
            }
            Gesture::DragDrop(DragDropGesture::Dragging { anchor, current }) => {
                overlays.push(Overlay::DraftBox(Rect::from_corners(anchor, current)));
            }
            _ => {}
        }
        if let (Mode::AnnotateByDragDrop, Some(pointer)) = (self.mode(), self.pointer) {
            overlays.push(Overlay::Rulers(pointer));
        }
        overlays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::gesture::Key;
    use crate::canvas::viewport::MAX_ZOOM;
    use crate::state::data::BoxRect;

    /// Working canvas with a 400x300 image in an 800x600 view (zoom 2)
    fn working() -> BoxCanvas {
        let mut canvas = BoxCanvas::new(Permissions::working());
        canvas.set_view_size(800.0, 600.0);
        canvas.set_image(400, 300, 5);
        canvas
    }

    /// View position of an image pixel
    fn at(canvas: &BoxCanvas, x: f64, y: f64) -> Point {
        let (w, h) = canvas.viewport().image_size();
        canvas.viewport().to_view(Point::new(x - w / 2.0, y - h / 2.0))
    }

    fn click(canvas: &mut BoxCanvas, p: Point) -> Option<CanvasEvent> {
        let event = canvas.handle_input(Input::PointerPressed(p));
        canvas.handle_input(Input::PointerReleased(p));
        event
    }

    fn click_at(canvas: &mut BoxCanvas, x: f64, y: f64) -> Option<CanvasEvent> {
        let p = at(canvas, x, y);
        click(canvas, p)
    }

    fn boxed(id: i64, person_id: i64, rect: BoxRect) -> PersonBox {
        PersonBox {
            id,
            image_id: 5,
            person_id,
            rect,
            hard: false,
        }
    }

    #[test]
    fn test_set_boxes_round_trip() {
        let mut canvas = working();
        let b = PersonBox {
            hard: true,
            ..boxed(3, 9, BoxRect::new(10, 20, 30, 40))
        };
        canvas.set_boxes(vec![b]);
        assert_eq!(canvas.boxes(), &[b]);
        assert_eq!(canvas.removed_marks(), &[false]);
        assert_eq!(canvas.visuals().count(), 1);
    }

    #[test]
    fn test_click_selects_and_reports_once() {
        let mut canvas = working();
        canvas.set_boxes(vec![boxed(1, 4, BoxRect::new(100, 100, 50, 100))]);
        assert!(canvas.selected_box().is_null());

        let inside = at(&canvas, 120.0, 150.0);
        assert_eq!(click(&mut canvas, inside), Some(CanvasEvent::BoxSelected));
        assert_eq!(canvas.state(), State::Selected);
        assert_eq!(canvas.selected_box().person_id, 4);
        // Clicking the same box again is not a new selection
        assert_eq!(click(&mut canvas, inside), None);

        canvas.handle_input(Input::Key(Key::Escape));
        assert_eq!(canvas.state(), State::IdleForSelection);
        assert!(canvas.selected_box().is_null());
    }

    #[test]
    fn test_drag_drop_commits_to_store() {
        let mut canvas = working();
        assert!(canvas.set_mode(Mode::AnnotateByDragDrop));
        canvas.handle_input(Input::PointerPressed(at(&canvas, 10.0, 10.0)));
        canvas.handle_input(Input::PointerMoved(at(&canvas, 40.0, 50.0)));
        assert!(matches!(canvas.overlays()[0], Overlay::DraftBox(_)));
        canvas.handle_input(Input::PointerReleased(at(&canvas, 60.0, 110.0)));

        assert_eq!(canvas.boxes(), &[PersonBox::new(5, BoxRect::new(10, 10, 50, 100))]);
        assert_eq!(canvas.state(), State::IdleForAnnotation);
    }

    #[test]
    fn test_head_foot_commits_to_store() {
        let mut canvas = working();
        canvas.set_mode(Mode::AnnotateByHeadFoot);
        click_at(&mut canvas, 100.0, 20.0);
        assert_eq!(canvas.state(), State::HeadMarked);
        click_at(&mut canvas, 100.0, 180.0);
        assert_eq!(canvas.boxes(), &[PersonBox::new(5, BoxRect::new(70, 20, 60, 160))]);
    }

    #[test]
    fn test_mode_switch_drops_head_marker() {
        let mut canvas = working();
        canvas.set_mode(Mode::AnnotateByHeadFoot);
        click_at(&mut canvas, 100.0, 20.0);
        assert_eq!(canvas.overlays(), vec![Overlay::HeadMarker(Point::new(-100.0, -130.0))]);

        assert!(canvas.set_mode(Mode::Selection));
        assert_eq!(canvas.state(), State::IdleForSelection);
        assert!(canvas.overlays().is_empty());
        assert!(canvas.boxes().is_empty());
    }

    #[test]
    fn test_reference_canvas_cannot_annotate_or_edit() {
        let mut canvas = BoxCanvas::new(Permissions::reference());
        canvas.set_view_size(800.0, 600.0);
        canvas.set_image(400, 300, 5);
        assert!(!canvas.set_mode(Mode::AnnotateByDragDrop));
        assert!(!canvas.set_mode(Mode::Selection));

        let original = boxed(1, 4, BoxRect::new(100, 100, 50, 100));
        canvas.set_boxes(vec![original]);
        let press = at(&canvas, 120.0, 150.0);
        canvas.handle_input(Input::PointerPressed(press));
        canvas.handle_input(Input::PointerMoved(at(&canvas, 200.0, 200.0)));
        canvas.handle_input(Input::PointerReleased(at(&canvas, 200.0, 200.0)));
        canvas.handle_input(Input::Key(Key::Right));
        canvas.handle_input(Input::Key(Key::Delete));

        assert_eq!(canvas.boxes(), &[original]);
        assert_eq!(canvas.removed_marks(), &[false]);
        assert_eq!(canvas.selected_box(), original);
    }

    #[test]
    fn test_move_and_nudge_update_store() {
        let mut canvas = working();
        canvas.set_boxes(vec![boxed(1, 4, BoxRect::new(100, 100, 50, 100))]);
        canvas.handle_input(Input::PointerPressed(at(&canvas, 120.0, 150.0)));
        canvas.handle_input(Input::PointerMoved(at(&canvas, 130.0, 140.0)));
        canvas.handle_input(Input::PointerReleased(at(&canvas, 130.0, 140.0)));
        assert_eq!(canvas.boxes()[0].rect, BoxRect::new(110, 90, 50, 100));

        // Zoom 2: two nudges make one image pixel
        canvas.handle_input(Input::Key(Key::Left));
        canvas.handle_input(Input::Key(Key::Left));
        canvas.handle_input(Input::Key(Key::Down));
        canvas.handle_input(Input::Key(Key::Down));
        assert_eq!(canvas.boxes()[0].rect, BoxRect::new(109, 91, 50, 100));
    }

    #[test]
    fn test_resize_keeps_opposite_corner() {
        let mut canvas = working();
        canvas.set_boxes(vec![boxed(1, 4, BoxRect::new(100, 100, 50, 100))]);
        click_at(&mut canvas, 120.0, 150.0);

        // Grab the top-left corner and drag it past the bottom-right one
        canvas.handle_input(Input::PointerPressed(at(&canvas, 101.0, 101.0)));
        assert_eq!(canvas.state(), State::Resizing);
        canvas.handle_input(Input::PointerMoved(at(&canvas, 170.0, 260.0)));
        assert_eq!(canvas.boxes()[0].rect, BoxRect::new(150, 200, 20, 60));
        // Degenerate sizes are fine while resizing
        canvas.handle_input(Input::PointerMoved(at(&canvas, 150.0, 120.0)));
        canvas.handle_input(Input::PointerReleased(at(&canvas, 150.0, 120.0)));
        assert_eq!(canvas.boxes()[0].rect, BoxRect::new(150, 120, 0, 80));
        assert_eq!(canvas.state(), State::Selected);
    }

    #[test]
    fn test_escape_mid_resize_keeps_reshape() {
        let mut canvas = working();
        canvas.set_boxes(vec![boxed(1, 4, BoxRect::new(100, 100, 50, 100))]);
        click_at(&mut canvas, 120.0, 150.0);

        canvas.handle_input(Input::PointerPressed(at(&canvas, 101.0, 101.0)));
        canvas.handle_input(Input::PointerMoved(at(&canvas, 170.0, 260.0)));
        canvas.handle_input(Input::Key(Key::Escape));

        assert_eq!(canvas.state(), State::IdleForSelection);
        assert!(canvas.selected_box().is_null());
        assert_eq!(canvas.boxes()[0].rect, BoxRect::new(150, 200, 20, 60));
    }

    #[test]
    fn test_delete_tombstones_selection() {
        let mut canvas = working();
        canvas.set_boxes(vec![
            boxed(1, 4, BoxRect::new(0, 100, 50, 100)),
            boxed(2, 5, BoxRect::new(200, 100, 50, 100)),
        ]);
        click_at(&mut canvas, 220.0, 150.0);
        canvas.handle_input(Input::Key(Key::Delete));

        assert_eq!(canvas.removed_marks(), &[false, true]);
        assert_eq!(canvas.boxes().len(), 2);
        assert_eq!(canvas.visuals().count(), 1);
        assert_eq!(canvas.state(), State::IdleForSelection);
    }

    #[test]
    fn test_identity_and_hard_flag_follow_selection() {
        let mut canvas = working();
        canvas.set_boxes(vec![boxed(1, 0, BoxRect::new(100, 100, 50, 100))]);
        canvas.set_person_id_of_selection(8);
        assert_eq!(canvas.boxes()[0].person_id, 0);

        click_at(&mut canvas, 120.0, 150.0);
        canvas.set_person_id_of_selection(13);
        canvas.toggle_hard_on_selection();
        let (_, visual) = canvas.visuals().next().unwrap();
        assert_eq!(visual.label, "13*");
        assert_eq!(visual.color, crate::canvas::scene::PALETTE[3]);
        assert!(canvas.boxes()[0].hard);

        canvas.toggle_hard_on_selection();
        assert_eq!(canvas.visuals().next().unwrap().1.label, "13");
    }

    #[test]
    fn test_programmatic_multi_select_keeps_first() {
        let mut canvas = working();
        canvas.set_boxes(vec![
            boxed(1, 4, BoxRect::new(0, 100, 50, 100)),
            boxed(2, 5, BoxRect::new(200, 100, 50, 100)),
        ]);
        let handles: Vec<_> = canvas.store().live_handles().collect();
        assert_eq!(canvas.select(&handles), Some(CanvasEvent::BoxSelected));
        assert_eq!(canvas.selected_box().id, 1);
    }

    #[test]
    fn test_clear_selection_waits_for_release() {
        let mut canvas = working();
        canvas.set_boxes(vec![boxed(1, 4, BoxRect::new(100, 100, 50, 100))]);
        let p = at(&canvas, 120.0, 150.0);
        assert_eq!(canvas.handle_input(Input::PointerPressed(p)), Some(CanvasEvent::BoxSelected));
        canvas.clear_selection_after_release();
        assert_eq!(canvas.state(), State::Selected);
        canvas.handle_input(Input::PointerReleased(p));
        assert_eq!(canvas.state(), State::IdleForSelection);
    }

    #[test]
    fn test_clear_after_release_is_immediate_once_released() {
        let mut canvas = working();
        canvas.set_boxes(vec![boxed(1, 4, BoxRect::new(100, 100, 50, 100))]);
        // Rubber band: the selection appears on release
        canvas.handle_input(Input::PointerPressed(at(&canvas, 10.0, 10.0)));
        canvas.handle_input(Input::PointerMoved(at(&canvas, 300.0, 280.0)));
        let event = canvas.handle_input(Input::PointerReleased(at(&canvas, 300.0, 280.0)));
        assert_eq!(event, Some(CanvasEvent::BoxSelected));

        canvas.clear_selection_after_release();
        assert_eq!(canvas.state(), State::IdleForSelection);
        assert!(canvas.selected_box().is_null());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut canvas = working();
        let centre = Point::new(400.0, 300.0);
        for _ in 0..20 {
            canvas.handle_input(Input::Wheel { notches: 1.0, at: centre });
        }
        assert!(canvas.viewport().zoom() <= MAX_ZOOM);
        let before = canvas.viewport().zoom();
        canvas.handle_input(Input::Wheel { notches: 2.0, at: centre });
        assert_eq!(canvas.viewport().zoom(), before);

        // A user zoom survives widget resizes
        canvas.set_view_size(1000.0, 700.0);
        assert_eq!(canvas.viewport().zoom(), before);
    }

    #[test]
    fn test_set_image_clears_boxes() {
        let mut canvas = working();
        canvas.set_boxes(vec![boxed(1, 4, BoxRect::new(100, 100, 50, 100))]);
        canvas.set_image(1600, 1200, 6);
        assert!(canvas.boxes().is_empty());
        assert_eq!(canvas.image_id(), 6);
        assert_eq!(canvas.viewport().zoom(), 0.5);
    }
}
