//! Interaction state machine of a box canvas
//!
//! Each mode has its own state enum carrying only the data that state needs.
//! `Gesture::transition` is total over (state, input) and returns the next
//! state plus the box edits the canvas has to apply; it never mutates
//! anything itself.

use crate::geometry::{Point, Rect};
use crate::state::annotations::BoxHandle;

use super::permissions::Permissions;
use super::scene::Scene;
use super::viewport::Viewport;

/// Distance from a selected box's corner, in view pixels, that grabs the corner
pub const CORNER_TOLERANCE: f64 = 20.0;

/// Width / height ratio of boxes created from a head and a foot point
pub const HEAD_FOOT_ASPECT: f64 = 0.375;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Selection,
    AnnotateByHeadFoot,
    AnnotateByDragDrop,
}

impl Mode {
    /// Permission needed to switch into this mode
    pub fn required_permission(self) -> Permissions {
        match self {
            Mode::Selection => Permissions::SELECTION,
            Mode::AnnotateByHeadFoot | Mode::AnnotateByDragDrop => Permissions::ANNOTATE,
        }
    }
}

/// Flat view of the current state, for display and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    IdleForSelection,
    Selected,
    Resizing,
    IdleForAnnotation,
    HeadMarked,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Delete,
    Escape,
}

/// Raw input, positions in view space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    PointerPressed(Point),
    PointerMoved(Point),
    PointerReleased(Point),
    /// Positive notches zoom in
    Wheel { notches: f64, at: Point },
    Key(Key),
}

/// Box mutation requested by a transition. Rectangles are in scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edit {
    Create { rect: Rect },
    Reshape { handle: BoxHandle, rect: Rect },
    Translate { handle: BoxHandle, dx: f64, dy: f64 },
    Remove { handle: BoxHandle },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionGesture {
    /// `rubber_band` holds the press point while dragging out a selection area
    Idle { rubber_band: Option<(Point, Point)> },
    /// `grab` is the last pointer position while the box is being dragged
    Selected { handle: BoxHandle, grab: Option<Point> },
    /// `anchor` is the fixed corner opposite the grabbed one
    Resizing { handle: BoxHandle, anchor: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadFootGesture {
    Idle,
    HeadMarked { head: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragDropGesture {
    Idle,
    Dragging { anchor: Point, current: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Selection(SelectionGesture),
    HeadFoot(HeadFootGesture),
    DragDrop(DragDropGesture),
}

impl Default for Gesture {
    fn default() -> Self {
        Gesture::idle(Mode::Selection)
    }
}

/// Read-only view of the canvas a transition may consult
pub struct Context<'a> {
    pub viewport: &'a Viewport,
    pub scene: &'a Scene,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Gesture,
    pub edits: Vec<Edit>,
}

impl Transition {
    fn to(next: Gesture) -> Self {
        Self { next, edits: Vec::new() }
    }

    fn with(next: Gesture, edit: Edit) -> Self {
        Self { next, edits: vec![edit] }
    }
}

impl Gesture {
    pub fn idle(mode: Mode) -> Self {
        match mode {
            Mode::Selection => Gesture::Selection(SelectionGesture::Idle { rubber_band: None }),
            Mode::AnnotateByHeadFoot => Gesture::HeadFoot(HeadFootGesture::Idle),
            Mode::AnnotateByDragDrop => Gesture::DragDrop(DragDropGesture::Idle),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Gesture::Selection(_) => Mode::Selection,
            Gesture::HeadFoot(_) => Mode::AnnotateByHeadFoot,
            Gesture::DragDrop(_) => Mode::AnnotateByDragDrop,
        }
    }

    pub fn state(&self) -> State {
        match self {
            Gesture::Selection(SelectionGesture::Idle { .. }) => State::IdleForSelection,
            Gesture::Selection(SelectionGesture::Selected { .. }) => State::Selected,
            Gesture::Selection(SelectionGesture::Resizing { .. }) => State::Resizing,
            Gesture::HeadFoot(HeadFootGesture::Idle) | Gesture::DragDrop(DragDropGesture::Idle) => {
                State::IdleForAnnotation
            }
            Gesture::HeadFoot(HeadFootGesture::HeadMarked { .. }) => State::HeadMarked,
            Gesture::DragDrop(DragDropGesture::Dragging { .. }) => State::Dragging,
        }
    }

    /// The selected box, if any. There is never more than one.
    pub fn selected(&self) -> Option<BoxHandle> {
        match self {
            Gesture::Selection(SelectionGesture::Selected { handle, .. })
            | Gesture::Selection(SelectionGesture::Resizing { handle, .. }) => Some(*handle),
            _ => None,
        }
    }

    pub fn transition(self, input: Input, ctx: &Context<'_>) -> Transition {
        match input {
            Input::PointerPressed(view) => self.on_press(view, ctx),
            Input::PointerMoved(view) => self.on_move(ctx.viewport.to_scene(view)),
            Input::PointerReleased(view) => self.on_release(ctx.viewport.to_scene(view), ctx),
            Input::Key(key) => self.on_key(key, ctx),
            // Zoom is a viewport concern
            Input::Wheel { .. } => Transition::to(self),
        }
    }

    fn on_press(self, view: Point, ctx: &Context<'_>) -> Transition {
        let point = ctx.viewport.to_scene(view);
        match self {
            Gesture::Selection(_) if !ctx.permissions.allows(Permissions::SELECTION) => Transition::to(self),
            Gesture::Selection(SelectionGesture::Idle { .. }) => Transition::to(press_select(point, ctx)),
            Gesture::Selection(SelectionGesture::Selected { handle, .. }) => {
                let corner = ctx.scene.get(handle).and_then(|visual| {
                    ctx.viewport
                        .scene_rect_to_view(&visual.rect)
                        .corner_near(view, CORNER_TOLERANCE)
                        .map(|corner| visual.rect.corner(corner.opposite()))
                });
                match corner {
                    Some(anchor) if ctx.permissions.allows(Permissions::RESIZE) => Transition::to(
                        Gesture::Selection(SelectionGesture::Resizing { handle, anchor }),
                    ),
                    // Not on a corner: behave like a fresh click
                    _ => Transition::to(press_select(point, ctx)),
                }
            }
            Gesture::Selection(SelectionGesture::Resizing { .. }) => Transition::to(self),

            Gesture::HeadFoot(HeadFootGesture::Idle) => {
                Transition::to(Gesture::HeadFoot(HeadFootGesture::HeadMarked { head: point }))
            }
            Gesture::HeadFoot(HeadFootGesture::HeadMarked { head }) => {
                let idle = Gesture::HeadFoot(HeadFootGesture::Idle);
                match head_foot_rect(head, point) {
                    Some(rect) => Transition::with(idle, Edit::Create { rect }),
                    None => Transition::to(idle),
                }
            }

            Gesture::DragDrop(DragDropGesture::Idle) => Transition::to(Gesture::DragDrop(
                DragDropGesture::Dragging { anchor: point, current: point },
            )),
            Gesture::DragDrop(DragDropGesture::Dragging { .. }) => Transition::to(self),
        }
    }

    fn on_move(self, point: Point) -> Transition {
        match self {
            Gesture::Selection(SelectionGesture::Idle { rubber_band: Some((origin, _)) }) => {
                Transition::to(Gesture::Selection(SelectionGesture::Idle {
                    rubber_band: Some((origin, point)),
                }))
            }
            Gesture::Selection(SelectionGesture::Selected { handle, grab: Some(last) }) => {
                Transition::with(
                    Gesture::Selection(SelectionGesture::Selected { handle, grab: Some(point) }),
                    Edit::Translate {
                        handle,
                        dx: point.x - last.x,
                        dy: point.y - last.y,
                    },
                )
            }
            Gesture::Selection(SelectionGesture::Resizing { handle, anchor }) => Transition::with(
                self,
                Edit::Reshape {
                    handle,
                    rect: Rect::from_corners(anchor, point),
                },
            ),
            Gesture::DragDrop(DragDropGesture::Dragging { anchor, .. }) => Transition::to(
                Gesture::DragDrop(DragDropGesture::Dragging { anchor, current: point }),
            ),
            _ => Transition::to(self),
        }
    }

    fn on_release(self, point: Point, ctx: &Context<'_>) -> Transition {
        match self {
            Gesture::Selection(SelectionGesture::Idle { rubber_band: Some((origin, _)) }) => {
                let area = Rect::from_corners(origin, point);
                let hits = if area.is_degenerate() {
                    Vec::new()
                } else {
                    ctx.scene.intersecting(&area)
                };
                // Only the first box of a multi-selection survives
                let next = match hits.first() {
                    Some(&handle) => SelectionGesture::Selected { handle, grab: None },
                    None => SelectionGesture::Idle { rubber_band: None },
                };
                Transition::to(Gesture::Selection(next))
            }
            Gesture::Selection(SelectionGesture::Selected { handle, .. })
            | Gesture::Selection(SelectionGesture::Resizing { handle, .. }) => {
                Transition::to(Gesture::Selection(SelectionGesture::Selected { handle, grab: None }))
            }
            Gesture::DragDrop(DragDropGesture::Dragging { anchor, .. }) => {
                let idle = Gesture::DragDrop(DragDropGesture::Idle);
                let rect = Rect::from_corners(anchor, point);
                if rect.is_degenerate() {
                    Transition::to(idle)
                } else {
                    Transition::with(idle, Edit::Create { rect })
                }
            }
            _ => Transition::to(self),
        }
    }

    fn on_key(self, key: Key, ctx: &Context<'_>) -> Transition {
        match key {
            Key::Escape => match self {
                Gesture::Selection(_) => Transition::to(Gesture::idle(Mode::Selection)),
                Gesture::HeadFoot(_) => Transition::to(Gesture::idle(Mode::AnnotateByHeadFoot)),
                Gesture::DragDrop(_) => Transition::to(Gesture::idle(Mode::AnnotateByDragDrop)),
            },
            Key::Delete => match self.selected() {
                Some(handle) if ctx.permissions.allows(Permissions::REMOVE) => {
                    Transition::with(Gesture::idle(Mode::Selection), Edit::Remove { handle })
                }
                _ => Transition::to(self),
            },
            Key::Left | Key::Right | Key::Up | Key::Down => match self.selected() {
                Some(handle) if ctx.permissions.allows(Permissions::MOVE) => {
                    let step = ctx.viewport.pixel_delta();
                    let (dx, dy) = match key {
                        Key::Left => (-step, 0.0),
                        Key::Right => (step, 0.0),
                        Key::Up => (0.0, -step),
                        _ => (0.0, step),
                    };
                    Transition::with(self, Edit::Translate { handle, dx, dy })
                }
                _ => Transition::to(self),
            },
        }
    }
}

/// Select whatever is under `point`, or start a rubber band on empty space
fn press_select(point: Point, ctx: &Context<'_>) -> Gesture {
    let next = match ctx.scene.hit_test(point) {
        Some(handle) => SelectionGesture::Selected {
            handle,
            grab: ctx.permissions.allows(Permissions::MOVE).then_some(point),
        },
        None => SelectionGesture::Idle {
            rubber_band: Some((point, point)),
        },
    };
    Gesture::Selection(next)
}

/// Fixed-ratio box whose top edge centre is `head` and bottom edge centre is
/// `foot`. `None` unless the foot lies strictly below the head.
fn head_foot_rect(head: Point, foot: Point) -> Option<Rect> {
    let height = foot.y - head.y;
    if height <= 0.0 {
        return None;
    }
    let width = height * HEAD_FOOT_ASPECT;
    let centre = head.midpoint(foot);
    Some(Rect::new(
        centre.x - width / 2.0,
        centre.y - height / 2.0,
        width,
        height,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::scene::BoxVisual;
    use crate::state::data::{BoxRect, PersonBox};

    /// 400x300 image in an 800x600 view: zoom 2, scene (0, 0) at view (400, 300)
    fn fixture() -> (Viewport, Scene) {
        let mut viewport = Viewport::default();
        viewport.set_view_size(800.0, 600.0);
        viewport.set_image_size(400.0, 300.0);
        let mut scene = Scene::default();
        scene.insert(
            BoxHandle(0),
            BoxVisual::new(&PersonBox::new(1, BoxRect::default()), Rect::new(0.0, 0.0, 50.0, 100.0)),
        );
        (viewport, scene)
    }

    fn view_of(viewport: &Viewport, x: f64, y: f64) -> Point {
        viewport.to_view(Point::new(x, y))
    }

    #[test]
    fn test_press_on_box_selects_and_grabs() {
        let (viewport, scene) = fixture();
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::working() };
        let t = Gesture::default().transition(Input::PointerPressed(view_of(&viewport, 25.0, 50.0)), &ctx);
        assert_eq!(
            t.next,
            Gesture::Selection(SelectionGesture::Selected {
                handle: BoxHandle(0),
                grab: Some(Point::new(25.0, 50.0))
            })
        );
    }

    #[test]
    fn test_reference_permissions_select_without_grab() {
        let (viewport, scene) = fixture();
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::reference() };
        let t = Gesture::default().transition(Input::PointerPressed(view_of(&viewport, 25.0, 50.0)), &ctx);
        assert_eq!(t.next.selected(), Some(BoxHandle(0)));
        let t = t.next.transition(Input::PointerMoved(view_of(&viewport, 40.0, 60.0)), &ctx);
        assert!(t.edits.is_empty());
    }

    #[test]
    fn test_corner_press_starts_resize_from_opposite_anchor() {
        let (viewport, scene) = fixture();
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::working() };
        let selected = Gesture::Selection(SelectionGesture::Selected { handle: BoxHandle(0), grab: None });
        // 15 view pixels away from the bottom-right corner (zoom 2)
        let press = view_of(&viewport, 50.0, 100.0);
        let press = Point::new(press.x + 9.0, press.y + 12.0);
        let t = selected.transition(Input::PointerPressed(press), &ctx);
        assert_eq!(
            t.next,
            Gesture::Selection(SelectionGesture::Resizing { handle: BoxHandle(0), anchor: Point::new(0.0, 0.0) })
        );

        for target in [Point::new(80.0, 30.0), Point::new(-20.0, -40.0), Point::new(0.0, 70.0)] {
            let moved = t.next.transition(Input::PointerMoved(viewport.to_view(target)), &ctx);
            assert_eq!(
                moved.edits,
                vec![Edit::Reshape {
                    handle: BoxHandle(0),
                    rect: Rect::from_corners(Point::new(0.0, 0.0), target)
                }]
            );
        }
    }

    #[test]
    fn test_corner_tolerance_is_in_view_pixels() {
        let (viewport, scene) = fixture();
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::working() };
        let selected = Gesture::Selection(SelectionGesture::Selected { handle: BoxHandle(0), grab: None });
        // 15 scene units = 30 view pixels outside the top-left corner: too far, and on empty space
        let t = selected.transition(Input::PointerPressed(view_of(&viewport, -15.0, -15.0)), &ctx);
        assert_eq!(t.next.state(), State::IdleForSelection);
    }

    #[test]
    fn test_corner_without_resize_permission_reselects() {
        let (viewport, scene) = fixture();
        let ctx = Context {
            viewport: &viewport,
            scene: &scene,
            permissions: Permissions::SELECTION | Permissions::MOVE,
        };
        let selected = Gesture::Selection(SelectionGesture::Selected { handle: BoxHandle(0), grab: None });
        let t = selected.transition(Input::PointerPressed(view_of(&viewport, 49.0, 99.0)), &ctx);
        assert_eq!(t.next.state(), State::Selected);
    }

    #[test]
    fn test_head_foot_creates_fixed_ratio_box() {
        let (viewport, scene) = fixture();
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::working() };
        let idle = Gesture::idle(Mode::AnnotateByHeadFoot);
        let t = idle.transition(Input::PointerPressed(view_of(&viewport, 10.0, -80.0)), &ctx);
        assert_eq!(t.next.state(), State::HeadMarked);
        let t = t.next.transition(Input::PointerPressed(view_of(&viewport, 10.0, 0.0)), &ctx);
        assert_eq!(t.next.state(), State::IdleForAnnotation);
        assert_eq!(t.edits, vec![Edit::Create { rect: Rect::new(-5.0, -80.0, 30.0, 80.0) }]);
    }

    #[test]
    fn test_head_foot_rejects_upward_pair() {
        let (viewport, scene) = fixture();
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::working() };
        let marked = Gesture::HeadFoot(HeadFootGesture::HeadMarked { head: Point::new(0.0, 10.0) });
        let t = marked.transition(Input::PointerPressed(view_of(&viewport, 0.0, 10.0)), &ctx);
        assert_eq!(t.next.state(), State::IdleForAnnotation);
        assert!(t.edits.is_empty());
    }

    #[test]
    fn test_drag_drop_discards_degenerate_box() {
        let (viewport, scene) = fixture();
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::working() };
        let t = Gesture::idle(Mode::AnnotateByDragDrop)
            .transition(Input::PointerPressed(view_of(&viewport, 0.0, 0.0)), &ctx);
        assert_eq!(t.next.state(), State::Dragging);
        let flat = t.next.transition(Input::PointerReleased(view_of(&viewport, 30.0, 0.0)), &ctx);
        assert!(flat.edits.is_empty());
        assert_eq!(flat.next.state(), State::IdleForAnnotation);

        let real = t.next.transition(Input::PointerReleased(view_of(&viewport, -30.0, 20.0)), &ctx);
        assert_eq!(real.edits, vec![Edit::Create { rect: Rect::new(-30.0, 0.0, 30.0, 20.0) }]);
    }

    #[test]
    fn test_rubber_band_collapses_to_first_box() {
        let (viewport, mut scene) = fixture();
        scene.insert(
            BoxHandle(1),
            BoxVisual::new(&PersonBox::new(1, BoxRect::default()), Rect::new(60.0, 0.0, 10.0, 10.0)),
        );
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::working() };
        let t = Gesture::default().transition(Input::PointerPressed(view_of(&viewport, -100.0, 120.0)), &ctx);
        assert_eq!(t.next.state(), State::IdleForSelection);
        let t = t.next.transition(Input::PointerMoved(view_of(&viewport, 100.0, 5.0)), &ctx);
        let t = t.next.transition(Input::PointerReleased(view_of(&viewport, 100.0, 5.0)), &ctx);
        assert_eq!(t.next.selected(), Some(BoxHandle(0)));
    }

    #[test]
    fn test_escape_cancels_every_gesture() {
        let (viewport, scene) = fixture();
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::working() };
        let cases = [
            (Gesture::Selection(SelectionGesture::Selected { handle: BoxHandle(0), grab: None }), State::IdleForSelection),
            (Gesture::HeadFoot(HeadFootGesture::HeadMarked { head: Point::default() }), State::IdleForAnnotation),
            (
                Gesture::DragDrop(DragDropGesture::Dragging { anchor: Point::default(), current: Point::new(5.0, 5.0) }),
                State::IdleForAnnotation,
            ),
        ];
        for (gesture, expected) in cases {
            let t = gesture.transition(Input::Key(Key::Escape), &ctx);
            assert_eq!(t.next.state(), expected);
            assert_eq!(t.next.mode(), gesture.mode());
            assert!(t.edits.is_empty());
        }
    }

    #[test]
    fn test_arrow_nudges_by_one_view_pixel() {
        let (viewport, scene) = fixture();
        let ctx = Context { viewport: &viewport, scene: &scene, permissions: Permissions::working() };
        let selected = Gesture::Selection(SelectionGesture::Selected { handle: BoxHandle(0), grab: None });
        let t = selected.transition(Input::Key(Key::Up), &ctx);
        assert_eq!(t.edits, vec![Edit::Translate { handle: BoxHandle(0), dx: 0.0, dy: -0.5 }]);

        let read_only = Context { viewport: &viewport, scene: &scene, permissions: Permissions::reference() };
        assert!(selected.transition(Input::Key(Key::Left), &read_only).edits.is_empty());
        assert!(selected.transition(Input::Key(Key::Delete), &read_only).edits.is_empty());
    }
}
