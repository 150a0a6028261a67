use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Path, Program, Stroke};
use iced::widget::image;
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::canvas::{BoxCanvas, Input, Mode, Overlay};
use crate::canvas::viewport::Viewport;
use crate::geometry;
use crate::link::Side;
use crate::Message;

const BACKGROUND: Color = Color::from_rgb(0.12, 0.12, 0.12);
const OVERLAY: Color = Color::from_rgb(1.0, 1.0, 0.0);
const LABEL_TEXT: Color = Color::WHITE;

/// Draws one `BoxCanvas` and turns mouse events into canvas input
pub struct CanvasView<'a> {
    pub side: Side,
    pub canvas: &'a BoxCanvas,
    pub image: Option<&'a image::Handle>,
}

impl<'a> CanvasView<'a> {
    /// The canvas viewport as it applies to a widget of `size`
    fn viewport(&self, size: Size) -> Viewport {
        let mut viewport = self.canvas.viewport().clone();
        let size = (size.width as f64, size.height as f64);
        if viewport.view_size() != size {
            // The canvas refits on the first event carrying the new size
            viewport.set_view_size(size.0, size.1);
            viewport.fit();
        }
        viewport
    }

    fn message(&self, input: Input, bounds: Rectangle) -> Message {
        Message::Canvas {
            side: self.side,
            input,
            size: bounds.size(),
        }
    }
}

impl<'a> Program<Message> for CanvasView<'a> {
    type State = PointerState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let viewport = self.viewport(bounds.size());
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND);

        if let Some(handle) = self.image {
            frame.draw_image(to_rectangle(&viewport.scene_rect_to_view(&viewport.image_bounds())), handle);
        }

        let selected = self.canvas.selected_handle();
        for (handle, visual) in self.canvas.visuals() {
            let color = Color::from_rgb8(visual.color.0, visual.color.1, visual.color.2);
            let width = if Some(handle) == selected { 4.0 } else { 2.0 };
            let rect = to_rectangle(&viewport.scene_rect_to_view(&visual.rect));
            frame.stroke(
                &Path::rectangle(rect.position(), rect.size()),
                Stroke::default().with_color(color).with_width(width),
            );

            let tab = to_rectangle(&viewport.scene_rect_to_view(&visual.label_rect()));
            frame.fill_rectangle(tab.position(), tab.size(), color);
            frame.fill_text(canvas::Text {
                content: visual.label.clone(),
                position: Point::new(tab.x + 4.0, tab.y + 2.0),
                color: LABEL_TEXT,
                size: (tab.height * 0.8).max(8.0).into(),
                ..canvas::Text::default()
            });
        }

        let stroke = Stroke::default().with_color(OVERLAY).with_width(1.5);
        for overlay in self.canvas.overlays() {
            match overlay {
                Overlay::HeadMarker(head) => {
                    frame.fill(&Path::circle(to_point(viewport.to_view(head)), 5.0), OVERLAY);
                }
                Overlay::DraftBox(rect) | Overlay::RubberBand(rect) => {
                    let rect = to_rectangle(&viewport.scene_rect_to_view(&rect));
                    frame.stroke(&Path::rectangle(rect.position(), rect.size()), stroke);
                }
                Overlay::Rulers(pointer) => {
                    let p = to_point(viewport.to_view(pointer));
                    frame.stroke(&Path::line(Point::new(0.0, p.y), Point::new(bounds.width, p.y)), stroke);
                    frame.stroke(&Path::line(Point::new(p.x, 0.0), Point::new(p.x, bounds.height)), stroke);
                }
            }
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let Some(position) = cursor.position_from(bounds.position()) else {
            return (canvas::event::Status::Ignored, None);
        };
        let point = geometry::Point::new(position.x as f64, position.y as f64);
        let inside = cursor.is_over(bounds);

        let input = match event {
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) if inside => {
                let notches = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y as f64,
                    mouse::ScrollDelta::Pixels { y, .. } => y as f64 / 120.0,
                };
                Input::Wheel { notches, at: point }
            }
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) if inside => {
                state.is_pressed = true;
                Input::PointerPressed(point)
            }
            // Releases outside the widget still finish a drag started inside it
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) if state.is_pressed => {
                state.is_pressed = false;
                Input::PointerReleased(point)
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if inside || state.is_pressed => {
                Input::PointerMoved(point)
            }
            _ => return (canvas::event::Status::Ignored, None),
        };

        (canvas::event::Status::Captured, Some(self.message(input, bounds)))
    }

    fn mouse_interaction(&self, _state: &Self::State, bounds: Rectangle, cursor: Cursor) -> mouse::Interaction {
        if !cursor.is_over(bounds) {
            return mouse::Interaction::default();
        }
        match self.canvas.mode() {
            Mode::Selection => mouse::Interaction::Pointer,
            Mode::AnnotateByHeadFoot | Mode::AnnotateByDragDrop => mouse::Interaction::Crosshair,
        }
    }
}

/// Mouse button tracking between events
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    pub is_pressed: bool,
}

fn to_point(point: geometry::Point) -> Point {
    Point::new(point.x as f32, point.y as f32)
}

fn to_rectangle(rect: &geometry::Rect) -> Rectangle {
    Rectangle {
        x: rect.x as f32,
        y: rect.y as f32,
        width: rect.width as f32,
        height: rect.height as f32,
    }
}
