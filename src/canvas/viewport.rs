//! Coordinate mapping between screen, scene and image space
//!
//! Scene space puts the image centre at the origin. View space is the
//! widget's own pixel space: `view = view_centre + pan + scene * zoom`.
//! Image space is what gets stored: `image = scene + image_size / 2`.

use crate::geometry::{Point, Rect};
use crate::state::data::BoxRect;

/// Smallest allowed zoom factor relative to the image's natural resolution
pub const MIN_ZOOM: f64 = 0.07;
/// Largest allowed zoom factor
pub const MAX_ZOOM: f64 = 20.0;

/// Zoom multiplier for a number of wheel notches (two notches double the zoom)
pub fn zoom_step(notches: f64) -> f64 {
    2f64.powf(notches / 2.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    image_width: f64,
    image_height: f64,
    view_width: f64,
    view_height: f64,
    zoom: f64,
    pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            image_width: 0.0,
            image_height: 0.0,
            view_width: 800.0,
            view_height: 600.0,
            zoom: 1.0,
            pan: Point::default(),
        }
    }
}

impl Viewport {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn image_size(&self) -> (f64, f64) {
        (self.image_width, self.image_height)
    }

    pub fn view_size(&self) -> (f64, f64) {
        (self.view_width, self.view_height)
    }

    /// Zoom at which the whole image fits the view
    pub fn fit_zoom(&self) -> f64 {
        if self.image_width <= 0.0 || self.image_height <= 0.0 {
            return 1.0;
        }
        (self.view_width / self.image_width)
            .min(self.view_height / self.image_height)
            .clamp(MIN_ZOOM, MAX_ZOOM)
    }

    /// Switch to a new image and fit it into the view
    pub fn set_image_size(&mut self, width: f64, height: f64) {
        self.image_width = width;
        self.image_height = height;
        self.fit();
    }

    pub fn set_view_size(&mut self, width: f64, height: f64) {
        self.view_width = width;
        self.view_height = height;
    }

    /// Fit the image and drop any panning
    pub fn fit(&mut self) {
        self.zoom = self.fit_zoom();
        self.pan = Point::default();
    }

    /// Multiply the zoom, keeping the scene point under `anchor` in place.
    /// Requests that would leave the allowed range are ignored; returns whether
    /// the zoom changed.
    pub fn zoom_by(&mut self, factor: f64, anchor: Point) -> bool {
        let zoom = self.zoom * factor;
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            return false;
        }
        let fixed = self.to_scene(anchor);
        let centre = self.view_centre();
        self.zoom = zoom;
        self.pan = Point::new(
            anchor.x - centre.x - fixed.x * zoom,
            anchor.y - centre.y - fixed.y * zoom,
        );
        true
    }

    fn view_centre(&self) -> Point {
        Point::new(self.view_width / 2.0, self.view_height / 2.0)
    }

    pub fn to_scene(&self, view: Point) -> Point {
        let centre = self.view_centre();
        Point::new(
            (view.x - centre.x - self.pan.x) / self.zoom,
            (view.y - centre.y - self.pan.y) / self.zoom,
        )
    }

    pub fn to_view(&self, scene: Point) -> Point {
        let centre = self.view_centre();
        Point::new(
            centre.x + self.pan.x + scene.x * self.zoom,
            centre.y + self.pan.y + scene.y * self.zoom,
        )
    }

    pub fn scene_rect_to_view(&self, rect: &Rect) -> Rect {
        let top_left = self.to_view(Point::new(rect.x, rect.y));
        Rect::new(top_left.x, top_left.y, rect.width * self.zoom, rect.height * self.zoom)
    }

    /// Scene-space length of one view pixel
    pub fn pixel_delta(&self) -> f64 {
        1.0 / self.zoom
    }

    /// The image itself, in scene space
    pub fn image_bounds(&self) -> Rect {
        Rect::new(
            -self.image_width / 2.0,
            -self.image_height / 2.0,
            self.image_width,
            self.image_height,
        )
    }

    pub fn image_rect_to_scene(&self, rect: &BoxRect) -> Rect {
        Rect::new(
            rect.x as f64 - self.image_width / 2.0,
            rect.y as f64 - self.image_height / 2.0,
            rect.width as f64,
            rect.height as f64,
        )
    }

    /// Stored box for a scene rectangle, rounded to whole pixels
    pub fn scene_rect_to_image(&self, rect: &Rect) -> BoxRect {
        BoxRect::new(
            (rect.x + self.image_width / 2.0).round() as i32,
            (rect.y + self.image_height / 2.0).round() as i32,
            rect.width.round() as i32,
            rect.height.round() as i32,
        )
    }
}
