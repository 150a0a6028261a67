//! Point and rectangle math shared by the canvas and its renderers.
//!
//! All values are `f64`. The same types are used for view space (pixels on
//! screen), scene space (image centre at the origin) and image space (top-left
//! of the image at the origin); the canvas viewport converts between them.

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// One of the four corners of an axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Order in which corners are hit-tested
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// The diagonally opposite corner
    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// An axis-aligned rectangle with non-negative width and height
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Normalized rectangle spanned by two arbitrary corner points
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => Point::new(self.x, self.y),
            Corner::TopRight => Point::new(self.x + self.width, self.y),
            Corner::BottomLeft => Point::new(self.x, self.y + self.height),
            Corner::BottomRight => Point::new(self.x + self.width, self.y + self.height),
        }
    }

    /// First corner (in `Corner::ALL` order) lying within `tolerance` of `point`
    pub fn corner_near(&self, point: Point, tolerance: f64) -> Option<Corner> {
        Corner::ALL
            .into_iter()
            .find(|&corner| self.corner(corner).distance_to(point) <= tolerance)
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.x + other.width
            && other.x <= self.x + self.width
            && self.y <= other.y + other.height
            && other.y <= self.y + self.height
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
    }

    #[test]
    fn test_from_corners_normalizes() {
        let r = Rect::from_corners(Point::new(10.0, 40.0), Point::new(4.0, 20.0));
        assert_eq!(r, Rect::new(4.0, 20.0, 6.0, 20.0));
    }

    #[test]
    fn test_corner_near() {
        let r = Rect::new(0.0, 0.0, 100.0, 200.0);
        assert_eq!(r.corner_near(Point::new(5.0, 5.0), 20.0), Some(Corner::TopLeft));
        assert_eq!(r.corner_near(Point::new(110.0, 195.0), 20.0), Some(Corner::BottomRight));
        assert_eq!(r.corner_near(Point::new(50.0, 100.0), 20.0), None);
        // Exactly on the tolerance boundary still counts
        assert_eq!(r.corner_near(Point::new(120.0, 0.0), 20.0), Some(Corner::TopRight));
    }

    #[test]
    fn test_opposite_corner_round_trips() {
        for corner in Corner::ALL {
            assert_eq!(corner.opposite().opposite(), corner);
        }
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(r.corner(Corner::TopLeft.opposite()), Point::new(4.0, 6.0));
    }

    #[test]
    fn test_intersects_and_contains() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(11.0, 0.0, 1.0, 1.0)));
        assert!(a.contains(Point::new(10.0, 10.0)));
        assert!(!a.contains(Point::new(10.1, 5.0)));
    }
}
