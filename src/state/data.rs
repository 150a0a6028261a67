//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the database layer, the canvases and the sync engine.

/// Sentinel id for rows that do not exist in the database
pub const NULL_ID: i64 = -1;

/// Represents a single image in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    /// Unique database ID, `NULL_ID` when not found
    pub id: i64,
    /// Path relative to the images root directory, `/` separated
    pub path: String,
    /// Provenance tag: the top-level folder the image was imported under
    pub author: String,
}

impl ImageFile {
    pub fn new(id: i64, path: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            author: author.into(),
        }
    }

    /// The "no such image" value returned by lookups
    pub fn null() -> Self {
        Self::new(NULL_ID, "", "")
    }

    pub fn is_null(&self) -> bool {
        self.id == NULL_ID
    }
}

/// Axis-aligned box in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoxRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// One annotated person region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonBox {
    /// Database ID; `<= 0` means the box has not been persisted yet
    pub id: i64,
    pub image_id: i64,
    /// Person identity; `<= 0` means unassigned
    pub person_id: i64,
    pub rect: BoxRect,
    /// Marks a difficult training sample
    pub hard: bool,
}

impl PersonBox {
    /// A freshly drawn, not yet persisted box with no identity
    pub fn new(image_id: i64, rect: BoxRect) -> Self {
        Self {
            id: 0,
            image_id,
            person_id: 0,
            rect,
            hard: false,
        }
    }

    /// The "nothing selected / no such box" value
    pub fn null() -> Self {
        Self {
            id: NULL_ID,
            image_id: NULL_ID,
            person_id: 0,
            rect: BoxRect::default(),
            hard: false,
        }
    }

    pub fn is_null(&self) -> bool {
        self.id == NULL_ID
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    pub fn has_person(&self) -> bool {
        self.person_id > 0
    }
}
