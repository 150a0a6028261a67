//! Box canvas
//!
//! Everything a single annotation view needs, independent of the GUI toolkit:
//! - Coordinate mapping and zoom (viewport.rs)
//! - Capability bits (permissions.rs)
//! - Drawn boxes, colours and hit testing (scene.rs)
//! - The interaction state machine (gesture.rs)
//! - The canvas tying them to an annotation store (box_canvas.rs)

pub mod box_canvas;
pub mod gesture;
pub mod permissions;
pub mod scene;
pub mod viewport;

pub use box_canvas::{BoxCanvas, CanvasEvent, Overlay};
pub use gesture::{Input, Key, Mode, State};
pub use permissions::Permissions;
