//! Visual side table of a canvas
//!
//! Maps each live box handle to what is drawn for it: the scene-space
//! rectangle (kept at full precision while it is dragged around), the
//! identity colour and the label text. Tombstoned boxes have no visual.

use std::collections::BTreeMap;

use crate::geometry::{Point, Rect};
use crate::state::annotations::BoxHandle;
use crate::state::data::PersonBox;

/// Box colours, picked by `person_id mod PALETTE.len()`
pub const PALETTE: [(u8, u8, u8); 10] = [
    (255, 65, 54),
    (61, 153, 112),
    (0, 116, 217),
    (133, 20, 75),
    (0, 31, 63),
    (240, 18, 190),
    (1, 255, 112),
    (127, 219, 255),
    (255, 133, 27),
    (176, 176, 176),
];

/// Size of the identity tab drawn above a box's top-left corner, in scene units
pub const LABEL_WIDTH: f64 = 100.0;
pub const LABEL_HEIGHT: f64 = 50.0;

/// Suffix appended to the label of hard samples
pub const HARD_MARKER: &str = "*";

pub fn color_for(person_id: i64) -> (u8, u8, u8) {
    PALETTE[person_id.rem_euclid(PALETTE.len() as i64) as usize]
}

pub fn label_for(person_box: &PersonBox) -> String {
    if person_box.hard {
        format!("{}{}", person_box.person_id, HARD_MARKER)
    } else {
        person_box.person_id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxVisual {
    pub rect: Rect,
    pub color: (u8, u8, u8),
    pub label: String,
}

impl BoxVisual {
    pub fn new(person_box: &PersonBox, rect: Rect) -> Self {
        Self {
            rect,
            color: color_for(person_box.person_id),
            label: label_for(person_box),
        }
    }

    /// Re-derive colour and label after the box's identity or flags changed
    pub fn refresh(&mut self, person_box: &PersonBox) {
        self.color = color_for(person_box.person_id);
        self.label = label_for(person_box);
    }

    pub fn label_rect(&self) -> Rect {
        Rect::new(self.rect.x, self.rect.y - LABEL_HEIGHT, LABEL_WIDTH, LABEL_HEIGHT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    visuals: BTreeMap<BoxHandle, BoxVisual>,
}

impl Scene {
    pub fn clear(&mut self) {
        self.visuals.clear();
    }

    pub fn insert(&mut self, handle: BoxHandle, visual: BoxVisual) {
        self.visuals.insert(handle, visual);
    }

    pub fn remove(&mut self, handle: BoxHandle) -> Option<BoxVisual> {
        self.visuals.remove(&handle)
    }

    pub fn get(&self, handle: BoxHandle) -> Option<&BoxVisual> {
        self.visuals.get(&handle)
    }

    pub fn get_mut(&mut self, handle: BoxHandle) -> Option<&mut BoxVisual> {
        self.visuals.get_mut(&handle)
    }

    /// Visuals bottom to top
    pub fn iter(&self) -> impl Iterator<Item = (BoxHandle, &BoxVisual)> + '_ {
        self.visuals.iter().map(|(handle, visual)| (*handle, visual))
    }

    /// Topmost box under `point`. Label tabs win over box interiors.
    pub fn hit_test(&self, point: Point) -> Option<BoxHandle> {
        self.visuals
            .iter()
            .rev()
            .find(|(_, visual)| visual.label_rect().contains(point))
            .or_else(|| {
                self.visuals
                    .iter()
                    .rev()
                    .find(|(_, visual)| visual.rect.contains(point))
            })
            .map(|(handle, _)| *handle)
    }

    /// Boxes touching `area`, bottom to top
    pub fn intersecting(&self, area: &Rect) -> Vec<BoxHandle> {
        self.visuals
            .iter()
            .filter(|(_, visual)| visual.rect.intersects(area))
            .map(|(handle, _)| *handle)
            .collect()
    }
}
