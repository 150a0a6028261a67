//! iced widgets of the annotator

pub mod canvas;
