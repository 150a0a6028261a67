//! State management module
//!
//! This module handles all application state, including:
//! - Shared data structures (data.rs)
//! - The in-memory box store of an open image (annotations.rs)
//! - Database connections and queries (library.rs)
//! - Writing edited boxes back to the database (sync.rs)
//! - Text exports (export.rs)
//! - Folder import (import.rs)
//! - Image lists and navigation (gallery.rs)

pub mod annotations;
pub mod data;
pub mod export;
pub mod gallery;
pub mod import;
pub mod library;
pub mod sync;
