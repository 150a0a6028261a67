use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the user by the annotator
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("cannot read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("folder {} must be inside the images root directory {}", .folder.display(), .root.display())]
    FolderOutsideRoot { root: PathBuf, folder: PathBuf },

    #[error("image index {index} is out of range for {count} images")]
    NavigationOutOfRange { index: i64, count: usize },

    #[error("no image folder is open")]
    NoFolderLoaded,
}

pub type AppResult<T> = Result<T, AppError>;
