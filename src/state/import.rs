//! Folder import
//!
//! Images are registered by their path relative to the images root
//! directory, tagged with the first folder below the root they came from.

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use super::data::ImageFile;
use super::library::Library;
use crate::error::{AppError, AppResult};

/// Supported image file extensions
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "bmp", "jpg", "jpeg"];

/// Check that `folder` lies strictly inside `root`.
/// Returns the folder path relative to the root.
pub fn validate_folder(root: &Path, folder: &Path) -> AppResult<PathBuf> {
    let outside = || AppError::FolderOutsideRoot {
        root: root.to_path_buf(),
        folder: folder.to_path_buf(),
    };

    if folder.as_os_str().is_empty() {
        return Err(outside());
    }

    let root = absolute(root);
    let folder = absolute(folder);
    let relative = folder.strip_prefix(&root).map_err(|_| outside())?;
    if relative.as_os_str().is_empty() {
        return Err(outside());
    }
    Ok(relative.to_path_buf())
}

/// Lexically normalized absolute path; does not touch the filesystem
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Image files directly inside `folder`, sorted by file name
pub fn list_image_files(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_image_file(path))
        .collect()
}

/// Path of `path` relative to `root`, `/` separated
fn relative_path_string(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Register every image of `folder` in the library and return them in listing order.
pub fn import_folder(library: &Library, root: &Path, folder: &Path) -> AppResult<Vec<ImageFile>> {
    let relative_folder = match validate_folder(root, folder) {
        Ok(relative) => relative,
        Err(e) => {
            log::warn!("⚠️  Rejected folder import: {}", e);
            return Err(e);
        }
    };

    let author = relative_folder
        .components()
        .next()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .unwrap_or_default();

    log::info!("🔍 Scanning folder: {}", folder.display());

    let root = absolute(root);
    let paths: Vec<String> = list_image_files(&absolute(folder))
        .iter()
        .map(|path| relative_path_string(&root, path))
        .collect();

    Ok(library.add_and_query_image_files(&paths, &author)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_folder() {
        let root = Path::new("/data/images");
        assert!(validate_folder(root, Path::new("/data/images/cam1/day2")).is_ok());
        assert!(validate_folder(root, Path::new("/data/images")).is_err());
        assert!(validate_folder(root, Path::new("/data/other")).is_err());
        assert!(validate_folder(root, Path::new("/data/images/../other")).is_err());
        assert!(validate_folder(root, Path::new("")).is_err());
    }

    #[test]
    fn test_import_folder_registers_relative_paths() {
        let root = tempfile::tempdir().unwrap();
        let folder = root.path().join("cam1").join("day2");
        fs::create_dir_all(folder.join("nested")).unwrap();
        for name in ["b.JPG", "a.png", "notes.txt", "c.jpeg"] {
            fs::write(folder.join(name), b"").unwrap();
        }
        fs::write(folder.join("nested").join("d.jpg"), b"").unwrap();

        let library = Library::open_in_memory().unwrap();
        let images = import_folder(&library, root.path(), &folder).unwrap();

        let paths: Vec<&str> = images.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["cam1/day2/a.png", "cam1/day2/b.JPG", "cam1/day2/c.jpeg"]);
        assert!(images.iter().all(|i| i.author == "cam1" && i.id > 0));

        // Importing again returns the same rows
        let again = import_folder(&library, root.path(), &folder).unwrap();
        assert_eq!(again, images);
        assert_eq!(library.image_count().unwrap(), 3);
    }

    #[test]
    fn test_import_outside_root_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let library = Library::open_in_memory().unwrap();
        let result = import_folder(&library, root.path(), other.path());
        assert!(matches!(result, Err(AppError::FolderOutsideRoot { .. })));
        assert_eq!(library.image_count().unwrap(), 0);
    }
}
