use super::data::ImageFile;
use crate::error::{AppError, AppResult};

/// Ordered list of images with a cursor, one per canvas
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    image_files: Vec<ImageFile>,
    current: Option<usize>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.image_files.clear();
        self.current = None;
    }

    /// Replace the list and point at its first image (if any)
    pub fn set_image_files(&mut self, image_files: Vec<ImageFile>) {
        self.current = if image_files.is_empty() { None } else { Some(0) };
        self.image_files = image_files;
    }

    pub fn image_files(&self) -> &[ImageFile] {
        &self.image_files
    }

    pub fn len(&self) -> usize {
        self.image_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_files.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_image_file(&self) -> Option<&ImageFile> {
        self.current.and_then(|i| self.image_files.get(i))
    }

    /// Move the cursor to `index`. Out-of-range indices leave the cursor where it was.
    pub fn navigate(&mut self, index: i64) -> AppResult<ImageFile> {
        let count = self.len();
        if index < 0 || index as usize >= count {
            return Err(AppError::NavigationOutOfRange { index, count });
        }
        let index = index as usize;
        self.current = Some(index);
        Ok(self.image_files[index].clone())
    }

    pub fn next(&mut self) -> AppResult<ImageFile> {
        self.navigate(self.current_as_i64() + 1)
    }

    pub fn prev(&mut self) -> AppResult<ImageFile> {
        self.navigate(self.current_as_i64() - 1)
    }

    /// Navigate by the 1-based number shown to the user
    pub fn jump(&mut self, number: i64) -> AppResult<ImageFile> {
        self.navigate(number - 1)
    }

    /// Put the cursor back where `current_index` reported it
    pub fn restore(&mut self, current: Option<usize>) {
        self.current = current.filter(|&i| i < self.len());
    }

    /// "3 / 120" style position text
    pub fn position_label(&self) -> String {
        match self.current {
            Some(i) => format!("{} / {}", i + 1, self.len()),
            None => String::new(),
        }
    }

    fn current_as_i64(&self) -> i64 {
        self.current.map(|i| i as i64).unwrap_or(-1)
    }
}
