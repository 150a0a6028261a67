//! Mediator between the two canvases, their galleries and the database
//!
//! The reference canvas is read only and shows the image before the one
//! being annotated. The working canvas is editable and is written back to the
//! library before every navigation.

use std::path::{Path, PathBuf};

use crate::canvas::{BoxCanvas, CanvasEvent, Input, Mode, Permissions};
use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::link::{propagate_identity, Side};
use crate::state::data::ImageFile;
use crate::state::gallery::Gallery;
use crate::state::import::import_folder;
use crate::state::library::Library;
use crate::state::sync::SyncSummary;

pub struct Workbench {
    settings: Settings,
    /// Where settings are written back; `None` keeps them in memory only
    settings_path: Option<PathBuf>,
    library: Library,
    reference: BoxCanvas,
    working: BoxCanvas,
    reference_gallery: Gallery,
    working_gallery: Gallery,
}

impl Workbench {
    pub fn new(settings: Settings, settings_path: Option<PathBuf>, library: Library) -> Self {
        Self {
            settings,
            settings_path,
            library,
            reference: BoxCanvas::new(Permissions::reference()),
            working: BoxCanvas::new(Permissions::working()),
            reference_gallery: Gallery::new(),
            working_gallery: Gallery::new(),
        }
    }

    /// Open the database named in `settings`
    pub fn open(settings: Settings, settings_path: Option<PathBuf>) -> AppResult<Self> {
        let library = Library::open(&settings.database_path)?;
        Ok(Self::new(settings, settings_path, library))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn canvas(&self, side: Side) -> &BoxCanvas {
        match side {
            Side::Reference => &self.reference,
            Side::Working => &self.working,
        }
    }

    pub fn canvas_mut(&mut self, side: Side) -> &mut BoxCanvas {
        match side {
            Side::Reference => &mut self.reference,
            Side::Working => &mut self.working,
        }
    }

    pub fn gallery(&self, side: Side) -> &Gallery {
        match side {
            Side::Reference => &self.reference_gallery,
            Side::Working => &self.working_gallery,
        }
    }

    /// File on disk of the image shown on `side`
    pub fn current_image_path(&self, side: Side) -> Option<PathBuf> {
        self.gallery(side)
            .current_image_file()
            .map(|image_file| self.settings.image_path(&image_file.path))
    }

    // ========== Database & folders ==========

    /// Save pending work, then switch to another database
    pub fn open_database(&mut self, path: &Path) -> AppResult<()> {
        self.save()?;
        self.library = Library::open(path)?;
        self.reset_views();

        self.settings.database_path = path.to_path_buf();
        self.save_settings()
    }

    /// Replace the settings. A new images root closes the open folder, a new
    /// database path switches databases.
    pub fn apply_settings(&mut self, settings: Settings) -> AppResult<()> {
        if settings.images_root != self.settings.images_root {
            self.save()?;
            self.reset_views();
            self.settings.images_root = settings.images_root;
        }
        if settings.database_path != self.settings.database_path {
            self.open_database(&settings.database_path)?;
        }
        self.save_settings()
    }

    fn save_settings(&self) -> AppResult<()> {
        if let Some(settings_path) = &self.settings_path {
            self.settings.save(settings_path)?;
            log::info!("⚙️  Settings saved to {}", settings_path.display());
        }
        Ok(())
    }

    /// Import `folder` and start annotating its first image.
    /// Returns the number of images in the folder.
    pub fn open_folder(&mut self, folder: &Path) -> AppResult<usize> {
        let image_files = import_folder(&self.library, &self.settings.images_root, folder)?;
        let count = image_files.len();

        if image_files.is_empty() {
            log::warn!("⚠️  No images found in {}", folder.display());
            self.save()?;
            self.reset_views();
            return Ok(0);
        }

        self.reference_gallery.set_image_files(image_files.clone());
        self.working_gallery.set_image_files(image_files);
        self.navigate_working(0)?;
        self.working.set_mode(Mode::Selection);
        Ok(count)
    }

    fn reset_views(&mut self) {
        self.reference_gallery.reset();
        self.working_gallery.reset();
        self.reference.reset();
        self.working.reset();
    }

    // ========== Navigation ==========

    /// Save the working image, then show image `index` on the working canvas
    /// and the one before it on the reference canvas.
    pub fn navigate_working(&mut self, index: i64) -> AppResult<()> {
        self.step(Side::Working, |gallery| gallery.navigate(index))
    }

    /// Show image `index` on the reference canvas. Nothing is saved.
    pub fn navigate_reference(&mut self, index: i64) -> AppResult<()> {
        self.step(Side::Reference, |gallery| gallery.navigate(index))
    }

    pub fn next(&mut self, side: Side) -> AppResult<()> {
        self.step(side, Gallery::next)
    }

    pub fn prev(&mut self, side: Side) -> AppResult<()> {
        self.step(side, Gallery::prev)
    }

    /// Navigate by the 1-based number shown to the user
    pub fn jump(&mut self, side: Side, number: i64) -> AppResult<()> {
        self.step(side, |gallery| gallery.jump(number))
    }

    /// Move the cursor of one gallery and show the image it lands on.
    /// On any failure the cursor goes back and both canvases are left as they were.
    fn step(&mut self, side: Side, go: impl FnOnce(&mut Gallery) -> AppResult<ImageFile>) -> AppResult<()> {
        let gallery = self.gallery_mut(side);
        if gallery.is_empty() {
            return Err(AppError::NoFolderLoaded);
        }
        let previous = gallery.current_index();
        let image_file = go(gallery).map_err(|e| {
            log::warn!("⚠️  {}", e);
            e
        })?;

        if let Err(e) = self.show(side, &image_file) {
            self.gallery_mut(side).restore(previous);
            return Err(e);
        }

        if side == Side::Working {
            let index = self.working_gallery.current_index().unwrap_or(0) as i64;
            self.navigate_reference((index - 1).max(0))?;
        }
        Ok(())
    }

    fn gallery_mut(&mut self, side: Side) -> &mut Gallery {
        match side {
            Side::Reference => &mut self.reference_gallery,
            Side::Working => &mut self.working_gallery,
        }
    }

    /// Load `image_file` into the canvas on `side`, saving the working canvas first
    fn show(&mut self, side: Side, image_file: &ImageFile) -> AppResult<()> {
        let path = self.settings.image_path(&image_file.path);
        let (width, height) = image::image_dimensions(&path).map_err(|e| {
            log::error!("❌ Could not read {}: {}", path.display(), e);
            e
        })?;
        if side == Side::Working {
            self.save()?;
        }
        let boxes = self.library.boxes_by_image(image_file.id)?;
        log::debug!("Loaded {} ({}x{}) with {} boxes", image_file.path, width, height, boxes.len());

        let canvas = self.canvas_mut(side);
        canvas.set_image(width, height, image_file.id);
        canvas.set_boxes(boxes);
        Ok(())
    }

    // ========== Persistence ==========

    /// Write the working canvas to the library and reload it from there
    pub fn save(&mut self) -> AppResult<SyncSummary> {
        // Nothing loaded yet
        if self.working.image_id() <= 0 {
            return Ok(SyncSummary::default());
        }
        let summary = self.library.sync_boxes(self.working.store())?;
        let boxes = self.library.boxes_by_image(self.working.image_id())?;
        self.working.set_boxes(boxes);
        Ok(summary)
    }

    pub fn export_by_person(&self, path: &Path) -> AppResult<()> {
        self.library.export_by_person_to_path(path)
    }

    pub fn export_by_image(&self, path: &Path) -> AppResult<()> {
        self.library.export_by_image_to_path(path)
    }

    // ========== Editing ==========

    /// Switch the working canvas to `mode`
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        self.working.set_mode(mode)
    }

    pub fn toggle_hard(&mut self) {
        self.working.toggle_hard_on_selection();
    }

    /// Route input to one canvas. Returns true when it linked an identity.
    pub fn handle_input(&mut self, side: Side, input: Input) -> bool {
        match self.canvas_mut(side).handle_input(input) {
            Some(CanvasEvent::BoxSelected) => propagate_identity(&mut self.reference, &mut self.working, side),
            None => false,
        }
    }
}
