use iced::keyboard::{self, key, Key, Modifiers};
use iced::widget::{button, column, container, row, text, text_input, Column};
use iced::widget::image::Handle;
use iced::{window, Element, Length, Size, Subscription, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;

mod canvas;
mod config;
mod error;
mod geometry;
mod link;
mod state;
mod ui;
mod workbench;

use canvas::{Input, Mode};
use config::Settings;
use link::Side;
use workbench::Workbench;

/// Main application state
struct Annotator {
    workbench: Workbench,
    /// Image shown on each side, keyed by its file so it is decoded once
    reference_image: Option<(PathBuf, Handle)>,
    working_image: Option<(PathBuf, Handle)>,
    /// Contents of the jump field under each canvas
    reference_jump: String,
    working_jump: String,
    /// Settings being edited, while the editor is open
    editing: Option<SettingsDraft>,
    /// Status message to display to the user
    status: String,
}

/// Text of the settings editor fields
#[derive(Debug, Clone, Default)]
struct SettingsDraft {
    images_root: String,
    database_path: String,
}

impl SettingsDraft {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            images_root: settings.images_root.display().to_string(),
            database_path: settings.database_path.display().to_string(),
        }
    }

    fn to_settings(&self) -> Settings {
        Settings {
            images_root: PathBuf::from(self.images_root.trim()),
            database_path: PathBuf::from(self.database_path.trim()),
        }
    }
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    OpenFolder,
    OpenDatabase,
    Save,
    ExportByPerson,
    ExportByImage,
    SetMode(Mode),
    Prev(Side),
    Next(Side),
    JumpInput(Side, String),
    Jump(Side),
    ToggleSettings,
    ImagesRootInput(String),
    DatabasePathInput(String),
    BrowseImagesRoot,
    ApplySettings,
    ToggleHard,
    /// Mouse input from one of the canvases, with the widget's current size
    Canvas { side: Side, input: Input, size: Size },
    /// Keyboard input for the working canvas
    CanvasKey(canvas::Key),
    /// Escape cancels gestures on both canvases
    Escape,
    CloseRequested(window::Id),
}

impl Annotator {
    fn new() -> (Self, Task<Message>) {
        let settings_path = Settings::default_path();
        let settings = Settings::load(&settings_path).unwrap_or_else(|e| {
            log::warn!("⚠️  Could not read settings: {}, using defaults", e);
            Settings::default()
        });

        // The app cannot function without its database
        let workbench = Workbench::open(settings, Some(settings_path))
            .expect("Failed to open annotation database. Check permissions and disk space.");

        let image_count = workbench.library().image_count().unwrap_or(0);
        log::info!("🎨 Person annotator initialized with {} images", image_count);

        (
            Annotator {
                workbench,
                reference_image: None,
                working_image: None,
                reference_jump: String::new(),
                working_jump: String::new(),
                editing: None,
                status: format!("Ready. {} images in database.", image_count),
            },
            Task::none(),
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenFolder => {
                let folder = FileDialog::new()
                    .set_title("Select Image Folder")
                    .set_directory(&self.workbench.settings().images_root)
                    .pick_folder();
                if let Some(folder) = folder {
                    self.status = match self.workbench.open_folder(&folder) {
                        Ok(count) => format!("Opened {} ({} images)", folder.display(), count),
                        Err(e) => format!("❌ {}", e),
                    };
                }
            }
            Message::OpenDatabase => {
                let file = FileDialog::new()
                    .set_title("Open Annotation Database")
                    .add_filter("SQLite database", &["sqlite", "db"])
                    .pick_file();
                if let Some(file) = file {
                    self.status = match self.workbench.open_database(&file) {
                        Ok(()) => format!("Database: {}", self.workbench.library().path().display()),
                        Err(e) => format!("❌ {}", e),
                    };
                }
            }
            Message::Save => {
                self.status = match self.workbench.save() {
                    Ok(summary) => format!(
                        "✅ Saved: {} new, {} updated, {} removed",
                        summary.inserted, summary.updated, summary.removed
                    ),
                    Err(e) => format!("❌ Save failed: {}", e),
                };
            }
            Message::ExportByPerson => self.export("by_person.txt", Workbench::export_by_person),
            Message::ExportByImage => self.export("by_image.txt", Workbench::export_by_image),
            Message::SetMode(mode) => {
                self.workbench.set_mode(mode);
            }
            Message::Prev(side) => self.report(|wb| wb.prev(side)),
            Message::Next(side) => self.report(|wb| wb.next(side)),
            Message::JumpInput(side, value) => *self.jump_field(side) = value,
            Message::Jump(side) => {
                let value = std::mem::take(self.jump_field(side));
                match value.trim().parse::<i64>() {
                    Ok(number) => self.report(|wb| wb.jump(side, number)),
                    Err(_) => self.status = format!("❌ Not an image number: {}", value),
                }
            }
            Message::ToggleSettings => {
                self.editing = match self.editing {
                    Some(_) => None,
                    None => Some(SettingsDraft::from_settings(self.workbench.settings())),
                };
            }
            Message::ImagesRootInput(value) => {
                if let Some(draft) = &mut self.editing {
                    draft.images_root = value;
                }
            }
            Message::DatabasePathInput(value) => {
                if let Some(draft) = &mut self.editing {
                    draft.database_path = value;
                }
            }
            Message::BrowseImagesRoot => {
                let folder = FileDialog::new().set_title("Select Images Root").pick_folder();
                if let (Some(folder), Some(draft)) = (folder, &mut self.editing) {
                    draft.images_root = folder.display().to_string();
                }
            }
            Message::ApplySettings => {
                if let Some(draft) = self.editing.take() {
                    self.status = match self.workbench.apply_settings(draft.to_settings()) {
                        Ok(()) => String::from("⚙️  Settings saved"),
                        Err(e) => {
                            self.editing = Some(draft);
                            format!("❌ {}", e)
                        }
                    };
                }
            }
            Message::ToggleHard => self.workbench.toggle_hard(),
            Message::Canvas { side, input, size } => {
                self.workbench
                    .canvas_mut(side)
                    .set_view_size(size.width as f64, size.height as f64);
                if self.workbench.handle_input(side, input) {
                    self.status = String::from("🔗 Identity linked");
                }
            }
            Message::CanvasKey(key) => {
                self.workbench.handle_input(Side::Working, Input::Key(key));
            }
            Message::Escape => {
                for side in [Side::Reference, Side::Working] {
                    self.workbench.handle_input(side, Input::Key(canvas::Key::Escape));
                }
            }
            Message::CloseRequested(id) => {
                if let Err(e) = self.workbench.save() {
                    log::error!("❌ Save on close failed: {}", e);
                }
                return window::close(id);
            }
        }

        self.refresh_images();
        Task::none()
    }

    fn export(&mut self, file_name: &str, export: fn(&Workbench, &std::path::Path) -> error::AppResult<()>) {
        let Some(path) = FileDialog::new()
            .set_title("Export Annotations")
            .set_file_name(file_name)
            .save_file()
        else {
            return;
        };
        self.status = match export(&self.workbench, &path) {
            Ok(()) => format!("📝 Exported to {}", path.display()),
            Err(e) => format!("❌ Export failed: {}", e),
        };
    }

    fn report(&mut self, navigate: impl FnOnce(&mut Workbench) -> error::AppResult<()>) {
        if let Err(e) = navigate(&mut self.workbench) {
            self.status = format!("❌ {}", e);
        }
    }

    fn jump_field(&mut self, side: Side) -> &mut String {
        match side {
            Side::Reference => &mut self.reference_jump,
            Side::Working => &mut self.working_jump,
        }
    }

    /// Reload image handles whose file changed
    fn refresh_images(&mut self) {
        for side in [Side::Reference, Side::Working] {
            let path = self.workbench.current_image_path(side);
            let slot = match side {
                Side::Reference => &mut self.reference_image,
                Side::Working => &mut self.working_image,
            };
            if slot.as_ref().map(|(p, _)| p) != path.as_ref() {
                *slot = path.map(|p| (p.clone(), Handle::from_path(p)));
            }
        }
    }

    fn view(&self) -> Element<Message> {
        let mode = self.workbench.canvas(Side::Working).mode();
        let mode_button = |label: &'static str, target: Mode| {
            button(text(label))
                .on_press_maybe((mode != target).then_some(Message::SetMode(target)))
                .padding(8)
        };

        let toolbar = row![
            button("Open Folder").on_press(Message::OpenFolder).padding(8),
            button("Open Database").on_press(Message::OpenDatabase).padding(8),
            button("Save").on_press(Message::Save).padding(8),
            button("Export by Person").on_press(Message::ExportByPerson).padding(8),
            button("Export by Image").on_press(Message::ExportByImage).padding(8),
            mode_button("Select (S)", Mode::Selection),
            mode_button("Head/Foot (A)", Mode::AnnotateByHeadFoot),
            mode_button("Drag (D)", Mode::AnnotateByDragDrop),
            button("Hard (Z)").on_press(Message::ToggleHard).padding(8),
            button("Settings").on_press(Message::ToggleSettings).padding(8),
        ]
        .spacing(8);

        let canvases = row![
            self.canvas_panel(Side::Reference, "Reference", &self.reference_image),
            self.canvas_panel(Side::Working, "Working", &self.working_image),
        ]
        .spacing(8)
        .height(Length::Fill);

        let mut content: Column<Message> = column![toolbar].spacing(8).padding(8);
        if let Some(draft) = &self.editing {
            content = content.push(settings_editor(draft));
        }
        let content = content.push(canvases).push(text(&self.status).size(14));

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn canvas_panel<'a>(
        &'a self,
        side: Side,
        title: &str,
        image: &'a Option<(PathBuf, Handle)>,
    ) -> Element<'a, Message> {
        let gallery = self.workbench.gallery(side);
        let caption = match gallery.current_image_file() {
            Some(image_file) => format!("{}  {}  {}", title, gallery.position_label(), image_file.path),
            None => title.to_string(),
        };
        let (prev, next) = match side {
            Side::Reference => ("◀ Prev", "Next ▶"),
            Side::Working => ("◀ Prev (Q)", "Next (W) ▶"),
        };
        let jump = match side {
            Side::Reference => &self.reference_jump,
            Side::Working => &self.working_jump,
        };
        let navigation = row![
            button(prev).on_press(Message::Prev(side)).padding(6),
            button(next).on_press(Message::Next(side)).padding(6),
            text_input("Go to #", jump)
                .on_input(move |value| Message::JumpInput(side, value))
                .on_submit(Message::Jump(side))
                .width(Length::Fixed(90.0)),
        ]
        .spacing(6);
        let program = ui::canvas::CanvasView {
            side,
            canvas: self.workbench.canvas(side),
            image: image.as_ref().map(|(_, handle)| handle),
        };

        column![
            text(caption).size(14),
            navigation,
            iced::widget::canvas(program).width(Length::Fill).height(Length::Fill),
        ]
        .spacing(4)
        .width(Length::FillPortion(1))
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            keyboard::on_key_press(shortcut),
            window::close_requests().map(Message::CloseRequested),
        ])
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn settings_editor(draft: &SettingsDraft) -> Element<'_, Message> {
    column![
        row![
            text("Images root").width(Length::Fixed(110.0)),
            text_input("/path/to/images", &draft.images_root)
                .on_input(Message::ImagesRootInput)
                .width(Length::Fill),
            button("Browse").on_press(Message::BrowseImagesRoot).padding(6),
        ]
        .spacing(8),
        row![
            text("Database").width(Length::Fixed(110.0)),
            text_input("/path/to/annotation.sqlite", &draft.database_path)
                .on_input(Message::DatabasePathInput)
                .on_submit(Message::ApplySettings)
                .width(Length::Fill),
        ]
        .spacing(8),
        row![
            button("Apply").on_press(Message::ApplySettings).padding(6),
            button("Cancel").on_press(Message::ToggleSettings).padding(6),
        ]
        .spacing(8),
    ]
    .spacing(6)
    .into()
}

/// Keyboard shortcuts
fn shortcut(key: Key, modifiers: Modifiers) -> Option<Message> {
    match key.as_ref() {
        Key::Character("s") if modifiers.command() => Some(Message::Save),
        Key::Character("s") => Some(Message::SetMode(Mode::Selection)),
        Key::Character("a") => Some(Message::SetMode(Mode::AnnotateByHeadFoot)),
        Key::Character("d") => Some(Message::SetMode(Mode::AnnotateByDragDrop)),
        Key::Character("q") => Some(Message::Prev(Side::Working)),
        Key::Character("w") => Some(Message::Next(Side::Working)),
        Key::Character("z") => Some(Message::ToggleHard),
        Key::Named(key::Named::ArrowLeft) => Some(Message::CanvasKey(canvas::Key::Left)),
        Key::Named(key::Named::ArrowRight) => Some(Message::CanvasKey(canvas::Key::Right)),
        Key::Named(key::Named::ArrowUp) => Some(Message::CanvasKey(canvas::Key::Up)),
        Key::Named(key::Named::ArrowDown) => Some(Message::CanvasKey(canvas::Key::Down)),
        Key::Named(key::Named::Delete | key::Named::Backspace) => {
            Some(Message::CanvasKey(canvas::Key::Delete))
        }
        Key::Named(key::Named::Escape) => Some(Message::Escape),
        _ => None,
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application("Person Annotator", Annotator::update, Annotator::view)
        .subscription(Annotator::subscription)
        .theme(Annotator::theme)
        .window(window::Settings {
            size: Size::new(1600.0, 900.0),
            position: window::Position::Centered,
            exit_on_close_request: false,
            ..window::Settings::default()
        })
        .run_with(Annotator::new)
}
