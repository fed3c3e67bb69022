use cgmath::Vector2;
use iced::widget::image::Handle;
use iced::widget::{
    button, canvas, checkbox, column, container, row, scrollable, slider, text, text_input, Column,
};
use iced::{Alignment, ContentFit, Element, Length, Task, Theme};
use rfd::FileDialog;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod geometry;
mod hook;
mod images;
mod state;
mod ui;

use config::Config;
use geometry::ZoomState;
use hook::{HookSize, HOOK_PAIRS};
use state::data::Pattern;
use state::draft::PatternDraft;
use state::preferences::Preferences;
use state::recommended::{self, RECOMMENDED};
use state::registry::{DateOrder, PatternRegistry, ProgressUpdate};
use state::store::PatternStore;
use state::workspace::{WorkspaceSession, WorkspaceStore};
use ui::canvas::MarkerCanvas;

/// Upper bound of the round/stitch steppers
const COUNTER_MAX: i64 = 999;
const CANVAS_HEIGHT: f32 = 360.0;
const THUMBNAIL_SIZE: f32 = 96.0;
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Main application state
struct CrochetDiary {
    /// User patterns, saved on every change
    registry: PatternRegistry<Preferences>,
    /// Per-entry viewing state, saved when a workspace screen closes
    workspace: WorkspaceStore<Preferences>,
    screen: Screen,
    /// The add-pattern form
    draft: PatternDraft,
    works_order: DateOrder,
    /// Status message to display to the user
    status: String,
}

enum Screen {
    Library,
    Works,
    AddPattern,
    /// Progress stored on the pattern record itself
    Diagram {
        id: Uuid,
        zoom: ZoomState,
        image: Handle,
        image_size: Vector2<f64>,
    },
    /// Progress stored in the workspace map
    Workspace(WorkspaceScreen),
}

struct WorkspaceScreen {
    title: String,
    session: WorkspaceSession,
    /// Picture per slot; built-in entries have none on disk
    images: Vec<Option<Handle>>,
    image_sizes: Vec<Vector2<f64>>,
    zooms: Vec<ZoomState>,
}

impl WorkspaceScreen {
    fn new(title: String, session: WorkspaceSession, images: Vec<Option<Vec<u8>>>) -> Self {
        let image_sizes = images
            .iter()
            .map(|bytes| bytes.as_deref().map(image_size).unwrap_or(SQUARE))
            .collect();
        let zooms = vec![ZoomState::default(); images.len()];
        Self {
            title,
            session,
            images: images
                .into_iter()
                .map(|bytes| bytes.map(Handle::from_bytes))
                .collect(),
            image_sizes,
            zooms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WorkspaceSource {
    Recommended(&'static str),
    User(Uuid),
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    ShowLibrary,
    ShowWorks,
    ShowAddPattern,
    OpenDiagram(Uuid),
    OpenWorkspace(WorkspaceSource),
    CloseWorkspace,

    // Add-pattern form
    NameChanged(String),
    YarnChanged(String),
    NotesChanged(String),
    HookIndexChanged(u8),
    InWorksToggled(bool),
    StarToggled,
    PickMainImage,
    MainImageLoaded(Result<Vec<u8>, String>),
    PickStitchImages,
    StitchImagesLoaded(Vec<Vec<u8>>),
    ClearStitchImages,
    SavePattern,

    // Progress on the open diagram or workspace
    RoundChanged(i64),
    StitchChanged(i64),
    ResetProgress,
    MarkerDropped { index: usize, x: f64, y: f64 },
    Panned { index: usize, translation: Vector2<f64> },
    PanEnded(usize),
    Zoomed { index: usize, factor: f64 },
    CycleZoom(usize),

    // Works gallery
    SortWorks(DateOrder),
    ToggleStar(Uuid),
    DeletePattern(Uuid),
}

const SQUARE: Vector2<f64> = Vector2 { x: 1.0, y: 1.0 };

/// Pixel size of an encoded image; undecodable data is drawn as a square
fn image_size(bytes: &[u8]) -> Vector2<f64> {
    match images::dimensions(bytes) {
        Ok((w, h)) => Vector2::new(w as f64, h as f64),
        Err(e) => {
            warn!(error = %e, "could not read image dimensions");
            SQUARE
        }
    }
}

impl CrochetDiary {
    fn new(
        registry: PatternRegistry<Preferences>,
        workspace: WorkspaceStore<Preferences>,
    ) -> (Self, Task<Message>) {
        let count = registry.patterns().len();
        info!(patterns = count, "crochet diary initialized");

        (
            CrochetDiary {
                registry,
                workspace,
                screen: Screen::Library,
                draft: PatternDraft::default(),
                works_order: DateOrder::default(),
                status: format!("{count} patterns in your diary."),
            },
            Task::none(),
        )
    }

    /// Switch screens, saving the workspace session being left (if any)
    fn navigate(&mut self, next: Screen) {
        let previous = std::mem::replace(&mut self.screen, next);
        if let Screen::Workspace(mut screen) = previous {
            screen.session.commit(&self.workspace);
        }
    }

    fn open_workspace(&self, source: WorkspaceSource) -> Option<WorkspaceScreen> {
        match source {
            WorkspaceSource::Recommended(key) => {
                let entry = recommended::find(key)?;
                let count = entry.image_count();
                Some(WorkspaceScreen::new(
                    entry.name.to_string(),
                    self.workspace.open_session(entry.id, count),
                    vec![None; count],
                ))
            }
            WorkspaceSource::User(id) => {
                let pattern = self.registry.get(id)?;
                let images: Vec<Option<Vec<u8>>> = std::iter::once(&pattern.image_data)
                    .chain(pattern.stitch_images.iter())
                    .map(|bytes| Some(bytes.clone()))
                    .collect();
                Some(WorkspaceScreen::new(
                    pattern.name.clone(),
                    self.workspace
                        .open_session(pattern.workspace_key(), pattern.image_count()),
                    images,
                ))
            }
        }
    }

    fn zoom_mut(&mut self, index: usize) -> Option<&mut ZoomState> {
        match &mut self.screen {
            Screen::Diagram { zoom, .. } if index == 0 => Some(zoom),
            Screen::Workspace(screen) => screen.zooms.get_mut(index),
            _ => None,
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ShowLibrary | Message::CloseWorkspace => self.navigate(Screen::Library),
            Message::ShowWorks => self.navigate(Screen::Works),
            Message::ShowAddPattern => self.navigate(Screen::AddPattern),
            Message::OpenDiagram(id) => {
                if let Some(pattern) = self.registry.get(id) {
                    let image_size = image_size(&pattern.image_data);
                    let image = Handle::from_bytes(pattern.image_data.clone());
                    self.navigate(Screen::Diagram {
                        id,
                        zoom: ZoomState::default(),
                        image,
                        image_size,
                    });
                }
            }
            Message::OpenWorkspace(source) => {
                if let Some(screen) = self.open_workspace(source) {
                    self.navigate(Screen::Workspace(screen));
                }
            }

            Message::NameChanged(name) => self.draft.name = name,
            Message::YarnChanged(yarn) => self.draft.yarn = yarn,
            Message::NotesChanged(notes) => self.draft.notes = notes,
            Message::HookIndexChanged(index) => self.draft.set_hook_index(index as usize),
            Message::InWorksToggled(in_works) => self.draft.is_in_works = in_works,
            Message::StarToggled => self.draft.is_starred = !self.draft.is_starred,
            Message::PickMainImage => {
                let picked = FileDialog::new()
                    .set_title("Select Finished Work Photo")
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_file();

                if let Some(path) = picked {
                    // Read off the UI thread
                    return Task::perform(
                        async move { images::load_image(path).await.map_err(|e| e.to_string()) },
                        Message::MainImageLoaded,
                    );
                }
            }
            Message::MainImageLoaded(Ok(bytes)) => self.draft.image_data = Some(bytes),
            Message::MainImageLoaded(Err(e)) => {
                warn!(error = %e, "main image not loaded");
                self.status = format!("Could not load image: {e}");
            }
            Message::PickStitchImages => {
                let picked = FileDialog::new()
                    .set_title("Select Stitch / Diagram Images")
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_files();

                if let Some(paths) = picked {
                    return Task::perform(
                        images::load_images_in_order(paths),
                        Message::StitchImagesLoaded,
                    );
                }
            }
            Message::StitchImagesLoaded(loaded) => self.draft.append_stitch_images(loaded),
            Message::ClearStitchImages => self.draft.stitch_images.clear(),
            Message::SavePattern => match self.registry.create(&self.draft) {
                Ok(id) => {
                    info!(%id, "pattern created");
                    self.status = format!("Saved \"{}\".", self.draft.name.trim());
                    self.draft.reset();
                }
                Err(e) => self.status = e.to_string(),
            },

            Message::RoundChanged(round) => match &mut self.screen {
                Screen::Diagram { id, .. } => {
                    self.registry.update_progress(*id, ProgressUpdate::round(round));
                }
                Screen::Workspace(screen) => screen.session.state_mut().set_round(round),
                _ => {}
            },
            Message::StitchChanged(stitch) => match &mut self.screen {
                Screen::Diagram { id, .. } => {
                    self.registry.update_progress(*id, ProgressUpdate::stitch(stitch));
                }
                Screen::Workspace(screen) => screen.session.state_mut().set_stitch(stitch),
                _ => {}
            },
            Message::ResetProgress => match &mut self.screen {
                Screen::Diagram { id, zoom, .. } => {
                    self.registry.reset_progress(*id);
                    zoom.reset();
                }
                Screen::Workspace(screen) => {
                    screen.session.reset(&self.workspace);
                    screen.zooms.iter_mut().for_each(ZoomState::reset);
                }
                _ => {}
            },
            Message::MarkerDropped { index, x, y } => match &mut self.screen {
                Screen::Diagram { id, .. } if index == 0 => {
                    self.registry.update_progress(*id, ProgressUpdate::marker(x, y));
                }
                Screen::Workspace(screen) => screen.session.state_mut().set_marker(index, x, y),
                _ => {}
            },
            Message::Panned { index, translation } => {
                if let Some(zoom) = self.zoom_mut(index) {
                    zoom.pan_changed(translation);
                }
            }
            Message::PanEnded(index) => {
                if let Some(zoom) = self.zoom_mut(index) {
                    zoom.pan_ended();
                }
            }
            Message::Zoomed { index, factor } => {
                if let Some(zoom) = self.zoom_mut(index) {
                    zoom.zoom_by(factor);
                }
            }
            Message::CycleZoom(index) => {
                if let Some(zoom) = self.zoom_mut(index) {
                    zoom.cycle_step();
                }
            }

            Message::SortWorks(order) => self.works_order = order,
            Message::ToggleStar(id) => {
                self.registry.toggle_star(id);
            }
            Message::DeletePattern(id) => {
                if self.registry.delete_by_id(id) {
                    info!(%id, "pattern deleted");
                    if matches!(self.screen, Screen::Diagram { id: open, .. } if open == id) {
                        self.navigate(Screen::Works);
                    }
                }
            }
        }

        Task::none()
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let nav = row![
            button("Pattern Library").on_press(Message::ShowLibrary),
            button("My Works").on_press(Message::ShowWorks),
            button("Add Pattern").on_press(Message::ShowAddPattern),
        ]
        .spacing(10);

        let body = match &self.screen {
            Screen::Library => self.library_view(),
            Screen::Works => self.works_view(),
            Screen::AddPattern => self.add_pattern_view(),
            Screen::Diagram {
                id,
                zoom,
                image,
                image_size,
            } => match self.registry.get(*id) {
                Some(pattern) => diagram_view(pattern, zoom, image, *image_size),
                None => text("This pattern no longer exists.").into(),
            },
            Screen::Workspace(screen) => workspace_view(screen),
        };

        let content: Column<Message> = column![
            nav,
            scrollable(body).height(Length::Fill),
            text(&self.status).size(14),
        ]
        .spacing(16)
        .padding(20);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn library_view(&self) -> Element<Message> {
        let mut recommended = Column::new().spacing(8);
        for entry in &RECOMMENDED {
            recommended = recommended.push(
                row![
                    text(entry.name).width(Length::Fixed(140.0)),
                    text(hook_label(entry.hook())).width(Length::Fixed(130.0)),
                    text(entry.yarn).width(Length::Fill),
                    button("Open").on_press(Message::OpenWorkspace(WorkspaceSource::Recommended(
                        entry.id
                    ))),
                ]
                .spacing(10)
                .align_y(Alignment::Center),
            );
        }

        let mut collection = Column::new().spacing(10);
        let mut empty = true;
        for pattern in self.registry.collection() {
            empty = false;
            collection = collection.push(
                row![
                    thumbnail(&pattern.image_data),
                    column![
                        text(title_of(pattern)).size(18),
                        text(format!(
                            "Round {} · Stitch {}",
                            pattern.current_round, pattern.current_stitch
                        ))
                        .size(14),
                    ]
                    .spacing(4)
                    .width(Length::Fill),
                    button("Diagram").on_press(Message::OpenDiagram(pattern.id)),
                    button("Workspace")
                        .on_press(Message::OpenWorkspace(WorkspaceSource::User(pattern.id))),
                ]
                .spacing(12)
                .align_y(Alignment::Center),
            );
        }

        let collection: Element<Message> = if empty {
            text("No images have been collected yet.").size(14).into()
        } else {
            collection.into()
        };

        column![
            text("Recommended").size(28),
            recommended,
            text("My Collection").size(28),
            collection,
        ]
        .spacing(14)
        .into()
    }

    fn works_view(&self) -> Element<Message> {
        let sort = row![
            text("Sort by date:"),
            button("Earliest → Latest").on_press_maybe(
                (self.works_order != DateOrder::EarliestFirst)
                    .then_some(Message::SortWorks(DateOrder::EarliestFirst))
            ),
            button("Latest → Earliest").on_press_maybe(
                (self.works_order != DateOrder::LatestFirst)
                    .then_some(Message::SortWorks(DateOrder::LatestFirst))
            ),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let works = self.registry.works_sorted(self.works_order);
        let list: Element<Message> = if works.is_empty() {
            text("No finished works yet.").into()
        } else {
            let mut list = Column::new().spacing(10);
            for pattern in works {
                let started = pattern
                    .start_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "No start date".to_string());
                list = list.push(
                    row![
                        thumbnail(&pattern.image_data),
                        column![
                            text(title_of(pattern)).size(18),
                            text(started).size(14),
                            text(&pattern.notes).size(14),
                        ]
                        .spacing(4)
                        .width(Length::Fill),
                        button(if pattern.is_starred { "★" } else { "☆" })
                            .on_press(Message::ToggleStar(pattern.id)),
                        button("Diagram").on_press(Message::OpenDiagram(pattern.id)),
                        button("Delete").on_press(Message::DeletePattern(pattern.id)),
                    ]
                    .spacing(12)
                    .align_y(Alignment::Center),
                );
            }
            list.into()
        };

        column![text("My Crochet Gallery").size(28), sort, list]
            .spacing(14)
            .into()
    }

    fn add_pattern_view(&self) -> Element<Message> {
        let draft = &self.draft;
        let hook: HookSize = draft.hook();

        let main_image: Element<Message> = match &draft.image_data {
            Some(bytes) => thumbnail(bytes),
            None => text("No finished work photo selected yet.").size(14).into(),
        };

        let mut stitch_row = row![].spacing(8);
        for bytes in &draft.stitch_images {
            stitch_row = stitch_row.push(thumbnail(bytes));
        }

        column![
            text("Add Pattern").size(28),
            row![
                text_input("Pattern name", &draft.name).on_input(Message::NameChanged),
                button(if draft.is_starred { "★" } else { "☆" }).on_press(Message::StarToggled),
            ]
            .spacing(10),
            row![
                text(format!("Hook size {}", hook.mm_label())),
                text(format!("Hook No. {}", hook.number_label())),
            ]
            .spacing(20),
            slider(
                0..=(HOOK_PAIRS.len() - 1) as u8,
                draft.hook_index as u8,
                Message::HookIndexChanged
            ),
            text_input("Yarn description", &draft.yarn).on_input(Message::YarnChanged),
            text("Finished work photo"),
            main_image,
            button("Choose photo…").on_press(Message::PickMainImage),
            text("Stitch / diagram images (optional)"),
            scrollable(stitch_row).direction(scrollable::Direction::Horizontal(
                scrollable::Scrollbar::default()
            )),
            row![
                button("Add images…").on_press(Message::PickStitchImages),
                button("Clear images").on_press_maybe(
                    (!draft.stitch_images.is_empty()).then_some(Message::ClearStitchImages)
                ),
            ]
            .spacing(10),
            checkbox("Add to my works (shown only in the gallery)", draft.is_in_works)
                .on_toggle(Message::InWorksToggled),
            text_input("Notes", &draft.notes).on_input(Message::NotesChanged),
            button("Save Pattern").on_press(Message::SavePattern),
        ]
        .spacing(12)
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

/// "2.5 mm · No. 4"
fn hook_label(hook: HookSize) -> String {
    format!("{} · No. {}", hook.mm_label(), hook.number_label())
}

fn title_of(pattern: &Pattern) -> String {
    if pattern.is_starred {
        format!("★ {}", pattern.name)
    } else {
        pattern.name.clone()
    }
}

fn thumbnail<'a>(bytes: &[u8]) -> Element<'a, Message> {
    iced::widget::image(Handle::from_bytes(bytes.to_vec()))
        .width(Length::Fixed(THUMBNAIL_SIZE))
        .height(Length::Fixed(THUMBNAIL_SIZE))
        .content_fit(ContentFit::Cover)
        .into()
}

/// Zoomable picture with its marker, plus the zoom button
fn image_area<'a>(program: MarkerCanvas) -> Element<'a, Message> {
    let index = program.index;
    let area = canvas(program)
        .width(Length::Fill)
        .height(Length::Fixed(CANVAS_HEIGHT));

    column![area, button("Zoom").on_press(Message::CycleZoom(index))]
        .spacing(6)
        .align_x(Alignment::End)
        .into()
}

fn counter<'a>(label: &'a str, value: u32, on_change: fn(i64) -> Message) -> Element<'a, Message> {
    let value = value as i64;
    row![
        text(label),
        button("-").on_press_maybe((value > 0).then(|| on_change(value - 1))),
        text(value.to_string()).width(Length::Fixed(36.0)),
        button("+").on_press_maybe((value < COUNTER_MAX).then(|| on_change(value + 1))),
    ]
    .spacing(8)
    .align_y(Alignment::Center)
    .into()
}

fn progress_bar<'a>(round: u32, stitch: u32) -> Element<'a, Message> {
    row![
        counter("Round", round, Message::RoundChanged),
        counter("Stitch", stitch, Message::StitchChanged),
        button("Reset").on_press(Message::ResetProgress),
    ]
    .spacing(24)
    .align_y(Alignment::Center)
    .into()
}

fn diagram_view<'a>(
    pattern: &'a Pattern,
    zoom: &ZoomState,
    image: &Handle,
    image_size: Vector2<f64>,
) -> Element<'a, Message> {
    let program = MarkerCanvas {
        index: 0,
        image: Some(image.clone()),
        image_size,
        marker: Vector2::new(pattern.marker_x_ratio, pattern.marker_y_ratio),
        transform: zoom.transform,
    };

    column![
        text(&pattern.name).size(28),
        image_area(program),
        progress_bar(pattern.current_round, pattern.current_stitch),
    ]
    .spacing(14)
    .into()
}

fn workspace_view(screen: &WorkspaceScreen) -> Element<Message> {
    let state = screen.session.state();
    let mut images = Column::new().spacing(16);
    for index in 0..screen.session.image_count() {
        let marker = state.marker(index);
        let program = MarkerCanvas {
            index,
            image: screen.images.get(index).cloned().flatten(),
            image_size: screen.image_sizes.get(index).copied().unwrap_or(SQUARE),
            marker: Vector2::new(marker.x, marker.y),
            transform: screen
                .zooms
                .get(index)
                .map(|zoom| zoom.transform)
                .unwrap_or_default(),
        };
        images = images.push(image_area(program));
    }

    column![
        row![
            text(&screen.title).size(28).width(Length::Fill),
            button("Close").on_press(Message::CloseWorkspace),
        ]
        .align_y(Alignment::Center),
        images,
        progress_bar(state.round, state.stitch),
    ]
    .spacing(14)
    .into()
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|e| {
        eprintln!("invalid log filter {filter:?}: {e}");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> iced::Result {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("crochet-diary: {e}");
            std::process::exit(1);
        }
    };
    init_logging(&config.log_filter);

    // Two connections to the same file: one per persisted slot owner
    let open = || Preferences::open(&config.db_path());
    let (patterns_prefs, workspace_prefs) = match (open(), open()) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, path = %config.db_path().display(), "cannot open preferences");
            std::process::exit(1);
        }
    };

    let registry = PatternRegistry::open(PatternStore::new(patterns_prefs));
    let workspace = WorkspaceStore::new(workspace_prefs);

    iced::application("Crochet Diary", CrochetDiary::update, CrochetDiary::view)
        .theme(CrochetDiary::theme)
        .centered()
        .run_with(move || CrochetDiary::new(registry, workspace))
}
