use iced::widget::canvas::Canvas;
use iced::widget::scrollable::{self, Scrollbar};
use iced::widget::{button, column, container, pick_list, row, text, text_input, Row};
use iced::futures::future::BoxFuture;
use iced::{Alignment, Element, Length, Point, Task, Theme, Vector};
use std::convert::identity;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod dialogs;
mod error;
mod export;
mod state;
mod ui;

use config::Settings;
use dialogs::{Dialogs, FileKind, NativeDialogs};
use export::{photo, raster};
use state::data::PaperSize;
use state::planner::{coerce_param, ControlsTicket, Planner};
use state::wall::WallKey;
use ui::canvas::{WallCanvas, TILE_HINT};
use ui::photos::PhotoCache;

/// Main application state
struct WallPlanner {
    /// Walls, tiles, parameters and drag state
    planner: Planner,
    /// Decoded tile photos for drawing
    photos: PhotoCache,
    /// File pickers and alerts
    dialogs: Arc<dyn Dialogs>,
    settings: Settings,
    /// Raw text of the scale and grid inputs
    scale_input: String,
    grid_input: String,
    /// Status message to display to the user
    status: String,
    /// Pointer is over a tile; the status line shows the usage hint
    hovering_tile: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    WallSelected(WallKey),
    ScaleChanged(String),
    GridChanged(String),
    AddTile(PaperSize),

    /// Left press on a tile at `offset` from its corner
    TilePressed { id: String, offset: Vector },
    /// Pointer moved during a drag, relative to the wall origin
    DragMoved(Point),
    DragEnded,
    /// Controls timeout elapsed for one drag
    HideControls(ControlsTicket),
    /// Pointer entered (`true`) or left a tile
    TileHovered(bool),

    RotateTile(String),
    DeleteTile(String),
    /// Double press on a tile
    PickPhoto(String),
    PhotoPicked(String, Option<Vec<u8>>),

    ExportPng,
    /// Rasterization finished; carries the file name to save under
    PngRendered(String, Result<Vec<u8>, String>),
    ExportLayout,
    ImportLayout,
    LayoutPicked(Option<Vec<u8>>),
    /// Save dialog finished
    Saved(Result<Option<PathBuf>, String>),
}

impl WallPlanner {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings = config::load();
        let planner = Planner::new(&settings);
        (
            Self::with_parts(settings, planner, Arc::new(NativeDialogs)),
            Task::none(),
        )
    }

    fn with_parts(settings: Settings, planner: Planner, dialogs: Arc<dyn Dialogs>) -> Self {
        let mut app = WallPlanner {
            scale_input: planner.scale().to_string(),
            grid_input: planner.grid_cm().to_string(),
            status: format!("Ready. {} tiles on {}.", planner.tiles().len(), planner.wall()),
            planner,
            photos: PhotoCache::default(),
            dialogs,
            settings,
            hovering_tile: false,
        };
        app.photos.sync(app.planner.tiles());
        app
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::WallSelected(wall) => {
                self.planner.select_wall(wall);
                self.photos.sync(self.planner.tiles());
                self.status = format!("{} loaded with {} tiles.", wall, self.planner.tiles().len());
                Task::none()
            }
            Message::ScaleChanged(input) => {
                self.planner.set_scale(coerce_param(&input));
                self.scale_input = input;
                Task::none()
            }
            Message::GridChanged(input) => {
                self.planner.set_grid_cm(coerce_param(&input));
                self.grid_input = input;
                Task::none()
            }
            Message::AddTile(size) => {
                self.planner.add_tile(size);
                Task::none()
            }

            Message::TilePressed { id, offset } => match self.planner.begin_drag(&id, offset) {
                Ok(ticket) => {
                    let timeout = self.settings.controls_timeout();
                    Task::perform(hide_controls_after(ticket, timeout), identity)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "drag on missing tile");
                    Task::none()
                }
            },
            Message::DragMoved(position) => {
                self.planner.drag_to(position);
                Task::none()
            }
            Message::DragEnded => {
                self.planner.end_drag();
                Task::none()
            }
            Message::HideControls(ticket) => {
                self.planner.hide_controls(&ticket);
                Task::none()
            }
            Message::TileHovered(over) => {
                self.hovering_tile = over;
                Task::none()
            }

            Message::RotateTile(id) => {
                if let Err(e) = self.planner.rotate(&id) {
                    tracing::warn!(error = %e, "rotate failed");
                }
                Task::none()
            }
            Message::DeleteTile(id) => {
                match self.planner.delete(&id) {
                    Ok(tile) => tracing::debug!(id = %tile.id, "tile deleted"),
                    Err(e) => tracing::warn!(error = %e, "delete failed"),
                }
                self.photos.sync(self.planner.tiles());
                Task::none()
            }
            Message::PickPhoto(id) => {
                self.planner.end_drag();
                Task::perform(
                    photo_picked(id, self.dialogs.open(FileKind::Image)),
                    identity,
                )
            }
            Message::PhotoPicked(_, None) => Task::none(),
            Message::PhotoPicked(id, Some(bytes)) => {
                let attached = photo::to_data_url(&bytes)
                    .and_then(|url| self.planner.attach_photo(&id, url));
                match attached {
                    Ok(()) => {
                        self.photos.sync(self.planner.tiles());
                        self.status = "Photo attached.".to_string();
                    }
                    Err(e) => {
                        tracing::warn!(tile = %id, error = %e, "photo not attached");
                        self.status = format!("Photo not attached: {}", e);
                    }
                }
                Task::none()
            }

            Message::ExportPng => {
                let scene = raster::Scene::capture(&self.planner);
                let file_name = format!("{}.png", self.planner.wall().key());
                self.status = "Rendering PNG...".to_string();
                Task::perform(
                    png_rendered(scene, self.settings.export_factor, file_name),
                    identity,
                )
            }
            Message::PngRendered(file_name, Ok(bytes)) => {
                tracing::info!(file = %file_name, bytes = bytes.len(), "PNG rendered");
                Task::perform(self.dialogs.save(file_name, bytes), Message::Saved)
            }
            Message::PngRendered(_, Err(e)) => {
                tracing::error!(error = %e, "PNG export failed");
                self.status = format!("PNG export failed: {}", e);
                Task::none()
            }
            Message::ExportLayout => match self.planner.export_layout() {
                Ok(json) => {
                    let file_name = format!("{}-layout.json", self.planner.wall().key());
                    Task::perform(
                        self.dialogs.save(file_name, json.into_bytes()),
                        Message::Saved,
                    )
                }
                Err(e) => {
                    tracing::error!(error = %e, "layout export failed");
                    self.status = format!("Layout export failed: {}", e);
                    Task::none()
                }
            },
            Message::ImportLayout => {
                Task::perform(self.dialogs.open(FileKind::Json), Message::LayoutPicked)
            }
            Message::LayoutPicked(None) => Task::none(),
            Message::LayoutPicked(Some(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                match self.planner.import_layout(&text) {
                    Ok(count) => {
                        self.photos.sync(self.planner.tiles());
                        self.status = format!("Imported {} tiles.", count);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "layout import rejected");
                        self.dialogs.alert("Invalid JSON file");
                    }
                }
                Task::none()
            }
            Message::Saved(Ok(Some(path))) => {
                tracing::info!(path = %path.display(), "file saved");
                self.status = format!("Saved {}", path.display());
                Task::none()
            }
            Message::Saved(Ok(None)) => Task::none(),
            Message::Saved(Err(e)) => {
                tracing::error!(error = %e, "save failed");
                self.status = e;
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let controls = row![
            text("Wall:"),
            pick_list(WallKey::ALL, Some(self.planner.wall()), Message::WallSelected),
            text("Scale (px/cm):"),
            text_input("3", &self.scale_input)
                .on_input(Message::ScaleChanged)
                .width(60),
            text("Grid (cm):"),
            text_input("5", &self.grid_input)
                .on_input(Message::GridChanged)
                .width(60),
        ]
        .spacing(12)
        .align_y(Alignment::Center);

        let sizes = Row::with_children(
            PaperSize::ALL
                .into_iter()
                .map(|size| button(text(size.label())).on_press(Message::AddTile(size)).into()),
        )
        .spacing(6);

        let actions = row![
            sizes,
            button("Export PNG").on_press(Message::ExportPng),
            button("Export JSON").on_press(Message::ExportLayout),
            button("Import JSON").on_press(Message::ImportLayout),
        ]
        .spacing(12);

        let size = self.planner.canvas_size();
        let wall = Canvas::new(WallCanvas {
            planner: &self.planner,
            photos: &self.photos,
        })
        .width(Length::Fixed(size.width))
        .height(Length::Fixed(size.height));

        let board = scrollable::Scrollable::new(container(wall))
            .direction(scrollable::Direction::Both {
                vertical: Scrollbar::default(),
                horizontal: Scrollbar::default(),
            })
            .width(Length::Fill)
            .height(Length::Fill);

        let mut status = row![text(&self.status).size(14)].spacing(24);
        if self.hovering_tile {
            status = status.push(text(TILE_HINT).size(14));
        }

        let content = column![
            text("Wall Planner").size(32),
            controls,
            actions,
            board,
            status,
        ]
        .spacing(8)
        .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Controls timeout for one drag; resolves to the message that hides them
async fn hide_controls_after(ticket: ControlsTicket, timeout: Duration) -> Message {
    tokio::time::sleep(timeout).await;
    Message::HideControls(ticket)
}

async fn photo_picked(id: String, pick: BoxFuture<'static, Option<Vec<u8>>>) -> Message {
    Message::PhotoPicked(id, pick.await)
}

async fn png_rendered(scene: raster::Scene, factor: f32, file_name: String) -> Message {
    let result = raster::render_png(scene, factor).await;
    Message::PngRendered(file_name, result)
}

fn main() -> iced::Result {
    tracing_subscriber::fmt::init();

    iced::application("Wall Planner", WallPlanner::update, WallPlanner::view)
        .theme(WallPlanner::theme)
        .centered()
        .run_with(WallPlanner::new)
}
