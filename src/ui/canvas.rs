use iced::alignment;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Path, Program, Stroke, Text};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme, Vector};
use std::time::{Duration, Instant};

use super::photos::PhotoCache;
use crate::state::data::Tile;
use crate::state::planner::Planner;
use crate::Message;

/// Two presses on the same tile within this window open the photo picker
const DOUBLE_CLICK: Duration = Duration::from_millis(400);

/// Shown in the status line while the pointer rests on a tile
pub const TILE_HINT: &str = "Drag to move • Double-click to add photo";

const CONTROL_W: f32 = 56.0;
const CONTROL_H: f32 = 22.0;
const CONTROL_GAP: f32 = 6.0;
/// Distance between the tile's edge and its controls
const CONTROL_DROP: f32 = 6.0;

const TILE_FILL: Color = Color::from_rgb(0.867, 0.867, 0.867);
const TILE_BORDER: Color = Color::from_rgb(0.2, 0.2, 0.2);
const DELETE_FILL: Color = Color::from_rgb(0.85, 0.1, 0.1);

/// The wall and its tiles, drawn and dragged on an iced canvas
pub struct WallCanvas<'a> {
    pub planner: &'a Planner,
    pub photos: &'a PhotoCache,
}

/// What a left press at a canvas point lands on
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    Rotate(String),
    Delete(String),
    Tile { id: String, offset: Vector },
}

/// Rotate and Delete button bounds, centered under the tile
///
/// Controls that would fall off the bottom of the wall go above the tile
/// instead. Either way they are kept inside `canvas` so they stay clickable.
pub fn control_rects(tile: &Tile, canvas: Size) -> (Rectangle, Rectangle) {
    let total = CONTROL_W * 2.0 + CONTROL_GAP;
    let left = tile.x + tile.w / 2.0 - total / 2.0;
    let left = left.min(canvas.width - total).max(0.0);

    let below = tile.y + tile.h + CONTROL_DROP;
    let top = if below + CONTROL_H <= canvas.height {
        below
    } else {
        tile.y - CONTROL_DROP - CONTROL_H
    };
    let top = top.min(canvas.height - CONTROL_H).max(0.0);

    let size = Size::new(CONTROL_W, CONTROL_H);
    (
        Rectangle::new(Point::new(left, top), size),
        Rectangle::new(Point::new(left + CONTROL_W + CONTROL_GAP, top), size),
    )
}

/// Resolve a press; visible controls take priority over tiles
pub fn hit(planner: &Planner, point: Point) -> Option<Hit> {
    let canvas = planner.canvas_size();
    for tile in planner.tiles().iter().rev().filter(|t| t.show_controls) {
        let (rotate, delete) = control_rects(tile, canvas);
        if rotate.contains(point) {
            return Some(Hit::Rotate(tile.id.clone()));
        }
        if delete.contains(point) {
            return Some(Hit::Delete(tile.id.clone()));
        }
    }

    planner.tile_at(point).map(|tile| Hit::Tile {
        id: tile.id.clone(),
        offset: point - Point::new(tile.x, tile.y),
    })
}

/// Destination of an image of `natural` size scaled to cover `target`,
/// centered, relative to the target's origin
pub fn cover_rect(natural: Size, target: Size) -> Rectangle {
    if natural.width <= 0.0 || natural.height <= 0.0 {
        return Rectangle::new(Point::ORIGIN, target);
    }
    let k = (target.width / natural.width).max(target.height / natural.height);
    let size = Size::new(natural.width * k, natural.height * k);
    Rectangle::new(
        Point::new(
            (target.width - size.width) / 2.0,
            (target.height - size.height) / 2.0,
        ),
        size,
    )
}

/// Pointer bookkeeping local to the canvas widget
#[derive(Debug, Default)]
pub struct PointerState {
    last_press: Option<(String, Instant)>,
    over_tile: bool,
}

/// Report entering or leaving a tile, once per transition
fn hover_change(state: &mut PointerState, over_tile: bool) -> Option<Message> {
    if state.over_tile == over_tile {
        return None;
    }
    state.over_tile = over_tile;
    Some(Message::TileHovered(over_tile))
}

impl Program<Message> for WallCanvas<'_> {
    type State = PointerState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::WHITE);

        for tile in self.planner.tiles() {
            self.draw_tile(&mut frame, tile);
        }

        // Controls go on top of every tile
        let canvas = self.planner.canvas_size();
        for tile in self.planner.tiles().iter().filter(|t| t.show_controls) {
            draw_controls(&mut frame, tile, canvas);
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let Some(position) = cursor.position_in(bounds) else {
                    return (canvas::event::Status::Ignored, None);
                };
                let message = match hit(self.planner, position) {
                    Some(Hit::Rotate(id)) => Message::RotateTile(id),
                    Some(Hit::Delete(id)) => Message::DeleteTile(id),
                    Some(Hit::Tile { id, offset }) => {
                        let now = Instant::now();
                        let repeated = matches!(
                            &state.last_press,
                            Some((last, at)) if *last == id && now.duration_since(*at) <= DOUBLE_CLICK
                        );
                        if repeated {
                            state.last_press = None;
                            Message::PickPhoto(id)
                        } else {
                            state.last_press = Some((id.clone(), now));
                            Message::TilePressed { id, offset }
                        }
                    }
                    None => return (canvas::event::Status::Ignored, None),
                };
                (canvas::event::Status::Captured, Some(message))
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if self.planner.is_dragging() => {
                // Leaving the wall ends the drag like releasing the button
                let message = match cursor.position_in(bounds) {
                    Some(position) => Message::DragMoved(position),
                    None => Message::DragEnded,
                };
                (canvas::event::Status::Captured, Some(message))
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
            | canvas::Event::Mouse(mouse::Event::CursorLeft)
                if self.planner.is_dragging() =>
            {
                (canvas::event::Status::Captured, Some(Message::DragEnded))
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                let over = cursor
                    .position_in(bounds)
                    .and_then(|p| self.planner.tile_at(p))
                    .is_some();
                (canvas::event::Status::Ignored, hover_change(state, over))
            }
            canvas::Event::Mouse(mouse::Event::CursorLeft) => {
                (canvas::event::Status::Ignored, hover_change(state, false))
            }

            _ => (canvas::event::Status::Ignored, None),
        }
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if self.planner.is_dragging() {
            return mouse::Interaction::Grabbing;
        }
        match cursor.position_in(bounds).and_then(|p| hit(self.planner, p)) {
            Some(Hit::Tile { .. }) => mouse::Interaction::Grab,
            Some(_) => mouse::Interaction::Pointer,
            None => mouse::Interaction::default(),
        }
    }
}

impl WallCanvas<'_> {
    fn draw_tile(&self, frame: &mut Frame, tile: &Tile) {
        let origin = Point::new(tile.x, tile.y);
        let size = Size::new(tile.w, tile.h);

        match self.photos.get(&tile.id) {
            Some(photo) => {
                let natural = Size::new(photo.width as f32, photo.height as f32);
                let target = cover_rect(natural, size);
                frame.with_clip(Rectangle::new(origin, size), |frame| {
                    frame.draw_image(target, canvas::Image::new(photo.handle.clone()));
                });
            }
            None => {
                frame.fill_rectangle(origin, size, TILE_FILL);
                frame.fill_text(Text {
                    content: tile.caption(),
                    position: Point::new(tile.x + tile.w / 2.0, tile.y + tile.h / 2.0),
                    color: Color::BLACK,
                    size: Pixels(12.0),
                    horizontal_alignment: alignment::Horizontal::Center,
                    vertical_alignment: alignment::Vertical::Center,
                    ..Text::default()
                });
            }
        }

        frame.stroke(
            &Path::rectangle(origin, size),
            Stroke::default().with_color(TILE_BORDER).with_width(2.0),
        );
    }
}

fn draw_controls(frame: &mut Frame, tile: &Tile, canvas: Size) {
    let (rotate, delete) = control_rects(tile, canvas);
    for (rect, label, fill, color) in [
        (rotate, "Rotate", Color::WHITE, Color::BLACK),
        (delete, "Delete", DELETE_FILL, Color::WHITE),
    ] {
        frame.fill_rectangle(rect.position(), rect.size(), fill);
        frame.stroke(
            &Path::rectangle(rect.position(), rect.size()),
            Stroke::default().with_color(TILE_BORDER).with_width(1.0),
        );
        frame.fill_text(Text {
            content: label.to_string(),
            position: rect.center(),
            color,
            size: Pixels(12.0),
            horizontal_alignment: alignment::Horizontal::Center,
            vertical_alignment: alignment::Vertical::Center,
            ..Text::default()
        });
    }
}
