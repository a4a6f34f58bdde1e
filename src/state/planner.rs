/// The planner state container
///
/// `Planner` owns everything the wall view shows: the selected wall, the
/// tile collection, the scale and grid parameters and the drag state
/// machine. The UI only reads it and calls the operations below; it never
/// mutates tiles directly.

use iced::{Point, Size, Vector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};

use super::data::{PaperSize, Tile};
use super::layout;
use super::wall::WallKey;
use crate::config::Settings;
use crate::error::{PlannerError, Result};

/// Value used when a scale or grid input is not a positive number
pub const PARAM_FALLBACK: f32 = 1.0;

/// Pointer drag state machine
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// A tile is being dragged; `offset` is the pointer position inside it
    Dragging { id: String, offset: Vector },
}

/// Handle for one scheduled "hide controls" callback
///
/// Starting a new drag on the same tile issues a new token, which makes
/// every older ticket for that tile stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsTicket {
    pub tile_id: String,
    pub token: u64,
}

pub struct Planner {
    wall: WallKey,
    tiles: Vec<Tile>,
    scale: f32,
    grid_cm: f32,
    drag: DragState,
    /// Latest controls token per tile
    controls: HashMap<String, u64>,
    next_token: u64,
    rng: StdRng,
}

impl Planner {
    /// Create a planner with the configured wall and parameters
    pub fn new(settings: &Settings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// Create a planner with a caller-provided random source
    pub fn with_rng(settings: &Settings, rng: StdRng) -> Self {
        let mut planner = Planner {
            wall: settings.wall,
            tiles: Vec::new(),
            scale: coerce(settings.scale),
            grid_cm: coerce(settings.grid_cm),
            drag: DragState::Idle,
            controls: HashMap::new(),
            next_token: 0,
            rng,
        };
        planner.select_wall(settings.wall);
        planner
    }

    pub fn wall(&self) -> WallKey {
        self.wall
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[cfg(test)]
    pub fn tile(&self, id: &str) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn grid_cm(&self) -> f32 {
        self.grid_cm
    }

    /// Grid spacing in canvas pixels
    pub fn grid_px(&self) -> f32 {
        self.grid_cm * self.scale
    }

    /// Wall canvas size in pixels at the current scale
    pub fn canvas_size(&self) -> Size {
        let (w, h) = self.wall.cm();
        Size::new(w * self.scale, h * self.scale)
    }

    #[cfg(test)]
    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Topmost tile under a canvas point (last drawn wins)
    pub fn tile_at(&self, point: Point) -> Option<&Tile> {
        self.tiles.iter().rev().find(|t| t.contains(point.x, point.y))
    }

    // ========== Wall & parameters ==========

    /// Switch walls, replacing all tiles with the wall's preset layout
    ///
    /// Unsaved edits on the previous wall are dropped.
    pub fn select_wall(&mut self, wall: WallKey) {
        self.wall = wall;
        self.tiles = wall.preset(self.scale, &mut self.rng);
        self.drag = DragState::Idle;
        self.controls.clear();
        tracing::info!(wall = wall.key(), tiles = self.tiles.len(), "wall selected");
    }

    /// Set px/cm; existing tiles keep their pixel size
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = coerce(scale);
    }

    pub fn set_grid_cm(&mut self, grid_cm: f32) {
        self.grid_cm = coerce(grid_cm);
    }

    // ========== Drag ==========

    /// Start dragging `id`, grabbed at `offset` from its top-left corner
    ///
    /// Shows the tile's controls and returns the ticket the caller must
    /// hand back to `hide_controls` once the timeout elapses.
    pub fn begin_drag(&mut self, id: &str, offset: Vector) -> Result<ControlsTicket> {
        let tile = self
            .tiles
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PlannerError::UnknownTile(id.to_string()))?;
        tile.show_controls = true;

        self.next_token += 1;
        let token = self.next_token;
        self.controls.insert(id.to_string(), token);

        self.drag = DragState::Dragging {
            id: id.to_string(),
            offset,
        };

        Ok(ControlsTicket {
            tile_id: id.to_string(),
            token,
        })
    }

    /// Move the dragged tile so the grab point follows `pointer`
    ///
    /// `pointer` is relative to the canvas origin. The new corner is
    /// snapped to the grid and is not clamped to the wall.
    pub fn drag_to(&mut self, pointer: Point) -> bool {
        let DragState::Dragging { id, offset } = &self.drag else {
            return false;
        };
        let grid = self.grid_px();
        let x = snap(pointer.x - offset.x, grid);
        let y = snap(pointer.y - offset.y, grid);

        match self.tiles.iter_mut().find(|t| t.id == *id) {
            Some(tile) => {
                tile.x = x;
                tile.y = y;
                true
            }
            None => false,
        }
    }

    /// Pointer released or left the canvas
    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Hide controls if `ticket` is still the latest for its tile
    pub fn hide_controls(&mut self, ticket: &ControlsTicket) -> bool {
        if self.controls.get(&ticket.tile_id) != Some(&ticket.token) {
            return false;
        }
        self.controls.remove(&ticket.tile_id);
        match self.tiles.iter_mut().find(|t| t.id == ticket.tile_id) {
            Some(tile) => {
                tile.show_controls = false;
                true
            }
            None => false,
        }
    }

    // ========== Tile lifecycle ==========

    /// Add a tile of `size` at a random spot inside the wall
    ///
    /// Returns the new tile's id. Tiles larger than the wall go to 0.
    pub fn add_tile(&mut self, size: PaperSize) -> String {
        let (w, h) = size.px(self.scale);
        let canvas = self.canvas_size();
        let x = random_position(&mut self.rng, canvas.width - w);
        let y = random_position(&mut self.rng, canvas.height - h);

        let taken: HashSet<String> = self.tiles.iter().map(|t| t.id.clone()).collect();
        let id = layout::fresh_id(&taken, &mut self.rng);

        self.tiles.push(Tile::new(id.clone(), size, x, y, self.scale));
        tracing::debug!(id = %id, size = %size, x, y, "tile added");
        id
    }

    /// Toggle orientation, swapping width and height
    pub fn rotate(&mut self, id: &str) -> Result<()> {
        let tile = self.tile_mut(id)?;
        tile.rotated = !tile.rotated;
        std::mem::swap(&mut tile.w, &mut tile.h);
        Ok(())
    }

    /// Remove a tile and return it
    pub fn delete(&mut self, id: &str) -> Result<Tile> {
        let index = self
            .tiles
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| PlannerError::UnknownTile(id.to_string()))?;

        if matches!(&self.drag, DragState::Dragging { id: dragged, .. } if dragged == id) {
            self.drag = DragState::Idle;
        }
        self.controls.remove(id);

        Ok(self.tiles.remove(index))
    }

    /// Store a photo (as a data URL) on a tile, replacing any previous one
    pub fn attach_photo(&mut self, id: &str, data_url: String) -> Result<()> {
        let tile = self.tile_mut(id)?;
        tile.img = Some(data_url);
        Ok(())
    }

    // ========== Import / export ==========

    /// Current tiles as pretty-printed layout JSON
    pub fn export_layout(&self) -> Result<String> {
        layout::to_json(&self.tiles)
    }

    /// Replace all tiles with the layout in `text`
    ///
    /// On any error the current tiles are left untouched.
    pub fn import_layout(&mut self, text: &str) -> Result<usize> {
        let tiles = layout::parse(text, self.scale, &mut self.rng)?;
        self.tiles = tiles;
        self.drag = DragState::Idle;
        self.controls.clear();
        tracing::info!(wall = self.wall.key(), tiles = self.tiles.len(), "layout imported");
        Ok(self.tiles.len())
    }

    fn tile_mut(&mut self, id: &str) -> Result<&mut Tile> {
        self.tiles
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PlannerError::UnknownTile(id.to_string()))
    }
}

/// Round `value` to the nearest multiple of `grid`, halves rounding up
pub fn snap(value: f32, grid: f32) -> f32 {
    ((value / grid) + 0.5).floor() * grid
}

/// Parse a scale or grid input, falling back for anything not positive
pub fn coerce_param(input: &str) -> f32 {
    coerce(input.trim().parse::<f32>().unwrap_or(PARAM_FALLBACK))
}

fn coerce(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        PARAM_FALLBACK
    }
}

fn random_position<R: Rng + ?Sized>(rng: &mut R, room: f32) -> f32 {
    (rng.random::<f32>() * room).floor().max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(wall: WallKey) -> Settings {
        Settings {
            wall,
            ..Settings::default()
        }
    }

    /// Planner on the empty wall with default scale 3 and grid 5
    fn empty_planner() -> Planner {
        Planner::with_rng(&settings(WallKey::Wall3), StdRng::seed_from_u64(99))
    }

    /// Field-for-field equality ignoring the transient controls flag
    fn same_layout(a: &Tile, b: &Tile) -> bool {
        Tile {
            show_controls: false,
            ..a.clone()
        } == Tile {
            show_controls: false,
            ..b.clone()
        }
    }

    fn is_multiple(value: f32, grid: f32) -> bool {
        let k = value / grid;
        (k - k.round()).abs() < 1e-4
    }

    #[test]
    fn test_wall_selection_replaces_tiles() {
        let mut planner = Planner::with_rng(&settings(WallKey::Wall1), StdRng::seed_from_u64(1));
        assert_eq!(planner.tiles().len(), 3);

        planner.add_tile(PaperSize::A6);
        assert_eq!(planner.tiles().len(), 4);

        planner.select_wall(WallKey::Wall3);
        assert!(planner.tiles().is_empty());

        planner.select_wall(WallKey::Wall1);
        assert_eq!(planner.tiles().len(), 3);
    }

    #[test]
    fn test_coerce_param() {
        assert_eq!(coerce_param("4"), 4.0);
        assert_eq!(coerce_param(" 2.5 "), 2.5);
        assert_eq!(coerce_param(""), 1.0);
        assert_eq!(coerce_param("abc"), 1.0);
        assert_eq!(coerce_param("0"), 1.0);
        assert_eq!(coerce_param("-3"), 1.0);
        assert_eq!(coerce_param("NaN"), 1.0);
    }

    #[test]
    fn test_scale_change_keeps_existing_tile_pixels() {
        let mut planner = empty_planner();
        let id = planner.add_tile(PaperSize::A4);
        let before = planner.tile(&id).cloned().unwrap();

        planner.set_scale(6.0);

        assert_eq!(planner.tile(&id), Some(&before));
        assert_eq!(planner.canvas_size(), Size::new(336.0 * 6.0, 300.0 * 6.0));
    }

    #[test]
    fn test_snap_rounds_to_nearest() {
        assert_eq!(snap(7.0, 15.0), 0.0);
        assert_eq!(snap(7.5, 15.0), 15.0);
        assert_eq!(snap(22.0, 15.0), 15.0);
        assert_eq!(snap(-7.5, 15.0), 0.0);
        assert_eq!(snap(-8.0, 15.0), -15.0);
    }

    #[test]
    fn test_drag_positions_stay_on_grid() {
        let mut planner = empty_planner();
        let id = planner.add_tile(PaperSize::A5);
        let grid = planner.grid_px();

        planner.begin_drag(&id, Vector::new(3.3, 7.1)).unwrap();
        for (px, py) in [(10.0, 10.0), (123.4, 56.7), (-40.2, 999.9), (5000.0, -3.0)] {
            assert!(planner.drag_to(Point::new(px, py)));
            let tile = planner.tile(&id).unwrap();
            assert!(is_multiple(tile.x, grid), "x={} not on grid {}", tile.x, grid);
            assert!(is_multiple(tile.y, grid), "y={} not on grid {}", tile.y, grid);
        }
        planner.end_drag();

        // Last move went outside the wall and was not clamped
        let tile = planner.tile(&id).unwrap();
        assert!(tile.x > planner.canvas_size().width);
        assert!(tile.y <= 0.0);
    }

    #[test]
    fn test_drag_state_machine() {
        let mut planner = empty_planner();
        let id = planner.add_tile(PaperSize::A4);
        assert_eq!(planner.drag_state(), &DragState::Idle);
        assert!(!planner.drag_to(Point::new(50.0, 50.0)));

        planner.begin_drag(&id, Vector::new(1.0, 2.0)).unwrap();
        assert_eq!(
            planner.drag_state(),
            &DragState::Dragging {
                id: id.clone(),
                offset: Vector::new(1.0, 2.0)
            }
        );

        planner.end_drag();
        assert!(!planner.is_dragging());
        assert!(planner.begin_drag("missing", Vector::new(0.0, 0.0)).is_err());
        assert!(!planner.is_dragging());
    }

    #[test]
    fn test_stale_controls_ticket_is_ignored() {
        let mut planner = empty_planner();
        let id = planner.add_tile(PaperSize::A3);

        let first = planner.begin_drag(&id, Vector::new(0.0, 0.0)).unwrap();
        planner.end_drag();
        let second = planner.begin_drag(&id, Vector::new(0.0, 0.0)).unwrap();
        planner.end_drag();
        assert!(planner.tile(&id).unwrap().show_controls);

        assert!(!planner.hide_controls(&first));
        assert!(planner.tile(&id).unwrap().show_controls);

        assert!(planner.hide_controls(&second));
        assert!(!planner.tile(&id).unwrap().show_controls);
    }

    #[test]
    fn test_add_uses_paper_dimensions() {
        let mut planner = empty_planner();
        for size in PaperSize::ALL {
            let id = planner.add_tile(size);
            let tile = planner.tile(&id).unwrap();
            let (w, h) = size.cm();
            assert_eq!(tile.w, w * planner.scale());
            assert_eq!(tile.h, h * planner.scale());
            assert!(!tile.rotated);
        }
    }

    #[test]
    fn test_add_places_inside_wall() {
        let mut planner = empty_planner();
        let canvas = planner.canvas_size();
        for _ in 0..200 {
            let id = planner.add_tile(PaperSize::A4);
            let tile = planner.tile(&id).unwrap();
            assert!(tile.x >= 0.0 && tile.x + tile.w <= canvas.width);
            assert!(tile.y >= 0.0 && tile.y + tile.h <= canvas.height);
        }
        let ids: HashSet<_> = planner.tiles().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_oversized_tile_goes_to_origin() {
        // No room left on the wall: placement collapses to 0
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(random_position(&mut rng, -120.0), 0.0);
            assert_eq!(random_position(&mut rng, 0.0), 0.0);
        }
    }

    #[test]
    fn test_rotate_twice_is_identity() {
        let mut planner = empty_planner();
        let id = planner.add_tile(PaperSize::A2);
        let original = planner.tile(&id).cloned().unwrap();

        planner.rotate(&id).unwrap();
        let once = planner.tile(&id).cloned().unwrap();
        assert!(once.rotated);
        assert_eq!((once.w, once.h), (original.h, original.w));

        planner.rotate(&id).unwrap();
        assert_eq!(planner.tile(&id), Some(&original));
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let mut planner = empty_planner();
        let a = planner.add_tile(PaperSize::A4);
        let b = planner.add_tile(PaperSize::A5);
        let c = planner.add_tile(PaperSize::A6);
        let others: Vec<Tile> = planner.tiles().iter().filter(|t| t.id != b).cloned().collect();

        let removed = planner.delete(&b).unwrap();
        assert_eq!(removed.id, b);
        assert_eq!(planner.tiles(), others.as_slice());
        assert!(planner.tile(&a).is_some() && planner.tile(&c).is_some());
        assert!(matches!(planner.delete(&b), Err(PlannerError::UnknownTile(_))));
    }

    #[test]
    fn test_deleting_dragged_tile_ends_drag() {
        let mut planner = empty_planner();
        let id = planner.add_tile(PaperSize::A4);
        planner.begin_drag(&id, Vector::new(0.0, 0.0)).unwrap();
        planner.delete(&id).unwrap();
        assert!(!planner.is_dragging());
    }

    #[test]
    fn test_attach_photo_replaces_previous() {
        let mut planner = empty_planner();
        let id = planner.add_tile(PaperSize::A4);
        planner.attach_photo(&id, "data:image/png;base64,AAA".into()).unwrap();
        planner.attach_photo(&id, "data:image/png;base64,BBB".into()).unwrap();
        assert_eq!(
            planner.tile(&id).unwrap().img.as_deref(),
            Some("data:image/png;base64,BBB")
        );
        assert!(planner.attach_photo("nope", String::new()).is_err());
    }

    #[test]
    fn test_export_import_round_trip_ignores_controls() {
        let mut planner = empty_planner();
        let a = planner.add_tile(PaperSize::A3);
        let b = planner.add_tile(PaperSize::A6);
        planner.rotate(&b).unwrap();
        planner.attach_photo(&a, "data:image/jpeg;base64,/9j/".into()).unwrap();
        planner.begin_drag(&a, Vector::new(2.0, 2.0)).unwrap();
        planner.drag_to(Point::new(100.0, 100.0));
        planner.end_drag();
        let before = planner.tiles().to_vec();

        let json = planner.export_layout().unwrap();
        let count = planner.import_layout(&json).unwrap();

        assert_eq!(count, before.len());
        for (old, new) in before.iter().zip(planner.tiles()) {
            assert!(same_layout(old, new), "{:?} != {:?}", old, new);
        }
    }

    #[test]
    fn test_invalid_import_leaves_tiles() {
        let mut planner = Planner::with_rng(&settings(WallKey::Wall1), StdRng::seed_from_u64(5));
        let before = planner.tiles().to_vec();

        let err = planner.import_layout("this is not json").unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON file");
        assert_eq!(planner.tiles(), before.as_slice());
    }

    #[test]
    fn test_wall1_a4_export_scenario() {
        let mut planner = Planner::with_rng(&settings(WallKey::Wall1), StdRng::seed_from_u64(8));
        planner.import_layout("[]").unwrap();
        planner.add_tile(PaperSize::A4);

        let json = planner.export_layout().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        let tile = &items[0];
        assert_eq!(tile["size"], "A4");
        assert_eq!(tile["rotated"], false);
        assert!((tile["w"].as_f64().unwrap() - 21.0 * 3.0).abs() < 1e-3);
        assert!((tile["h"].as_f64().unwrap() - 29.7 * 3.0).abs() < 1e-3);
    }
}
