/// Shared data structures for the planner state
///
/// These structs are the tile model shared by the planner, the canvas
/// and the layout JSON files. Field names on the wire follow the layout
/// format (`showControls` is camelCase there).

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of generated tile ids
const ID_LEN: usize = 8;

/// Standard ISO 216 paper sizes that can be placed on a wall
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperSize {
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl PaperSize {
    /// All sizes in the order the toolbar shows them
    pub const ALL: [PaperSize; 6] = [
        PaperSize::A1,
        PaperSize::A2,
        PaperSize::A3,
        PaperSize::A4,
        PaperSize::A5,
        PaperSize::A6,
    ];

    /// Portrait width and height in centimeters
    pub fn cm(self) -> (f32, f32) {
        match self {
            PaperSize::A1 => (59.4, 84.1),
            PaperSize::A2 => (42.0, 59.4),
            PaperSize::A3 => (29.7, 42.0),
            PaperSize::A4 => (21.0, 29.7),
            PaperSize::A5 => (14.8, 21.0),
            PaperSize::A6 => (10.5, 14.8),
        }
    }

    /// Portrait width and height in pixels at the given scale (px/cm)
    pub fn px(self, scale: f32) -> (f32, f32) {
        let (w, h) = self.cm();
        (w * scale, h * scale)
    }

    pub fn label(self) -> &'static str {
        match self {
            PaperSize::A1 => "A1",
            PaperSize::A2 => "A2",
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
            PaperSize::A6 => "A6",
        }
    }

    /// Inverse of `label`
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.label() == label)
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A sheet of paper placed on the wall canvas
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tile {
    /// Opaque unique id, never changes after creation
    pub id: String,
    pub size: PaperSize,
    /// Top-left corner in canvas pixels
    pub x: f32,
    pub y: f32,
    /// Effective width and height in pixels (already swapped when rotated)
    pub w: f32,
    pub h: f32,
    pub rotated: bool,
    /// Attached photo as a `data:` URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    /// Rotate/Delete controls are visible (UI only)
    #[serde(
        rename = "showControls",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub show_controls: bool,
}

impl Tile {
    /// Create an unrotated tile whose pixel size follows `size` at `scale`
    pub fn new(id: String, size: PaperSize, x: f32, y: f32, scale: f32) -> Self {
        let (w, h) = size.px(scale);
        Self {
            id,
            size,
            x,
            y,
            w,
            h,
            rotated: false,
            img: None,
            show_controls: false,
        }
    }

    /// Label drawn on tiles without a photo, e.g. "A4 (P)"
    pub fn caption(&self) -> String {
        let orientation = if self.rotated { "L" } else { "P" };
        format!("{} ({})", self.size, orientation)
    }

    /// Whether a canvas point falls inside this tile
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }
}

/// Generate a short random base-36 id, e.g. "k3x9a0qz"
pub fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..ID_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
