/// Fixed wall presets
///
/// Each wall has physical dimensions and a layout that is loaded when
/// the wall is selected. Layouts are bundled into the binary.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::data::Tile;
use super::layout;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum WallKey {
    #[default]
    Wall1,
    Wall2,
    Wall3,
}

impl WallKey {
    pub const ALL: [WallKey; 3] = [WallKey::Wall1, WallKey::Wall2, WallKey::Wall3];

    /// Key used in file names, e.g. "wall1"
    pub fn key(self) -> &'static str {
        match self {
            WallKey::Wall1 => "wall1",
            WallKey::Wall2 => "wall2",
            WallKey::Wall3 => "wall3",
        }
    }

    /// Physical width and height in centimeters
    pub fn cm(self) -> (f32, f32) {
        match self {
            WallKey::Wall1 => (490.0, 300.0),
            WallKey::Wall2 => (559.0, 300.0),
            WallKey::Wall3 => (336.0, 300.0),
        }
    }

    fn preset_json(self) -> &'static str {
        match self {
            WallKey::Wall1 => include_str!("../../assets/layouts/wall1-layout.json"),
            WallKey::Wall2 => include_str!("../../assets/layouts/wall2-layout.json"),
            WallKey::Wall3 => include_str!("../../assets/layouts/wall3-layout.json"),
        }
    }

    /// Tiles of the bundled layout for this wall
    ///
    /// A broken preset yields an empty wall rather than an error.
    pub fn preset<R: Rng + ?Sized>(self, scale: f32, rng: &mut R) -> Vec<Tile> {
        match layout::parse(self.preset_json(), scale, rng) {
            Ok(tiles) => tiles,
            Err(e) => {
                tracing::warn!(wall = self.key(), error = %e, "preset layout unreadable, starting empty");
                Vec::new()
            }
        }
    }
}

impl fmt::Display for WallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.cm();
        let number = match self {
            WallKey::Wall1 => 1,
            WallKey::Wall2 => 2,
            WallKey::Wall3 => 3,
        };
        write!(f, "Wall {} ({}×{} cm)", number, w, h)
    }
}
