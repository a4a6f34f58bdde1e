/// State management module
///
/// This module handles all planner state, including:
/// - Tile and paper size data structures (data.rs)
/// - Wall presets and their bundled layouts (wall.rs)
/// - Layout JSON import/export (layout.rs)
/// - The planner store with drag and tile operations (planner.rs)

pub mod data;
pub mod layout;
pub mod planner;
pub mod wall;
