/// User settings
///
/// Optional `settings.toml` stored in the user's config directory:
/// - Linux: ~/.config/wall-planner/settings.toml
/// - macOS: ~/Library/Application Support/wall-planner/settings.toml
/// - Windows: %APPDATA%\wall-planner\settings.toml
///
/// Every key is optional. A missing file means defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::state::wall::WallKey;

const APP_DIR: &str = "wall-planner";
const CONFIG_FILE: &str = "settings.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Wall shown at startup
    pub wall: WallKey,
    /// Pixels per centimeter
    pub scale: f32,
    /// Snap grid in centimeters
    pub grid_cm: f32,
    /// Resolution multiplier for PNG export
    pub export_factor: f32,
    /// How long tile controls stay visible after a drag starts
    pub controls_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wall: WallKey::Wall1,
            scale: 3.0,
            grid_cm: 5.0,
            export_factor: 2.0,
            controls_timeout_ms: 3000,
        }
    }
}

impl Settings {
    pub fn controls_timeout(&self) -> Duration {
        Duration::from_millis(self.controls_timeout_ms)
    }
}

/// Path of the settings file, if the platform has a config directory
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_DIR);
        path.push(CONFIG_FILE);
        path
    })
}

/// Load settings from the default location, falling back to defaults
pub fn load() -> Settings {
    let Some(path) = default_path() else {
        return Settings::default();
    };
    if !path.exists() {
        return Settings::default();
    }
    match load_from_path(&path) {
        Ok(settings) => {
            tracing::info!(path = %path.display(), "settings loaded");
            settings
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring settings file");
            Settings::default()
        }
    }
}

pub fn load_from_path(path: &Path) -> Result<Settings> {
    let text = std::fs::read_to_string(path)?;
    let mut settings: Settings = toml::from_str(&text)?;
    settings.sanitize();
    Ok(settings)
}

impl Settings {
    /// Non-positive numbers fall back to 1 like the UI inputs do
    fn sanitize(&mut self) {
        for value in [&mut self.scale, &mut self.grid_cm, &mut self.export_factor] {
            if !value.is_finite() || *value <= 0.0 {
                *value = 1.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_startup_state() {
        let settings = Settings::default();
        assert_eq!(settings.wall, WallKey::Wall1);
        assert_eq!(settings.scale, 3.0);
        assert_eq!(settings.grid_cm, 5.0);
        assert_eq!(settings.controls_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wall = \"wall2\"\ngrid_cm = 10").unwrap();

        let settings = load_from_path(file.path()).unwrap();
        assert_eq!(settings.wall, WallKey::Wall2);
        assert_eq!(settings.grid_cm, 10.0);
        assert_eq!(settings.scale, 3.0);
    }

    #[test]
    fn test_non_positive_values_fall_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scale = -2\nexport_factor = 0").unwrap();

        let settings = load_from_path(file.path()).unwrap();
        assert_eq!(settings.scale, 1.0);
        assert_eq!(settings.export_factor, 1.0);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wall = [").unwrap();
        assert!(load_from_path(file.path()).is_err());
    }
}
