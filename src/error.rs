/// Error types for the wall planner
///
/// Every fallible operation in the crate returns `Result<T, PlannerError>`.
/// Only `InvalidJson` ever reaches the user as an alert; the rest are
/// logged and shown in the status line.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// The imported file is not JSON at all
    #[error("Invalid JSON file")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Tile not found: {0}")]
    UnknownTile(String),

    #[error("Photo could not be read: {0}")]
    Photo(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
