/// Decoded photo handles for the on-screen canvas
///
/// Tiles store photos as data URLs. Decoding one on every redraw would be
/// wasteful, so handles are cached per tile and refreshed only when the
/// tile's URL changes.

use iced::widget::image::Handle;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io::Cursor;

use crate::error::Result;
use crate::export::photo;
use crate::state::data::Tile;

#[derive(Debug, Clone)]
pub struct CachedPhoto {
    pub handle: Handle,
    /// Natural size in pixels
    pub width: u32,
    pub height: u32,
    digest: u64,
}

#[derive(Debug, Default)]
pub struct PhotoCache {
    entries: HashMap<String, CachedPhoto>,
}

impl PhotoCache {
    pub fn get(&self, tile_id: &str) -> Option<&CachedPhoto> {
        self.entries.get(tile_id)
    }

    /// Bring the cache in line with the current tiles
    pub fn sync(&mut self, tiles: &[Tile]) {
        self.entries
            .retain(|id, _| tiles.iter().any(|t| t.id == *id && t.img.is_some()));

        for tile in tiles {
            let Some(url) = tile.img.as_deref() else {
                continue;
            };
            let digest = digest(url);
            if self.entries.get(&tile.id).map(|c| c.digest) == Some(digest) {
                continue;
            }
            match load(url, digest) {
                Ok(cached) => {
                    self.entries.insert(tile.id.clone(), cached);
                }
                Err(e) => {
                    tracing::warn!(tile = %tile.id, error = %e, "photo not displayable");
                    self.entries.remove(&tile.id);
                }
            }
        }
    }
}

fn load(url: &str, digest: u64) -> Result<CachedPhoto> {
    let bytes = photo::data_url_bytes(url)?;
    let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(CachedPhoto {
        handle: Handle::from_bytes(bytes),
        width,
        height,
        digest,
    })
}

fn digest(url: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    hasher.finish()
}
