/// Wall rasterizer
///
/// Turns a snapshot of the wall into a PNG: white background, every tile
/// filled with its photo (scaled to cover, centered) or a light grey, and
/// a dark border. Output is `factor` times the on-screen canvas size.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use tokio::task;

use super::photo;
use crate::error::{PlannerError, Result};
use crate::state::data::Tile;
use crate::state::planner::Planner;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TILE_FILL: Rgba<u8> = Rgba([0xdd, 0xdd, 0xdd, 255]);
const TILE_BORDER: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 255]);
/// Border width in canvas pixels (before the export factor)
const BORDER_PX: f32 = 2.0;

/// Everything needed to draw the wall, detached from the live planner
#[derive(Debug, Clone)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub tiles: Vec<Tile>,
}

impl Scene {
    pub fn capture(planner: &Planner) -> Self {
        let size = planner.canvas_size();
        Scene {
            width: size.width,
            height: size.height,
            tiles: planner.tiles().to_vec(),
        }
    }
}

/// Rasterize and PNG-encode a scene off the UI thread
pub async fn render_png(scene: Scene, factor: f32) -> std::result::Result<Vec<u8>, String> {
    // Spawn blocking because decoding and resizing photos is CPU-intensive
    task::spawn_blocking(move || {
        let image = render(&scene, factor);
        photo::encode_png(&DynamicImage::ImageRgba8(image)).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Draw a scene into an RGBA buffer
pub fn render(scene: &Scene, factor: f32) -> RgbaImage {
    let width = (scene.width * factor).round().max(1.0) as u32;
    let height = (scene.height * factor).round().max(1.0) as u32;
    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

    for tile in &scene.tiles {
        draw_tile(&mut canvas, tile, factor);
    }

    canvas
}

/// Pixel rectangle already clipped to the canvas, `x0..x1` by `y0..y1`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Region {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Region {
    /// Intersect a float rectangle with the canvas; `None` when nothing is visible
    fn clip(canvas: &RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<Self> {
        if [x0, y0, x1, y1].iter().any(|v| v.is_nan()) {
            return None;
        }
        let x0 = x0.max(0.0).round();
        let y0 = y0.max(0.0).round();
        let x1 = x1.min(canvas.width() as f32).round();
        let y1 = y1.min(canvas.height() as f32).round();
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Region {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        })
    }

    fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

fn draw_tile(canvas: &mut RgbaImage, tile: &Tile, factor: f32) {
    let [x, y, w, h] = [tile.x, tile.y, tile.w, tile.h].map(|v| v * factor);
    if ![x, y, w, h].iter().all(|v| v.is_finite()) || w <= 0.0 || h <= 0.0 {
        return;
    }
    let Some(visible) = Region::clip(canvas, x, y, x + w, y + h) else {
        return;
    };

    match tile.img.as_deref().map(|url| cover(url, [x, y, w, h], visible)) {
        Some(Ok(photo)) => {
            imageops::overlay(canvas, &photo, visible.x0 as i64, visible.y0 as i64)
        }
        Some(Err(e)) => {
            tracing::warn!(tile = %tile.id, error = %e, "photo skipped in export");
            fill(canvas, visible, TILE_FILL);
        }
        None => fill(canvas, visible, TILE_FILL),
    }

    let b = (BORDER_PX * factor).round().max(1.0);
    let edges = [
        (x, y, x + w, y + b),
        (x, y + h - b, x + w, y + h),
        (x, y, x + b, y + h),
        (x + w - b, y, x + w, y + h),
    ];
    for (x0, y0, x1, y1) in edges {
        if let Some(region) = Region::clip(canvas, x0, y0, x1, y1) {
            fill(canvas, region, TILE_BORDER);
        }
    }
}

/// Decode a photo, scale it to cover the tile rect `[x, y, w, h]` with the
/// center kept, and return only the part inside `visible`
fn cover(url: &str, [x, y, w, h]: [f32; 4], visible: Region) -> Result<RgbaImage> {
    let image = photo::decode(url)?;
    let (iw, ih) = (image.width(), image.height());
    if iw == 0 || ih == 0 {
        return Err(PlannerError::Photo("empty image".to_string()));
    }

    let (x, y, w, h) = (x as f64, y as f64, w as f64, h as f64);
    let k = (w / iw as f64).max(h / ih as f64);
    let origin_x = x + (w - iw as f64 * k) / 2.0;
    let origin_y = y + (h - ih as f64 * k) / 2.0;

    // Source span mapping onto `from..to` canvas pixels
    let span = |from: u32, to: u32, origin: f64, len: u32| {
        let start = ((from as f64 - origin) / k).floor().clamp(0.0, (len - 1) as f64) as u32;
        let end = ((to as f64 - origin) / k).ceil().clamp(0.0, len as f64) as u32;
        (start, end.saturating_sub(start).max(1).min(len - start))
    };
    let (sx, sw) = span(visible.x0, visible.x1, origin_x, iw);
    let (sy, sh) = span(visible.y0, visible.y1, origin_y, ih);

    Ok(image
        .crop_imm(sx, sy, sw, sh)
        .resize_exact(visible.width(), visible.height(), FilterType::Triangle)
        .to_rgba8())
}

fn fill(canvas: &mut RgbaImage, region: Region, color: Rgba<u8>) {
    for py in region.y0..region.y1 {
        for px in region.x0..region.x1 {
            canvas.put_pixel(px, py, color);
        }
    }
}
