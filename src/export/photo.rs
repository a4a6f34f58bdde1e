/// Photo data URLs
///
/// Tiles keep their photo inline as `data:<mime>;base64,<payload>` so a
/// layout JSON file is self-contained.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};

use crate::error::{PlannerError, Result};

/// Encode image file bytes as a data URL, sniffing the format
pub fn to_data_url(bytes: &[u8]) -> Result<String> {
    let format = image::guess_format(bytes)?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(bytes)
    ))
}

/// Extract the raw bytes from a base64 data URL
pub fn data_url_bytes(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| PlannerError::Photo("not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| PlannerError::Photo("missing data URL payload".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(PlannerError::Photo("data URL is not base64".to_string()));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| PlannerError::Photo(e.to_string()))
}

/// Decode a data URL into an image
pub fn decode(url: &str) -> Result<DynamicImage> {
    let bytes = data_url_bytes(url)?;
    let format = image::guess_format(&bytes)?;
    Ok(image::load_from_memory_with_format(&bytes, format)?)
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = std::io::Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
