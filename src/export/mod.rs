/// Export module
///
/// This module handles:
/// - Encoding photos as `data:` URLs and decoding them back
/// - Rasterizing the wall and its tiles to a PNG

pub mod photo;
pub mod raster;
