/// User interface module
///
/// - `canvas.rs` - the wall canvas: drawing, hit testing, pointer drag
/// - `photos.rs` - decoded photo handles for drawing tiles

pub mod canvas;
pub mod photos;
