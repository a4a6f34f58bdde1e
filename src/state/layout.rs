/// Layout JSON reading and writing
///
/// A layout is a JSON array of tile objects. Export writes the tiles
/// pretty-printed with 2-space indentation. Import is lenient: anything
/// that parses as JSON is accepted, and fields that are missing or of the
/// wrong type get defaults.

use rand::Rng;
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::data::{generate_id, PaperSize, Tile};
use crate::error::{PlannerError, Result};

/// Serialize tiles to pretty-printed JSON
pub fn to_json(tiles: &[Tile]) -> Result<String> {
    serde_json::to_string_pretty(tiles).map_err(PlannerError::Encode)
}

/// Parse layout text into tiles
///
/// Only text that is not JSON is an error. A single object is read as a
/// one-tile layout, other non-array roots as an empty one, and array
/// items that are not objects are skipped. `scale` sizes tiles whose
/// `w`/`h` are missing. Ids that are missing or repeated are replaced
/// with fresh ones so ids stay unique.
pub fn parse<R: Rng + ?Sized>(text: &str, scale: f32, rng: &mut R) -> Result<Vec<Tile>> {
    let value: Value = serde_json::from_str(text).map_err(PlannerError::InvalidJson)?;

    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            tracing::warn!(root = %other, "layout root is not a list, importing no tiles");
            Vec::new()
        }
    };

    let mut seen = HashSet::new();
    let mut tiles = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Some(fields) = item.as_object() else {
            tracing::warn!(index, "skipping layout entry that is not an object");
            continue;
        };
        let tile = read_tile(fields, scale, &seen, rng);
        seen.insert(tile.id.clone());
        tiles.push(tile);
    }

    Ok(tiles)
}

/// Build a tile from whatever usable fields an entry carries
fn read_tile<R: Rng + ?Sized>(
    fields: &Map<String, Value>,
    scale: f32,
    taken: &HashSet<String>,
    rng: &mut R,
) -> Tile {
    let number = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_f64)
            .map(|n| n as f32)
            .filter(|n| n.is_finite())
    };
    let flag = |key: &str| fields.get(key).and_then(Value::as_bool).unwrap_or(false);

    let size = match fields.get("size") {
        None => PaperSize::A4,
        Some(value) => value
            .as_str()
            .and_then(PaperSize::from_label)
            .unwrap_or_else(|| {
                tracing::warn!(size = %value, "unknown paper size, using A4");
                PaperSize::A4
            }),
    };
    let rotated = flag("rotated");

    let (pw, ph) = size.px(scale);
    let (dw, dh) = if rotated { (ph, pw) } else { (pw, ph) };

    let id = match fields.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() && !taken.contains(id) => id.to_string(),
        other => {
            let fresh = fresh_id(taken, rng);
            if let Some(old) = other {
                tracing::warn!(old = %old, new = %fresh, "replacing missing or duplicate tile id");
            }
            fresh
        }
    };

    Tile {
        id,
        size,
        x: number("x").unwrap_or(0.0),
        y: number("y").unwrap_or(0.0),
        w: number("w").unwrap_or(dw),
        h: number("h").unwrap_or(dh),
        rotated,
        img: fields.get("img").and_then(Value::as_str).map(str::to_string),
        show_controls: flag("showControls"),
    }
}

/// Generate an id not present in `taken`
pub fn fresh_id<R: Rng + ?Sized>(taken: &HashSet<String>, rng: &mut R) -> String {
    loop {
        let id = generate_id(rng);
        if !taken.contains(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_export_uses_two_space_indent() {
        let tiles = vec![Tile::new("a".into(), PaperSize::A4, 0.0, 0.0, 3.0)];
        let json = to_json(&tiles).unwrap();
        assert!(json.starts_with("[\n  {\n    \"id\": \"a\""));
    }

    #[test]
    fn test_round_trip_keeps_every_field() {
        let mut tile = Tile::new("abc".into(), PaperSize::A3, 30.0, 45.0, 3.0);
        tile.rotated = true;
        std::mem::swap(&mut tile.w, &mut tile.h);
        tile.img = Some("data:image/png;base64,AAAA".into());
        let tiles = vec![tile, Tile::new("def".into(), PaperSize::A6, 0.0, 15.0, 3.0)];

        let json = to_json(&tiles).unwrap();
        let back = parse(&json, 3.0, &mut rng()).unwrap();

        assert_eq!(back, tiles);
    }

    #[test]
    fn test_invalid_text_is_invalid_json() {
        let err = parse("{not json", 3.0, &mut rng()).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidJson(_)));
        assert_eq!(err.to_string(), "Invalid JSON file");
    }

    #[test]
    fn test_non_array_roots_are_lenient() {
        let tiles = parse("{\"id\": \"x\", \"size\": \"A6\"}", 3.0, &mut rng()).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].id, "x");
        assert_eq!(tiles[0].size, PaperSize::A6);

        assert!(parse("42", 3.0, &mut rng()).unwrap().is_empty());
        assert!(parse("null", 3.0, &mut rng()).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_typed_fields_fall_back() {
        let text = r#"[
            "not a tile",
            {"id": 7, "size": 4, "x": "10", "y": 12.5, "w": null, "rotated": "yes", "img": false}
        ]"#;
        let tiles = parse(text, 1.0, &mut rng()).unwrap();
        assert_eq!(tiles.len(), 1);
        let tile = &tiles[0];
        assert_eq!(tile.size, PaperSize::A4);
        assert_eq!((tile.x, tile.y), (0.0, 12.5));
        assert!((tile.w - 21.0).abs() < 1e-4);
        assert!(!tile.rotated);
        assert!(tile.img.is_none());
        assert_eq!(tile.id.len(), 8);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let tiles = parse("[{\"size\": \"A5\", \"rotated\": true}]", 2.0, &mut rng()).unwrap();
        assert_eq!(tiles.len(), 1);
        let tile = &tiles[0];
        assert_eq!(tile.size, PaperSize::A5);
        assert_eq!((tile.x, tile.y), (0.0, 0.0));
        // rotated without explicit size: landscape dimensions
        assert!((tile.w - 42.0).abs() < 1e-4);
        assert!((tile.h - 29.6).abs() < 1e-4);
        assert!(!tile.id.is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_replaced() {
        let text = r#"[
            {"id": "same", "size": "A4", "x": 0, "y": 0, "w": 1, "h": 1, "rotated": false},
            {"id": "same", "size": "A4", "x": 5, "y": 5, "w": 1, "h": 1, "rotated": false}
        ]"#;
        let tiles = parse(text, 1.0, &mut rng()).unwrap();
        assert_eq!(tiles[0].id, "same");
        assert_ne!(tiles[1].id, "same");
        assert_eq!(tiles[1].x, 5.0);
    }

    #[test]
    fn test_unknown_paper_size_defaults_to_a4() {
        let tiles = parse("[{\"size\": \"B4\", \"x\": 3}]", 1.0, &mut rng()).unwrap();
        assert_eq!(tiles[0].size, PaperSize::A4);
        assert_eq!(tiles[0].x, 3.0);
        assert!((tiles[0].h - 29.7).abs() < 1e-4);
    }
}
