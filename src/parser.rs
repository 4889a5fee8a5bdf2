use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cipher;
use crate::config::ImageConfig;
use crate::error::{Error, Result};
use crate::image_parser::{ImageParser, MAP_INSIDE, MAP_OUTSIDE, MAP_ROOM_MIN, MAP_WALL};
use crate::inflate::inflate_bytes;
use crate::model::{Area, ImageData, MapData, Path, Point, Pose, Room, Wall, Zone};
use crate::palette::{DefaultPalette, Palette};
use crate::render::{NoopRenderer, Renderer};
use crate::transform::{MapHeader, Transformer};

/// Decrypted map payload: either the JSON text straight out of
/// [`cipher::unpack_map`] or an already-parsed structure.
#[derive(Debug, Clone)]
pub enum RawInput {
    Text(String),
    Structured(Value),
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Value> for RawInput {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

/// Convert a pixel room number (10..=59) into the payload's grid id space
/// (3 and up).
pub fn room_number_to_grid_id(room_number: u8) -> i64 {
    room_number as i64 - MAP_ROOM_MIN as i64 + 3
}

/// Normalize a heading to degrees in [0, 180).
///
/// Firmwares disagree on the unit: values within [-2π, 2π] are radians,
/// values beyond 180 are centi-degrees, the rest are already degrees. The
/// boundary between radians and degrees is inherently ambiguous (a literal
/// 6.0 is always read as radians); the heuristic is preserved as-is for
/// device compatibility.
pub fn yaw_to_degrees(yaw: Option<&Value>) -> f64 {
    let Some(value) = yaw.and_then(json_f64) else {
        return 0.0;
    };

    if value.abs() <= 2.0 * std::f64::consts::PI + 0.001 {
        return value.to_degrees();
    }
    if value.abs() > 180.0 {
        return (value / 100.0).rem_euclid(180.0);
    }
    value.rem_euclid(180.0)
}

/// Map payload decoder: normalizes the pixel encoding, runs the classifier,
/// reconciles the three room-id spaces and assembles the [`MapData`] model.
pub struct MapDataParser<P = DefaultPalette, R = NoopRenderer> {
    image_parser: ImageParser<P>,
    renderer: R,
}

impl MapDataParser<DefaultPalette, NoopRenderer> {
    /// Parser with the built-in palette and no overlay rendering.
    pub fn new(config: ImageConfig) -> Self {
        Self::with_collaborators(DefaultPalette, config, NoopRenderer)
    }
}

impl Default for MapDataParser<DefaultPalette, NoopRenderer> {
    fn default() -> Self {
        Self::new(ImageConfig::default())
    }
}

impl<P: Palette, R: Renderer> MapDataParser<P, R> {
    pub fn with_collaborators(palette: P, config: ImageConfig, renderer: R) -> Self {
        Self { image_parser: ImageParser::new(palette, config), renderer }
    }

    /// Decrypt and inflate a raw encrypted payload into its JSON text.
    pub fn unpack_map(&self, raw: &[u8], model_key: &str, device_id: &str) -> Result<String> {
        cipher::unpack_map(raw, model_key, device_id)
    }

    /// Parse a decrypted payload into the map model.
    pub fn parse(&self, raw: impl Into<RawInput>) -> Result<MapData> {
        let payload = match raw.into() {
            RawInput::Text(text) => serde_json::from_str::<Value>(&text)
                .map_err(|e| Error::MalformedPayload(e.to_string()))?,
            RawInput::Structured(value) => value,
        };

        match payload.as_object() {
            Some(object) => self.parse_payload(object),
            None => Err(Error::UnsupportedInputType(json_type_name(&payload))),
        }
    }

    fn parse_payload(&self, payload: &Map<String, Value>) -> Result<MapData> {
        let map_id = payload.get("map_id").and_then(json_i64).unwrap_or(0);

        // Absent pixel data is the valid "robot has not mapped yet" state.
        let (Some(width), Some(height), Some(raw_map_data)) = (
            payload.get("width").filter(|v| !v.is_null()),
            payload.get("height").filter(|v| !v.is_null()),
            payload.get("map_data").and_then(Value::as_str).filter(|s| !s.is_empty()),
        ) else {
            debug!("map payload missing map_data/width/height");
            return Ok(MapData::default());
        };

        let width = dimension(width, "width")?;
        let height = dimension(height, "height")?;
        let resolution = match payload.get("resolution") {
            None | Some(Value::Null) => 50.0,
            Some(v) => json_f64(v)
                .filter(|r| *r > 0.0)
                .ok_or_else(|| Error::MalformedPayload("invalid resolution".into()))?,
        };
        let origin_x = payload.get("origin_x").and_then(json_f64).unwrap_or(0.0);
        let origin_y = payload.get("origin_y").and_then(json_f64).unwrap_or(0.0);

        let map_bytes = decode_map_blob(raw_map_data, width, height)?;

        let header = MapHeader::new(map_id, width, height, resolution, origin_x, origin_y);
        let transformer = Transformer::new(&header);

        let normalized = normalize_map_pixels(&map_bytes);
        let classified = self.image_parser.parse(&normalized, width, height)?;

        let mut map_data = MapData::default();
        let image = match classified.image {
            Some(image) => image,
            None => self.renderer.create_empty_map_image(),
        };
        map_data.image = Some(ImageData {
            pixel_count: width as usize * height as usize,
            width,
            height,
            image,
            transformer,
        });

        let (grid_to_room, room_to_grid) = room_id_tables(payload.get("map_room_info"));

        for (&room_number, bounds) in &classified.rooms {
            let grid_id = room_number_to_grid_id(room_number);
            let room_id = grid_to_room.get(&grid_id).copied().unwrap_or(grid_id);
            map_data.rooms.insert(
                room_id,
                Room::new(
                    transformer.image_to_map_x(bounds.min_x as f64),
                    transformer.image_to_map_y(bounds.min_y as f64),
                    transformer.image_to_map_x(bounds.max_x as f64),
                    transformer.image_to_map_y(bounds.max_y as f64),
                    room_id,
                ),
            );
        }

        attach_room_attrs(
            &mut map_data.rooms,
            payload.get("room_attrs"),
            &grid_to_room,
            &room_to_grid,
        );

        map_data.cleaned_rooms = classified
            .cleaned_areas
            .iter()
            .map(|&room_number| {
                let grid_id = room_number_to_grid_id(room_number);
                grid_to_room.get(&grid_id).copied().unwrap_or(grid_id)
            })
            .collect();

        // "Pile" is the vendor term for the charging dock.
        if payload.get("have_pile").map(json_truthy).unwrap_or(false) {
            map_data.charger = Some(Pose {
                x: payload.get("pile_x").and_then(json_f64).unwrap_or(0.0),
                y: payload.get("pile_y").and_then(json_f64).unwrap_or(0.0),
                angle: yaw_to_degrees(payload.get("pile_yaw")),
            });
        }

        if let Some(position) = payload.get("position").and_then(Value::as_object) {
            map_data.vacuum_position = Some(Pose {
                x: position.get("x").and_then(json_f64).unwrap_or(0.0),
                y: position.get("y").and_then(json_f64).unwrap_or(0.0),
                angle: yaw_to_degrees(position.get("yaw")),
            });
        }

        let (path, mop_path) = build_paths(payload.get("paths"));
        map_data.path = path;
        map_data.mop_path = mop_path;

        build_forbidden_regions(&mut map_data, payload.get("fb_regions"));
        map_data.zones = build_zones(
            payload.get("current_cleaning_config").and_then(|c| c.get("zones")),
        );

        let has_image = map_data.image.as_ref().is_some_and(|i| !i.is_empty());
        if has_image {
            self.renderer.draw_map(&mut map_data);
        }

        Ok(map_data)
    }
}

fn dimension(value: &Value, field: &str) -> Result<u32> {
    json_i64(value)
        .filter(|d| *d > 0)
        .and_then(|d| u32::try_from(d).ok())
        .ok_or_else(|| Error::MalformedPayload(format!("invalid {field}")))
}

fn decode_map_blob(raw: &str, width: u32, height: u32) -> Result<Vec<u8>> {
    let compressed = BASE64
        .decode(raw.trim())
        .map_err(|e| Error::MapDataCorrupt(format!("base64: {e}")))?;
    let map_bytes = inflate_bytes(&compressed)
        .map_err(|e| Error::MapDataCorrupt(e.to_string()))?;

    let need = width as usize * height as usize;
    if map_bytes.len() < need {
        return Err(Error::MapDataCorrupt(format!(
            "pixel buffer too short: need {need} bytes, have {}",
            map_bytes.len()
        )));
    }
    Ok(map_bytes)
}

/// Remap the payload's native pixel alphabet into the classifier's:
/// 0 stays outside, 1/2 are floor, 3..=63 are rooms (offset onto 10..),
/// everything else is a wall.
fn normalize_map_pixels(raw: &[u8]) -> Vec<u8> {
    raw.iter()
        .map(|&value| match value {
            0 => MAP_OUTSIDE,
            1 | 2 => MAP_INSIDE,
            3..=63 => MAP_ROOM_MIN + (value - 3),
            _ => MAP_WALL,
        })
        .collect()
}

/// Build the bidirectional grid-id ↔ room-id tables from `map_room_info`.
/// Entries with missing or non-numeric ids are skipped.
fn room_id_tables(info: Option<&Value>) -> (HashMap<i64, i64>, HashMap<i64, i64>) {
    let mut grid_to_room = HashMap::new();
    let mut room_to_grid = HashMap::new();

    for entry in info.and_then(Value::as_array).into_iter().flatten() {
        let Some(entry) = entry.as_object() else { continue };
        let (Some(grid_id), Some(room_id)) = (
            entry.get("grid_id").and_then(json_i64),
            entry.get("room_id").and_then(json_i64),
        ) else {
            continue;
        };
        grid_to_room.insert(grid_id, room_id);
        room_to_grid.insert(room_id, grid_id);
    }

    (grid_to_room, room_to_grid)
}

/// Attach names and label positions from `room_attrs`.
///
/// The id field and its meaning vary across firmwares: the entry id may be
/// a room id or a grid id under any of three keys. Resolution tries the id
/// as-is, then as a grid id, then as a room id; entries that resolve to no
/// known room are dropped.
fn attach_room_attrs(
    rooms: &mut HashMap<i64, Room>,
    attrs: Option<&Value>,
    grid_to_room: &HashMap<i64, i64>,
    room_to_grid: &HashMap<i64, i64>,
) {
    for attr in attrs.and_then(Value::as_array).into_iter().flatten() {
        let Some(attr) = attr.as_object() else { continue };

        let id = ["room_id", "grid_id", "id"]
            .iter()
            .find_map(|key| attr.get(*key).filter(|v| !v.is_null()));
        let Some(id) = id.and_then(json_i64) else {
            debug!("room_attrs entry without a numeric id");
            continue;
        };

        let target = if rooms.contains_key(&id) {
            Some(id)
        } else if let Some(mapped) = grid_to_room.get(&id).filter(|m| rooms.contains_key(m)) {
            Some(*mapped)
        } else {
            room_to_grid.get(&id).filter(|m| rooms.contains_key(m)).copied()
        };

        let Some(room) = target.and_then(|target| rooms.get_mut(&target)) else {
            debug!(id, "room_attrs entry matches no detected room");
            continue;
        };
        room.name = attr
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| attr.get("room_name").and_then(Value::as_str).filter(|s| !s.is_empty()))
            .map(str::to_owned);
        room.pos_x = match attr.get("text_x") {
            Some(v) => json_f64(v),
            None => attr.get("name_pos_x").and_then(json_f64),
        };
        room.pos_y = match attr.get("text_y") {
            Some(v) => json_f64(v),
            None => attr.get("name_pos_y").and_then(json_f64),
        };
    }
}

/// Build the travel path and its mopping subsequence. `paths` is either an
/// object with a `points` array or a bare array of points.
fn build_paths(paths: Option<&Value>) -> (Option<Path>, Option<Path>) {
    let points_src = match paths {
        Some(Value::Object(object)) => object.get("points").and_then(Value::as_array),
        Some(Value::Array(array)) => Some(array),
        _ => None,
    };
    let Some(points_src) = points_src else {
        return (None, None);
    };

    let mut points = Vec::new();
    let mut mop_points = Vec::new();
    for entry in points_src {
        let Some(entry) = entry.as_object() else { continue };
        let point = Point {
            x: entry.get("x").and_then(json_f64).unwrap_or(0.0),
            y: entry.get("y").and_then(json_f64).unwrap_or(0.0),
        };
        // Points carrying the mop-mode marker form the mopping path.
        if entry.contains_key("sweep_mop_mode") {
            mop_points.push(point);
        }
        points.push(point);
    }

    (
        (!points.is_empty()).then(|| Path { points }),
        (!mop_points.is_empty()).then(|| Path { points: mop_points }),
    )
}

/// Sort `fb_regions` (forbidden regions) into virtual walls, no-go areas
/// and no-mop areas. Entries need exactly 4 well-formed points; anything
/// else is skipped.
fn build_forbidden_regions(map_data: &mut MapData, regions: Option<&Value>) {
    for region in regions.and_then(Value::as_array).into_iter().flatten() {
        let Some(region) = region.as_object() else { continue };
        let Some(points) = region.get("points").and_then(Value::as_array) else { continue };
        if points.len() != 4 {
            debug!("fb_region without exactly 4 points");
            continue;
        }

        let corners: Option<Vec<Point>> = points
            .iter()
            .map(|point| {
                let point = point.as_object()?;
                Some(Point {
                    x: json_f64(point.get("x")?)?,
                    y: json_f64(point.get("y")?)?,
                })
            })
            .collect();
        let Some(corners) = corners else {
            debug!("fb_region with malformed points");
            continue;
        };

        match region.get("type").and_then(Value::as_str) {
            // A virtual wall runs between two opposite corners.
            Some("wall") => map_data.walls.push(Wall {
                x0: corners[0].x,
                y0: corners[0].y,
                x1: corners[2].x,
                y1: corners[2].y,
            }),
            Some("no_go") => map_data
                .no_go_areas
                .push(Area { points: [corners[0], corners[1], corners[2], corners[3]] }),
            Some("no_mop") => map_data
                .no_mopping_areas
                .push(Area { points: [corners[0], corners[1], corners[2], corners[3]] }),
            other => debug!(?other, "fb_region with unknown type"),
        }
    }
}

/// Rectangular cleaning zones from two-corner entries.
fn build_zones(zones: Option<&Value>) -> Vec<Zone> {
    let mut out = Vec::new();
    for zone in zones.and_then(Value::as_array).into_iter().flatten() {
        let Some(zone) = zone.as_object() else { continue };
        let corners = ["x1", "y1", "x2", "y2"]
            .map(|key| zone.get(key).and_then(json_f64));
        let [Some(x0), Some(y0), Some(x1), Some(y1)] = corners else {
            debug!("zone entry with missing corners");
            continue;
        };
        out.push(Zone { x0, y0, x1, y1 });
    }
    out
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Lenient numeric read: JSON numbers, numeric strings and booleans all
/// count, matching how loosely firmwares type these fields.
fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(u8::from(*b) as f64),
        _ => None,
    }
}

fn json_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
