use std::collections::{HashMap, HashSet};

use image::RgbaImage;

use crate::transform::Transformer;

/// World-space point (map millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// World-space position plus heading in degrees, normalized to [0, 180).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

/// A detected room: bounding box in world coordinates plus optional metadata
/// attached from the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: i64,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub name: Option<String>,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
}

impl Room {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64, id: i64) -> Self {
        Self { id, x0, y0, x1, y1, name: None, pos_x: None, pos_y: None }
    }
}

/// Virtual wall segment in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// 4-corner restricted region (no-go or no-mop).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub points: [Point; 4],
}

/// Axis-aligned cleaning zone defined by two corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Ordered sequence of travelled points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub points: Vec<Point>,
}

/// Classifier output image with the raw-map dimensions it was built from.
/// The image itself is owned here but opaque to the decode core; the
/// renderer collaborator paints overlays onto it, using the embedded
/// transformer to project world coordinates onto pixels.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub pixel_count: usize,
    pub width: u32,
    pub height: u32,
    pub image: RgbaImage,
    pub transformer: Transformer,
}

impl ImageData {
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}

/// Fully assembled map model.
///
/// Every field is optional or an empty collection when the payload does not
/// carry it; a default `MapData` is the valid "robot has not mapped yet"
/// state.
#[derive(Debug, Clone, Default)]
pub struct MapData {
    pub image: Option<ImageData>,
    pub rooms: HashMap<i64, Room>,
    pub cleaned_rooms: HashSet<i64>,
    pub charger: Option<Pose>,
    pub vacuum_position: Option<Pose>,
    pub path: Option<Path>,
    pub mop_path: Option<Path>,
    pub walls: Vec<Wall>,
    pub no_go_areas: Vec<Area>,
    pub no_mopping_areas: Vec<Area>,
    pub zones: Vec<Zone>,
}
