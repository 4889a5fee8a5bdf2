use crate::model::Point;

/// Map header derived from the payload: pixel dimensions plus world-space
/// bounds. Built once per parse and passed by reference; `max_x`/`max_y`
/// follow from the origin, dimensions and resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapHeader {
    pub map_id: i64,
    pub size_x: u32,
    pub size_y: u32,
    /// Millimeters of world space per pixel. Must be positive.
    pub resolution: f64,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl MapHeader {
    pub fn new(map_id: i64, size_x: u32, size_y: u32, resolution: f64, min_x: f64, min_y: f64) -> Self {
        Self {
            map_id,
            size_x,
            size_y,
            resolution,
            min_x,
            min_y,
            max_x: min_x + size_x as f64 * resolution,
            max_y: min_y + size_y as f64 * resolution,
        }
    }
}

/// Linear world↔image coordinate transform for one map header.
///
/// Stateless once constructed. A zero-area header would divide by zero in
/// the scale factors; callers must not build a Transformer for one.
#[derive(Debug, Clone, Copy)]
pub struct Transformer {
    min_x: f64,
    min_y: f64,
    to_image_x: f64,
    to_image_y: f64,
}

impl Transformer {
    pub fn new(header: &MapHeader) -> Self {
        Self {
            min_x: header.min_x,
            min_y: header.min_y,
            to_image_x: header.size_x as f64 / (header.max_x - header.min_x),
            to_image_y: header.size_y as f64 / (header.max_y - header.min_y),
        }
    }

    pub fn map_to_image(&self, pt: Point) -> Point {
        Point {
            x: (pt.x - self.min_x) * self.to_image_x,
            y: (pt.y - self.min_y) * self.to_image_y,
        }
    }

    pub fn image_to_map_x(&self, x: f64) -> f64 {
        x / self.to_image_x + self.min_x
    }

    pub fn image_to_map_y(&self, y: f64) -> f64 {
        y / self.to_image_y + self.min_y
    }
}
