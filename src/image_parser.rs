use std::collections::{HashMap, HashSet};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{debug, warn};

use crate::config::ImageConfig;
use crate::error::{Error, Result};
use crate::model::Point;
use crate::palette::{Palette, SupportedColor};

// Pixel values in the classifier's alphabet.
pub const MAP_OUTSIDE: u8 = 0x00;
pub const MAP_WALL: u8 = 128;
pub const MAP_INSIDE: u8 = 127;
pub const MAP_SCAN: u8 = 0x01;
pub const MAP_NEW_DISCOVERED_AREA: u8 = 0x02;
pub const MAP_ROOM_MIN: u8 = 10;
pub const MAP_ROOM_MAX: u8 = 59;
// Rooms currently being cleaned carry their number offset by +50.
pub const MAP_SELECTED_ROOM_MIN: u8 = 60;
pub const MAP_SELECTED_ROOM_MAX: u8 = 109;

/// Axis-aligned bounding box in untrimmed pixel coordinates. Grows
/// monotonically as room pixels are scanned; never shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelBounds {
    fn at(x: u32, y: u32) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y }
    }

    fn expand(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Result of one classification pass over a raw pixel buffer.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedImage {
    /// None when trimming consumed the whole map.
    pub image: Option<RgbaImage>,
    /// Room bounding boxes keyed by pixel room number (10..=59).
    pub rooms: HashMap<u8, PixelBounds>,
    /// Pixel room numbers observed in the currently-cleaned band.
    pub cleaned_areas: HashSet<u8>,
    /// Raw values that matched no known pixel class. Diagnostic, non-fatal.
    pub unknown_pixels: HashSet<u8>,
}

/// Single-pass pixel classifier and room region extractor.
pub struct ImageParser<P> {
    palette: P,
    config: ImageConfig,
}

impl<P: Palette> ImageParser<P> {
    pub fn new(palette: P, config: ImageConfig) -> Self {
        Self { palette, config }
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// Classify every pixel of a `width` x `height` buffer, accumulating
    /// per-room bounding boxes and the cleaned-room set.
    ///
    /// The buffer is row-major with the origin at the bottom-left in world
    /// orientation; output rows are written top-down, so the scan flips
    /// vertically. Room bounds are reported in untrimmed buffer coordinates.
    pub fn parse(&self, map_data: &[u8], width: u32, height: u32) -> Result<ClassifiedImage> {
        let need = width as usize * height as usize;
        if map_data.len() < need {
            return Err(Error::PixelBufferSize { need, have: map_data.len() });
        }

        let trim = &self.config.trim;
        let trim_left = (trim.left * width as f64 / 100.0) as u32;
        let trim_right = (trim.right * width as f64 / 100.0) as u32;
        let trim_top = (trim.top * height as f64 / 100.0) as u32;
        let trim_bottom = (trim.bottom * height as f64 / 100.0) as u32;

        let trimmed_width = width.saturating_sub(trim_left + trim_right);
        let trimmed_height = height.saturating_sub(trim_top + trim_bottom);
        debug!(trim_left, trim_right, trim_top, trim_bottom, trimmed_width, trimmed_height, "classifying map pixels");

        if trimmed_width == 0 || trimmed_height == 0 {
            return Ok(ClassifiedImage::default());
        }

        let mut image = RgbaImage::new(trimmed_width, trimmed_height);
        let mut rooms: HashMap<u8, PixelBounds> = HashMap::new();
        let mut cleaned_areas = HashSet::new();
        let mut unknown_pixels = HashSet::new();

        for img_y in 0..trimmed_height {
            // The raw buffer runs bottom-up; image rows run top-down.
            let out_y = trimmed_height - 1 - img_y;

            for img_x in 0..trimmed_width {
                let index = ((img_y + trim_bottom) * width + img_x + trim_left) as usize;
                let value = map_data[index];

                let color = match value {
                    MAP_OUTSIDE => self.palette.color(SupportedColor::Outside),
                    MAP_SCAN => self.palette.color(SupportedColor::Scan),
                    MAP_NEW_DISCOVERED_AREA => self.palette.color(SupportedColor::NewDiscoveredArea),
                    MAP_INSIDE => self.palette.color(SupportedColor::Inside),
                    MAP_WALL => self.palette.color(SupportedColor::Wall),
                    MAP_ROOM_MIN..=MAP_SELECTED_ROOM_MAX => {
                        let room_number = if value >= MAP_SELECTED_ROOM_MIN {
                            let folded = value - MAP_SELECTED_ROOM_MIN + MAP_ROOM_MIN;
                            cleaned_areas.insert(folded);
                            folded
                        } else {
                            value
                        };

                        // Bounds live in untrimmed buffer coordinates.
                        let room_x = img_x + trim_left;
                        let room_y = img_y + trim_bottom;
                        rooms
                            .entry(room_number)
                            .and_modify(|bounds| bounds.expand(room_x, room_y))
                            .or_insert_with(|| PixelBounds::at(room_x, room_y));

                        self.palette.room_color(room_number)
                    }
                    _ => {
                        unknown_pixels.insert(value);
                        debug!(x = img_x, y = out_y, value, "unknown pixel");
                        self.palette.color(SupportedColor::Unknown)
                    }
                };

                image.put_pixel(img_x, out_y, color);
            }
        }

        // Nearest neighbor only: region boundaries must stay crisp.
        let scale = self.config.scale;
        let image = if scale != 1.0 {
            imageops::resize(
                &image,
                (trimmed_width as f64 * scale) as u32,
                (trimmed_height as f64 * scale) as u32,
                FilterType::Nearest,
            )
        } else {
            image
        };

        if !unknown_pixels.is_empty() {
            warn!(?unknown_pixels, "unknown pixel types");
        }

        Ok(ClassifiedImage { image: Some(image), rooms, cleaned_areas, unknown_pixels })
    }
}

/// Look up which room the vacuum stands in, applying the same folding rule
/// as the full scan. `None` when it is on a wall, outside, or on floor that
/// belongs to no room.
pub fn current_vacuum_room(map_data: &[u8], position_on_image: Point, image_width: u32) -> Option<u8> {
    let index = position_on_image.y as usize * image_width as usize + position_on_image.x as usize;
    let value = *map_data.get(index)?;

    match value {
        MAP_ROOM_MIN..=MAP_ROOM_MAX => Some(value),
        MAP_SELECTED_ROOM_MIN..=MAP_SELECTED_ROOM_MAX => {
            Some(value - MAP_SELECTED_ROOM_MIN + MAP_ROOM_MIN)
        }
        _ => None,
    }
}
