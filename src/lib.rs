//! Robot Vacuum Map Decoder
//!
//! A Rust library for decoding encrypted robot-vacuum map payloads into a
//! structured, renderable map model: a pixel-classified floor plan, room
//! boundaries, the vacuum's pose, cleaning history and user-defined
//! zones/barriers.
//!
//! The pipeline is decrypt → inflate → classify → assemble:
//!
//! ```no_run
//! use vacuum_map::{ImageConfig, MapDataParser};
//!
//! # fn main() -> vacuum_map::Result<()> {
//! # let raw_payload: &[u8] = &[];
//! let parser = MapDataParser::new(ImageConfig::default());
//! let json = parser.unpack_map(raw_payload, "model-key", "device-id")?;
//! let map = parser.parse(json)?;
//! println!("rooms: {}", map.rooms.len());
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod config;
pub mod error;
pub mod image_parser;
pub mod inflate;
pub mod model;
pub mod palette;
pub mod parser;
pub mod render;
pub mod transform;

pub use error::{Error, Result};
pub use cipher::{decrypt, derive_key, unpack_map};
pub use config::{ImageConfig, TrimConfig};
pub use image_parser::{current_vacuum_room, ClassifiedImage, ImageParser, PixelBounds};
pub use inflate::{inflate, inflate_text};
pub use model::{
    Area, ImageData, MapData, Path, Point, Pose, Room, Wall, Zone,
};
pub use palette::{DefaultPalette, Palette, SupportedColor};
pub use parser::{room_number_to_grid_id, yaw_to_degrees, MapDataParser, RawInput};
pub use render::{NoopRenderer, Renderer};
pub use transform::{MapHeader, Transformer};
