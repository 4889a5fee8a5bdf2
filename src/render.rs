use image::RgbaImage;

use crate::model::MapData;

/// Rendering collaborator. The decode core produces the classified base
/// image and the map model; a renderer paints overlays (paths, zones,
/// labels) on top of it.
pub trait Renderer {
    /// Placeholder image used when classification produced no drawable
    /// pixels (for example when trimming consumed the whole map).
    fn create_empty_map_image(&self) -> RgbaImage;

    /// Paint overlays onto `map_data.image`. Invoked exactly once per
    /// successful parse that produced a non-empty image.
    fn draw_map(&self, map_data: &mut MapData);
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn create_empty_map_image(&self) -> RgbaImage {
        (**self).create_empty_map_image()
    }

    fn draw_map(&self, map_data: &mut MapData) {
        (**self).draw_map(map_data)
    }
}

/// Renderer that draws nothing. Decoding with it yields the bare classified
/// image and model, which is all automation consumers need.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn create_empty_map_image(&self) -> RgbaImage {
        RgbaImage::new(0, 0)
    }

    fn draw_map(&self, _map_data: &mut MapData) {}
}
