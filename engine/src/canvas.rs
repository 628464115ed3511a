use crate::blend::CompositeOp;
use crate::error::{Result, ViewerError};
use image::RgbaImage;
use tiny_skia::{ColorU8, FilterQuality, Pixmap, PixmapPaint, Transform};

/// A premultiplied raster paint target with canvas-style paint state.
///
/// `draw_pixmap` combines the source with the current global alpha and
/// composite operation, the same way a 2D canvas context does.
#[derive(Clone, Debug)]
pub struct Canvas {
    pixmap: Pixmap,
    paint: PixmapPaint,
}

impl Canvas {
    /// A fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| ViewerError::resource(format!("cannot allocate a {}x{} canvas", width, height)))?;
        let paint = PixmapPaint { quality: FilterQuality::Nearest, ..PixmapPaint::default() };
        Ok(Canvas { pixmap, paint })
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        // Canvas ignores out-of-range alpha rather than clamping it.
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.paint.opacity = alpha;
        }
    }

    pub fn set_global_composite_operation(&mut self, op: CompositeOp) {
        self.paint.blend_mode = op.skia_blend_mode();
    }

    /// Draws `src` with its top-left corner at `(dx, dy)`, clipped to the canvas.
    pub fn draw_pixmap(&mut self, src: &Pixmap, dx: i32, dy: i32) {
        self.pixmap.draw_pixmap(dx, dy, src.as_ref(), &self.paint, Transform::identity(), None);
    }

    pub fn draw_canvas(&mut self, src: &Canvas, dx: i32, dy: i32) {
        self.draw_pixmap(&src.pixmap, dx, dy);
    }

    /// Straight-alpha copy of the canvas contents.
    pub fn into_image(self) -> RgbaImage {
        to_image(&self.pixmap)
    }
}

/// Premultiplies a decoded image into a pixmap.
pub fn to_pixmap(image: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())
        .ok_or_else(|| ViewerError::resource(format!("cannot allocate a {}x{} pixmap", image.width(), image.height())))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

pub fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let pixels = pixmap.pixels();
    RgbaImage::from_fn(width, pixmap.height(), |x, y| {
        let c = pixels[(y * width + x) as usize].demultiply();
        image::Rgba([c.red(), c.green(), c.blue(), c.alpha()])
    })
}
