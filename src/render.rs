//! Drawing decoded frames onto a fixed-size surface.

use crate::geometry::{cover_crop, Rect, SourceRect};
use crate::RenderError;

/// A decoded image with known natural dimensions.
pub trait FrameImage {
    /// Natural width in pixels.
    fn width(&self) -> u32;
    /// Natural height in pixels.
    fn height(&self) -> u32;
}

/// A drawing surface with a fixed backing store.
///
/// The player sets the backing size once, at construction, and never
/// resizes it afterwards.
pub trait Surface {
    /// Image type this surface can draw
    type Image: FrameImage;

    /// Size in logical (CSS) pixels, used when no explicit size is configured.
    fn logical_size(&self) -> (u32, u32);

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Resize the backing store to `width` x `height` physical pixels.
    fn set_backing_size(&mut self, width: u32, height: u32);

    /// Backing store size in physical pixels.
    fn backing_size(&self) -> (u32, u32);

    /// Erase `rect` to transparent.
    fn clear(&mut self, rect: Rect) -> Result<(), RenderError>;

    /// Draw the `source` region of `image` scaled into `dest`.
    ///
    /// Parts of `source` outside the image are clipped, and `dest` shrinks
    /// by the same proportion, as the canvas `drawImage` call does.
    fn draw_image(&mut self, image: &Self::Image, source: Rect, dest: Rect) -> Result<(), RenderError>;
}

/// Platform-agnostic description of one frame draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPlan {
    /// Area erased before drawing
    pub clear: Rect,
    /// Region of the image to sample
    pub source: SourceRect,
    /// Area of the surface to fill
    pub dest: Rect,
}

/// Plan a cover-fit draw of a `image_width`x`image_height` image onto the
/// whole `surface_width`x`surface_height` backing store.
///
/// ## Example
///
/// ```rust
/// use frameseq_player::render::plan_frame;
///
/// let plan = plan_frame(800, 600, 400, 400).unwrap();
/// assert_eq!(plan.dest, plan.clear);
/// assert_eq!(plan.dest.width, 400.0);
/// assert_eq!(plan.source.sy, 0.0);
/// ```
pub fn plan_frame(
    image_width: u32,
    image_height: u32,
    surface_width: u32,
    surface_height: u32,
) -> Result<RenderPlan, RenderError> {
    if image_width == 0 || image_height == 0 {
        return Err(RenderError::EmptyImage {
            width: image_width,
            height: image_height,
        });
    }
    let (w, h) = (surface_width as f64, surface_height as f64);
    let dest = Rect::from_size(w, h);
    Ok(RenderPlan {
        clear: dest,
        source: cover_crop(image_width as f64, image_height as f64, w, h),
        dest,
    })
}

/// Clear the surface and draw `image` cover-fitted onto it.
pub fn render_frame<S: Surface>(surface: &mut S, image: &S::Image) -> Result<RenderPlan, RenderError> {
    let (width, height) = surface.backing_size();
    let plan = plan_frame(image.width(), image.height(), width, height)?;
    surface.clear(plan.clear)?;
    surface.draw_image(image, plan.source.to_rect(), plan.dest)?;
    Ok(plan)
}

/// Web-specific rendering implementation.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use wasm_bindgen::JsCast;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

    impl FrameImage for HtmlImageElement {
        fn width(&self) -> u32 {
            self.natural_width()
        }

        fn height(&self) -> u32 {
            self.natural_height()
        }
    }

    /// An HTML canvas with its 2d context.
    #[derive(Clone, Debug)]
    pub struct CanvasSurface {
        canvas: HtmlCanvasElement,
        context: CanvasRenderingContext2d,
    }

    impl CanvasSurface {
        /// Wrap `canvas` and acquire its 2d context.
        pub fn new(canvas: HtmlCanvasElement) -> Result<Self, RenderError> {
            let context = canvas
                .get_context("2d")
                .map_err(|_| RenderError::Backend("Failed to get 2d context".into()))?
                .ok_or_else(|| RenderError::Backend("No 2d context available".into()))?
                .dyn_into::<CanvasRenderingContext2d>()
                .map_err(|_| RenderError::Backend("Failed to cast to CanvasRenderingContext2d".into()))?;
            Ok(Self { canvas, context })
        }

        /// The underlying canvas element.
        pub fn canvas(&self) -> &HtmlCanvasElement {
            &self.canvas
        }
    }

    impl Surface for CanvasSurface {
        type Image = HtmlImageElement;

        fn logical_size(&self) -> (u32, u32) {
            (
                self.canvas.client_width().max(0) as u32,
                self.canvas.client_height().max(0) as u32,
            )
        }

        fn device_pixel_ratio(&self) -> f64 {
            web_sys::window()
                .map(|window| window.device_pixel_ratio())
                .unwrap_or(1.0)
        }

        fn set_backing_size(&mut self, width: u32, height: u32) {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }

        fn backing_size(&self) -> (u32, u32) {
            (self.canvas.width(), self.canvas.height())
        }

        fn clear(&mut self, rect: Rect) -> Result<(), RenderError> {
            self.context.clear_rect(rect.x, rect.y, rect.width, rect.height);
            Ok(())
        }

        fn draw_image(&mut self, image: &HtmlImageElement, source: Rect, dest: Rect) -> Result<(), RenderError> {
            self.context
                .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    image,
                    source.x,
                    source.y,
                    source.width,
                    source.height,
                    dest.x,
                    dest.y,
                    dest.width,
                    dest.height,
                )
                .map_err(|_| RenderError::Backend("Failed to draw image".into()))
        }
    }
}

/// In-memory RGBA surface backed by the `image` crate.
#[cfg(feature = "raster")]
pub mod raster {
    use super::*;
    use image::imageops::{self, FilterType};
    use image::{Rgba, RgbaImage};

    impl FrameImage for RgbaImage {
        fn width(&self) -> u32 {
            self.dimensions().0
        }

        fn height(&self) -> u32 {
            self.dimensions().1
        }
    }

    /// Off-screen pixel buffer.
    #[derive(Clone, Debug)]
    pub struct RasterSurface {
        buffer: RgbaImage,
        logical: (u32, u32),
        pixel_ratio: f64,
        filter: FilterType,
    }

    impl RasterSurface {
        /// A surface of `width`x`height` logical pixels at density 1.
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                buffer: RgbaImage::new(width, height),
                logical: (width, height),
                pixel_ratio: 1.0,
                filter: FilterType::Triangle,
            }
        }

        /// Scale the backing store by `pixel_ratio`.
        pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
            self.pixel_ratio = pixel_ratio;
            self
        }

        /// Resampling filter used when scaling frames.
        pub fn with_filter(mut self, filter: FilterType) -> Self {
            self.filter = filter;
            self
        }

        /// The rendered pixels.
        pub fn pixels(&self) -> &RgbaImage {
            &self.buffer
        }

        /// Consume the surface, returning its pixels.
        pub fn into_pixels(self) -> RgbaImage {
            self.buffer
        }
    }

    impl Surface for RasterSurface {
        type Image = RgbaImage;

        fn logical_size(&self) -> (u32, u32) {
            self.logical
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.pixel_ratio
        }

        fn set_backing_size(&mut self, width: u32, height: u32) {
            self.buffer = RgbaImage::new(width, height);
        }

        fn backing_size(&self) -> (u32, u32) {
            self.buffer.dimensions()
        }

        fn clear(&mut self, rect: Rect) -> Result<(), RenderError> {
            let (width, height) = self.buffer.dimensions();
            let Some(area) = rect.intersect(&Rect::from_size(width as f64, height as f64)) else {
                return Ok(());
            };
            let (x0, y0) = (area.x.floor() as u32, area.y.floor() as u32);
            let x1 = (area.right().ceil() as u32).min(width);
            let y1 = (area.bottom().ceil() as u32).min(height);
            for y in y0..y1 {
                for x in x0..x1 {
                    self.buffer.put_pixel(x, y, Rgba([0, 0, 0, 0]));
                }
            }
            Ok(())
        }

        fn draw_image(&mut self, image: &RgbaImage, source: Rect, dest: Rect) -> Result<(), RenderError> {
            if source.width <= 0.0 || source.height <= 0.0 {
                return Ok(());
            }
            let (iw, ih) = image.dimensions();
            let Some(visible) = source.intersect(&Rect::from_size(iw as f64, ih as f64)) else {
                return Ok(());
            };

            // Shrink the destination by however much of the source was clipped.
            let scale_x = dest.width / source.width;
            let scale_y = dest.height / source.height;
            let target = Rect::new(
                dest.x + (visible.x - source.x) * scale_x,
                dest.y + (visible.y - source.y) * scale_y,
                visible.width * scale_x,
                visible.height * scale_y,
            );

            let cx = visible.x.floor() as u32;
            let cy = visible.y.floor() as u32;
            let cw = ((visible.right().ceil() as u32).min(iw)).saturating_sub(cx).max(1);
            let ch = ((visible.bottom().ceil() as u32).min(ih)).saturating_sub(cy).max(1);
            let cropped = imageops::crop_imm(image, cx, cy, cw, ch).to_image();

            let tw = target.width.round().max(1.0) as u32;
            let th = target.height.round().max(1.0) as u32;
            let scaled = imageops::resize(&cropped, tw, th, self.filter);
            imageops::overlay(
                &mut self.buffer,
                &scaled,
                target.x.round() as i64,
                target.y.round() as i64,
            );
            Ok(())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSurface, SurfaceOp, TestImage};

    fn image(width: u32, height: u32) -> TestImage {
        TestImage {
            name: "frame".into(),
            width,
            height,
        }
    }

    #[test]
    fn test_render_clears_then_draws() {
        let mut surface = RecordingSurface::new(400, 400);
        let log = surface.log.clone();
        render_frame(&mut surface, &image(800, 600)).unwrap();

        let ops = log.borrow();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], SurfaceOp::Clear(Rect::from_size(400.0, 400.0)));
        match &ops[1] {
            SurfaceOp::Draw { source, dest, .. } => {
                assert_eq!(*dest, Rect::from_size(400.0, 400.0));
                assert!((source.x - 100.0).abs() < 1e-9);
                assert!((source.width - 600.0).abs() < 1e-9);
                assert_eq!(source.height, 600.0);
            }
            other => panic!("expected a draw, got {:?}", other),
        }
    }

    #[test]
    fn test_uses_backing_size_not_logical() {
        let mut surface = RecordingSurface::new(200, 100);
        surface.set_backing_size(400, 200);
        let plan = render_frame(&mut surface, &image(400, 200)).unwrap();
        assert_eq!(plan.dest, Rect::from_size(400.0, 200.0));
        assert_eq!(plan.source.to_rect(), Rect::from_size(400.0, 200.0));
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut surface = RecordingSurface::new(10, 10);
        let err = render_frame(&mut surface, &image(0, 5)).unwrap_err();
        assert_eq!(err, RenderError::EmptyImage { width: 0, height: 5 });
        assert!(surface.log.borrow().is_empty());
    }
}
