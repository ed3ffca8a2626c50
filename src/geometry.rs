//! Cover-fit (aspect-fill) calculations for mapping an image onto a fixed surface.

use crate::ConfigError;

/// An axis-aligned rectangle in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// X coordinate of the right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Overlapping area of two rectangles, if it is not empty.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }
}

/// Region of the source image that gets stretched over the whole surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceRect {
    /// Source x offset, in image pixels
    pub sx: f64,
    /// Source y offset, in image pixels
    pub sy: f64,
    /// Source width, in image pixels
    pub s_width: f64,
    /// Source height, in image pixels
    pub s_height: f64,
}

impl SourceRect {
    /// Convert to a plain [`Rect`].
    #[inline]
    pub fn to_rect(self) -> Rect {
        Rect::new(self.sx, self.sy, self.s_width, self.s_height)
    }
}

/// Which dimension of the source gets cropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CropAxis {
    /// Full source width, centered band of the height
    Vertical,
    /// Full source height, centered band of the width
    Horizontal,
}

/// Pick the crop branch for a `w`x`h` image on a `dst_w`x`dst_h` surface.
///
/// When the source is larger (or smaller) than the destination in both
/// dimensions the scale ratios decide; otherwise the width comparison does.
pub fn classify(w: f64, h: f64, dst_w: f64, dst_h: f64) -> CropAxis {
    let scale_w = dst_w / w;
    let scale_h = dst_h / h;
    let uniform = (w > dst_w && h > dst_h) || (w < dst_w && h < dst_h);
    let vertical = if uniform { scale_w > scale_h } else { w > dst_w };
    if vertical {
        CropAxis::Vertical
    } else {
        CropAxis::Horizontal
    }
}

/// Keep the full width, take a vertically centered band of the height.
pub fn vertical_crop(w: f64, h: f64, dst_w: f64, dst_h: f64) -> SourceRect {
    let scale_w = dst_w / w;
    let s_height = dst_h / scale_w;
    SourceRect {
        sx: 0.0,
        sy: (h - s_height) / 2.0,
        s_width: w,
        s_height,
    }
}

/// Keep the full height, take a horizontally centered band of the width.
pub fn horizontal_crop(w: f64, h: f64, dst_w: f64, dst_h: f64) -> SourceRect {
    let scale_h = dst_h / h;
    let s_width = dst_w / scale_h;
    SourceRect {
        sx: (w - s_width) / 2.0,
        sy: 0.0,
        s_width,
        s_height: h,
    }
}

/// Compute the cover-fit source rectangle.
///
/// ## Example
///
/// ```rust
/// use frameseq_player::geometry::cover_crop;
///
/// // 800x600 onto 400x400: crop 100px off each side
/// let src = cover_crop(800.0, 600.0, 400.0, 400.0);
/// assert!((src.sx - 100.0).abs() < 1e-9);
/// assert!((src.s_width - 600.0).abs() < 1e-9);
/// assert_eq!(src.sy, 0.0);
/// assert_eq!(src.s_height, 600.0);
/// ```
pub fn cover_crop(w: f64, h: f64, dst_w: f64, dst_h: f64) -> SourceRect {
    match classify(w, h, dst_w, dst_h) {
        CropAxis::Vertical => vertical_crop(w, h, dst_w, dst_h),
        CropAxis::Horizontal => horizontal_crop(w, h, dst_w, dst_h),
    }
}

/// Backing-store size for a logical surface size at the given pixel density.
///
/// Fractional pixels are truncated, as canvas dimension assignment does.
pub fn backing_size(width: u32, height: u32, pixel_ratio: f64) -> Result<(u32, u32), ConfigError> {
    if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
        return Err(ConfigError::InvalidPixelRatio(pixel_ratio));
    }
    let scaled_w = (width as f64 * pixel_ratio) as u32;
    let scaled_h = (height as f64 * pixel_ratio) as u32;
    if scaled_w == 0 || scaled_h == 0 {
        return Err(ConfigError::ZeroSize { width, height });
    }
    Ok((scaled_w, scaled_h))
}
