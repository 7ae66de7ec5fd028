//! View geometry inputs.

use serde::{Deserialize, Serialize};

/// A 2D point or size in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Square size, e.g. the default 256×256 tile.
    pub const fn square(size: f64) -> Self {
        Self { x: size, y: size }
    }

    /// Both components are finite and strictly positive.
    pub fn is_positive_size(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x > 0.0 && self.y > 0.0
    }
}

/// A requested view of an image: a rectangle in image pixels plus the
/// downsampling factor it will be displayed at.
///
/// `mip` is the number of source pixels per displayed pixel along each axis;
/// `mip = 1` is full resolution and `mip = 4` shows every fourth pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameView {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub mip: f64,
}

impl FrameView {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64, mip: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            mip,
        }
    }

    /// All bounds and the mip are finite.
    pub fn is_finite(&self) -> bool {
        self.x_min.is_finite()
            && self.x_max.is_finite()
            && self.y_min.is_finite()
            && self.y_max.is_finite()
            && self.mip.is_finite()
    }

    /// Centre of the view rectangle.
    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Clamp the rectangle to `[0, width] × [0, height]`, keeping the mip.
    pub fn cropped(&self, image_size: Point2D) -> Self {
        Self {
            x_min: self.x_min.max(0.0),
            x_max: self.x_max.min(image_size.x),
            y_min: self.y_min.max(0.0),
            y_max: self.y_max.min(image_size.y),
            mip: self.mip,
        }
    }

    /// Mip for a view shown at `zoom_level` screen pixels per image pixel.
    ///
    /// The exact mip is `max(1, adjustment / zoom)`, where the adjustment is 2
    /// in low bandwidth mode and 1 otherwise. It is rounded to the nearest
    /// power of two in log space, so the result always lands on a pyramid
    /// layer. A zoom that is not finite and positive yields 1.
    pub fn rounded_mip(zoom_level: f64, low_bandwidth: bool) -> f64 {
        if !zoom_level.is_finite() || zoom_level <= 0.0 {
            return 1.0;
        }

        let adjustment = if low_bandwidth { 2.0 } else { 1.0 };
        let exact = (adjustment / zoom_level).max(1.0);
        2f64.powf(exact.log2().round())
    }
}
