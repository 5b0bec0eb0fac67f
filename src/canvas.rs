use crate::math;

use nalgebra as na;

/// Gap between the canvas border and the background box.
pub const CANVAS_BUFFER: i32 = 20;

/// Gap between the background box and the drawable map.
pub const MAP_PADDING: i32 = 10;

/// Layout of the square top-down map canvas.
///
/// The background ("buffer") box is anchored to the top right of the canvas,
/// and the map itself is inset inside it by the padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    pub size: i32,
    pub rect_extent: i32,
    pub start: na::Point2<i32>,
    pub end: na::Point2<i32>,
    pub map_start: na::Point2<i32>,
    pub map_end: na::Point2<i32>,
    pub map_extent: i32,
}

impl CanvasGeometry {
    pub fn new(size: i32) -> Self {
        Self::with_margins(size, CANVAS_BUFFER, MAP_PADDING)
    }

    pub fn with_margins(size: i32, buffer: i32, padding: i32) -> Self {
        let rect_extent = size - buffer - padding;

        let end = na::Point2::new(size - buffer, buffer + rect_extent);
        let start = na::Point2::new(end.x - rect_extent, end.y - rect_extent);

        let map_start = na::Point2::new(start.x + padding, start.y + padding);
        let map_end = na::Point2::new(end.x - padding, end.y - padding);

        Self {
            size,
            rect_extent,
            start,
            end,
            map_start,
            map_end,
            map_extent: rect_extent - 2 * padding,
        }
    }

    /// Scales a ground ratio pair into canvas pixels.
    #[inline]
    pub fn map_to_canvas(&self, ratio_h: f64, ratio_v: f64) -> na::Point2<i32> {
        na::Point2::new(
            (self.map_start.x as f64 + ratio_h * self.map_extent as f64) as i32,
            (self.map_start.y as f64 + ratio_v * self.map_extent as f64) as i32,
        )
    }

    /// Map corners in calibration order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [na::Point2<i32>; 4] {
        [
            self.map_start,
            na::Point2::new(self.map_end.x, self.map_start.y),
            self.map_end,
            na::Point2::new(self.map_start.x, self.map_end.y),
        ]
    }

    /// Association radius in canvas pixels, given that the background box
    /// spans `reference_extent_meters` on the ground.
    pub fn radius_pixels(&self, radius_meters: f64, reference_extent_meters: f64) -> f64 {
        math::meters_to_pixels(
            radius_meters,
            reference_extent_meters,
            self.rect_extent as f64,
        )
    }
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self::new(300)
    }
}
