//! Pixel → ground-plane mapping from four calibration keypoints.
//!
//! No homography is estimated. The two vanishing points of the calibrated
//! trapezoid are found, and a query point is projected back onto the top and
//! left edges along the lines through those vanishing points. The distance
//! of each hit from the top-left corner, relative to the edge length, gives
//! the normalized `(ratio_h, ratio_v)` coordinate.

use crate::error::Error;
use crate::math;

use nalgebra as na;

/// Calibrated ground region as seen by one camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrilateral {
    pub top_left: na::Point2<f64>,
    pub top_right: na::Point2<f64>,
    pub bottom_right: na::Point2<f64>,
    pub bottom_left: na::Point2<f64>,
}

impl Quadrilateral {
    pub fn new(
        top_left: na::Point2<f64>,
        top_right: na::Point2<f64>,
        bottom_right: na::Point2<f64>,
        bottom_left: na::Point2<f64>,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Builds the quadrilateral from a flat `[x0, y0, .., x3, y3]` list.
    pub fn from_keypoints(keypoints: &[i32]) -> Result<Self, Error> {
        match keypoints {
            &[x0, y0, x1, y1, x2, y2, x3, y3] => Ok(Self::new(
                na::Point2::new(x0 as f64, y0 as f64),
                na::Point2::new(x1 as f64, y1 as f64),
                na::Point2::new(x2 as f64, y2 as f64),
                na::Point2::new(x3 as f64, y3 as f64),
            )),
            _ => Err(Error::InvalidKeypoints(keypoints.len())),
        }
    }

    #[inline]
    pub fn corners(&self) -> [na::Point2<f64>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    pub fn centroid(&self) -> na::Point2<f64> {
        let sum = self
            .corners()
            .iter()
            .fold(na::Vector2::zeros(), |acc, p| acc + p.coords);

        (sum / 4.0).into()
    }

    #[inline]
    pub fn up(&self) -> na::Vector2<f64> {
        self.top_right - self.top_left
    }

    #[inline]
    pub fn right(&self) -> na::Vector2<f64> {
        self.bottom_right - self.top_right
    }

    #[inline]
    pub fn down(&self) -> na::Vector2<f64> {
        self.bottom_right - self.bottom_left
    }

    #[inline]
    pub fn left(&self) -> na::Vector2<f64> {
        self.bottom_left - self.top_left
    }
}

/// Edge directions and vanishing points derived once from a quadrilateral.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveAxes {
    pub up: na::Vector2<f64>,
    pub down: na::Vector2<f64>,
    pub left: na::Vector2<f64>,
    pub right: na::Vector2<f64>,

    // convergence of the left and right edges
    pub vanishing_y: Option<na::Point2<f64>>,

    // convergence of the top and bottom edges
    pub vanishing_x: Option<na::Point2<f64>>,

    pub top_length: f64,
    pub left_length: f64,
}

impl PerspectiveAxes {
    pub fn new(quad: &Quadrilateral) -> Self {
        let theta_up = math::angle_from_x(&quad.up());
        let theta_down = math::angle_from_x(&quad.down());
        let phi_left = math::angle_from_y(&quad.left());
        let phi_right = math::angle_from_y(&quad.right());

        let up = na::Vector2::new(theta_up.cos(), theta_up.sin());
        let down = na::Vector2::new(theta_down.cos(), theta_down.sin());
        let left = na::Vector2::new(phi_left.sin(), phi_left.cos());
        let right = na::Vector2::new(phi_right.sin(), phi_right.cos());

        let vanishing_y = math::line_intersection(&quad.top_left, &left, &quad.top_right, &right);
        let vanishing_x = math::line_intersection(&quad.top_left, &up, &quad.bottom_left, &down);

        Self {
            up,
            down,
            left,
            right,
            vanishing_y,
            vanishing_x,
            top_length: quad.up().norm(),
            left_length: quad.left().norm(),
        }
    }

    /// Opposite edges are parallel: nothing can be projected.
    #[inline]
    pub fn is_singular(&self) -> bool {
        self.vanishing_x.is_none() || self.vanishing_y.is_none()
    }
}

/// Geometry of one projection, kept for the debug overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionTrace {
    pub point: na::Point2<f64>,
    pub vanishing_x: na::Point2<f64>,
    pub vanishing_y: na::Point2<f64>,
}

#[derive(Debug, Clone)]
pub struct PerspectiveMapper {
    quad: Quadrilateral,
    axes: PerspectiveAxes,
}

impl PerspectiveMapper {
    pub fn new(quad: Quadrilateral) -> Self {
        let axes = PerspectiveAxes::new(&quad);

        if axes.is_singular() {
            log::warn!(
                "calibration {:?} has parallel opposite edges, no point will be mapped",
                quad.corners()
            );
        }

        Self { quad, axes }
    }

    #[inline]
    pub fn quadrilateral(&self) -> &Quadrilateral {
        &self.quad
    }

    #[inline]
    pub fn axes(&self) -> &PerspectiveAxes {
        &self.axes
    }

    /// Normalized `(ratio_h, ratio_v)` ground coordinate of a pixel point.
    ///
    /// `None` when the calibration is singular, the point is outside the
    /// calibrated wedge, or an edge has zero length.
    pub fn project(&self, point: na::Point2<f64>) -> Option<(f64, f64)> {
        let quad = &self.quad;
        let axes = &self.axes;

        let vanishing_y = axes.vanishing_y?;
        let vanishing_x = axes.vanishing_x?;

        let towards_y = math::normalize(vanishing_y - point);
        let towards_x = math::normalize(vanishing_x - point);

        if !math::is_between(&axes.up, &axes.left, &(point - quad.top_left)) {
            return None;
        }

        let left_hit =
            math::line_intersection(&vanishing_x, &towards_x, &quad.top_left, &quad.left())?;
        let top_hit =
            math::line_intersection(&vanishing_y, &towards_y, &quad.top_left, &quad.up())?;

        if axes.top_length == 0.0 || axes.left_length == 0.0 {
            return None;
        }

        let ratio_h = na::distance(&quad.top_left, &top_hit) / axes.top_length;
        let ratio_v = na::distance(&quad.top_left, &left_hit) / axes.left_length;

        Some((ratio_h, ratio_v))
    }

    pub fn trace(&self, point: na::Point2<f64>) -> Option<ProjectionTrace> {
        Some(ProjectionTrace {
            point,
            vanishing_x: self.axes.vanishing_x?,
            vanishing_y: self.axes.vanishing_y?,
        })
    }
}
