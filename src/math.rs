use nalgebra as na;

/// Below this determinant two lines are treated as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-9;

/// Unit vector in the direction of `v`; the zero vector is returned unchanged.
#[inline]
pub fn normalize(v: na::Vector2<f64>) -> na::Vector2<f64> {
    let norm = v.norm();
    if norm == 0.0 {
        v
    } else {
        v / norm
    }
}

/// Angle of a segment measured against the horizontal axis.
#[inline]
pub fn angle_from_x(segment: &na::Vector2<f64>) -> f64 {
    (segment.y / segment.x).atan()
}

/// Angle of a segment measured against the vertical axis.
#[inline]
pub fn angle_from_y(segment: &na::Vector2<f64>) -> f64 {
    (segment.x / segment.y).atan()
}

/// Intersection of the lines `p1 + t1 * v1` and `p2 + t2 * v2`.
///
/// Returns `None` when the lines are parallel (or a direction is degenerate).
pub fn line_intersection(
    p1: &na::Point2<f64>,
    v1: &na::Vector2<f64>,
    p2: &na::Point2<f64>,
    v2: &na::Vector2<f64>,
) -> Option<na::Point2<f64>> {
    let a = na::Matrix2::new(v1.x, -v2.x, v1.y, -v2.y);
    let det = a.determinant();

    // NaN directions fail this check as well
    if !(det.abs() >= PARALLEL_EPSILON) {
        return None;
    }

    let t = a.lu().solve(&(*p2 - *p1))?;

    Some(*p1 + *v1 * t.x)
}

/// z-component of the 2-D cross product.
#[inline(always)]
pub fn cross(a: &na::Vector2<f64>, b: &na::Vector2<f64>) -> f64 {
    a.perp(b)
}

/// True when `v` lies angularly between `a` and `b`.
///
/// Same-sign test on `a × v` and `v × b`, so the opposite wedge passes too.
#[inline]
pub fn is_between(a: &na::Vector2<f64>, b: &na::Vector2<f64>, v: &na::Vector2<f64>) -> bool {
    cross(a, v) * cross(v, b) >= 0.0
}

pub fn meters_to_pixels(meters: f64, reference_meters: f64, reference_pixels: f64) -> f64 {
    meters * reference_pixels / reference_meters
}

pub fn pixels_to_meters(pixels: f64, reference_meters: f64, reference_pixels: f64) -> f64 {
    pixels * reference_meters / reference_pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersects_crossing_lines() {
        let p = line_intersection(
            &na::Point2::new(0.0, 0.0),
            &na::Vector2::new(1.0, 1.0),
            &na::Point2::new(10.0, 0.0),
            &na::Vector2::new(-1.0, 1.0),
        )
        .unwrap();

        assert!((p.x - 5.0).abs() < 1e-9);
        assert!((p.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_lines_have_no_intersection() {
        let p = line_intersection(
            &na::Point2::new(0.0, 0.0),
            &na::Vector2::new(0.0, 1.0),
            &na::Point2::new(100.0, 0.0),
            &na::Vector2::new(0.0, 1.0),
        );

        assert!(p.is_none());
    }

    #[test]
    fn nan_direction_has_no_intersection() {
        let p = line_intersection(
            &na::Point2::new(0.0, 0.0),
            &na::Vector2::new(f64::NAN, f64::NAN),
            &na::Point2::new(100.0, 0.0),
            &na::Vector2::new(0.0, 1.0),
        );

        assert!(p.is_none());
    }

    #[test]
    fn angles_against_axes() {
        let diag = na::Vector2::new(1.0, 1.0);
        assert!((angle_from_x(&diag) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert!((angle_from_y(&na::Vector2::new(0.0, 5.0))).abs() < 1e-12);
        assert!(
            (angle_from_x(&na::Vector2::new(0.0, 5.0)) - std::f64::consts::FRAC_PI_2).abs() < 1e-12
        );
    }

    #[test]
    fn between_vectors() {
        let right = na::Vector2::new(1.0, 0.1);
        let down = na::Vector2::new(0.1, 1.0);

        assert!(is_between(&right, &down, &na::Vector2::new(1.0, 1.0)));
        assert!(!is_between(&right, &down, &na::Vector2::new(-100.0, 50.0)));
    }

    #[test]
    fn normalize_keeps_zero() {
        assert_eq!(normalize(na::Vector2::zeros()), na::Vector2::<f64>::zeros());
        assert!((normalize(na::Vector2::new(3.0, 4.0)).norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn meters_and_pixels() {
        assert!((meters_to_pixels(1.0, 3.0, 270.0) - 90.0).abs() < 1e-9);
        assert!((pixels_to_meters(90.0, 3.0, 270.0) - 1.0).abs() < 1e-9);
    }
}
