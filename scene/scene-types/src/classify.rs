//! Point classification against a planar polygon.

use nalgebra::{Point2, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a point lies relative to a planar polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PointClass {
    /// The polygon is degenerate and nothing can be said.
    Unknown,
    /// Strictly inside the polygon.
    Inside,
    /// Coincident with one of the polygon's vertices.
    OnVertex,
    /// On one of the polygon's edges, away from its vertices.
    OnEdge,
    /// In the polygon's plane but outside its boundary.
    Outside,
    /// Off the polygon's plane.
    NotOnPlane,
}

/// Classify `point` against the polygon `loop_points` with unit `normal`.
///
/// `tolerance` is used for the plane test and for vertex/edge coincidence.
///
/// # Example
///
/// ```
/// use scene_types::{classify_point, PointClass, Point3, Vector3};
///
/// let square = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let class = classify_point(&square, &Vector3::z(), &Point3::new(0.5, 0.5, 0.0), 1e-9);
/// assert_eq!(class, PointClass::Inside);
/// ```
#[must_use]
pub fn classify_point(
    loop_points: &[Point3<f64>],
    normal: &Vector3<f64>,
    point: &Point3<f64>,
    tolerance: f64,
) -> PointClass {
    if loop_points.len() < 3 || normal.norm() < f64::EPSILON {
        return PointClass::Unknown;
    }

    if normal.dot(&(point - loop_points[0])).abs() > tolerance {
        return PointClass::NotOnPlane;
    }

    if loop_points.iter().any(|v| (point - v).norm() <= tolerance) {
        return PointClass::OnVertex;
    }

    let n = loop_points.len();
    for i in 0..n {
        let a = &loop_points[i];
        let b = &loop_points[(i + 1) % n];
        if segment_distance(point, a, b) <= tolerance {
            return PointClass::OnEdge;
        }
    }

    let drop_axis = dominant_axis(normal);
    let flat: Vec<Point2<f64>> = loop_points.iter().map(|p| flatten(p, drop_axis)).collect();
    if contains_2d(&flat, &flatten(point, drop_axis)) {
        PointClass::Inside
    } else {
        PointClass::Outside
    }
}

fn segment_distance(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < f64::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

fn dominant_axis(normal: &Vector3<f64>) -> usize {
    let abs = normal.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        0
    } else if abs.y >= abs.z {
        1
    } else {
        2
    }
}

fn flatten(p: &Point3<f64>, drop_axis: usize) -> Point2<f64> {
    match drop_axis {
        0 => Point2::new(p.y, p.z),
        1 => Point2::new(p.z, p.x),
        _ => Point2::new(p.x, p.y),
    }
}

/// Even-odd crossing test.
fn contains_2d(polygon: &[Point2<f64>], p: &Point2<f64>) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&polygon[i], &polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
