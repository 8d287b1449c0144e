//! Plane representation and best-fit planes.

use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A plane in 3D space defined by a point and a unit normal.
///
/// The plane equation is `normal · (p - point) = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane {
    /// A point on the plane.
    pub point: Point3<f64>,
    /// The plane normal (unit vector).
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a plane from a point and normal. The normal is normalized.
    ///
    /// Returns `None` for a zero-length normal.
    #[must_use]
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let norm = normal.norm();
        if norm < f64::EPSILON {
            return None;
        }
        Some(Self {
            point,
            normal: normal / norm,
        })
    }

    /// The ground reference plane: origin point, +Z normal.
    #[must_use]
    pub fn ground() -> Self {
        Self {
            point: Point3::origin(),
            normal: Vector3::z(),
        }
    }

    /// Create a plane through three non-collinear points.
    #[must_use]
    pub fn from_points(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Option<Self> {
        Self::new(*p0, (p1 - p0).cross(&(p2 - p0)))
    }

    /// Least-squares plane through a point set.
    ///
    /// The normal is the eigenvector of the covariance matrix with the
    /// smallest eigenvalue. Returns `None` for fewer than three points or for
    /// collinear input.
    ///
    /// # Example
    ///
    /// ```
    /// use scene_types::{Plane, Point3};
    ///
    /// let points = [
    ///     Point3::new(0.0, 0.0, 2.0),
    ///     Point3::new(1.0, 0.0, 2.0),
    ///     Point3::new(1.0, 1.0, 2.0),
    ///     Point3::new(0.0, 1.0, 2.0),
    /// ];
    /// let plane = Plane::fit(&points).unwrap();
    /// assert!(plane.distance(&Point3::new(5.0, 5.0, 2.0)) < 1e-9);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let count = points.len() as f64;
        let centroid = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / count;

        let mut covariance = Matrix3::zeros();
        for p in points {
            let d = p.coords - centroid;
            covariance += d * d.transpose();
        }
        covariance /= count;

        let eigen = SymmetricEigen::new(covariance);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

        // Two vanishing eigenvalues means the points lie on a line.
        let largest = eigen.eigenvalues[order[2]];
        if largest < f64::EPSILON || eigen.eigenvalues[order[1]] <= largest * 1e-12 {
            return None;
        }

        let normal: Vector3<f64> = eigen.eigenvectors.column(order[0]).into_owned();
        Self::new(Point3::from(centroid), normal)
    }

    /// Signed distance from a point to the plane, positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&(*point - self.point))
    }

    /// Absolute distance from a point to the plane.
    #[must_use]
    pub fn distance(&self, point: &Point3<f64>) -> f64 {
        self.signed_distance(point).abs()
    }

    /// Whether a point lies on the plane within `tolerance`.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        self.distance(point) <= tolerance
    }

    /// Project a point onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        *point - self.normal * self.signed_distance(point)
    }
}

/// Twice the vector area of a closed polygon (Newell's sum).
fn newell_sum(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut sum = Vector3::<f64>::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        sum.x += (current.y - next.y) * (current.z + next.z);
        sum.y += (current.z - next.z) * (current.x + next.x);
        sum.z += (current.x - next.x) * (current.y + next.y);
    }
    sum
}

/// Polygon normal by Newell's method. `None` for degenerate polygons.
#[must_use]
pub fn polygon_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    if points.len() < 3 {
        return None;
    }
    let normal = newell_sum(points);
    let norm = normal.norm();
    if norm < f64::EPSILON {
        None
    } else {
        Some(normal / norm)
    }
}

/// Area of a planar polygon. Back-tracking spurs contribute nothing.
#[must_use]
pub fn polygon_area(points: &[Point3<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    newell_sum(points).norm() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fallback() -> Plane {
        Plane::ground()
    }

    #[test]
    fn normal_is_normalized() {
        let plane = Plane::new(Point3::origin(), Vector3::new(0.0, 0.0, 2.0)).unwrap_or_else(fallback);
        assert_relative_eq!(plane.normal.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_normal_no_plane() {
        assert!(Plane::new(Point3::origin(), Vector3::zeros()).is_none());
    }

    #[test]
    fn collinear_points_no_plane() {
        let p0 = Point3::new(0.0, 0.0, 0.0);
        let p1 = Point3::new(1.0, 0.0, 0.0);
        let p2 = Point3::new(2.0, 0.0, 0.0);
        assert!(Plane::from_points(&p0, &p1, &p2).is_none());
        assert!(Plane::fit(&[p0, p1, p2]).is_none());
    }

    #[test]
    fn fit_tilted_plane() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 0.5),
        ];
        let plane = Plane::fit(&points).unwrap_or_else(fallback);
        for p in &points {
            assert!(plane.distance(p) < 1e-9);
        }
        let expected = Vector3::new(-1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(plane.normal.dot(&expected).abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn fit_rejects_bent_points() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let plane = Plane::fit(&points).unwrap_or_else(fallback);
        assert!(points.iter().any(|p| plane.distance(p) > 1e-3));
    }

    #[test]
    fn signed_distance_and_project() {
        let plane = Plane::ground();
        let p = Point3::new(3.0, 4.0, 7.0);
        assert_relative_eq!(plane.signed_distance(&p), 7.0, epsilon = 1e-12);
        assert_relative_eq!(plane.signed_distance(&Point3::new(0.0, 0.0, -3.0)), -3.0, epsilon = 1e-12);
        let projected = plane.project(&p);
        assert_relative_eq!(projected.z, 0.0, epsilon = 1e-12);
        assert!(plane.contains(&projected, 0.0));
    }

    #[test]
    fn newell_normal_ccw_square() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let n = polygon_normal(&square).unwrap_or_else(Vector3::zeros);
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);

        let mut reversed = square;
        reversed.reverse();
        let n = polygon_normal(&reversed).unwrap_or_else(Vector3::zeros);
        assert_relative_eq!(n.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn polygon_area_ignores_winding_and_spurs() {
        let square = [
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(2.0, 0.0, 3.0),
            Point3::new(2.0, 2.0, 3.0),
            Point3::new(0.0, 2.0, 3.0),
        ];
        assert_relative_eq!(polygon_area(&square), 4.0, epsilon = 1e-12);

        let mut reversed = square;
        reversed.reverse();
        assert_relative_eq!(polygon_area(&reversed), 4.0, epsilon = 1e-12);

        let spur = [square[0], square[1], Point3::new(3.0, 0.0, 3.0), square[1], square[2], square[3]];
        assert_relative_eq!(polygon_area(&spur), 4.0, epsilon = 1e-12);
        assert_relative_eq!(polygon_area(&square[..2]), 0.0);
    }
}
