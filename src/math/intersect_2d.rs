use super::{Point2, TOLERANCE};

/// Intersection of the segment `a → b` with a circle.
///
/// Substitutes the parametric segment `a + t * (b - a)` into the circle
/// equation and solves the quadratic in `t`. Returns the smaller root that
/// lies in `[0, 1]`, or `None` if the circle misses the segment.
/// A tangent circle yields its single touching root.
#[must_use]
pub fn segment_circle_intersect(a: &Point2, b: &Point2, center: &Point2, radius: f64) -> Option<f64> {
    let d = b - a;
    let f = a - center;

    let qa = d.norm_squared();
    if qa < TOLERANCE * TOLERANCE {
        return None;
    }
    let qb = 2.0 * d.dot(&f);
    let qc = f.norm_squared() - radius * radius;

    let discriminant = qb * qb - 4.0 * qa * qc;
    if discriminant < -TOLERANCE {
        return None;
    }
    let disc_sqrt = discriminant.max(0.0).sqrt();

    let t_low = (-qb - disc_sqrt) / (2.0 * qa);
    let t_high = (-qb + disc_sqrt) / (2.0 * qa);

    [t_low, t_high]
        .into_iter()
        .find(|t| (0.0..=1.0).contains(t))
}
