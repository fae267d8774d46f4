pub mod angle;
pub mod distance_2d;
pub mod intersect_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Largest number of samples a single resampling call may produce.
pub const MAX_SAMPLES: usize = 1 << 24;

/// Returns `true` if both coordinates of `a` and `b` agree within `tol`.
#[must_use]
pub fn points_close(a: &Point2, b: &Point2, tol: f64) -> bool {
    (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol
}
