use nalgebra::DMatrix;
use tracing::{debug, warn};

use crate::error::{Result, TrackError};
use crate::math::angle::tangent_from_spline_psi;
use crate::math::distance_2d::edge_lengths;
use crate::math::{points_close, Point2, Vector2, TOLERANCE};

use super::SplineCoeffs;

/// Pivots smaller than this fraction of the largest one mark the system as
/// numerically singular.
const MIN_PIVOT_RATIO: f64 = 1e-13;

/// Normals shorter than this are reported as zero vectors.
const MIN_NORMAL_NORM: f64 = 1e-12;

/// Fits a C2-continuous piecewise-cubic spline through ordered waypoints.
///
/// A path whose first and last waypoints coincide is treated as closed,
/// unless boundary headings are given: the seam then gets the same
/// continuity as every interior joint. Any other path is open and needs a
/// heading at both ends.
///
/// # Linear system
///
/// Each segment contributes four rows to one square system shared by both
/// axes: two position rows, then heading and curvature continuity with the
/// next segment. The last segment only has its position rows; the final
/// two rows hold the boundary conditions. With distance scaling, the
/// continuity rows are weighted by the ratio of neighbouring segment
/// lengths so the tangent match is physical rather than per unit `t`.
#[derive(Debug, Clone)]
pub struct CalcSplines {
    path: Vec<Point2>,
    el_lengths: Option<Vec<f64>>,
    psi_s: Option<f64>,
    psi_e: Option<f64>,
    use_dist_scaling: bool,
}

impl CalcSplines {
    /// Creates a fit through `path` with distance scaling enabled.
    ///
    /// Repeat the first waypoint at the end to fit a closed loop.
    #[must_use]
    pub fn new(path: Vec<Point2>) -> Self {
        Self {
            path,
            el_lengths: None,
            psi_s: None,
            psi_e: None,
            use_dist_scaling: true,
        }
    }

    /// Uses these segment lengths instead of the chord lengths for scaling.
    #[must_use]
    pub fn with_el_lengths(mut self, el_lengths: Vec<f64>) -> Self {
        self.el_lengths = Some(el_lengths);
        self
    }

    /// Heading at the start of the first segment, 0 = north.
    #[must_use]
    pub fn with_start_heading(mut self, psi_s: f64) -> Self {
        self.psi_s = Some(psi_s);
        self
    }

    /// Heading at the end of the last segment, 0 = north.
    #[must_use]
    pub fn with_end_heading(mut self, psi_e: f64) -> Self {
        self.psi_e = Some(psi_e);
        self
    }

    /// Sets both boundary headings.
    #[must_use]
    pub fn with_headings(self, psi_s: f64, psi_e: f64) -> Self {
        self.with_start_heading(psi_s).with_end_heading(psi_e)
    }

    #[must_use]
    pub fn with_dist_scaling(mut self, use_dist_scaling: bool) -> Self {
        self.use_dist_scaling = use_dist_scaling;
        self
    }

    /// Assembles and solves the spline system.
    ///
    /// # Errors
    ///
    /// - `TrackError::InvalidInput` for fewer than 2 waypoints (3 for a closed
    ///   loop), a missing boundary heading on an open path, or element
    ///   lengths that do not match the number of segments.
    /// - `TrackError::DegenerateGeometry` if distance scaling meets a
    ///   segment of zero length.
    /// - `TrackError::SolverFailure` if the system is singular.
    pub fn execute(&self) -> Result<SplineResult> {
        let n = self.path.len();
        if n < 2 {
            return Err(TrackError::InvalidInput(format!(
                "at least 2 waypoints are required for a spline, got {n}"
            )));
        }
        let closed = self.psi_s.is_none()
            && self.psi_e.is_none()
            && points_close(&self.path[0], &self.path[n - 1], TOLERANCE);
        let no_splines = n - 1;

        let boundary = if closed {
            if n < 3 {
                return Err(TrackError::invalid(
                    "a closed spline needs at least 2 distinct waypoints",
                ));
            }
            None
        } else {
            match (self.psi_s, self.psi_e) {
                (Some(s), Some(e)) => Some((s, e)),
                _ => {
                    return Err(TrackError::invalid(
                        "an open spline needs both a start and an end heading",
                    ))
                }
            }
        };

        let el_lengths = match &self.el_lengths {
            Some(el) if el.len() != no_splines => {
                return Err(TrackError::InvalidInput(format!(
                    "expected {no_splines} element lengths, got {}",
                    el.len()
                )));
            }
            Some(el) => el.clone(),
            None => edge_lengths(&self.path, false),
        };
        if self.use_dist_scaling {
            if let Some(i) = el_lengths.iter().position(|&l| l.abs() < TOLERANCE) {
                return Err(TrackError::DegenerateGeometry(format!(
                    "segment {i} has zero length, distance scaling is undefined"
                )));
            }
        }

        // scaling[i] links segment i to its successor; on a loop the last
        // entry links the final segment back to the first.
        let scaling: Vec<f64> = if self.use_dist_scaling {
            (0..no_splines)
                .map(|i| el_lengths[i] / el_lengths[(i + 1) % no_splines])
                .collect()
        } else {
            vec![1.0; no_splines]
        };

        let dim = 4 * no_splines;
        let mut m = DMatrix::<f64>::zeros(dim, dim);
        let mut b = DMatrix::<f64>::zeros(dim, 2);

        for i in 0..no_splines {
            let j = 4 * i;
            m[(j, j)] = 1.0;
            for k in 0..4 {
                m[(j + 1, j + k)] = 1.0;
            }
            if i + 1 < no_splines {
                let s = scaling[i];
                // x_i'(1) = s * x_{i+1}'(0)
                m[(j + 2, j + 1)] = 1.0;
                m[(j + 2, j + 2)] = 2.0;
                m[(j + 2, j + 3)] = 3.0;
                m[(j + 2, j + 5)] = -s;
                // x_i''(1) = s² * x_{i+1}''(0)
                m[(j + 3, j + 2)] = 2.0;
                m[(j + 3, j + 3)] = 6.0;
                m[(j + 3, j + 6)] = -2.0 * s * s;
            }
            b[(j, 0)] = self.path[i].x;
            b[(j, 1)] = self.path[i].y;
            b[(j + 1, 0)] = self.path[i + 1].x;
            b[(j + 1, 1)] = self.path[i + 1].y;
        }

        if let Some((psi_s, psi_e)) = boundary {
            let (len_s, len_e) = if self.use_dist_scaling {
                (el_lengths[0], el_lengths[no_splines - 1])
            } else {
                (1.0, 1.0)
            };
            let start = tangent_from_spline_psi(psi_s) * len_s;
            let end = tangent_from_spline_psi(psi_e) * len_e;

            m[(dim - 2, 1)] = 1.0;
            b[(dim - 2, 0)] = start.x;
            b[(dim - 2, 1)] = start.y;

            m[(dim - 1, dim - 3)] = 1.0;
            m[(dim - 1, dim - 2)] = 2.0;
            m[(dim - 1, dim - 1)] = 3.0;
            b[(dim - 1, 0)] = end.x;
            b[(dim - 1, 1)] = end.y;
        } else {
            let s = scaling[no_splines - 1];
            // x_last'(1) = s * x_0'(0)
            m[(dim - 2, 1)] = s;
            m[(dim - 2, dim - 3)] = -1.0;
            m[(dim - 2, dim - 2)] = -2.0;
            m[(dim - 2, dim - 1)] = -3.0;
            // x_last''(1) = s² * x_0''(0)
            m[(dim - 1, 2)] = 2.0 * s * s;
            m[(dim - 1, dim - 2)] = -2.0;
            m[(dim - 1, dim - 1)] = -6.0;
        }

        let solution = solve(&m, &b)?;
        let rows = |col: usize| -> Vec<[f64; 4]> {
            (0..no_splines)
                .map(|i| {
                    let j = 4 * i;
                    [
                        solution[(j, col)],
                        solution[(j + 1, col)],
                        solution[(j + 2, col)],
                        solution[(j + 3, col)],
                    ]
                })
                .collect()
        };
        let coeffs = SplineCoeffs::new(rows(0), rows(1))?;

        let mut zero_normals = 0;
        let normals: Vec<Vector2> = (0..no_splines)
            .map(|i| {
                let d = coeffs.first_derivative(i, 0.0);
                let normal = Vector2::new(d.y, -d.x);
                let norm = normal.norm();
                if norm < MIN_NORMAL_NORM {
                    zero_normals += 1;
                    Vector2::zeros()
                } else {
                    normal / norm
                }
            })
            .collect();
        if zero_normals > 0 {
            warn!(zero_normals, "spline segments without a defined normal");
        }

        debug!(no_splines, closed, dist_scaling = self.use_dist_scaling, "fitted splines");
        Ok(SplineResult {
            coeffs,
            normals,
            matrix: m,
            closed,
        })
    }
}

/// Solves `m · X = b` for all right-hand-side columns at once.
fn solve(m: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let lu = m.clone().full_piv_lu();
    if !lu.is_invertible() {
        return Err(TrackError::SolverFailure("spline system is singular".to_owned()));
    }

    let pivots = lu.u().diagonal();
    let (min, max) = pivots
        .iter()
        .map(|p| p.abs())
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), p| (lo.min(p), hi.max(p)));
    if !min.is_finite() || min < MIN_PIVOT_RATIO * max {
        return Err(TrackError::SolverFailure(format!(
            "spline system is ill-conditioned (pivot ratio {:e})",
            min / max
        )));
    }

    lu.solve(b)
        .ok_or_else(|| TrackError::SolverFailure("spline system has no solution".to_owned()))
}

/// Output of [`CalcSplines`].
#[derive(Debug, Clone)]
pub struct SplineResult {
    coeffs: SplineCoeffs,
    normals: Vec<Vector2>,
    matrix: DMatrix<f64>,
    closed: bool,
}

impl SplineResult {
    #[must_use]
    pub fn coeffs(&self) -> &SplineCoeffs {
        &self.coeffs
    }

    #[must_use]
    pub fn into_coeffs(self) -> SplineCoeffs {
        self.coeffs
    }

    /// Unit normal of each segment at its start, pointing right of the
    /// direction of travel. Zero where the tangent vanishes.
    #[must_use]
    pub fn normals(&self) -> &[Vector2] {
        &self.normals
    }

    /// The assembled system matrix.
    #[must_use]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Whether the fit was closed at the seam.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn no_splines(&self) -> usize {
        self.coeffs.no_splines()
    }

    /// Position on segment `i` at parameter `t`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= no_splines()`.
    #[must_use]
    pub fn evaluate(&self, i: usize, t: f64) -> Point2 {
        self.coeffs.evaluate(i, t)
    }

    /// First derivative on segment `i` at parameter `t`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= no_splines()`.
    #[must_use]
    pub fn derivative(&self, i: usize, t: f64) -> Vector2 {
        self.coeffs.first_derivative(i, t)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, TAU};

    use approx::assert_abs_diff_eq;
    use nalgebra::DVector;

    use super::*;
    use crate::math::angle::spline_psi_from_tangent;

    fn circle(n: usize, radius: f64) -> Vec<Point2> {
        let mut pts: Vec<Point2> = (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let a = TAU * i as f64 / n as f64;
                Point2::new(radius * a.cos(), radius * a.sin())
            })
            .collect();
        pts.push(pts[0]);
        pts
    }

    fn wiggle() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.5),
            Point2::new(3.0, 0.2),
            Point2::new(3.5, 2.0),
            Point2::new(6.0, 2.5),
        ]
    }

    fn assert_continuous(result: &SplineResult, el: &[f64], i: usize, k: usize) {
        let c = result.coeffs();
        let d1_end = c.first_derivative(i, 1.0) / el[i];
        let d1_start = c.first_derivative(k, 0.0) / el[k];
        assert_abs_diff_eq!(d1_end.x, d1_start.x, epsilon = 1e-8);
        assert_abs_diff_eq!(d1_end.y, d1_start.y, epsilon = 1e-8);

        let d2_end = c.second_derivative(i, 1.0) / (el[i] * el[i]);
        let d2_start = c.second_derivative(k, 0.0) / (el[k] * el[k]);
        assert_abs_diff_eq!(d2_end.x, d2_start.x, epsilon = 1e-8);
        assert_abs_diff_eq!(d2_end.y, d2_start.y, epsilon = 1e-8);
    }

    #[test]
    fn straight_line_is_linear() {
        let path = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        let result = CalcSplines::new(path)
            .with_headings(-FRAC_PI_2, -FRAC_PI_2)
            .execute()
            .unwrap();

        assert!(!result.is_closed());
        assert_eq!(result.no_splines(), 2);
        assert_eq!(result.matrix().shape(), (8, 8));
        for (row, x0) in result.coeffs().x().iter().zip([0.0, 1.0]) {
            for (a, e) in row.iter().zip([x0, 1.0, 0.0, 0.0]) {
                assert_abs_diff_eq!(*a, e, epsilon = 1e-10);
            }
        }
        for row in result.coeffs().y() {
            for a in row {
                assert_abs_diff_eq!(*a, 0.0, epsilon = 1e-10);
            }
        }
        for normal in result.normals() {
            assert_abs_diff_eq!(normal.x, 0.0, epsilon = 1e-10);
            assert_abs_diff_eq!(normal.y, -1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn passes_through_waypoints() {
        let path = wiggle();
        let result = CalcSplines::new(path.clone()).with_headings(-1.0, -1.2).execute().unwrap();
        for i in 0..result.no_splines() {
            let start = result.evaluate(i, 0.0);
            let end = result.evaluate(i, 1.0);
            assert_abs_diff_eq!(start.x, path[i].x, epsilon = 1e-9);
            assert_abs_diff_eq!(start.y, path[i].y, epsilon = 1e-9);
            assert_abs_diff_eq!(end.x, path[i + 1].x, epsilon = 1e-9);
            assert_abs_diff_eq!(end.y, path[i + 1].y, epsilon = 1e-9);
        }
    }

    #[test]
    fn interior_joints_are_c2_after_scaling() {
        let path = wiggle();
        let el = edge_lengths(&path, false);
        let result = CalcSplines::new(path).with_headings(-1.0, -1.2).execute().unwrap();
        for i in 0..result.no_splines() - 1 {
            assert_continuous(&result, &el, i, i + 1);
        }
    }

    #[test]
    fn unscaled_joints_match_per_unit_t() {
        let path = wiggle();
        let ones = vec![1.0; path.len() - 1];
        let result = CalcSplines::new(path)
            .with_headings(-1.0, -1.2)
            .with_dist_scaling(false)
            .execute()
            .unwrap();
        for i in 0..result.no_splines() - 1 {
            assert_continuous(&result, &ones, i, i + 1);
        }
    }

    #[test]
    fn open_boundaries_follow_headings() {
        let result = CalcSplines::new(wiggle()).with_headings(-1.0, -1.2).execute().unwrap();
        let last = result.no_splines() - 1;
        assert_abs_diff_eq!(spline_psi_from_tangent(&result.derivative(0, 0.0)), -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spline_psi_from_tangent(&result.derivative(last, 1.0)), -1.2, epsilon = 1e-9);
    }

    #[test]
    fn closed_loop_is_continuous_at_seam() {
        let path = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(5.0, 2.0),
            Point2::new(1.0, 3.0),
            Point2::new(0.0, 0.0),
        ];
        let el = edge_lengths(&path, false);
        let result = CalcSplines::new(path).execute().unwrap();
        assert!(result.is_closed());

        let last = result.no_splines() - 1;
        for i in 0..last {
            assert_continuous(&result, &el, i, i + 1);
        }
        assert_continuous(&result, &el, last, 0);
    }

    #[test]
    fn circle_tangents_are_perpendicular_to_radius() {
        let result = CalcSplines::new(circle(16, 3.0)).execute().unwrap();
        for i in 0..result.no_splines() {
            let radial = result.evaluate(i, 0.0).coords.normalize();
            let tangent = result.derivative(i, 0.0).normalize();
            assert_abs_diff_eq!(radial.dot(&tangent), 0.0, epsilon = 1e-9);
            // Counter-clockwise loop: the normal points outwards, away from
            // the centre on the right-hand side.
            assert_abs_diff_eq!(result.normals()[i].dot(&radial), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn headings_make_path_open() {
        let result = CalcSplines::new(circle(8, 1.0))
            .with_headings(0.0, 0.0)
            .execute()
            .unwrap();
        assert!(!result.is_closed());
    }

    #[test]
    fn custom_el_lengths_must_match() {
        let err = CalcSplines::new(wiggle())
            .with_headings(0.0, 0.0)
            .with_el_lengths(vec![1.0; 2])
            .execute();
        assert!(matches!(err, Err(TrackError::InvalidInput(_))));

        let ok = CalcSplines::new(wiggle())
            .with_headings(0.0, 0.0)
            .with_el_lengths(vec![1.0; 4])
            .execute();
        assert!(ok.is_ok());
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(
            CalcSplines::new(vec![Point2::origin()]).execute(),
            Err(TrackError::InvalidInput(_))
        ));
        assert!(matches!(
            CalcSplines::new(wiggle()).execute(),
            Err(TrackError::InvalidInput(_))
        ));
        assert!(matches!(
            CalcSplines::new(wiggle()).with_start_heading(0.0).execute(),
            Err(TrackError::InvalidInput(_))
        ));
        assert!(matches!(
            CalcSplines::new(vec![Point2::origin(), Point2::origin()]).execute(),
            Err(TrackError::InvalidInput(_))
        ));
    }

    #[test]
    fn singular_system_is_a_solver_failure() {
        let rhs = DMatrix::zeros(4, 2);
        assert!(matches!(
            solve(&DMatrix::zeros(4, 4), &rhs),
            Err(TrackError::SolverFailure(_))
        ));

        // Invertible in exact arithmetic, but one pivot is far below the rest.
        let near_singular = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 1e-15, 1.0, 1.0]));
        assert!(matches!(solve(&near_singular, &rhs), Err(TrackError::SolverFailure(_))));

        let x = solve(&DMatrix::identity(4, 4), &DMatrix::from_element(4, 2, 2.0)).unwrap();
        assert!(x.iter().all(|v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn reversing_loop_has_zero_normals() {
        // Both segments start with zero tangent, so no normal direction exists.
        let path = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 0.0)];
        let fit = CalcSplines::new(path).execute().unwrap();
        assert_eq!(fit.normals(), &[Vector2::zeros(); 2]);
        assert!(fit.normals().iter().all(|n| n.iter().all(|v| v.is_finite())));
        assert!(fit.coeffs().x().iter().chain(fit.coeffs().y()).flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_length_segment_with_scaling() {
        let path = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 0.0)];
        let err = CalcSplines::new(path).with_headings(0.0, 0.0).execute();
        assert!(matches!(err, Err(TrackError::DegenerateGeometry(_))));
    }
}
