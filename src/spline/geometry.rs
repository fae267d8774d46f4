use tracing::debug;

use crate::error::{Result, TrackError};
use crate::math::angle::spline_psi_from_tangent;
use crate::math::TOLERANCE;

use super::{check_params, SplineCoeffs};

/// How [`calc_spline_lengths`] measures a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplineLength {
    /// Straight distance between the segment's end points.
    Chord,
    /// Length of a polyline through `samples` evenly spaced parameters.
    Polyline { samples: usize },
}

impl Default for SplineLength {
    fn default() -> Self {
        Self::Polyline { samples: 15 }
    }
}

/// Heading on segment `ind_spls[k]` at parameter `t_spls[k]`, for every `k`.
///
/// Headings use the "0 = north" convention, normalized to `(-π, π]`.
///
/// # Errors
///
/// Returns `TrackError::InvalidInput` if the lists differ in length or an
/// index is out of range.
pub fn calc_spline_headings(coeffs: &SplineCoeffs, ind_spls: &[usize], t_spls: &[f64]) -> Result<Vec<f64>> {
    check_params(coeffs, ind_spls, t_spls)?;
    Ok(ind_spls
        .iter()
        .zip(t_spls)
        .map(|(&i, &t)| spline_psi_from_tangent(&coeffs.first_derivative(i, t)))
        .collect())
}

/// Signed curvature on segment `ind_spls[k]` at parameter `t_spls[k]`.
///
/// `κ = (x'·y'' − y'·x'') / (x'² + y'²)^1.5`, positive for left turns. Where
/// the curve has no speed the curvature is reported as 0.
///
/// # Errors
///
/// Returns `TrackError::InvalidInput` if the lists differ in length or an
/// index is out of range.
pub fn calc_spline_curvatures(coeffs: &SplineCoeffs, ind_spls: &[usize], t_spls: &[f64]) -> Result<Vec<f64>> {
    check_params(coeffs, ind_spls, t_spls)?;

    let mut degenerate = 0_usize;
    let kappa = ind_spls
        .iter()
        .zip(t_spls)
        .map(|(&i, &t)| {
            let d1 = coeffs.first_derivative(i, t);
            let d2 = coeffs.second_derivative(i, t);
            let denom = d1.norm_squared().powf(1.5);
            if denom < TOLERANCE {
                degenerate += 1;
                0.0
            } else {
                d1.perp(&d2) / denom
            }
        })
        .collect();
    if degenerate > 0 {
        debug!(degenerate, "zero-speed spline points, curvature set to 0");
    }
    Ok(kappa)
}

/// Length of every segment.
///
/// # Errors
///
/// Returns `TrackError::InvalidInput` if a polyline measure uses fewer than
/// 2 samples.
pub fn calc_spline_lengths(coeffs: &SplineCoeffs, mode: SplineLength) -> Result<Vec<f64>> {
    let n = coeffs.no_splines();
    match mode {
        SplineLength::Chord => Ok((0..n)
            .map(|i| (coeffs.evaluate(i, 1.0) - coeffs.evaluate(i, 0.0)).norm())
            .collect()),
        SplineLength::Polyline { samples } if samples < 2 => Err(TrackError::InvalidInput(format!(
            "polyline spline length needs at least 2 samples, got {samples}"
        ))),
        SplineLength::Polyline { samples } => {
            #[allow(clippy::cast_precision_loss)]
            let step = 1.0 / (samples - 1) as f64;
            Ok((0..n)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let points: Vec<_> = (0..samples).map(|k| coeffs.evaluate(i, k as f64 * step)).collect();
                    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
                })
                .collect())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;
    use crate::math::angle::normalize_psi;
    use crate::math::Point2;
    use crate::spline::CalcSplines;

    fn circle_coeffs(n: usize, radius: f64) -> SplineCoeffs {
        let mut pts: Vec<Point2> = (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let a = TAU * i as f64 / n as f64;
                Point2::new(radius * a.cos(), radius * a.sin())
            })
            .collect();
        pts.push(pts[0]);
        CalcSplines::new(pts).execute().unwrap().into_coeffs()
    }

    /// Unit quarter-ish arc: x = 1 - t², y = t.
    fn parabola() -> SplineCoeffs {
        SplineCoeffs::new(vec![[1.0, 0.0, -1.0, 0.0]], vec![[0.0, 1.0, 0.0, 0.0]]).unwrap()
    }

    #[test]
    fn heading_uses_north_convention() {
        let east = SplineCoeffs::new(vec![[0.0, 1.0, 0.0, 0.0]], vec![[0.0; 4]]).unwrap();
        let psi = calc_spline_headings(&east, &[0], &[0.5]).unwrap();
        assert_abs_diff_eq!(psi[0], -FRAC_PI_2, epsilon = 1e-12);

        let west = SplineCoeffs::new(vec![[0.0, -1.0, 0.0, 0.0]], vec![[0.0; 4]]).unwrap();
        let psi = calc_spline_headings(&west, &[0], &[0.5]).unwrap();
        assert_abs_diff_eq!(psi[0], FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn circle_headings_and_curvature() {
        let radius = 4.0;
        let coeffs = circle_coeffs(32, radius);
        let inds: Vec<usize> = (0..32).collect();
        let ts = vec![0.0; 32];

        let psi = calc_spline_headings(&coeffs, &inds, &ts).unwrap();
        let kappa = calc_spline_curvatures(&coeffs, &inds, &ts).unwrap();
        for i in 0..32 {
            // Tangent at angle a + π/2 is heading a in the north convention.
            #[allow(clippy::cast_precision_loss)]
            let a = normalize_psi(TAU * i as f64 / 32.0);
            assert_abs_diff_eq!(normalize_psi(psi[i] - a), 0.0, epsilon = 1e-9);
            assert_relative_eq!(kappa[i], 1.0 / radius, max_relative = 0.01);
        }
    }

    #[test]
    fn parabola_curvature() {
        // x' = -2t, y' = 1, x'' = -2, y'' = 0 → κ = 2 / (4t² + 1)^1.5
        let kappa = calc_spline_curvatures(&parabola(), &[0, 0], &[0.0, 0.5]).unwrap();
        assert_abs_diff_eq!(kappa[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(kappa[1], 2.0 / 2.0_f64.powf(1.5), epsilon = 1e-12);
    }

    #[test]
    fn zero_speed_curvature_is_zero() {
        let cusp = SplineCoeffs::new(vec![[0.0, 0.0, 1.0, 0.0]], vec![[0.0, 0.0, 0.0, 1.0]]).unwrap();
        let kappa = calc_spline_curvatures(&cusp, &[0], &[0.0]).unwrap();
        assert_eq!(kappa, vec![0.0]);
    }

    #[test]
    fn right_turn_is_negative() {
        let mirrored = SplineCoeffs::new(vec![[1.0, 0.0, -1.0, 0.0]], vec![[0.0, -1.0, 0.0, 0.0]]).unwrap();
        let kappa = calc_spline_curvatures(&mirrored, &[0], &[0.0]).unwrap();
        assert!(kappa[0] < 0.0);
    }

    #[test]
    fn lengths_chord_vs_polyline() {
        let radius = 2.0;
        let coeffs = circle_coeffs(16, radius);
        let chord: f64 = calc_spline_lengths(&coeffs, SplineLength::Chord).unwrap().iter().sum();
        let poly: f64 = calc_spline_lengths(&coeffs, SplineLength::default())
            .unwrap()
            .iter()
            .sum();

        assert_abs_diff_eq!(chord, 32.0 * radius * (PI / 16.0).sin(), epsilon = 1e-9);
        assert!(poly > chord);
        assert_relative_eq!(poly, TAU * radius, max_relative = 0.005);
    }

    #[test]
    fn straight_segment_lengths_agree() {
        let line = SplineCoeffs::new(vec![[0.0, 3.0, 0.0, 0.0]], vec![[0.0, 4.0, 0.0, 0.0]]).unwrap();
        assert_abs_diff_eq!(calc_spline_lengths(&line, SplineLength::Chord).unwrap()[0], 5.0);
        assert_abs_diff_eq!(
            calc_spline_lengths(&line, SplineLength::Polyline { samples: 4 }).unwrap()[0],
            5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn invalid_parameters() {
        let coeffs = parabola();
        assert!(matches!(
            calc_spline_headings(&coeffs, &[0, 0], &[0.0]),
            Err(TrackError::InvalidInput(_))
        ));
        assert!(matches!(
            calc_spline_curvatures(&coeffs, &[1], &[0.0]),
            Err(TrackError::InvalidInput(_))
        ));
        assert!(matches!(
            calc_spline_lengths(&coeffs, SplineLength::Polyline { samples: 1 }),
            Err(TrackError::InvalidInput(_))
        ));
    }
}
