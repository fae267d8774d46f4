//! Piecewise-cubic splines through waypoints.
//!
//! Every segment is a cubic `a0 + a1·t + a2·t² + a3·t³` per axis with a
//! local parameter `t ∈ [0, 1]`, regardless of the segment's physical length.

mod fit;
mod geometry;
mod interp;

pub use fit::{CalcSplines, SplineResult};
pub use geometry::{calc_spline_curvatures, calc_spline_headings, calc_spline_lengths, SplineLength};
pub use interp::{InterpSplines, Sampling, SplineSamples};

use crate::error::{Result, TrackError};
use crate::math::{Point2, Vector2};

/// Cubic coefficients `[a0, a1, a2, a3]` of every segment, per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineCoeffs {
    x: Vec<[f64; 4]>,
    y: Vec<[f64; 4]>,
}

impl SplineCoeffs {
    /// Creates coefficients from per-axis rows.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::InvalidInput` if the axes differ in length or are
    /// empty.
    pub fn new(x: Vec<[f64; 4]>, y: Vec<[f64; 4]>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(TrackError::InvalidInput(format!(
                "coefficient rows differ in length: x has {}, y has {}",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(TrackError::invalid("at least one spline segment is required"));
        }
        Ok(Self { x, y })
    }

    #[must_use]
    pub fn no_splines(&self) -> usize {
        self.x.len()
    }

    #[must_use]
    pub fn x(&self) -> &[[f64; 4]] {
        &self.x
    }

    #[must_use]
    pub fn y(&self) -> &[[f64; 4]] {
        &self.y
    }

    /// Position on segment `i` at parameter `t`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= no_splines()`.
    #[must_use]
    pub fn evaluate(&self, i: usize, t: f64) -> Point2 {
        Point2::new(cubic(&self.x[i], t), cubic(&self.y[i], t))
    }

    /// First derivative with respect to `t` on segment `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= no_splines()`.
    #[must_use]
    pub fn first_derivative(&self, i: usize, t: f64) -> Vector2 {
        Vector2::new(cubic_d1(&self.x[i], t), cubic_d1(&self.y[i], t))
    }

    /// Second derivative with respect to `t` on segment `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= no_splines()`.
    #[must_use]
    pub fn second_derivative(&self, i: usize, t: f64) -> Vector2 {
        Vector2::new(cubic_d2(&self.x[i], t), cubic_d2(&self.y[i], t))
    }

    pub(crate) fn check_index(&self, i: usize) -> Result<()> {
        if i < self.no_splines() {
            Ok(())
        } else {
            Err(TrackError::InvalidInput(format!(
                "spline index {i} out of bounds for {} splines",
                self.no_splines()
            )))
        }
    }
}

fn cubic(a: &[f64; 4], t: f64) -> f64 {
    a[0] + t * (a[1] + t * (a[2] + t * a[3]))
}

fn cubic_d1(a: &[f64; 4], t: f64) -> f64 {
    a[1] + 2.0 * a[2] * t + 3.0 * a[3] * t * t
}

fn cubic_d2(a: &[f64; 4], t: f64) -> f64 {
    2.0 * a[2] + 6.0 * a[3] * t
}

/// Checks that segment indices and parameters pair up and are in range.
pub(crate) fn check_params(coeffs: &SplineCoeffs, ind_spls: &[usize], t_spls: &[f64]) -> Result<()> {
    if ind_spls.len() != t_spls.len() {
        return Err(TrackError::InvalidInput(format!(
            "got {} spline indices but {} parameters",
            ind_spls.len(),
            t_spls.len()
        )));
    }
    ind_spls.iter().try_for_each(|&i| coeffs.check_index(i))
}
