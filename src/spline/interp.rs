use tracing::debug;

use crate::error::{Result, TrackError};
use crate::math::distance_2d::edge_lengths;
use crate::math::{Point2, MAX_SAMPLES, TOLERANCE};
use crate::track::Track;

use super::{calc_spline_lengths, SplineCoeffs, SplineLength};

/// How [`InterpSplines`] places its samples.
#[derive(Debug, Clone, PartialEq)]
pub enum Sampling {
    /// Evenly spaced in arclength, at most this far apart.
    StepSize(f64),
    /// This many evenly spaced parameters per segment, joints included.
    FixedCounts(Vec<usize>),
}

/// Samples a piecewise-cubic spline into a point sequence.
#[derive(Debug, Clone)]
pub struct InterpSplines<'a> {
    coeffs: &'a SplineCoeffs,
    sampling: Sampling,
    spline_lengths: Option<Vec<f64>>,
    incl_last_point: bool,
}

/// Points produced by [`InterpSplines`], with the segment and parameter
/// each came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineSamples {
    pub points: Vec<Point2>,
    pub spline_inds: Vec<usize>,
    pub t_values: Vec<f64>,
    /// Distance from the first sample along the spline in step-size mode;
    /// cumulative chord length between samples in fixed-count mode.
    pub dists: Vec<f64>,
}

impl<'a> InterpSplines<'a> {
    #[must_use]
    pub fn new(coeffs: &'a SplineCoeffs, sampling: Sampling) -> Self {
        Self {
            coeffs,
            sampling,
            spline_lengths: None,
            incl_last_point: false,
        }
    }

    /// Reuses segment lengths computed earlier instead of measuring the
    /// spline again.
    #[must_use]
    pub fn with_spline_lengths(mut self, spline_lengths: Vec<f64>) -> Self {
        self.spline_lengths = Some(spline_lengths);
        self
    }

    /// Keeps the end point of the last segment. Leave it out when the spline
    /// is a closed loop, where it repeats the first sample.
    #[must_use]
    pub fn with_last_point(mut self, incl_last_point: bool) -> Self {
        self.incl_last_point = incl_last_point;
        self
    }

    /// Samples the spline.
    ///
    /// # Errors
    ///
    /// - `TrackError::InvalidInput` for a non-positive step size, a step so
    ///   small it would need more than [`MAX_SAMPLES`] samples, fixed
    ///   counts or spline lengths that do not match the number of segments,
    ///   or a fixed count below 2.
    /// - `TrackError::DegenerateGeometry` if the spline has zero length in
    ///   step-size mode.
    pub fn execute(&self) -> Result<SplineSamples> {
        let mut samples = match &self.sampling {
            Sampling::StepSize(step) => self.sample_by_step(*step)?,
            Sampling::FixedCounts(counts) => self.sample_fixed(counts)?,
        };
        if !self.incl_last_point {
            samples.points.pop();
            samples.spline_inds.pop();
            samples.t_values.pop();
            samples.dists.pop();
        }
        debug!(
            samples = samples.points.len(),
            no_splines = self.coeffs.no_splines(),
            "interpolated splines"
        );
        Ok(samples)
    }

    fn sample_by_step(&self, step: f64) -> Result<SplineSamples> {
        if step.is_nan() || step <= 0.0 {
            return Err(TrackError::InvalidInput(format!(
                "interpolation step size must be positive, got {step}"
            )));
        }
        let no_splines = self.coeffs.no_splines();
        let lengths = match &self.spline_lengths {
            Some(l) if l.len() != no_splines => {
                return Err(TrackError::InvalidInput(format!(
                    "expected {no_splines} spline lengths, got {}",
                    l.len()
                )));
            }
            Some(l) => l.clone(),
            None => calc_spline_lengths(self.coeffs, SplineLength::default())?,
        };

        let cumulative: Vec<f64> = lengths
            .iter()
            .scan(0.0, |acc, l| {
                *acc += l;
                Some(*acc)
            })
            .collect();
        let total = cumulative[no_splines - 1];
        if total < TOLERANCE {
            return Err(TrackError::degenerate("spline has zero length"));
        }

        let ratio = (total / step).ceil();
        #[allow(clippy::cast_precision_loss)]
        let limit = MAX_SAMPLES as f64;
        if !ratio.is_finite() || ratio >= limit {
            return Err(TrackError::InvalidInput(format!(
                "step size {step} needs more than {MAX_SAMPLES} samples over length {total}"
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = ratio as usize + 1;
        #[allow(clippy::cast_precision_loss)]
        let spacing = total / (count - 1) as f64;

        let mut out = SplineSamples::with_capacity(count);
        for k in 0..count - 1 {
            #[allow(clippy::cast_precision_loss)]
            let dist = k as f64 * spacing;
            let j = cumulative
                .partition_point(|&c| c <= dist)
                .min(no_splines - 1);
            let start = if j == 0 { 0.0 } else { cumulative[j - 1] };
            let t = if lengths[j] < TOLERANCE {
                0.0
            } else {
                ((dist - start) / lengths[j]).clamp(0.0, 1.0)
            };
            out.push(self.coeffs.evaluate(j, t), j, t, dist);
        }
        out.push(self.coeffs.evaluate(no_splines - 1, 1.0), no_splines - 1, 1.0, total);
        Ok(out)
    }

    fn sample_fixed(&self, counts: &[usize]) -> Result<SplineSamples> {
        let no_splines = self.coeffs.no_splines();
        if counts.len() != no_splines {
            return Err(TrackError::InvalidInput(format!(
                "expected {no_splines} sample counts, got {}",
                counts.len()
            )));
        }
        if let Some(i) = counts.iter().position(|&c| c < 2) {
            return Err(TrackError::InvalidInput(format!(
                "segment {i} needs at least 2 samples, got {}",
                counts[i]
            )));
        }

        let total: usize = counts.iter().sum::<usize>() - (no_splines - 1);
        let mut out = SplineSamples::with_capacity(total);
        for (j, &count) in counts.iter().enumerate() {
            // Each joint is emitted once, as the start of the next segment.
            let last = if j + 1 < no_splines { count - 1 } else { count };
            for k in 0..last {
                #[allow(clippy::cast_precision_loss)]
                let t = k as f64 / (count - 1) as f64;
                out.push(self.coeffs.evaluate(j, t), j, t, 0.0);
            }
        }

        let mut dist = 0.0;
        for (d, el) in out.dists.iter_mut().skip(1).zip(edge_lengths(&out.points, false)) {
            dist += el;
            *d = dist;
        }
        Ok(out)
    }
}

impl SplineSamples {
    fn with_capacity(n: usize) -> Self {
        Self {
            points: Vec::with_capacity(n),
            spline_inds: Vec::with_capacity(n),
            t_values: Vec::with_capacity(n),
            dists: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, point: Point2, spline: usize, t: f64, dist: f64) {
        self.points.push(point);
        self.spline_inds.push(spline);
        self.t_values.push(t);
        self.dists.push(dist);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Builds a track through the samples and derives its geometry.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::InvalidInput` for fewer than 2 samples.
    pub fn to_track(&self, closed: bool) -> Result<Track> {
        Track::from_points(&self.points, closed)
    }
}
