use tracing::debug;

use crate::error::{Result, TrackError};
use crate::math::angle::{angle_diff, psi_from_direction};
use crate::math::distance_2d::edge_lengths;
use crate::math::{Point2, TOLERANCE};

use super::Track;

/// Window sizes for the finite-difference heading and curvature estimates.
///
/// Each step size is a physical distance; it is turned into a sample count
/// using the average edge length of the track, so the window adapts to the
/// point density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalcParams {
    /// Distance ahead of a sample used for the heading estimate.
    pub stepsize_psi_preview: f64,
    /// Distance behind a sample used for the heading estimate.
    pub stepsize_psi_review: f64,
    /// Distance ahead of a sample used for the curvature estimate.
    pub stepsize_curv_preview: f64,
    /// Distance behind a sample used for the curvature estimate.
    pub stepsize_curv_review: f64,
    /// Whether curvature is computed at all.
    pub calc_curv: bool,
}

impl Default for CalcParams {
    fn default() -> Self {
        Self {
            stepsize_psi_preview: 1.0,
            stepsize_psi_review: 1.0,
            stepsize_curv_preview: 2.0,
            stepsize_curv_review: 2.0,
            calc_curv: true,
        }
    }
}

impl Track {
    /// Derives arclength, heading and curvature with default [`CalcParams`].
    ///
    /// # Errors
    ///
    /// Returns `TrackError::InvalidInput` if the track has fewer than 2 samples.
    pub fn calculate(&mut self) -> Result<()> {
        self.calculate_with(&CalcParams::default())
    }

    /// Derives arclength, heading and curvature from the sample positions.
    ///
    /// Arclength starts at 0 and accumulates chord lengths. Headings are the
    /// direction from a review sample behind to a preview sample ahead;
    /// curvature is the heading change between the curvature window's ends
    /// divided by the path length between them. Closed tracks index the
    /// windows modulo the size; open tracks shrink them at the ends.
    /// With `calc_curv` off, curvature is cleared.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::InvalidInput` if the track has fewer than 2
    /// samples or a step size is not positive.
    pub fn calculate_with(&mut self, params: &CalcParams) -> Result<()> {
        let n = self.len();
        if n < 2 {
            return Err(TrackError::InvalidInput(format!(
                "at least 2 points are required to calculate a track, got {n}"
            )));
        }
        let steps = [
            params.stepsize_psi_preview,
            params.stepsize_psi_review,
            params.stepsize_curv_preview,
            params.stepsize_curv_review,
        ];
        if steps.iter().any(|s| s.is_nan() || *s <= 0.0) {
            return Err(TrackError::invalid("calculation step sizes must be positive"));
        }

        let closed = self.is_closed();
        let positions = self.positions();
        let el_lengths = edge_lengths(&positions, closed);

        #[allow(clippy::cast_precision_loss)]
        let avg_el_length = el_lengths.iter().sum::<f64>() / el_lengths.len() as f64;
        let psi_window = Window::new(
            params.stepsize_psi_review,
            params.stepsize_psi_preview,
            avg_el_length,
            n,
            closed,
        );
        let curv_window = Window::new(
            params.stepsize_curv_review,
            params.stepsize_curv_preview,
            avg_el_length,
            n,
            closed,
        );
        debug!(
            n,
            closed,
            avg_el_length,
            ?psi_window,
            ?curv_window,
            "calculating track"
        );

        let psi: Vec<f64> = (0..n)
            .map(|i| heading_at(&positions, i, psi_window.bounds(i)))
            .collect();

        let kappa: Option<Vec<f64>> = params.calc_curv.then(|| {
            (0..n)
                .map(|i| {
                    let (review, preview) = curv_window.bounds(i);
                    let length = path_length(&el_lengths, review, preview, closed);
                    if length < TOLERANCE {
                        0.0
                    } else {
                        angle_diff(psi[review], psi[preview]) / length
                    }
                })
                .collect()
        });

        let mut s = 0.0;
        for (i, point) in self.points_mut().iter_mut().enumerate() {
            if i > 0 {
                s += el_lengths[i - 1];
            }
            point.s = Some(s);
            point.psi = Some(psi[i]);
            point.kappa = kappa.as_ref().map(|k| k[i]);
        }
        Ok(())
    }
}

/// Review and preview offsets, in samples.
#[derive(Debug, Clone, Copy)]
struct Window {
    review: usize,
    preview: usize,
    n: usize,
    closed: bool,
}

impl Window {
    fn new(review_dist: f64, preview_dist: f64, avg_el_length: f64, n: usize, closed: bool) -> Self {
        let mut review = steps_for(review_dist, avg_el_length, n);
        let mut preview = steps_for(preview_dist, avg_el_length, n);
        if closed {
            // Keep both ends of the window distinct on a loop.
            let max_steps = ((n - 1) / 2).max(1);
            review = review.min(max_steps);
            preview = preview.min(max_steps);
        }
        Self {
            review,
            preview,
            n,
            closed,
        }
    }

    /// Sample indices `(review, preview)` around sample `i`.
    fn bounds(&self, i: usize) -> (usize, usize) {
        if self.closed {
            (
                (i + self.n - self.review) % self.n,
                (i + self.preview) % self.n,
            )
        } else {
            (
                i.saturating_sub(self.review),
                (i + self.preview).min(self.n - 1),
            )
        }
    }
}

/// `max(1, round(distance / avg_el_length))`, capped at `n`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn steps_for(distance: f64, avg_el_length: f64, n: usize) -> usize {
    let steps = (distance / avg_el_length).round();
    if steps.is_nan() || steps < 1.0 {
        1
    } else if steps >= n as f64 {
        n
    } else {
        steps as usize
    }
}

fn heading_at(positions: &[Point2], i: usize, (review, preview): (usize, usize)) -> f64 {
    if review == preview {
        // Two-point loop: both window ends land on the other sample.
        return psi_from_direction(&(positions[preview] - positions[i]));
    }
    psi_from_direction(&(positions[preview] - positions[review]))
}

/// Path length from sample `from` forward to sample `to`.
fn path_length(el_lengths: &[f64], from: usize, to: usize, closed: bool) -> f64 {
    if closed {
        let n = el_lengths.len();
        let mut length = 0.0;
        let mut j = from;
        while j != to {
            length += el_lengths[j];
            j = (j + 1) % n;
        }
        length
    } else {
        el_lengths[from..to].iter().sum()
    }
}
