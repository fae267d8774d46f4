use std::borrow::Cow;

use tracing::debug;

use crate::error::{Result, TrackError};
use crate::math::{MAX_SAMPLES, TOLERANCE};

use super::{CalcParams, Track, TrackPoint};

/// Fraction of a step below which the last sample of a closed resampling
/// counts as a duplicate of the first.
const MIN_SEAM_FRACTION: f64 = 1e-3;

impl Track {
    /// Interpolates the track at each arclength in `s_query`.
    ///
    /// The two samples bracketing a query are found by binary search on `s`
    /// and every field both carry is blended (see [`TrackPoint::lerp`]).
    /// Closed tracks accept any `s` and wrap it into one lap; open tracks
    /// reject queries outside `[s_first, s_last]`.
    ///
    /// # Errors
    ///
    /// - `TrackError::InvalidInput` if the track has fewer than 2 samples,
    ///   no arclength (run [`calculate`](Self::calculate) first) or an
    ///   arclength that decreases along the track, or if a query is not
    ///   finite.
    /// - `TrackError::OutOfRange` for an open track queried outside its span.
    /// - `TrackError::DegenerateGeometry` if a closed track has zero length.
    pub fn interpolate(&self, s_query: &[f64]) -> Result<Vec<TrackPoint>> {
        let domain = ArclengthDomain::new(self)?;
        s_query.iter().map(|&s| domain.sample(s)).collect()
    }

    /// Interpolates the track at a single arclength.
    ///
    /// # Errors
    ///
    /// Same as [`interpolate`](Self::interpolate).
    pub fn interpolate_one(&self, s: f64) -> Result<TrackPoint> {
        ArclengthDomain::new(self)?.sample(s)
    }

    /// Resamples the track every `stepsize` metres of arclength with the
    /// default [`CalcParams`].
    ///
    /// # Errors
    ///
    /// Same as [`interpolate_track_with`](Self::interpolate_track_with).
    pub fn interpolate_track(&self, stepsize: f64) -> Result<Track> {
        self.interpolate_track_with(stepsize, &CalcParams::default())
    }

    /// Resamples the track every `stepsize` metres of arclength, starting at
    /// the first sample, and derives the new track's geometry with `params`.
    ///
    /// A closed track stops short of the point that would coincide with its
    /// start after one lap, and drops a last sample lying within a thousandth
    /// of a step of that point. An open track ends on the last value that
    /// does not pass its final sample. The result keeps the `closed` flag.
    ///
    /// # Errors
    ///
    /// - `TrackError::InvalidInput` if `stepsize` is not positive or would
    ///   need more than [`MAX_SAMPLES`] samples, or the track has fewer than
    ///   2 samples or no monotone arclength.
    /// - `TrackError::DegenerateGeometry` if the resampled track would have
    ///   fewer than 2 samples.
    pub fn interpolate_track_with(&self, stepsize: f64, params: &CalcParams) -> Result<Track> {
        if stepsize.is_nan() || stepsize <= 0.0 {
            return Err(TrackError::InvalidInput(format!(
                "interpolation step size must be positive, got {stepsize}"
            )));
        }
        let domain = ArclengthDomain::new(self)?;
        let span = domain.s_max - domain.s_min;
        let ratio = span / stepsize;
        #[allow(clippy::cast_precision_loss)]
        let limit = MAX_SAMPLES as f64;
        if !ratio.is_finite() || ratio >= limit {
            return Err(TrackError::InvalidInput(format!(
                "step size {stepsize} needs more than {MAX_SAMPLES} samples on a track of length {span}"
            )));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = if domain.closed {
            (ratio - MIN_SEAM_FRACTION).ceil().max(0.0) as usize
        } else {
            (ratio + TOLERANCE).floor().max(0.0) as usize + 1
        };
        if count < 2 {
            return Err(TrackError::DegenerateGeometry(format!(
                "step size {stepsize} leaves fewer than 2 samples on a track of length {span}"
            )));
        }
        debug!(stepsize, count, closed = domain.closed, "resampling track");

        #[allow(clippy::cast_precision_loss)]
        let points = (0..count)
            .map(|k| domain.sample((domain.s_min + k as f64 * stepsize).min(domain.s_max)))
            .collect::<Result<Vec<_>>>()?;

        let mut track = Track::new(points, domain.closed);
        track.calculate_with(params)?;
        Ok(track)
    }
}

/// Samples of a track with their arclengths, extended across the seam of a
/// closed track by a copy of the first sample one lap later.
struct ArclengthDomain<'a> {
    samples: Cow<'a, [TrackPoint]>,
    s: Vec<f64>,
    s_min: f64,
    s_max: f64,
    closed: bool,
}

impl<'a> ArclengthDomain<'a> {
    fn new(track: &'a Track) -> Result<Self> {
        if track.len() < 2 {
            return Err(TrackError::InvalidInput(format!(
                "at least 2 points are required to interpolate, got {}",
                track.len()
            )));
        }
        let mut s = Vec::with_capacity(track.len() + 1);
        for p in track {
            s.push(p.s.ok_or_else(|| {
                TrackError::invalid("track has no arclength; calculate it before interpolating")
            })?);
        }
        let bad = s
            .windows(2)
            .position(|w| !w[0].is_finite() || !w[1].is_finite() || w[1] < w[0]);
        if let Some(i) = bad {
            return Err(TrackError::InvalidInput(format!(
                "arclength must be finite and non-decreasing, got {} after {} at sample {}",
                s[i + 1],
                s[i],
                i + 1
            )));
        }

        let samples = if track.is_closed() {
            let mut wrap = track[0];
            let s_wrap = s[s.len() - 1] + track.closing_length();
            wrap.s = Some(s_wrap);
            s.push(s_wrap);
            let mut extended = track.points().to_vec();
            extended.push(wrap);
            Cow::Owned(extended)
        } else {
            Cow::Borrowed(track.points())
        };

        let s_min = s[0];
        let s_max = s[s.len() - 1];
        if track.is_closed() && s_max - s_min < TOLERANCE {
            return Err(TrackError::degenerate("closed track has zero length"));
        }
        Ok(Self {
            samples,
            s,
            s_min,
            s_max,
            closed: track.is_closed(),
        })
    }

    /// Maps a query into `[s_min, s_max]`.
    fn normalize(&self, s: f64) -> Result<f64> {
        if !s.is_finite() {
            return Err(TrackError::InvalidInput(format!("arclength query must be finite, got {s}")));
        }
        if self.closed {
            let lap = self.s_max - self.s_min;
            let wrapped = self.s_min + (s - self.s_min).rem_euclid(lap);
            // rem_euclid can round up to a full lap.
            Ok(if wrapped >= self.s_max { self.s_min } else { wrapped })
        } else if s < self.s_min - TOLERANCE || s > self.s_max + TOLERANCE {
            Err(TrackError::OutOfRange {
                parameter: "s",
                value: s,
                min: self.s_min,
                max: self.s_max,
            })
        } else {
            Ok(s.clamp(self.s_min, self.s_max))
        }
    }

    fn sample(&self, s: f64) -> Result<TrackPoint> {
        let s = self.normalize(s)?;
        let i = self
            .s
            .partition_point(|&v| v <= s)
            .saturating_sub(1)
            .min(self.s.len() - 2);

        let ds = self.s[i + 1] - self.s[i];
        let t = if ds < TOLERANCE { 0.0 } else { (s - self.s[i]) / ds };
        let mut point = self.samples[i].lerp(&self.samples[i + 1], t);
        point.s = Some(s);
        Ok(point)
    }
}
