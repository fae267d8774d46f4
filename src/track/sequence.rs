use std::ops::Index;

use crate::error::{Result, TrackError};
use crate::math::distance_2d::edge_lengths;
use crate::math::Point2;

use super::TrackPoint;

/// An ordered sequence of [`TrackPoint`]s forming an open path or a loop.
///
/// For a closed track the edge from the last sample back to the first is
/// part of the path. No duplicate of the first sample is stored at the
/// seam; the closing edge length is computed when needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    points: Vec<TrackPoint>,
    closed: bool,
}

impl Track {
    /// Creates a track from samples with whatever fields they already carry.
    ///
    /// The samples are not checked here. Arclength queries later require
    /// every sample to carry a finite `s` that never decreases along the
    /// track, and fail with `TrackError::InvalidInput` otherwise.
    #[must_use]
    pub fn new(points: Vec<TrackPoint>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Creates an undecorated track from raw waypoints.
    #[must_use]
    pub fn from_waypoints(waypoints: &[Point2], closed: bool) -> Self {
        Self {
            points: waypoints.iter().map(TrackPoint::from_point).collect(),
            closed,
        }
    }

    /// Creates a track from raw waypoints and derives arclength, heading and
    /// curvature with the default [`CalcParams`](super::CalcParams).
    ///
    /// # Errors
    ///
    /// Returns `TrackError::InvalidInput` if fewer than 2 waypoints are given.
    pub fn from_points(waypoints: &[Point2], closed: bool) -> Result<Self> {
        let mut track = Self::from_waypoints(waypoints, closed);
        track.calculate()?;
        Ok(track)
    }

    /// Appends a sample at the end of the path.
    ///
    /// Derived fields of the existing samples are not updated, and a sample
    /// without `s` or with a smaller `s` than its predecessor breaks
    /// arclength queries. Run [`calculate`](Self::calculate) again after
    /// appending.
    pub fn push(&mut self, point: TrackPoint) {
        self.points.push(point);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TrackPoint> {
        self.points.get(index)
    }

    #[must_use]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [TrackPoint] {
        &mut self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackPoint> {
        self.points.iter()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Returns `true` if the samples carry arclength.
    #[must_use]
    pub fn has_s(&self) -> bool {
        self.points.first().is_some_and(TrackPoint::has_s)
    }

    #[must_use]
    pub fn has_psi(&self) -> bool {
        self.points.first().is_some_and(TrackPoint::has_psi)
    }

    #[must_use]
    pub fn has_kappa(&self) -> bool {
        self.points.first().is_some_and(TrackPoint::has_kappa)
    }

    #[must_use]
    pub fn has_widths(&self) -> bool {
        self.points.first().is_some_and(TrackPoint::has_widths)
    }

    #[must_use]
    pub fn s(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.s).collect()
    }

    #[must_use]
    pub fn x(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    #[must_use]
    pub fn y(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    #[must_use]
    pub fn psi(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.psi).collect()
    }

    #[must_use]
    pub fn kappa(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.kappa).collect()
    }

    #[must_use]
    pub fn wl(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.wl).collect()
    }

    #[must_use]
    pub fn wr(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.wr).collect()
    }

    /// Returns the sample positions in path order.
    #[must_use]
    pub fn positions(&self) -> Vec<Point2> {
        self.points.iter().map(TrackPoint::position).collect()
    }

    /// Assigns the corridor widths of every sample.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::InvalidInput` if either slice length differs
    /// from the number of samples.
    pub fn set_widths(&mut self, wl: &[f64], wr: &[f64]) -> Result<()> {
        if wl.len() != self.points.len() || wr.len() != self.points.len() {
            return Err(TrackError::InvalidInput(format!(
                "width vectors ({}, {}) must match the track size {}",
                wl.len(),
                wr.len(),
                self.points.len()
            )));
        }
        for ((p, &l), &r) in self.points.iter_mut().zip(wl).zip(wr) {
            p.wl = Some(l);
            p.wr = Some(r);
        }
        Ok(())
    }

    /// Chord lengths between consecutive samples, including the closing
    /// edge for a closed track.
    #[must_use]
    pub fn el_lengths(&self) -> Vec<f64> {
        edge_lengths(&self.positions(), self.closed)
    }

    /// Total path length, including the closing edge for a closed track.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.el_lengths().iter().sum()
    }

    /// Number of edges: `len - 1` for open tracks, `len` for closed ones.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        match (self.points.len(), self.closed) {
            (0 | 1, _) => 0,
            (n, true) => n,
            (n, false) => n - 1,
        }
    }

    /// Length of the edge from the last sample back to the first.
    pub(crate) fn closing_length(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first.position() - last.position()).norm(),
            _ => 0.0,
        }
    }

    /// Sample on edge `i` (from sample `i` to its successor) at parameter `t`.
    ///
    /// On the closing edge the arclength keeps growing past the last sample
    /// and wraps back to the start of the lap at `t = 1`.
    pub(crate) fn edge_point(&self, i: usize, t: f64) -> TrackPoint {
        let n = self.points.len();
        let start = &self.points[i];
        let mut end = self.points[(i + 1) % n];
        let seam = i + 1 == n;
        if seam {
            end.s = start.s.map(|s| s + self.closing_length());
        }

        let mut point = start.lerp(&end, t);
        if seam && t >= 1.0 {
            point.s = self.points[0].s;
        }
        point
    }
}

impl Index<usize> for Track {
    type Output = TrackPoint;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a TrackPoint;
    type IntoIter = std::slice::Iter<'a, TrackPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
