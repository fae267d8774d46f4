use crate::error::{Result, TrackError};
use crate::math::distance_2d::{nearest_point_index, project_onto_segment};
use crate::math::intersect_2d::segment_circle_intersect;
use crate::math::Point2;

use super::{Track, TrackPoint};

impl Track {
    /// Index of the sample closest to `p`, or `None` for an empty track.
    ///
    /// Linear scan; ties go to the lower index.
    #[must_use]
    pub fn nearest_index(&self, p: &Point2) -> Option<usize> {
        nearest_point_index(self.iter().map(TrackPoint::position), p)
    }

    /// Orthogonal projection of `p` onto the track polyline.
    ///
    /// Only the edges adjacent to the nearest sample are considered. The
    /// result carries every field both edge ends carry, interpolated at the
    /// foot point; on the closing edge of a closed track the arclength
    /// continues past the last sample.
    ///
    /// # Errors
    ///
    /// - `TrackError::InvalidInput` if the track has fewer than 2 samples.
    /// - `TrackError::DegenerateGeometry` if every candidate edge has zero
    ///   length.
    pub fn project(&self, p: &Point2) -> Result<TrackPoint> {
        let n = self.len();
        if n < 2 {
            return Err(TrackError::InvalidInput(format!(
                "at least 2 points are required to project, got {n}"
            )));
        }
        let Some(nearest) = self.nearest_index(p) else {
            return Err(TrackError::invalid("track is empty"));
        };

        let mut edges = Vec::with_capacity(2);
        if self.is_closed() {
            edges.push((nearest + n - 1) % n);
            edges.push(nearest);
        } else {
            if nearest > 0 {
                edges.push(nearest - 1);
            }
            if nearest + 1 < n {
                edges.push(nearest);
            }
        }

        let mut best: Option<(usize, f64, f64)> = None;
        for edge in edges {
            let a = self[edge].position();
            let b = self[(edge + 1) % n].position();
            let Some(proj) = project_onto_segment(p, &a, &b) else {
                continue;
            };
            if best.is_none_or(|(_, _, d)| proj.distance < d) {
                best = Some((edge, proj.t, proj.distance));
            }
        }

        let (edge, t, _) = best.ok_or_else(|| {
            TrackError::DegenerateGeometry(format!("edges around sample {nearest} have zero length"))
        })?;
        Ok(self.edge_point(edge, t))
    }

    /// First point where a circle around `center` crosses the track, scanning
    /// forward from the sample nearest to `center`.
    ///
    /// This is the first hit in scan order, not the nearest one. Closed
    /// tracks include the closing edge in the scan. With `wrap`, the scan
    /// continues from the first edge up to the starting sample.
    #[must_use]
    pub fn first_intersect_point(&self, center: &Point2, radius: f64, wrap: bool) -> Option<TrackPoint> {
        let start = self.nearest_index(center)?;
        let n = self.len();
        let edges = self.edge_count();

        let forward = start.min(edges)..edges;
        let wrapped = 0..if wrap { start.min(edges) } else { 0 };
        forward.chain(wrapped).find_map(|edge| {
            let a = self[edge].position();
            let b = self[(edge + 1) % n].position();
            segment_circle_intersect(&a, &b, center, radius).map(|t| self.edge_point(edge, t))
        })
    }
}
