use super::{Point2, TOLERANCE};

/// Orthogonal projection of a point onto a line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Segment parameter of the projected point, clamped to `[0, 1]`.
    pub t: f64,
    /// The projected point.
    pub point: Point2,
    /// Distance from the query point to `point`.
    pub distance: f64,
}

/// Projects `p` onto the segment `a → b`, clamping to the segment ends.
///
/// Returns `None` for a zero-length segment.
#[must_use]
pub fn project_onto_segment(p: &Point2, a: &Point2, b: &Point2) -> Option<SegmentProjection> {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return None;
    }

    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    let point = a + d * t;
    Some(SegmentProjection {
        t,
        point,
        distance: (p - point).norm(),
    })
}

/// Index of the point in `points` closest to `p`; the first one wins ties.
///
/// Returns `None` for empty input.
#[must_use]
pub fn nearest_point_index<I>(points: I, p: &Point2) -> Option<usize>
where
    I: IntoIterator<Item = Point2>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, q) in points.into_iter().enumerate() {
        let d = (q - p).norm_squared();
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Chord lengths between consecutive points, plus the closing edge from the
/// last point back to the first when `closed`.
#[must_use]
pub fn edge_lengths(points: &[Point2], closed: bool) -> Vec<f64> {
    let mut lengths: Vec<f64> = points.windows(2).map(|w| (w[1] - w[0]).norm()).collect();
    if closed && points.len() >= 2 {
        lengths.push((points[0] - points[points.len() - 1]).norm());
    }
    lengths
}
