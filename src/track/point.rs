use crate::math::angle::lerp_angle;
use crate::math::Point2;

/// A sample along a track.
///
/// The position is always known. Arclength, heading, curvature and the
/// corridor widths are `None` until something computes or assigns them, so
/// a heading of exactly `0.0` is never confused with a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackPoint {
    /// Arclength from the start of the track.
    pub s: Option<f64>,
    pub x: f64,
    pub y: f64,
    /// Heading in `(-π, π]`.
    pub psi: Option<f64>,
    /// Corridor width to the left of the path.
    pub wl: Option<f64>,
    /// Corridor width to the right of the path.
    pub wr: Option<f64>,
    /// Signed curvature, positive for left turns.
    pub kappa: Option<f64>,
}

impl TrackPoint {
    /// Creates an undecorated sample at `(x, y)`.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Creates an undecorated sample at `p`.
    #[must_use]
    pub fn from_point(p: &Point2) -> Self {
        Self::new(p.x, p.y)
    }

    #[must_use]
    pub fn with_s(mut self, s: f64) -> Self {
        self.s = Some(s);
        self
    }

    #[must_use]
    pub fn with_psi(mut self, psi: f64) -> Self {
        self.psi = Some(psi);
        self
    }

    /// Sets both corridor widths, left first.
    #[must_use]
    pub fn with_widths(mut self, wl: f64, wr: f64) -> Self {
        self.wl = Some(wl);
        self.wr = Some(wr);
        self
    }

    #[must_use]
    pub fn with_kappa(mut self, kappa: f64) -> Self {
        self.kappa = Some(kappa);
        self
    }

    /// Returns the position of the sample.
    #[must_use]
    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    #[must_use]
    pub fn has_s(&self) -> bool {
        self.s.is_some()
    }

    #[must_use]
    pub fn has_psi(&self) -> bool {
        self.psi.is_some()
    }

    #[must_use]
    pub fn has_kappa(&self) -> bool {
        self.kappa.is_some()
    }

    /// Returns `true` if both corridor widths are set.
    #[must_use]
    pub fn has_widths(&self) -> bool {
        self.wl.is_some() && self.wr.is_some()
    }

    /// Interpolates between `self` (t = 0) and `other` (t = 1).
    ///
    /// Position, arclength, widths and curvature are blended linearly and
    /// the heading along the shorter arc. A field is only produced when both
    /// ends carry it.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let lin = |a: Option<f64>, b: Option<f64>| Some(lerp(a?, b?, t));
        Self {
            s: lin(self.s, other.s),
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
            psi: self.psi.zip(other.psi).map(|(a, b)| lerp_angle(a, b, t)),
            wl: lin(self.wl, other.wl),
            wr: lin(self.wr, other.wr),
            kappa: lin(self.kappa, other.kappa),
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}
