//! Heading conventions shared by the finite-difference and spline derivations.
//!
//! Track samples carry headings as plain math angles of the direction of
//! travel (`atan2(dy, dx)`). Spline headings use the "0 = north" convention
//! and are offset by [`HEADING_OFFSET`]; the conversions below are the only
//! place that offset is applied.
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::Vector2;

/// Offset between a tangent's math angle and the spline heading convention.
pub const HEADING_OFFSET: f64 = FRAC_PI_2;

/// Normalizes an angle into `(-π, π]`.
#[must_use]
pub fn normalize_psi(psi: f64) -> f64 {
    if psi > -PI && psi <= PI {
        return psi;
    }
    let wrapped = (psi + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `from` to `to`, in `(-π, π]`.
#[must_use]
pub fn angle_diff(from: f64, to: f64) -> f64 {
    normalize_psi(to - from)
}

/// Blends two headings along the shortest arc between them.
#[must_use]
pub fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    normalize_psi(a + t * angle_diff(a, b))
}

/// Heading of a direction vector in the track (math angle) convention.
#[must_use]
pub fn psi_from_direction(dir: &Vector2) -> f64 {
    normalize_psi(dir.y.atan2(dir.x))
}

/// Heading of a spline tangent in the "0 = north" convention.
#[must_use]
pub fn spline_psi_from_tangent(tangent: &Vector2) -> f64 {
    normalize_psi(tangent.y.atan2(tangent.x) - HEADING_OFFSET)
}

/// Unit tangent for a heading given in the "0 = north" convention.
#[must_use]
pub fn tangent_from_spline_psi(psi: f64) -> Vector2 {
    let angle = psi + HEADING_OFFSET;
    Vector2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn normalize_keeps_in_range_values() {
        assert_eq!(normalize_psi(0.3), 0.3);
        assert_eq!(normalize_psi(PI), PI);
    }

    #[test]
    fn normalize_maps_minus_pi_to_pi() {
        assert_abs_diff_eq!(normalize_psi(-PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_psi(3.0 * PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn normalize_wraps_multiple_turns() {
        assert_abs_diff_eq!(normalize_psi(0.5 + 4.0 * TAU), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(normalize_psi(-0.5 - 3.0 * TAU), -0.5, epsilon = 1e-9);
    }

    #[test]
    fn lerp_crosses_seam_the_short_way() {
        let a = PI - 0.1;
        let b = -PI + 0.1;
        let mid = lerp_angle(a, b, 0.5);
        assert_abs_diff_eq!(mid.abs(), PI, epsilon = 1e-12);
        assert!(angle_diff(a, mid).abs() <= 0.1 + 1e-12);
        assert!(angle_diff(mid, b).abs() <= 0.1 + 1e-12);
    }

    #[test]
    fn spline_convention_round_trips_through_tangent() {
        for psi in [-3.0, -1.2, 0.0, 0.7, 2.9] {
            let tangent = tangent_from_spline_psi(psi);
            assert_abs_diff_eq!(spline_psi_from_tangent(&tangent), psi, epsilon = 1e-12);
        }
    }

    #[test]
    fn spline_north_is_track_east_rotated() {
        // A tangent pointing along +y is heading 0 in the spline convention
        // and π/2 in the track convention.
        let up = Vector2::new(0.0, 1.0);
        assert_abs_diff_eq!(spline_psi_from_tangent(&up), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(psi_from_direction(&up), FRAC_PI_2, epsilon = 1e-12);
    }
}
